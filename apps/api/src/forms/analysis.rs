//! Structural summary of the uploaded PDF, returned alongside the results.

use serde::Serialize;
use tracing::warn;

use crate::forms::pdf;

const SNIPPET_PAGES: usize = 3;
const SNIPPET_CHARS: usize = 500;

#[derive(Debug, Clone, Serialize)]
pub struct TextSnippet {
    pub page: u32,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PdfAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub total_pages: usize,
    pub has_form_fields: bool,
    pub form_fields: Vec<String>,
    pub extracted_text_snippets: Vec<TextSnippet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_encrypted: Option<bool>,
}

impl PdfAnalysis {
    pub fn failed(error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            total_pages: 0,
            has_form_fields: false,
            form_fields: Vec::new(),
            extracted_text_snippets: Vec::new(),
            is_encrypted: None,
        }
    }
}

pub fn analyze_structure(bytes: &[u8]) -> PdfAnalysis {
    let doc = match pdf::load(bytes) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("Error analyzing PDF: {e}");
            return PdfAnalysis::failed(e);
        }
    };

    let form_fields: Vec<String> = pdf::text_fields(&doc).into_iter().map(|f| f.name).collect();
    let pages = doc.get_pages();

    let extracted_text_snippets = pages
        .keys()
        .take(SNIPPET_PAGES)
        .filter_map(|&page| match pdf::page_text(&doc, page) {
            Ok(text) if !text.is_empty() => Some(TextSnippet {
                page,
                text: snippet(&text),
            }),
            Ok(_) => None,
            Err(e) => {
                warn!("Failed to extract text from page {page}: {e}");
                None
            }
        })
        .collect();

    PdfAnalysis {
        error: None,
        total_pages: pages.len(),
        has_form_fields: !form_fields.is_empty(),
        form_fields,
        extracted_text_snippets,
        is_encrypted: Some(pdf::is_encrypted(&doc)),
    }
}

fn snippet(text: &str) -> String {
    match text.char_indices().nth(SNIPPET_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
