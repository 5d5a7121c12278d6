//! Produces the completed document: the source form with its fields filled
//! when it has fillable fields, otherwise a rendered application, otherwise
//! plain text.

use std::fmt;

use tracing::{debug, info, warn};

use crate::forms::render::{render_application_pdf, text_document};
use crate::forms::{pdf, FieldResponses, FormError};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const TEXT_CONTENT_TYPE: &str = "text/plain";

#[derive(Debug, Clone, PartialEq)]
pub enum FillMethod {
    FormFields,
    Generated,
    Text,
    Error(String),
}

impl fmt::Display for FillMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillMethod::FormFields => f.write_str("form_fields"),
            FillMethod::Generated => f.write_str("generated"),
            FillMethod::Text => f.write_str("text"),
            FillMethod::Error(message) => write!(f, "error: {message}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Assembly {
    pub success: bool,
    /// Base64 document body.
    pub data: Option<String>,
    pub content_type: &'static str,
    pub method: FillMethod,
}

impl Assembly {
    fn pdf(bytes: &[u8], method: FillMethod) -> Self {
        Self {
            success: true,
            data: Some(pdf::encode_base64(bytes)),
            content_type: PDF_CONTENT_TYPE,
            method,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            content_type: PDF_CONTENT_TYPE,
            method: FillMethod::Error(message.into()),
        }
    }
}

/// `source` is the decoded upload, if it decoded at all.
pub fn assemble(source: Option<&[u8]>, responses: &FieldResponses) -> Assembly {
    assemble_with(source, responses, render_application_pdf)
}

fn assemble_with(
    source: Option<&[u8]>,
    responses: &FieldResponses,
    render: impl FnOnce(&FieldResponses) -> Result<Vec<u8>, FormError>,
) -> Assembly {
    if let Some(bytes) = source {
        match fill_form_fields(bytes, responses) {
            Ok(filled) => {
                info!("Filled source PDF form fields");
                return Assembly::pdf(&filled, FillMethod::FormFields);
            }
            Err(FormError::NoFillableFields) => debug!("Source PDF has no fillable fields"),
            Err(e) => warn!("Form field filling failed, generating a new document: {e}"),
        }
    }

    match render(responses) {
        Ok(bytes) => {
            info!("Generated application PDF ({} bytes)", bytes.len());
            Assembly::pdf(&bytes, FillMethod::Generated)
        }
        Err(e) => {
            warn!("PDF generation failed, falling back to text: {e}");
            Assembly {
                success: true,
                data: Some(pdf::encode_base64(text_document(responses).as_bytes())),
                content_type: TEXT_CONTENT_TYPE,
                method: FillMethod::Text,
            }
        }
    }
}

/// Writes responses into the source form's text fields.
pub fn fill_form_fields(
    bytes: &[u8],
    responses: &FieldResponses,
) -> Result<Vec<u8>, FormError> {
    let mut doc = pdf::load(bytes)?;
    if pdf::is_encrypted(&doc) {
        return Err(FormError::NoFillableFields);
    }
    let fields = pdf::text_fields(&doc);
    if fields.is_empty() {
        return Err(FormError::NoFillableFields);
    }

    let filled = pdf::set_field_values(&mut doc, &fields, responses)?;
    debug!("Set {filled} of {} form fields", fields.len());
    pdf::set_need_appearances(&mut doc)?;
    pdf::save(&mut doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::pdf::test_support::{acroform_pdf, text_pdf};

    fn responses() -> FieldResponses {
        [
            ("organization_name".to_string(), "Hope Works".to_string()),
            ("project_title".to_string(), "Clean Water".to_string()),
        ]
        .into_iter()
        .collect()
    }

    fn decode(assembly: &Assembly) -> Vec<u8> {
        pdf::decode_base64(assembly.data.as_deref().unwrap()).unwrap()
    }

    #[test]
    fn test_fillable_source_is_filled_in_place() {
        let source = acroform_pdf(&[("organization_name", ""), ("project_title", "")]);
        let assembly = assemble(Some(&source), &responses());
        assert_eq!(assembly.method, FillMethod::FormFields);
        assert_eq!(assembly.content_type, "application/pdf");

        let doc = pdf::load(&decode(&assembly)).unwrap();
        let values: Vec<String> = pdf::text_fields(&doc).into_iter().map(|f| f.value).collect();
        assert_eq!(values, vec!["Hope Works", "Clean Water"]);
    }

    #[test]
    fn test_plain_source_gets_generated_document() {
        let source = text_pdf(&["Project Title"]);
        let assembly = assemble(Some(&source), &responses());
        assert!(assembly.success);
        assert_eq!(assembly.method, FillMethod::Generated);
        assert!(pdf::load(&decode(&assembly)).is_ok());
    }

    #[test]
    fn test_undecodable_source_gets_generated_document() {
        let assembly = assemble(None, &responses());
        assert_eq!(assembly.method.to_string(), "generated");
    }

    #[test]
    fn test_render_failure_falls_back_to_text() {
        let assembly = assemble_with(None, &responses(), |_| {
            Err(FormError::TextExtraction("boom".to_string()))
        });
        assert!(assembly.success);
        assert_eq!(assembly.method, FillMethod::Text);
        assert_eq!(assembly.content_type, "text/plain");
        let text = String::from_utf8(decode(&assembly)).unwrap();
        assert!(text.starts_with("FILLED GRANT APPLICATION\n"));
        assert!(text.contains("Organization Name:\nHope Works"));
    }

    #[test]
    fn test_failed_method_display() {
        let assembly = Assembly::failed("worker panicked");
        assert!(!assembly.success);
        assert!(assembly.data.is_none());
        assert_eq!(assembly.method.to_string(), "error: worker panicked");
    }
}
