//! Form-filling pipeline: enrich profile → extract fields → classify →
//! draft responses → assemble document → analyze source structure.

use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::forms::analysis::{analyze_structure, PdfAnalysis};
use crate::forms::assembly::{assemble, Assembly};
use crate::forms::classification::ClassifiedFields;
use crate::forms::enrichment::{enhance_profile, DataSources};
use crate::forms::extraction::{demo_fields, extract_fields};
use crate::forms::generation::generate_responses;
use crate::forms::{pdf, FieldResponses, FormField};
use crate::llm_client::LlmClient;
use crate::models::profile::{GrantContext, NgoProfile};

pub const FILLED_PDF_NAME: &str = "filled_grant_application.pdf";

#[derive(Debug, Clone, Deserialize)]
pub struct FillGrantFormRequest {
    pub pdf_data: Option<String>,
    pub ngo_profile: Option<NgoProfile>,
    pub grant_context: Option<GrantContext>,
    pub data_sources: Option<DataSources>,
    pub ngo_profile_pdf: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FillInput {
    pub pdf_data: String,
    pub ngo_profile: NgoProfile,
    pub grant_context: GrantContext,
    pub data_sources: DataSources,
    pub ngo_profile_pdf: Option<String>,
}

impl FillInput {
    pub fn from_request(request: FillGrantFormRequest) -> Option<Self> {
        let pdf_data = request.pdf_data.filter(|p| !p.is_empty())?;
        Some(Self {
            pdf_data,
            ngo_profile: request.ngo_profile.unwrap_or_default(),
            grant_context: request.grant_context.unwrap_or_default(),
            data_sources: request.data_sources.unwrap_or_default(),
            ngo_profile_pdf: request.ngo_profile_pdf,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FormMetadata {
    pub processing_method: &'static str,
    pub field_classification: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilledFormStructure {
    pub form_type: &'static str,
    pub filled_fields: FieldResponses,
    pub completion_status: &'static str,
    pub fill_timestamp: String,
    pub total_fields: usize,
    pub metadata: FormMetadata,
}

impl FilledFormStructure {
    fn new(responses: &FieldResponses, timestamp: &str) -> Self {
        Self {
            form_type: "grant_application",
            filled_fields: responses.clone(),
            completion_status: "completed",
            fill_timestamp: timestamp.to_string(),
            total_fields: responses.len(),
            metadata: FormMetadata {
                processing_method: "llm_assisted",
                field_classification: "automated",
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PdfGeneration {
    pub success: bool,
    pub method: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessingSummary {
    pub total_fields: usize,
    pub filled_fields: usize,
    /// Percentage of discovered fields that received a response.
    pub fill_rate: f64,
    pub pdf_generation: PdfGeneration,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilledPdf {
    pub data: String,
    pub filename: &'static str,
    pub content_type: &'static str,
    pub encoding: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct FillGrantFormResponse {
    pub success: bool,
    pub original_fields: Vec<FormField>,
    pub classified_fields: ClassifiedFields,
    pub filled_responses: FieldResponses,
    pub filled_form_structure: FilledFormStructure,
    pub pdf_analysis: PdfAnalysis,
    pub timestamp: String,
    pub processing_summary: ProcessingSummary,
    pub enhanced_profile: NgoProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filled_pdf: Option<FilledPdf>,
}

pub fn fill_rate(filled: usize, total: usize) -> f64 {
    filled as f64 / total.max(1) as f64 * 100.0
}

/// Runs the whole pipeline. Every stage degrades to a fallback, so a
/// validated request always produces a response.
pub async fn fill_grant_form(llm: Option<&LlmClient>, input: FillInput) -> FillGrantFormResponse {
    let profile = enhance_profile(
        llm,
        input.ngo_profile,
        &input.data_sources,
        input.ngo_profile_pdf.as_deref(),
    )
    .await;

    let source = match pdf::decode_base64(&input.pdf_data) {
        Ok(bytes) => Ok(Bytes::from(bytes)),
        Err(e) => {
            warn!("Could not decode pdf_data: {e}");
            Err(e)
        }
    };

    let (fields, pdf_analysis) = match &source {
        Ok(bytes) => {
            let bytes = bytes.clone();
            tokio::task::spawn_blocking(move || (extract_fields(&bytes), analyze_structure(&bytes)))
                .await
                .unwrap_or_else(|e| {
                    warn!("PDF inspection task failed: {e}");
                    (demo_fields(), PdfAnalysis::failed(e))
                })
        }
        Err(e) => (demo_fields(), PdfAnalysis::failed(e)),
    };

    let classified = ClassifiedFields::from_fields(&fields);
    let responses = generate_responses(llm, &classified, &profile, &input.grant_context).await;

    let assembly = {
        let source = source.ok();
        let responses = responses.clone();
        tokio::task::spawn_blocking(move || assemble(source.as_deref(), &responses))
            .await
            .unwrap_or_else(|e| Assembly::failed(format!("document assembly task failed: {e}")))
    };

    let timestamp = Utc::now().to_rfc3339();
    let filled_pdf = match (&assembly.data, assembly.success) {
        (Some(data), true) => Some(FilledPdf {
            data: data.clone(),
            filename: FILLED_PDF_NAME,
            content_type: assembly.content_type,
            encoding: "base64",
        }),
        _ => None,
    };

    info!(
        "Filled {}/{} fields, document method {}",
        responses.len(),
        fields.len(),
        assembly.method
    );

    FillGrantFormResponse {
        success: true,
        processing_summary: ProcessingSummary {
            total_fields: fields.len(),
            filled_fields: responses.len(),
            fill_rate: fill_rate(responses.len(), fields.len()),
            pdf_generation: PdfGeneration {
                success: assembly.success,
                method: assembly.method.to_string(),
            },
        },
        filled_form_structure: FilledFormStructure::new(&responses, &timestamp),
        original_fields: fields,
        classified_fields: classified,
        filled_responses: responses,
        pdf_analysis,
        timestamp,
        enhanced_profile: profile,
        filled_pdf,
    }
}
