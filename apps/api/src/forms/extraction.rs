//! Field discovery: AcroForm metadata first, text inference second, a demo
//! field set when the PDF cannot be read at all.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use crate::forms::{pdf, FieldType, FormField};

struct FieldPattern {
    pattern: Regex,
    name: &'static str,
    field_type: FieldType,
}

static FIELD_PATTERNS: Lazy<Vec<FieldPattern>> = Lazy::new(|| {
    [
        (r"(?i)organization.*name", "organization_name", FieldType::Text),
        (r"(?i)project.*title", "project_title", FieldType::Text),
        (r"(?i)mission.*statement", "mission_statement", FieldType::Textarea),
        (r"(?i)project.*description", "project_description", FieldType::Textarea),
        (r"(?i)total.*budget|requested.*amount", "requested_amount", FieldType::Number),
        (r"(?i)project.*duration", "project_duration", FieldType::Text),
        (r"(?i)target.*population", "target_population", FieldType::Textarea),
        (r"(?i)expected.*outcomes", "expected_outcomes", FieldType::Textarea),
    ]
    .into_iter()
    .map(|(pattern, name, field_type)| FieldPattern {
        pattern: Regex::new(pattern).expect("field pattern is valid"),
        name,
        field_type,
    })
    .collect()
});

/// Fields of a typical grant application, used when the upload is unreadable.
pub fn demo_fields() -> Vec<FormField> {
    vec![
        FormField::new("organization_name", FieldType::Text, true),
        FormField::new("project_title", FieldType::Text, true),
        FormField::new("mission_statement", FieldType::Textarea, true),
        FormField::new("project_description", FieldType::Textarea, true),
        FormField::new("requested_amount", FieldType::Number, true),
        FormField::new("project_duration", FieldType::Text, true),
        FormField::new("target_population", FieldType::Textarea, false),
        FormField::new("expected_outcomes", FieldType::Textarea, true),
    ]
}

pub fn extract_fields(bytes: &[u8]) -> Vec<FormField> {
    let doc = match pdf::load(bytes) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("Could not parse PDF, using demo fields: {e}");
            return demo_fields();
        }
    };

    if pdf::is_encrypted(&doc) {
        warn!("PDF is encrypted, cannot extract form fields");
        return Vec::new();
    }

    let fields: Vec<FormField> = pdf::text_fields(&doc)
        .into_iter()
        .map(|field| FormField {
            current_value: field.value,
            ..FormField::new(&field.name, FieldType::Text, true)
        })
        .collect();
    if !fields.is_empty() {
        info!("Found {} AcroForm text fields", fields.len());
        return fields;
    }

    match pdf::extract_text(bytes) {
        Ok(text) => infer_fields_from_text(&text),
        Err(e) => {
            warn!("Could not read PDF text, using demo fields: {e}");
            demo_fields()
        }
    }
}

/// Fields whose labels appear in the page text, in template order.
pub fn infer_fields_from_text(text: &str) -> Vec<FormField> {
    let fields: Vec<FormField> = FIELD_PATTERNS
        .iter()
        .filter(|p| p.pattern.is_match(text))
        .map(|p| FormField {
            inferred: Some(true),
            ..FormField::new(p.name, p.field_type, true)
        })
        .collect();
    info!("Inferred {} fields from PDF text", fields.len());
    fields
}
