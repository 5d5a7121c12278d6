// Grant form filling: reads the fields of an application PDF, drafts a value
// for each with the LLM and hands back a completed document.
// PDF parsing and rendering run on the blocking pool; LLM calls go through
// llm_client.

pub mod analysis;
pub mod assembly;
pub mod classification;
pub mod enrichment;
pub mod extraction;
pub mod filler;
pub mod generation;
pub mod handlers;
pub mod pdf;
pub mod prompts;
pub mod render;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("Invalid base64 PDF data: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("PDF write error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Text extraction failed: {0}")]
    TextExtraction(String),

    #[error("PDF has no fillable text fields")]
    NoFillableFields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Textarea,
    Number,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Number => "number",
        }
    }
}

/// A fillable slot in the application form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub current_value: String,
    pub required: bool,
    /// Set when the field was guessed from the page text rather than read
    /// from form metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inferred: Option<bool>,
}

impl FormField {
    pub fn new(name: &str, field_type: FieldType, required: bool) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            current_value: String::new(),
            required,
            inferred: None,
        }
    }
}

/// Drafted values keyed by field name, kept in the order they were drafted.
/// Serializes as a JSON object in that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldResponses(Vec<(String, String)>);

impl FieldResponses {
    /// Replaces the value in place when `name` is already present.
    pub fn insert(&mut self, name: String, value: String) {
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl std::ops::Index<&str> for FieldResponses {
    type Output = String;

    fn index(&self, name: &str) -> &String {
        match self.0.iter().find(|(existing, _)| existing == name) {
            Some((_, value)) => value,
            None => panic!("no response for field {name}"),
        }
    }
}

impl FromIterator<(String, String)> for FieldResponses {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut responses = Self::default();
        for (name, value) in iter {
            responses.insert(name, value);
        }
        responses
    }
}

impl Serialize for FieldResponses {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// `project_title` → `Project Title`. Letters following a non-letter are
/// capitalized, all others lowercased.
pub fn title_case(field_name: &str) -> String {
    let mut out = String::with_capacity(field_name.len());
    let mut prev_alpha = false;
    for c in field_name.replace('_', " ").chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
