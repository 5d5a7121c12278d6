//! Profile enrichment from supplementary sources supplied with the form.
//!
//! A profile PDF is read and turned into profile keys, by the LLM when one is
//! configured and by keyword heuristics otherwise. Extracted values replace
//! profile values that are missing or shorter. The list of sources actually
//! applied is recorded under `data_sources_used`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::forms::prompts::{
    PROFILE_EXTRACTION_OPTIONS, PROFILE_EXTRACTION_PROMPT_TEMPLATE, PROFILE_EXTRACTION_SYSTEM,
    PROFILE_TEXT_CHARS,
};
use crate::forms::{pdf, FormError};
use crate::llm_client::prompts::{fill_template, value_text, JSON_ONLY_INSTRUCTION};
use crate::llm_client::LlmClient;
use crate::models::profile::NgoProfile;
use crate::request::is_empty_value;

pub const SOURCE_PROFILE_PDF: &str = "profile_pdf";
pub const SOURCE_MANUAL_ENTRY: &str = "manual_entry";

const MISSION_MAX_CHARS: usize = 500;

static DOLLAR_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$[\d,]+").expect("dollar pattern is valid"));

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataSources {
    pub has_profile_pdf: Option<bool>,
    pub has_website: Option<bool>,
    pub website_url: Option<String>,
}

impl DataSources {
    /// Absent and `null` flags both read as false.
    pub fn wants_profile_pdf(&self) -> bool {
        self.has_profile_pdf.unwrap_or(false)
    }

    pub fn wants_website(&self) -> bool {
        self.has_website.unwrap_or(false)
    }
}

pub async fn enhance_profile(
    llm: Option<&LlmClient>,
    base: NgoProfile,
    sources: &DataSources,
    profile_pdf: Option<&str>,
) -> NgoProfile {
    let mut profile = base;
    let mut used: Vec<&str> = Vec::new();

    if sources.wants_profile_pdf() {
        if let Some(pdf_data) = profile_pdf.filter(|p| !p.trim().is_empty()) {
            match extract_profile_data(llm, pdf_data).await {
                Ok(data) if !data.is_empty() => {
                    merge_extracted(&mut profile, data);
                    used.push(SOURCE_PROFILE_PDF);
                    info!("Enhanced NGO profile with profile PDF data");
                }
                Ok(_) => info!("Profile PDF yielded no organization data"),
                Err(e) => warn!("Failed to extract data from NGO profile PDF: {e}"),
            }
        }
    }

    if sources.wants_website() {
        if let Some(url) = sources.website_url.as_deref().filter(|u| !u.trim().is_empty()) {
            info!("Website profile extraction is not supported, skipping {url}");
        }
    }

    if used.is_empty() {
        used.push(SOURCE_MANUAL_ENTRY);
    }
    profile.insert("data_sources_used", json!(used));
    profile
}

async fn extract_profile_data(
    llm: Option<&LlmClient>,
    pdf_data: &str,
) -> Result<Map<String, Value>, FormError> {
    let bytes = pdf::decode_base64(pdf_data)?;
    let text = tokio::task::spawn_blocking(move || pdf::extract_text(&bytes))
        .await
        .map_err(|e| FormError::TextExtraction(format!("extraction task failed: {e}")))??;

    Ok(match llm {
        Some(llm) => extract_with_llm(llm, &text).await,
        None => extract_with_keywords(&text),
    })
}

async fn extract_with_llm(llm: &LlmClient, text: &str) -> Map<String, Value> {
    let excerpt: String = text.chars().take(PROFILE_TEXT_CHARS).collect();
    let prompt = fill_template(PROFILE_EXTRACTION_PROMPT_TEMPLATE, &[("text", excerpt.as_str())]);
    let system = format!("{PROFILE_EXTRACTION_SYSTEM}\n{JSON_ONLY_INSTRUCTION}");

    match llm
        .call_json::<Map<String, Value>>(&system, &prompt, PROFILE_EXTRACTION_OPTIONS)
        .await
    {
        Ok(data) => data,
        Err(e) => {
            warn!("Profile extraction reply unusable: {e}");
            Map::new()
        }
    }
}

/// Mission paragraph and largest dollar figure found in the text.
pub fn extract_with_keywords(text: &str) -> Map<String, Value> {
    let mut extracted = Map::new();

    let lines: Vec<&str> = text.split('\n').collect();
    if let Some(start) = lines
        .iter()
        .position(|line| line.to_lowercase().contains("mission"))
    {
        let end = (start + 3).min(lines.len());
        let mission: String = lines[start..end]
            .join(" ")
            .trim()
            .chars()
            .take(MISSION_MAX_CHARS)
            .collect();
        extracted.insert("mission".to_string(), json!(mission));
    }

    let largest = DOLLAR_AMOUNT
        .find_iter(text)
        .filter_map(|m| m.as_str()[1..].replace(',', "").parse::<i64>().ok())
        .max();
    if let Some(amount) = largest {
        extracted.insert("annual_budget".to_string(), json!(amount));
    }

    extracted
}

/// Takes an extracted value when the profile lacks the key or holds a
/// shorter rendering of it.
pub fn merge_extracted(profile: &mut NgoProfile, extracted: Map<String, Value>) {
    for (key, value) in extracted {
        if is_empty_value(&value) {
            continue;
        }
        let replace = match profile.get(&key) {
            None => true,
            Some(existing) => {
                value_text(&value).chars().count() > value_text(existing).chars().count()
            }
        };
        if replace {
            profile.insert(&key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::MockServer;

    use super::*;
    use crate::forms::pdf::encode_base64;
    use crate::forms::pdf::test_support::text_pdf;
    use crate::llm_client::test_support::{mount_reply, test_client};

    fn profile(value: Value) -> NgoProfile {
        serde_json::from_value(value).unwrap()
    }

    fn pdf_sources() -> DataSources {
        DataSources {
            has_profile_pdf: Some(true),
            ..DataSources::default()
        }
    }

    #[test]
    fn test_keywords_take_mission_lines_and_largest_amount() {
        let text = "About us\nOur Mission\nWe teach coding\nto girls in Lagos.\nExtra line\nBudget: $250,000 of $1,200,000 total; fee $5";
        let extracted = extract_with_keywords(text);
        assert_eq!(extracted["mission"], "Our Mission We teach coding to girls in Lagos.");
        assert_eq!(extracted["annual_budget"], 1_200_000);
    }

    #[test]
    fn test_keywords_mission_is_capped() {
        let text = format!("mission {}", "x".repeat(900));
        let extracted = extract_with_keywords(&text);
        assert_eq!(extracted["mission"].as_str().unwrap().chars().count(), 500);
        assert!(extracted.get("annual_budget").is_none());
    }

    #[test]
    fn test_merge_prefers_missing_or_longer_values() {
        let mut p = profile(json!({"mission": "Help", "organization_name": "Hope Works", "years_active": ""}));
        merge_extracted(
            &mut p,
            serde_json::from_value(json!({
                "mission": "Help children read",
                "organization_name": "Hope",
                "years_active": 12,
                "focus_areas": null
            }))
            .unwrap(),
        );
        assert_eq!(p.text_or("mission", ""), "Help children read");
        assert_eq!(p.text_or("organization_name", ""), "Hope Works");
        assert_eq!(p.text_or("years_active", ""), "12");
        assert!(p.get("focus_areas").is_none());
    }

    #[tokio::test]
    async fn test_without_sources_marks_manual_entry() {
        let p = enhance_profile(None, profile(json!({"mission": "Help"})), &DataSources::default(), None).await;
        assert_eq!(p.0["data_sources_used"], json!(["manual_entry"]));
        assert_eq!(p.0["mission"], "Help");
    }

    #[test]
    fn test_null_flags_read_as_false() {
        let sources: DataSources =
            serde_json::from_value(json!({"has_profile_pdf": null, "has_website": null})).unwrap();
        assert!(!sources.wants_profile_pdf());
        assert!(!sources.wants_website());
        let sources: DataSources = serde_json::from_value(json!({"has_profile_pdf": true})).unwrap();
        assert!(sources.wants_profile_pdf());
    }

    #[tokio::test]
    async fn test_website_source_is_skipped() {
        let sources = DataSources {
            has_website: Some(true),
            website_url: Some("https://hope.example".to_string()),
            ..DataSources::default()
        };
        let p = enhance_profile(None, NgoProfile::default(), &sources, None).await;
        assert_eq!(p.0["data_sources_used"], json!(["manual_entry"]));
    }

    #[tokio::test]
    async fn test_unreadable_profile_pdf_keeps_profile() {
        let base = profile(json!({"organization_name": "Hope Works"}));
        let p = enhance_profile(None, base, &pdf_sources(), Some("!!not base64")).await;
        assert_eq!(p.0["organization_name"], "Hope Works");
        assert_eq!(p.0["data_sources_used"], json!(["manual_entry"]));
    }

    #[tokio::test]
    async fn test_profile_pdf_keywords_without_llm() {
        let pdf = encode_base64(&text_pdf(&["Our mission is clean water for all villages"]));
        let p = enhance_profile(None, NgoProfile::default(), &pdf_sources(), Some(&pdf)).await;
        assert_eq!(p.0["data_sources_used"], json!(["profile_pdf"]));
        assert!(p.text_or("mission", "").contains("clean water"));
    }

    #[tokio::test]
    async fn test_profile_pdf_with_llm_extraction() {
        let server = MockServer::start().await;
        mount_reply(
            &server,
            r#"```json
{"mission": "Clean water for every village", "years_active": 9, "geographic_scope": null}
```"#,
        )
        .await;
        let client = test_client(&server);
        let pdf = encode_base64(&text_pdf(&["Water Trust annual report"]));

        let p = enhance_profile(
            Some(&client),
            profile(json!({"mission": "Water"})),
            &pdf_sources(),
            Some(&pdf),
        )
        .await;
        assert_eq!(p.0["mission"], "Clean water for every village");
        assert_eq!(p.0["years_active"], 9);
        assert!(p.0.get("geographic_scope").is_none());
        assert_eq!(p.0["data_sources_used"], json!(["profile_pdf"]));
    }
}
