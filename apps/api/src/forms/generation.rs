//! Drafts a value for every classified field.

use tracing::{info, warn};

use crate::forms::classification::ClassifiedFields;
use crate::forms::prompts::{field_prompt, FIELD_OPTIONS, FIELD_SYSTEM};
use crate::forms::{title_case, FieldResponses};
use crate::llm_client::LlmClient;
use crate::models::profile::{GrantContext, NgoProfile};

const DEMO_ORGANIZATION: &str = "Community Development Alliance";

const DEMO_PROJECT_TITLE: &str = "Digital Literacy Training for Underserved Communities";
const DEMO_PROJECT_DESCRIPTION: &str = "This 12-month project will establish digital literacy training centers in three underserved neighborhoods, providing computer skills training to 300 adults and seniors. The program includes basic computer operations, internet safety, online job applications, and digital communication skills. Each center will operate 6 days per week with certified instructors and provide ongoing support to ensure skill retention and practical application.";
const DEMO_TARGET_POPULATION: &str = "Low-income adults ages 25-65 in underserved urban neighborhoods who lack basic computer skills and digital literacy, with priority given to unemployed individuals, seniors, and single parents seeking to improve employment prospects.";
const DEMO_EXPECTED_OUTCOMES: &str = "1. Train 300 adults in basic digital literacy skills with 85% completion rate. 2. Achieve 70% job application success rate among participants. 3. Establish sustainable partnerships with 5 local employers. 4. Create ongoing digital support network with 90% participant satisfaction.";

/// Generates one response per field, keyed by field name.
///
/// Without an LLM every field gets its demo text or static fallback. With
/// one, each field is prompted separately and a failed call falls back for
/// that field only.
pub async fn generate_responses(
    llm: Option<&LlmClient>,
    classified: &ClassifiedFields,
    profile: &NgoProfile,
    context: &GrantContext,
) -> FieldResponses {
    let Some(llm) = llm else {
        warn!("Azure OpenAI not configured, using demo responses");
        return classified
            .iter()
            .map(|(_, field)| {
                let value = demo_response(&field.name, profile)
                    .unwrap_or_else(|| fallback_response(&field.name, profile));
                (field.name.clone(), value)
            })
            .collect();
    };

    let mut responses = FieldResponses::default();
    for (category, field) in classified.iter() {
        let prompt = field_prompt(&field.name, field.field_type, profile, context);
        let value = match llm.call_text(FIELD_SYSTEM, &prompt, FIELD_OPTIONS).await {
            Ok(text) => text,
            Err(e) => {
                warn!("LLM call failed for field {} ({category:?}): {e}", field.name);
                fallback_response(&field.name, profile)
            }
        };
        responses.insert(field.name.clone(), value);
    }
    info!("Generated responses for {} fields", responses.len());
    responses
}

/// Sample answers for the standard template fields.
pub fn demo_response(field_name: &str, profile: &NgoProfile) -> Option<String> {
    let organization = profile
        .organization_name()
        .unwrap_or_else(|| DEMO_ORGANIZATION.to_string());
    let value = match field_name {
        "organization_name" => organization,
        "project_title" => DEMO_PROJECT_TITLE.to_string(),
        "mission_statement" => format!(
            "{organization} empowers underserved communities through education, technology access, and capacity building programs that create sustainable positive change and economic opportunities."
        ),
        "project_description" => DEMO_PROJECT_DESCRIPTION.to_string(),
        "requested_amount" => "45000".to_string(),
        "project_duration" => "12 months".to_string(),
        "target_population" => DEMO_TARGET_POPULATION.to_string(),
        "expected_outcomes" => DEMO_EXPECTED_OUTCOMES.to_string(),
        _ => return None,
    };
    Some(value)
}

/// Static text used when a field cannot be drafted.
pub fn fallback_response(field_name: &str, profile: &NgoProfile) -> String {
    match field_name {
        "organization_name" => profile
            .organization_name()
            .unwrap_or_else(|| "NGO Name".to_string()),
        "project_title" => "Community Development Initiative".to_string(),
        "requested_amount" => "25000".to_string(),
        "project_duration" => "12 months".to_string(),
        other => format!("[Please provide {}]", title_case(other)),
    }
}
