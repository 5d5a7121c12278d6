use crate::forms::FieldType;
use crate::llm_client::CallOptions;
use crate::models::profile::{GrantContext, NgoProfile};

pub const FIELD_OPTIONS: CallOptions = CallOptions::new(0.7, 500);
pub const PROFILE_EXTRACTION_OPTIONS: CallOptions = CallOptions::new(0.1, 500);

/// Characters of profile PDF text sent for extraction.
pub const PROFILE_TEXT_CHARS: usize = 3000;

pub const FIELD_SYSTEM: &str =
    "You are an expert grant writer helping fill out grant applications.";

pub const PROFILE_EXTRACTION_SYSTEM: &str =
    "You extract structured organization data from NGO documents.";

/// Replace `{text}` before sending.
pub const PROFILE_EXTRACTION_PROMPT_TEMPLATE: &str = "Extract the following information from this NGO document. Return only a JSON object with the specified fields.
If information is not found, omit the field or use null.

Text: {text}

Extract these fields:
- mission: Organization's mission statement
- years_active: Number of years the organization has been active
- focus_areas: Array of focus areas/sectors
- annual_budget: Annual budget in dollars (number only)
- recent_projects: Description of recent successful projects
- target_population: Who the organization serves
- geographic_scope: Areas where organization operates
- key_achievements: Notable accomplishments";

/// Organization and funder facts shared by every field prompt.
pub fn base_context(profile: &NgoProfile, context: &GrantContext) -> String {
    let mut ngo = format!(
        "NGO Profile:
- Organization: {}
- Mission: {}
- Years Active: {}
- Focus Areas: {}
- Annual Budget: {}",
        profile.text_or("organization_name", "Example NGO"),
        profile.text_or("mission", "Helping communities"),
        profile.text_or("years_active", "5"),
        profile.focus_areas_or("community development"),
        profile.annual_budget_display(),
    );

    if let Some(email) = profile.get("contact_email") {
        ngo.push_str(&format!("\n- Contact: {}", display(email)));
        if let Some(phone) = profile.get("phone") {
            ngo.push_str(&format!(" | {}", display(phone)));
        }
    }
    for (key, label) in [
        ("recent_projects", "Recent Projects"),
        ("target_population", "Target Population"),
        ("key_achievements", "Key Achievements"),
        ("geographic_scope", "Geographic Scope"),
    ] {
        if let Some(value) = profile.get(key) {
            ngo.push_str(&format!("\n- {label}: {}", display(value)));
        }
    }
    if let Some(serde_json::Value::Array(sources)) = profile.get("data_sources_used") {
        let sources: Vec<String> = sources.iter().map(display).collect();
        ngo.push_str(&format!("\n- Data Sources: {}", sources.join(", ")));
    }

    format!(
        "{ngo}

Grant Context:
- Funder: {}
- Focus Area: {}
- Max Amount: {}
- Requirements: {}",
        context.text_or("funder_name", "Foundation"),
        context.text_or("focus_area", "community development"),
        context.max_amount_display(),
        context.text_or("requirements", "N/A"),
    )
}

fn field_instruction(field_name: &str, field_type: FieldType) -> String {
    match field_name {
        "organization_name" => "Provide the exact legal name of the organization.".to_string(),
        "project_title" => "Create a compelling project title (8-12 words) that aligns with both the NGO's mission and the funder's focus area. Make it specific and action-oriented.".to_string(),
        "mission_statement" => "Write a concise mission statement (under 200 words) that clearly describes the organization's core purpose and demonstrates alignment with the grant focus area.".to_string(),
        "project_description" => "Write a detailed project description (300-500 words) that includes:
1. The problem being addressed
2. Your proposed solution
3. Specific activities and methodology
4. Timeline and milestones
5. How it aligns with funder priorities".to_string(),
        "requested_amount" => "Determine an appropriate funding request amount considering:
1. The maximum grant amount
2. Project scope and needs
3. Organizational capacity
Provide only the dollar amount (no $ symbol).".to_string(),
        "project_duration" => "Specify an appropriate project duration (e.g., '12 months', '18 months') based on the project scope and typical grant periods.".to_string(),
        "target_population" => "Describe the target population this project will serve, including demographics, size, and why they need this intervention.".to_string(),
        "expected_outcomes" => "List 3-5 specific, measurable outcomes this project will achieve, including quantitative targets where possible.".to_string(),
        other => format!(
            "Provide an appropriate response for the field '{other}' ({}).",
            field_type.as_str()
        ),
    }
}

pub fn field_prompt(
    field_name: &str,
    field_type: FieldType,
    profile: &NgoProfile,
    context: &GrantContext,
) -> String {
    format!(
        "{}\n\n{}",
        base_context(profile, context),
        field_instruction(field_name, field_type)
    )
}

fn display(value: &serde_json::Value) -> String {
    crate::llm_client::prompts::value_text(value)
}
