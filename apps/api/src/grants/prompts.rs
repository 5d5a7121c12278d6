// All LLM prompt constants for the grant analysis module.

use crate::llm_client::CallOptions;

pub const ANALYZE_OPTIONS: CallOptions = CallOptions::new(0.3, 1500);

/// System prompt for grant analysis.
pub const GRANT_ANALYSIS_SYSTEM: &str = "You are a grant analysis expert. \
Analyze the following grant opportunity and provide a comprehensive assessment.
Return a JSON object with:
- eligibilityRequirements: Array of key eligibility criteria
- fundingDetails: Object with amount, duration, matching requirements
- applicationRequirements: Array of required documents/information
- evaluationCriteria: Array of evaluation criteria
- strategicAlignment: Array of research/project areas supported
- competitiveness: Assessment (low/medium/high)
- recommendedApplicantProfile: Description of ideal applicant
- keyDeadlines: Important dates and milestones
- riskFactors: Potential challenges or risks
- successFactors: What makes applications successful
- applicationTips: Specific tips for a strong application";

/// User prompt template. Replace `{grant_description}`, `{organization_type}`,
/// `{funding_amount}` and `{deadline}` before sending.
pub const GRANT_ANALYSIS_PROMPT_TEMPLATE: &str = "Grant Description: {grant_description}

Organization Type: {organization_type}
Funding Amount: {funding_amount}
Deadline: {deadline}";
