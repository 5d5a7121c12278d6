use crate::llm_client::CallOptions;

pub const MATCH_OPTIONS: CallOptions = CallOptions::new(0.3, 2000);

/// Grants described to the model per request, to stay inside the context window.
pub const MAX_GRANTS_IN_PROMPT: usize = 10;

pub const GRANT_MATCHING_SYSTEM: &str = "You are a grant matching expert. \
Analyze user profiles/documents against grant opportunities and provide match scores.

For each grant, provide a match score (0-100) and explanation. Return a JSON array where each element contains:
- grantId: The grant identifier
- matchScore: Integer from 0-100 (higher = better match)
- reasoning: Detailed explanation of the match
- strengths: Array of alignment strengths
- gaps: Array of potential gaps or weaknesses
- recommendations: Array of specific recommendations
- priority: high/medium/low based on match quality

Sort results by matchScore in descending order.";

/// Replace `{user_profile}` and `{grants}` before sending.
pub const GRANT_MATCHING_PROMPT_TEMPLATE: &str = "User Profile:
{user_profile}

Grant Opportunities:
{grants}";

pub const GRANT_SEPARATOR: &str = "\n\n---\n\n";
