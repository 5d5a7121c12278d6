// Grant analysis: turns a free-text funding opportunity into a structured
// assessment and stores it as an active grant for matching.
// All LLM calls go through llm_client.

pub mod analyzer;
pub mod handlers;
pub mod prompts;
