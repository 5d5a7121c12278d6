// Grant matching: scores active grants against a processed document or an
// organization profile. The LLM ranks; a fixed fallback applies when its
// reply cannot be parsed.

pub mod handlers;
pub mod matcher;
pub mod prompts;
