// Document processing: uploads raw content to blob storage, analyzes it with
// the LLM and records the result for grant matching.

pub mod handlers;
pub mod processor;
pub mod prompts;
