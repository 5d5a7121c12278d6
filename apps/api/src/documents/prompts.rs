use crate::llm_client::CallOptions;

pub const DOCUMENT_OPTIONS: CallOptions = CallOptions::new(0.3, 1000);

/// Characters of document content sent to the model.
pub const CONTENT_PREVIEW_CHARS: usize = 4000;

pub const DOCUMENT_ANALYSIS_SYSTEM: &str = "You are a document analyzer specializing in grant-related content.
Analyze the following document and extract key information. Return a JSON object with:
- summary: Brief document summary
- documentType: Type (grant application, grant opportunity, research paper, etc.)
- keyEntities: Important organizations, amounts, dates mentioned
- isGrantRelated: boolean indicating if grant-related
- confidence: confidence score (0-1)
- grantRequirements: If grant opportunity, list key requirements
- fundingAmount: Any funding amounts mentioned
- deadlines: Important dates/deadlines found";

/// Replace `{file_name}` and `{content}` before sending.
pub const DOCUMENT_ANALYSIS_PROMPT_TEMPLATE: &str =
    "Document filename: {file_name}\nDocument content: {content}";
