use super::types::ChatMessage;

/// Character budget for the document body, counted in Unicode scalar values.
pub const MAX_CONTENT_CHARS: usize = 50_000;
pub const TRUNCATION_MARKER: &str = "\n\n[Content truncated due to length...]";

pub const SUMMARIZER_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that provides clear, concise, and well-structured summaries of text content.";

/// Returns the text to embed and whether it was cut.
pub fn truncate_content(content: &str) -> (String, bool) {
    match content.char_indices().nth(MAX_CONTENT_CHARS) {
        Some((byte_idx, _)) => {
            let mut out = String::with_capacity(byte_idx + TRUNCATION_MARKER.len());
            out.push_str(&content[..byte_idx]);
            out.push_str(TRUNCATION_MARKER);
            (out, true)
        }
        None => (content.to_string(), false),
    }
}

pub fn build_summary_user_prompt(content: &str) -> String {
    format!(
        "Please provide a clear and concise summary of the following text. \n\
Focus on the main points, key ideas, and important information. \n\
Keep the summary well-structured and easy to read.\n\
\n\
Text to summarize:\n\
{content}"
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryPrompt {
    pub messages: Vec<ChatMessage>,
    pub truncated: bool,
}

pub fn build_summary_prompt(content: &str) -> SummaryPrompt {
    let (body, truncated) = truncate_content(content);
    SummaryPrompt {
        messages: vec![
            ChatMessage::system(SUMMARIZER_SYSTEM_PROMPT),
            ChatMessage::user(build_summary_user_prompt(&body)),
        ],
        truncated,
    }
}
