pub mod types;
pub mod prompt;
pub mod parser;
pub mod ollama;
pub mod orchestrator;

pub use types::*;
pub use prompt::*;
pub use parser::*;
pub use ollama::*;
pub use orchestrator::*;

use thiserror::Error;

/// Maximum characters of a remote error body kept in an error message.
pub const MAX_ERROR_BODY_CHARS: usize = 500;

#[derive(Error, Debug)]
pub enum StructuringError {
    #[error("LLM service is not running at {0}")]
    Connection(String),

    #[error("LLM service returned error (status {status}): {body}")]
    Service { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),
}

/// First `max_chars` characters of `text`, with an ellipsis when cut.
/// Char-based so multi-byte text never splits mid-codepoint.
pub fn bounded_snippet(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}
