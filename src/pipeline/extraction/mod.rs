pub mod fields;
pub mod values;
pub mod prescriptions;
pub mod heuristic;

pub use fields::*;
pub use values::*;
pub use prescriptions::*;
pub use heuristic::*;

use thiserror::Error;

use crate::models::NormalizedNote;
use crate::pipeline::structuring::StructuringError;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("LLM error: {0}")]
    Llm(#[from] StructuringError),

    /// The model answered, but not with the JSON object we asked for.
    #[error("LLM returned invalid JSON ({reason}); payload starts with: {snippet}")]
    MalformedLlmResponse { reason: String, snippet: String },
}

/// Shared contract for the heuristic and LLM extractors, so callers can swap
/// one for the other.
pub trait NoteExtractor: Send + Sync {
    /// Short name used in logs and configuration.
    fn name(&self) -> &'static str;

    fn extract(&self, raw_text: &str) -> Result<NormalizedNote, ExtractionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extractor_trait_is_object_safe() {
        fn _assert_extractor(_: &dyn NoteExtractor) {}
    }

    #[test]
    fn malformed_response_message_carries_snippet() {
        let err = ExtractionError::MalformedLlmResponse {
            reason: "expected value".into(),
            snippet: "{ not valid json".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("LLM returned invalid JSON"));
        assert!(msg.contains("{ not valid json"));
    }
}
