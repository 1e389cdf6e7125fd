use std::time::Instant;

use super::parser::parse_note_response;
use super::prompt::NOTE_EXTRACTION_SYSTEM_PROMPT;
use super::types::LlmClient;
use crate::models::NormalizedNote;
use crate::pipeline::extraction::{unwrap_envelope, ExtractionError, NoteExtractor};

/// LLM-backed extractor: note text → model → JSON → normalized note.
pub struct LlmNoteExtractor {
    llm: Box<dyn LlmClient + Send + Sync>,
}

impl LlmNoteExtractor {
    pub fn new(llm: Box<dyn LlmClient + Send + Sync>) -> Self {
        Self { llm }
    }
}

impl NoteExtractor for LlmNoteExtractor {
    fn name(&self) -> &'static str {
        "llm"
    }

    fn extract(&self, raw_text: &str) -> Result<NormalizedNote, ExtractionError> {
        if raw_text.trim().is_empty() {
            return Ok(NormalizedNote::default());
        }

        let text = unwrap_envelope(raw_text);
        let _span = tracing::info_span!("llm_extract", input_chars = text.len()).entered();
        let started = Instant::now();

        let response = self.llm.complete(NOTE_EXTRACTION_SYSTEM_PROMPT, &text)?;

        let note = parse_note_response(&response).inspect_err(|e| {
            tracing::warn!(
                response_chars = response.len(),
                error = %e,
                "LLM response did not match the extraction schema"
            );
        })?;

        tracing::info!(
            duration_ms = started.elapsed().as_millis() as u64,
            device = note.prescription.as_ref().map(|rx| rx.device().as_str()),
            "LLM extraction complete"
        );

        Ok(note)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::{DeviceKind, Prescription};
    use crate::pipeline::structuring::{MockLlmClient, StructuringError};

    /// Lets a test keep a handle on the mock after boxing it.
    struct SharedMock(Arc<MockLlmClient>);

    impl LlmClient for SharedMock {
        fn complete(&self, system: &str, user: &str) -> Result<String, StructuringError> {
            self.0.complete(system, user)
        }
    }

    #[test]
    fn sends_schema_prompt_and_note_text() {
        let mock = Arc::new(MockLlmClient::new(r#"{"prescription": {"device": "cpap"}}"#));
        let extractor = LlmNoteExtractor::new(Box::new(SharedMock(Arc::clone(&mock))));

        let note = extractor.extract("Patient needs CPAP").unwrap();
        assert_eq!(
            note.prescription.map(|rx| rx.device()),
            Some(DeviceKind::Cpap)
        );

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, NOTE_EXTRACTION_SYSTEM_PROMPT);
        assert_eq!(calls[0].1, "Patient needs CPAP");
    }

    #[test]
    fn unwraps_envelope_before_sending() {
        let mock = Arc::new(MockLlmClient::new("{}"));
        let extractor = LlmNoteExtractor::new(Box::new(SharedMock(Arc::clone(&mock))));
        extractor.extract(r#"{"data": "inner note"}"#).unwrap();
        assert_eq!(mock.calls()[0].1, "inner note");
    }

    #[test]
    fn blank_input_skips_llm_call() {
        let mock = Arc::new(MockLlmClient::new("not reached"));
        let extractor = LlmNoteExtractor::new(Box::new(SharedMock(Arc::clone(&mock))));
        assert!(extractor.extract("  \n ").unwrap().is_empty());
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn malformed_response_is_an_error() {
        let extractor = LlmNoteExtractor::new(Box::new(MockLlmClient::new("{ not valid json")));
        let err = extractor.extract("Patient needs CPAP").unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedLlmResponse { .. }));
        assert!(err.to_string().contains("{ not valid json"));
    }

    #[test]
    fn transport_failure_propagates() {
        let extractor = LlmNoteExtractor::new(Box::new(MockLlmClient::failing(502, "bad gateway")));
        let err = extractor.extract("Patient needs CPAP").unwrap_err();
        match err {
            ExtractionError::Llm(StructuringError::Service { status, body }) => {
                assert_eq!(status, 502);
                assert_eq!(body, "bad gateway");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn fenced_wheelchair_response() {
        let response = "```json\n{\"prescription\": {\"device\": \"Wheelchair\", \"chair_type\": \"power\"}}\n```";
        let extractor = LlmNoteExtractor::new(Box::new(MockLlmClient::new(response)));
        let note = extractor.extract("power wheelchair").unwrap();
        let Some(Prescription::Wheelchair(chair)) = note.prescription else {
            panic!("expected wheelchair");
        };
        assert_eq!(chair.chair_type.as_deref(), Some("power"));
    }
}
