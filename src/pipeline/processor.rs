//! Note Processing Orchestrator.
//!
//! Single entry point that drives one note through the pipeline:
//! extract → format legacy payload → submit.
//!
//! Uses trait-based DI for the extractor and the order transport so the
//! orchestrator stays testable with mock implementations.

use serde::Serialize;
use uuid::Uuid;

use crate::models::NormalizedNote;
use crate::pipeline::extraction::{ExtractionError, NoteExtractor};
use crate::pipeline::ordering::{format_order_request, OrderError, OrderTransport};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur while processing a note.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Formatting failed: {0}")]
    Order(#[from] OrderError),
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// What happened to one note.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingOutcome {
    pub run_id: Uuid,
    pub extractor: &'static str,
    pub note: NormalizedNote,
    /// Legacy JSON payload, exactly as submitted.
    pub payload: String,
    /// `None` when submission was skipped (dry run).
    pub submitted: Option<bool>,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct NoteProcessor {
    extractor: Box<dyn NoteExtractor>,
    transport: Option<Box<dyn OrderTransport + Send + Sync>>,
}

impl NoteProcessor {
    pub fn new(
        extractor: Box<dyn NoteExtractor>,
        transport: Box<dyn OrderTransport + Send + Sync>,
    ) -> Self {
        Self {
            extractor,
            transport: Some(transport),
        }
    }

    /// Extract and format only; nothing is sent.
    pub fn dry_run(extractor: Box<dyn NoteExtractor>) -> Self {
        Self {
            extractor,
            transport: None,
        }
    }

    /// Run one note through the pipeline.
    ///
    /// A rejected or failed submission is reported in the outcome, not as an
    /// error; retrying is the caller's decision.
    pub fn process(&self, raw_text: &str) -> Result<ProcessingOutcome, ProcessingError> {
        let run_id = Uuid::new_v4();
        let _span = tracing::info_span!(
            "process_note",
            run_id = %run_id,
            extractor = self.extractor.name()
        )
        .entered();

        let note = self.extractor.extract(raw_text)?;
        let payload = format_order_request(&note)?;

        tracing::info!(
            device = note.prescription.as_ref().map(|rx| rx.device().as_str()),
            payload_bytes = payload.len(),
            "Order payload built"
        );

        let submitted = self.transport.as_ref().map(|transport| {
            let accepted = transport.submit(&payload);
            if !accepted {
                tracing::warn!("Order was not accepted");
            }
            accepted
        });

        Ok(ProcessingOutcome {
            run_id,
            extractor: self.extractor.name(),
            note,
            payload,
            submitted,
        })
    }
}
