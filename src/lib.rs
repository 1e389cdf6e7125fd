pub mod config;
pub mod models;
pub mod pipeline;

use tracing_subscriber::EnvFilter;

pub use pipeline::extraction::{ExtractionError, HeuristicExtractor, NoteExtractor};
pub use pipeline::ordering::{format_order_request, HttpOrderClient, OrderError, OrderTransport};
pub use pipeline::processor::{NoteProcessor, ProcessingError, ProcessingOutcome};
pub use pipeline::structuring::{LlmClient, LlmNoteExtractor, OllamaClient, StructuringError};

/// Install the global `tracing` subscriber. `RUST_LOG` wins over the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();
}
