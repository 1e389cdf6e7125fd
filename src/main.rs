use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use dme_intake_lib::config::{self, AppConfig, ExtractorMode};
use dme_intake_lib::{
    HeuristicExtractor, HttpOrderClient, LlmNoteExtractor, NoteExtractor, NoteProcessor,
    OllamaClient,
};

/// Turn a physician note into a DME order and submit it
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the note (plain text, or a JSON `{"data": "..."}` envelope)
    note: PathBuf,

    /// Extractor to use: "heuristic" or "llm" (overrides DME_EXTRACTOR)
    #[arg(short, long)]
    extractor: Option<ExtractorMode>,

    /// Ordering service URL (overrides DME_ORDER_ENDPOINT)
    #[arg(long)]
    endpoint: Option<String>,

    /// Build the payload but do not submit it
    #[arg(long)]
    dry_run: bool,

    /// Also print the normalized note as JSON
    #[arg(long)]
    print_note: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    dme_intake_lib::init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let mut config = AppConfig::from_env().context("Invalid configuration")?;
    if let Some(mode) = args.extractor {
        config.extractor = mode;
    }
    if let Some(endpoint) = args.endpoint {
        config.order_endpoint = Some(endpoint);
    }

    let raw_text = std::fs::read_to_string(&args.note)
        .with_context(|| format!("Failed to read note {}", args.note.display()))?;

    let processor = build_processor(&config, args.dry_run)?;
    let outcome = processor.process(&raw_text)?;

    if args.print_note {
        println!("{}", serde_json::to_string_pretty(&outcome.note)?);
    }
    println!("{}", outcome.payload);

    if outcome.submitted == Some(false) {
        bail!("Ordering service did not accept the order (run {})", outcome.run_id);
    }
    Ok(())
}

fn build_processor(config: &AppConfig, dry_run: bool) -> Result<NoteProcessor> {
    let extractor: Box<dyn NoteExtractor> = match config.extractor {
        ExtractorMode::Heuristic => Box::new(HeuristicExtractor::new()),
        ExtractorMode::Llm => {
            let client =
                OllamaClient::new(&config.llm_url, &config.llm_model, config.llm_timeout_secs)?;
            Box::new(LlmNoteExtractor::new(Box::new(client)))
        }
    };

    if dry_run {
        return Ok(NoteProcessor::dry_run(extractor));
    }

    let Some(endpoint) = config.order_endpoint.as_deref() else {
        bail!(
            "No order endpoint configured; set {} or pass --endpoint, or use --dry-run",
            config::ENV_ORDER_ENDPOINT
        );
    };
    let transport = HttpOrderClient::new(endpoint, config.http_timeout_secs)?;
    Ok(NoteProcessor::new(extractor, Box::new(transport)))
}
