use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use medbrief::config::{self, PipelineConfig};
use medbrief::models::ProcessingStatus;
use medbrief::pipeline::import::{capabilities, validate_file};
use medbrief::{DocumentSource, PipelineOrchestrator, ProgressCallback};

#[derive(Parser, Debug)]
#[command(
    name = "medbrief",
    version,
    about = "Summarize a medical document in plain language, with safety checks."
)]
struct Args {
    /// Document to process (pdf, jpg, png, tiff or txt).
    file: Option<PathBuf>,

    /// Process this text instead of a file.
    #[arg(long, conflicts_with = "file")]
    text: Option<String>,

    /// Skip the patient-friendly summary.
    #[arg(long)]
    no_summary: bool,

    /// Skip structured field extraction.
    #[arg(long)]
    no_extraction: bool,

    /// Minimum confidence before human review is required (0.0-1.0).
    #[arg(long)]
    threshold: Option<f32>,

    /// Time budget per generation stage, in milliseconds.
    #[arg(long)]
    max_processing_ms: Option<u64>,

    /// Only check size and format, then exit.
    #[arg(long)]
    validate_only: bool,

    /// Print capabilities as JSON and exit.
    #[arg(long)]
    capabilities: bool,
}

fn main() -> anyhow::Result<()> {
    medbrief::init_tracing();
    let args = Args::parse();
    tracing::info!("{} v{}", config::APP_NAME, config::APP_VERSION);

    if args.capabilities {
        println!("{}", serde_json::to_string_pretty(&capabilities())?);
        return Ok(());
    }

    let source = match (args.file, args.text) {
        (Some(path), None) => {
            let check = validate_file(&path);
            if args.validate_only {
                println!("{}", serde_json::to_string_pretty(&check)?);
                return Ok(());
            }
            if !check.valid {
                bail!(
                    "{}: {}",
                    path.display(),
                    check.reason.unwrap_or_else(|| "invalid file".into())
                );
            }
            DocumentSource::File(path)
        }
        (None, Some(text)) => DocumentSource::text(text),
        _ => bail!("Provide a document path or --text"),
    };

    let config = PipelineConfig::from_env().context("Invalid MEDBRIEF_* environment")?;
    let mut options = config.options.clone();
    options.enable_summary = !args.no_summary;
    options.enable_extraction = !args.no_extraction;
    if let Some(threshold) = args.threshold {
        if !(0.0..=1.0).contains(&threshold) {
            bail!("--threshold must be within [0, 1]");
        }
        options.confidence_threshold = threshold;
    }
    if let Some(ms) = args.max_processing_ms {
        options.max_processing_time = ms;
    }

    // The blocking HTTP client must be built (and dropped) outside the runtime.
    let orchestrator =
        PipelineOrchestrator::from_config(&config).context("Failed to configure pipeline")?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let on_progress: ProgressCallback = Arc::new(|status: &ProcessingStatus| {
        eprintln!("[{:>3}%] {}: {}", status.progress, status.stage, status.message);
    });
    let result = runtime
        .block_on(orchestrator.process(source, &options, Some(on_progress)))
        .context("Document could not be parsed")?;
    drop(runtime);

    println!("{}", serde_json::to_string_pretty(&result)?);
    if result.safety_check.requires_provider_consult() {
        eprintln!("Review this document with your healthcare provider before acting on it.");
    }
    Ok(())
}
