pub mod config;
pub mod models;
pub mod pipeline;

pub use pipeline::extraction::{DocumentSource, ParseError};
pub use pipeline::{PipelineError, PipelineOrchestrator, ProgressCallback};

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` wins over the build
/// default. Logs go to stderr; repeated calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
