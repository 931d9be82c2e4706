use anyhow::Result;
use std::io;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Default directive from the CLI level, refined by `RUST_LOG` when set.
fn env_filter(verbosity_level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(verbosity_level.into())
        .from_env_lossy()
}

/// Install the global subscriber. Logs go to stderr; stdout carries command
/// output only.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init(verbosity_level: Option<Level>, json: bool) -> Result<()> {
    let filter = env_filter(verbosity_level.unwrap_or(Level::ERROR));

    let (plain_layer, json_layer) = if json {
        let layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(false)
            .with_writer(io::stderr);
        (None, Some(layer))
    } else {
        let layer = fmt::layer()
            .with_file(false)
            .with_line_number(false)
            .with_thread_ids(false)
            .with_target(false)
            .with_writer(io::stderr);
        (Some(layer), None)
    };

    let subscriber = Registry::default()
        .with(plain_layer)
        .with(json_layer)
        .with(filter);
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}
