//! Logging setup for processes embedding the resolver.

use anyhow::Context;

/// Install a global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `log_level` (e.g. "info",
/// "resolver_index=debug") is used. Fails if a subscriber is already set.
pub fn init_logging(log_level: &str) -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}
