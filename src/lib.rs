pub mod classifier;
pub mod config;
pub mod db;
pub mod engagement;
pub mod favorites;
pub mod feed;
pub mod models;
pub mod normalize;
pub mod remote;
pub mod result_cache;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for a host binary.
///
/// Respects `RUST_LOG` when set, otherwise falls back to the library
/// default filter. Call once at startup; the embedding UI shell owns the
/// subscriber for the rest of the process lifetime.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} core v{}", config::APP_NAME, config::APP_VERSION);
}
