//! Startup orchestration.
//!
//! # Responsibilities
//! - Run the provider through its boot cycles in order
//! - Start background tasks (metrics exporter)
//! - Serve until the close hook fires, then stop cleanly
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener starts last (traffic only when routes are ready)

use crate::lifecycle::provider::{BootError, HttpServerProvider};
use crate::lifecycle::signals;
use crate::observability::metrics;

/// Boot `provider` and serve until SIGINT/SIGTERM or an explicit trigger.
pub async fn run(mut provider: HttpServerProvider) -> Result<(), BootError> {
    let observability = provider.config().observability.clone();
    if observability.metrics_enabled {
        match observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    provider.init()?;
    provider.boot().await?;

    let signal = signals::trigger_on_signal(provider.shutdown().clone());
    let result = provider.wait().await;
    signal.abort();

    tracing::info!("Shutdown complete");
    result
}
