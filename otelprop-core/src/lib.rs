pub mod carrier;
pub mod config;
pub mod datadog;
pub mod error;
pub mod telemetry;

pub use carrier::{TextMapCarrier, UrlCarrier};
pub use config::{PropagationConfig, PropagatorKind};
pub use datadog::DatadogPropagator;
pub use error::{PropagatorError, Result};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global fmt subscriber. `RUST_LOG` wins when set; otherwise
/// this crate logs at debug (discarded extractions show up there) and
/// everything else at info.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,otelprop_core=debug"))
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
