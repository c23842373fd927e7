use crate::config::{PropagationConfig, PropagatorKind};
use crate::datadog::DatadogPropagator;
use crate::error::{PropagatorError, Result};
use opentelemetry::global;
use opentelemetry::propagation::{TextMapCompositePropagator, TextMapPropagator};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use tracing::info;

pub fn build_propagator(config: &PropagationConfig) -> Result<TextMapCompositePropagator> {
    if config.propagators.is_empty() {
        return Err(PropagatorError::NoPropagators);
    }

    let propagators = config
        .propagators
        .iter()
        .map(|kind| -> Box<dyn TextMapPropagator + Send + Sync> {
            match kind {
                PropagatorKind::TraceContext => Box::new(TraceContextPropagator::new()),
                PropagatorKind::Datadog => Box::new(DatadogPropagator::new()),
            }
        })
        .collect();

    Ok(TextMapCompositePropagator::new(propagators))
}

/// Registers the configured propagators as the global text map propagator.
pub fn install(config: &PropagationConfig) -> Result<()> {
    let propagator = build_propagator(config)?;
    global::set_text_map_propagator(propagator);
    info!("Installed text map propagators: {:?}", config.propagators);
    Ok(())
}
