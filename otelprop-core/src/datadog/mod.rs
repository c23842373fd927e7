//! Datadog APM header propagation.
//!
//! Reads and writes `x-datadog-trace-id`, `x-datadog-parent-id` and
//! `x-datadog-sampling-priority` through any opentelemetry carrier.

pub mod id;

pub use id::{decode_from_vendor, to_datadog_id, to_opentelemetry_id, IdKind};

use crate::error::{PropagatorError, Result};
use once_cell::sync::Lazy;
use opentelemetry::{
    propagation::{text_map_propagator::FieldIter, Extractor, Injector, TextMapPropagator},
    trace::{SpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState},
    Context,
};
use tracing::debug;

pub const TRACE_ID_HEADER: &str = "x-datadog-trace-id";
pub const PARENT_ID_HEADER: &str = "x-datadog-parent-id";
pub const SAMPLING_PRIORITY_HEADER: &str = "x-datadog-sampling-priority";

const SAMPLING_NO: &str = "0";
const SAMPLING_YES: &str = "1";

static DATADOG_FIELDS: Lazy<[String; 3]> = Lazy::new(|| {
    [
        TRACE_ID_HEADER.to_string(),
        PARENT_ID_HEADER.to_string(),
        SAMPLING_PRIORITY_HEADER.to_string(),
    ]
});

#[derive(Debug, Default, Clone, Copy)]
pub struct DatadogPropagator;

impl DatadogPropagator {
    pub fn new() -> Self {
        Self
    }
}

impl TextMapPropagator for DatadogPropagator {
    fn inject_context(&self, cx: &Context, injector: &mut dyn Injector) {
        let span = cx.span();
        let span_context = span.span_context();
        let trace_id = span_context.trace_id();
        let span_id = span_context.span_id();
        if trace_id == TraceId::INVALID || span_id == SpanId::INVALID {
            return;
        }

        let priority = if span_context.is_sampled() {
            SAMPLING_YES
        } else {
            SAMPLING_NO
        };
        injector.set(SAMPLING_PRIORITY_HEADER, priority.to_string());
        injector.set(TRACE_ID_HEADER, to_datadog_id(&trace_id.to_string()));
        injector.set(PARENT_ID_HEADER, to_datadog_id(&span_id.to_string()));
    }

    fn extract_with_context(&self, cx: &Context, extractor: &dyn Extractor) -> Context {
        let span_context = match extract_span_context(
            extractor.get(TRACE_ID_HEADER).unwrap_or_default(),
            extractor.get(PARENT_ID_HEADER).unwrap_or_default(),
            extractor.get(SAMPLING_PRIORITY_HEADER).unwrap_or_default(),
        ) {
            Ok(span_context) => span_context,
            Err(e) => {
                debug!("Ignoring Datadog headers: {}", e);
                return cx.clone();
            }
        };

        if !span_context.is_valid() {
            debug!("Ignoring Datadog headers: zero trace or span ID");
            return cx.clone();
        }

        cx.with_remote_span_context(span_context)
    }

    fn fields(&self) -> FieldIter<'_> {
        FieldIter::new(&*DATADOG_FIELDS)
    }
}

fn extract_span_context(trace_id: &str, span_id: &str, priority: &str) -> Result<SpanContext> {
    let trace_hex = decode_from_vendor(trace_id, IdKind::Trace)?;
    let trace_id = TraceId::from_hex(&trace_hex).map_err(|source| {
        PropagatorError::InvalidTraceId {
            value: trace_hex,
            source,
        }
    })?;

    let span_hex = decode_from_vendor(span_id, IdKind::Span)?;
    let span_id = SpanId::from_hex(&span_hex).map_err(|source| PropagatorError::InvalidSpanId {
        value: span_hex,
        source,
    })?;

    let flags = TraceFlags::default().with_sampled(priority == SAMPLING_YES);

    Ok(SpanContext::new(trace_id, span_id, flags, true, TraceState::default()))
}
