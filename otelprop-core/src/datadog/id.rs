//! Conversion between OpenTelemetry hex identifiers and Datadog decimal identifiers.
//!
//! Datadog carries trace and span IDs as unsigned 64-bit decimals. A 128-bit
//! OpenTelemetry trace ID is reduced to its low 64 bits on the way out, so the
//! high half does not survive a round trip.

use crate::error::{PropagatorError, Result};
use std::num::ParseIntError;

/// Width of a Datadog ID in hex digits.
const DATADOG_ID_HEX_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Trace,
    Span,
}

impl IdKind {
    /// Hex width of the OpenTelemetry rendering.
    pub fn hex_width(self) -> usize {
        match self {
            Self::Trace => 32,
            Self::Span => 16,
        }
    }
}

/// Converts a hex OpenTelemetry ID to a Datadog decimal ID.
///
/// Returns an empty string when the input is shorter than 16 characters or is
/// not hex. Inputs longer than 16 characters contribute only their trailing 16.
pub fn to_datadog_id(otel_id: &str) -> String {
    if otel_id.len() < DATADOG_ID_HEX_LEN {
        return String::new();
    }

    let low_bits = match otel_id.get(otel_id.len() - DATADOG_ID_HEX_LEN..) {
        Some(low_bits) => low_bits,
        None => return String::new(),
    };

    match parse_u64(low_bits, 16) {
        Ok(value) => value.to_string(),
        Err(_) => String::new(),
    }
}

/// Converts a Datadog decimal ID to unpadded lowercase hex.
pub fn to_opentelemetry_id(dd_id: &str) -> std::result::Result<String, ParseIntError> {
    parse_u64(dd_id, 10).map(|value| format!("{:x}", value))
}

/// Converts a Datadog decimal ID to hex left-padded with zeros to the width of `kind`.
pub fn decode_from_vendor(dd_id: &str, kind: IdKind) -> Result<String> {
    let hex = to_opentelemetry_id(dd_id).map_err(|source| match kind {
        IdKind::Trace => PropagatorError::InvalidTraceId {
            value: dd_id.to_string(),
            source,
        },
        IdKind::Span => PropagatorError::InvalidSpanId {
            value: dd_id.to_string(),
            source,
        },
    })?;

    Ok(format!("{:0>width$}", hex, width = kind.hex_width()))
}

fn parse_u64(digits: &str, radix: u32) -> std::result::Result<u64, ParseIntError> {
    // from_str_radix accepts a leading '+', the wire format does not
    if digits.starts_with('+') {
        return u64::from_str_radix("+", radix);
    }
    u64::from_str_radix(digits, radix)
}
