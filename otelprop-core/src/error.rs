use std::num::ParseIntError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PropagatorError {
    #[error("invalid trace ID {value:?}: {source}")]
    InvalidTraceId {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("invalid span ID {value:?}: {source}")]
    InvalidSpanId {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("No propagators configured")]
    NoPropagators,
}

pub type Result<T> = std::result::Result<T, PropagatorError>;
