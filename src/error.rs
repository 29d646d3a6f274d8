use thiserror::Error;

use crate::models::DataFormat;

/// Reasons a payload or packet produced no value.
///
/// None of these are fatal: a decode path that fails returns one of these
/// (or `None`) and the caller decides whether to log it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A chunk declared more bytes than the payload still holds. The beacon
    /// was heard, but the capture was truncated.
    #[error("chunk declares {declared} bytes but only {available} remain")]
    ShortData { declared: usize, available: usize },

    /// The payload has no manufacturer, service data or name chunk.
    #[error("no candidate chunk in advertisement")]
    NoChunk,

    /// A chunk was found but its prefix matches no known data format.
    #[error("unrecognized data format")]
    UnrecognizedFormat,

    /// The data format was recognized but the decoder rejected the bytes.
    #[error("invalid data format {0} payload")]
    InvalidPayload(DataFormat),

    /// A history record had the wrong length, marker or format byte.
    #[error("malformed history record: {0}")]
    MalformedRecord(&'static str),

    #[error("payload is not valid hex")]
    InvalidHex,
}
