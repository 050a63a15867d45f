use thiserror::Error;

/// Failures that stop the decoder for good.
///
/// Bad tokens inside turn frames are not errors; they are logged and decoded
/// as a sentinel. Only a preamble the turn grammar cannot be sized from ends
/// up here.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed metadata payload '{raw}': {source}")]
    Metadata {
        raw: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid player count {0}")]
    InvalidPlayerCount(i64),
    #[error("invalid map dimensions {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },
    #[error("map is {width}x{height} but metadata announced {expected_width}x{expected_height}")]
    DimensionMismatch {
        width: i64,
        height: i64,
        expected_width: i64,
        expected_height: i64,
    },
    #[error("decoder halted after a fatal preamble error")]
    Halted,
}
