use thiserror::Error;

/// The closed set of failures every exchange call can report.
///
/// Transport-specific error types never escape this crate; they are flattened into
/// a message carried by one of these variants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response (DNS, refused connection, timeout).
    #[error("error during request: {0}")]
    Connection(String),

    /// A response arrived but its body could not be read in full.
    #[error("failed decoding response: {0}")]
    Decoding(String),

    /// The body was read but does not have the expected JSON shape.
    #[error("failed to unmarshal response: {0}")]
    Unmarshal(String),
}
