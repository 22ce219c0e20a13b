use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A derived figure fell outside the range a `Decimal` can hold.
    #[error("Calculation error: {0} overflowed")]
    Overflow(&'static str),
}
