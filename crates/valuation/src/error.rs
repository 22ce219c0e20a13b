use api_client::error::ApiError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValuationError {
    /// The initial account listing failed, so there is nothing to value.
    #[error("Account discovery failed: {0}")]
    Discovery(#[from] ApiError),
}
