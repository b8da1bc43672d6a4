// In crates/api-client/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to build the bridge client: {0}")]
    ClientBuildError(String),
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(#[from] serde_json::Error),
    #[error("Bridge error: status {code}, msg: {msg}")]
    ApiError { code: u16, msg: String },
    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: &'static str, secs: u64 },
    #[error("Account {0} did not reach a deployed and connected state")]
    NotDeployed(String),
}

pub type Result<T> = std::result::Result<T, Error>;
