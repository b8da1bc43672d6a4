// In crates/engine/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The account could only be served from cache and nothing is cached.
    #[error("No cached metrics available for account {account_id}")]
    NoCachedData { account_id: String },

    #[error("Credential is not authorized for account {account_id}")]
    Forbidden { account_id: String },

    #[error("Invalid evaluation request: {0}")]
    InvalidRequest(String),

    #[error("Metrics store error: {0}")]
    Store(#[from] database::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
