// In crates/core-types/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("Unknown program type '{0}', expected 'standard' or 'instant'")]
    UnknownProgramType(String),
}

pub type Result<T> = std::result::Result<T, Error>;
