//! Shared error types for the chaos monkey workspace

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SharedError {
    #[error("Unknown action: {input}")]
    UnknownAction { input: String },

    #[error("Invalid argument: {field} = {value}")]
    InvalidArgument { field: String, value: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
