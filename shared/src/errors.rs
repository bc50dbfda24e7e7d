//! Shared error types for the variant generation engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Serialization failed: {message}")]
    SerializationError { message: String },

    #[error("Deserialization failed: {message}")]
    DeserializationError { message: String },

    #[error("Unknown generation mode: {input}")]
    UnknownMode { input: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
