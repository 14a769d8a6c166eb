//! Error types shared by the sampling pipeline and the result envelope handed
//! to callers.
//!
//! Every library error exposes a stable `code()` so the request layer can
//! report failures without matching on variants.

use std::{fmt, io};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONNECTION_FAILED: &str = "connection-failed";
pub const UNEXPECTED_ERROR: &str = "unexpected-error";
pub const READ_FAILED: &str = "read-failed";
pub const DECOMPRESSION_FAILED: &str = "decompression-failed";
pub const DECODING_FAILED: &str = "decoding-failed";
pub const TOKENIZE_FAILED: &str = "tokenize-failed";
pub const UNKNOWN_FILE_TYPE: &str = "unknown-file-type";

pub trait ErrorCode {
    fn code(&self) -> &'static str;
}

/// Failures raised while draining an object stream.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Failed to read object stream: {0}")]
    Io(#[source] io::Error),

    #[error("Failed to decompress gzip content: {0}")]
    Decompress(#[source] io::Error),

    #[error("Content is not valid UTF-8: {0}")]
    Decode(#[from] std::str::Utf8Error),
}

impl ErrorCode for StreamError {
    fn code(&self) -> &'static str {
        match self {
            StreamError::Io(_) => READ_FAILED,
            StreamError::Decompress(_) => DECOMPRESSION_FAILED,
            StreamError::Decode(_) => DECODING_FAILED,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{0}")]
    ConnectionFailed(String),

    #[error("{0}")]
    Unexpected(String),

    #[error(transparent)]
    Stream(#[from] StreamError),
}

impl ErrorCode for ProviderError {
    fn code(&self) -> &'static str {
        match self {
            ProviderError::ConnectionFailed(_) => CONNECTION_FAILED,
            ProviderError::Unexpected(_) => UNEXPECTED_ERROR,
            ProviderError::Stream(inner) => inner.code(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenizeError {
    #[error("Malformed delimited text: {0}")]
    Csv(#[from] csv::Error),
}

impl ErrorCode for TokenizeError {
    fn code(&self) -> &'static str {
        TOKENIZE_FAILED
    }
}

/// Failures of the end-to-end read, tokenize and profile pipeline.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Tokenize(#[from] TokenizeError),

    #[error("The file type of '{0}' is not supported.")]
    UnknownFileType(String),
}

impl ErrorCode for SampleError {
    fn code(&self) -> &'static str {
        match self {
            SampleError::Provider(inner) => inner.code(),
            SampleError::Tokenize(inner) => inner.code(),
            SampleError::UnknownFileType(_) => UNKNOWN_FILE_TYPE,
        }
    }
}

/// Uniform result envelope: `{status: "success", data}` or
/// `{status: "failure", code, message}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome<T> {
    Success { data: T },
    Failure { code: String, message: String },
}

impl<T> Outcome<T> {
    pub fn failure(code: &str, message: impl fmt::Display) -> Self {
        Outcome::Failure {
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T>
where
    E: ErrorCode + fmt::Display,
{
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Outcome::Success { data },
            Err(err) => Outcome::failure(err.code(), &err),
        }
    }
}
