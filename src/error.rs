// Error handling for Transcritor API
//
// This module defines error types and handling for the transcription service.
// It centralizes error definitions and provides helpful conversion traits.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use actix_web::{HttpResponse, ResponseError};

use crate::models::ErrorResponse;
use crate::store::StoreError;

/// Errors that abort a pipeline run
///
/// Probe and chunking failures are not represented here: both degrade to a
/// safe default instead of failing the run. Anything below marks the job
/// `Failed` after a single catch at the run's outermost boundary.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The speech-to-text engine failed on a chunk
    #[error("Engine error: {0}")]
    Engine(String),

    /// I/O error while reading or writing pipeline files
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Engine output could not be parsed
    #[error("Engine output error: {0}")]
    Output(#[from] serde_json::Error),

    /// Record store rejected a read or write
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors that can occur in the HTTP handlers
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Error when processing multipart form data
    #[error("Form error: {0}")]
    FormError(String),

    /// Error when saving file data
    #[error("File error: {0}")]
    FileError(#[from] io::Error),

    /// Error when no media file was provided
    #[error("No media file provided in the request")]
    NoMediaFile,

    /// Error with an unsupported file extension
    #[error("Unsupported file extension: {0}")]
    UnsupportedExtension(String),

    /// Error when a file is too large
    #[error("File too large: {0} bytes exceeds limit of {1} bytes")]
    FileTooLarge(usize, usize),

    /// Error when a job is not found
    #[error("Transcription not found: {0}")]
    JobNotFound(i64),

    /// Error when a job is not in a state that allows the requested action
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl HandlerError {
    /// Create a new FormError
    pub fn form_error<S: Into<String>>(msg: S) -> Self {
        Self::FormError(msg.into())
    }

    /// Helper to clean up an upload folder when an error occurs
    pub fn with_cleanup(self, folder: Option<&PathBuf>) -> Self {
        if let Some(folder) = folder {
            crate::file_utils::cleanup_folder(folder);
        }
        self
    }
}

impl ResponseError for HandlerError {
    fn error_response(&self) -> HttpResponse {
        let error_response = ErrorResponse {
            error: self.to_string(),
        };

        match self {
            HandlerError::NoMediaFile
            | HandlerError::UnsupportedExtension(_)
            | HandlerError::FormError(_)
            | HandlerError::InvalidState(_) => HttpResponse::BadRequest().json(error_response),
            HandlerError::JobNotFound(_) => HttpResponse::NotFound().json(error_response),
            HandlerError::FileTooLarge(_, _) => {
                HttpResponse::PayloadTooLarge().json(error_response)
            }
            _ => HttpResponse::InternalServerError().json(error_response),
        }
    }
}

/// Convert StoreError to HandlerError
impl From<StoreError> for HandlerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::JobNotFound(id) => HandlerError::JobNotFound(id),
            StoreError::InvalidTransition { .. } => HandlerError::InvalidState(err.to_string()),
        }
    }
}
