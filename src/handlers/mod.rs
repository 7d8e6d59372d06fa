// Transcritor API HTTP handlers
//
// This module contains the HTTP handlers for the transcription service.
// It provides the interface between HTTP requests and the pipeline dispatcher.

pub mod authentication;
pub mod form;
pub mod routes;

// Re-export handlers for easier access
pub use self::routes::{
    list_transcriptions, mark_reviewed, transcription_result, transcription_segments,
    transcription_status, upload_transcription,
};
// Re-export authentication middleware
pub use self::authentication::Authentication;
