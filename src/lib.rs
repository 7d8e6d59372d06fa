// Transcritor API Library
//
// This crate provides an HTTP API for transcribing recordings of legal
// proceedings. Uploaded media is probed for duration, split into bounded
// chunks when long, transcribed chunk by chunk with an adaptively selected
// whisper model, and persisted as a time-aligned transcript.

pub mod chunker;
pub mod config;
pub mod config_loader;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod file_utils;
pub mod handlers;
pub mod model_select;
pub mod models;
pub mod pipeline;
pub mod probe;
pub mod store;

// Re-export common types for easier access
pub use config::{HandlerConfig, PipelineConfig};
pub use dispatcher::{Dispatcher, JobQueue};
pub use engine::{TranscriptionEngine, WhisperEngine};
pub use error::{HandlerError, PipelineError};
pub use handlers::{
    list_transcriptions, mark_reviewed, transcription_result, transcription_segments,
    transcription_status, upload_transcription,
};
pub use model_select::ModelTier;
pub use models::{ErrorResponse, SuccessResponse};
pub use store::{JobStatus, TranscriptionJob, TranscriptionSegment, TranscriptionStore};
