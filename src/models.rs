// Transcritor API data models
//
// This module contains the data models used for the HTTP surface of the
// transcription service: request parameters and response types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

use crate::store::{JobStatus, TranscriptionJob, TranscriptionSegment};

/// Parameters extracted from an upload request
#[derive(Debug, Default)]
pub struct UploadParams {
    /// Hearing title; defaults to the original filename when omitted
    pub title: Option<String>,
    /// Transcription language (e.g., "pt", "en")
    pub language: Option<String>,
    /// Original filename as sent by the client
    pub original_filename: Option<String>,
    /// Path to the stored media file
    pub media_file: Option<PathBuf>,
    /// Path to the folder containing the upload
    pub folder_path: Option<PathBuf>,
    /// Size of the stored file in bytes
    pub file_size: usize,
}

/// Status snapshot of a transcription job
#[derive(Serialize)]
pub struct JobSnapshot {
    pub id: i64,
    pub title: String,
    pub original_filename: String,
    pub status: JobStatus,
    /// Coarse fixed heuristic, not a true percentage
    pub progress: u8,
    pub language: String,
    pub duration: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub has_segments: bool,
    pub segment_count: usize,
}

impl JobSnapshot {
    pub fn from_job(job: TranscriptionJob, segment_count: usize) -> Self {
        Self {
            id: job.id,
            title: job.title,
            original_filename: job.original_filename,
            status: job.status,
            progress: job.status.progress_estimate(),
            language: job.language,
            duration: job.duration,
            created_at: job.created_at,
            updated_at: job.updated_at,
            completed_at: job.completed_at,
            has_segments: segment_count > 0,
            segment_count,
        }
    }
}

/// Full transcript of a completed job
#[derive(Serialize)]
pub struct TranscriptResponse {
    pub id: i64,
    pub status: JobStatus,
    pub full_text: Option<String>,
    pub segments: Vec<TranscriptionSegment>,
}

/// Error response for API
#[derive(Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Success response for API
#[derive(Serialize)]
pub struct SuccessResponse {
    /// Success flag
    pub success: bool,
    /// Message describing the successful operation
    pub message: String,
}
