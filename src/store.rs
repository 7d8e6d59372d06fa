//! Record store for transcription jobs
//!
//! This module holds the persisted entities of the service: transcription jobs
//! and their time-aligned segments. State lives in process memory behind a
//! mutex; every write is visible to readers as soon as the lock is released,
//! so status polling observes partial progress while a pipeline run is still
//! going.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

/// Lifecycle states of a transcription job
///
/// A run moves a job from `Pending` to `Processing` exactly once, then ends
/// in exactly one of `Completed` or `Failed`. `Reviewed` is a terminal state
/// reached only from `Completed` through an editorial action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Reviewed,
}

impl JobStatus {
    /// Coarse progress heuristic reported to status polls, not a true percentage
    pub fn progress_estimate(&self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Processing => 50,
            JobStatus::Completed => 100,
            JobStatus::Failed => 0,
            JobStatus::Reviewed => 100,
        }
    }

    /// Whether moving from `self` to `next` is a legal lifecycle step
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
                | (JobStatus::Completed, JobStatus::Reviewed)
        )
    }
}

/// One end-to-end request to transcribe a single uploaded recording
#[derive(Debug, Clone)]
pub struct TranscriptionJob {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub original_filename: String,
    pub file_path: PathBuf,
    pub file_size: u64,
    pub language: String,
    pub status: JobStatus,
    /// Probed duration in seconds, None until (and unless) probing succeeds
    pub duration: Option<f64>,
    pub full_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Time-aligned slice of a job's transcript
///
/// Times are on the job's global timeline, never a chunk-local one.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptionSegment {
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
    pub speaker: String,
    pub confidence: f64,
}

/// Immutable inputs for a new job record
#[derive(Debug, Clone)]
pub struct NewJob {
    pub owner_id: i64,
    pub title: String,
    pub original_filename: String,
    pub file_path: PathBuf,
    pub file_size: u64,
    pub language: String,
}

/// Record store error types
#[derive(Error, Debug)]
pub enum StoreError {
    /// Job not found in the store
    #[error("Job not found: {0}")]
    JobNotFound(i64),
    /// Illegal status transition
    #[error("Invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition { from: JobStatus, to: JobStatus },
}

/// Internal state of the record store
struct StoreState {
    jobs: HashMap<i64, TranscriptionJob>,
    /// Segments keyed by parent job id; removed with their job (cascade)
    segments: HashMap<i64, Vec<TranscriptionSegment>>,
    next_id: i64,
}

/// In-process record store for jobs and segments
///
/// Cloning is cheap; all clones share the same state. Each job touches only
/// its own row and child segment rows, so concurrent runs on distinct jobs
/// never contend beyond the short lock hold of a single read or write.
#[derive(Clone)]
pub struct TranscriptionStore {
    state: Arc<Mutex<StoreState>>,
}

impl TranscriptionStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState {
                jobs: HashMap::new(),
                segments: HashMap::new(),
                next_id: 1,
            })),
        }
    }

    /// Create a new job record in `Pending` state
    pub async fn create_job(&self, new: NewJob) -> TranscriptionJob {
        let mut state = self.state.lock().await;
        let id = state.next_id;
        state.next_id += 1;

        let job = TranscriptionJob {
            id,
            owner_id: new.owner_id,
            title: new.title,
            original_filename: new.original_filename,
            file_path: new.file_path,
            file_size: new.file_size,
            language: new.language,
            status: JobStatus::Pending,
            duration: None,
            full_text: None,
            created_at: Utc::now(),
            updated_at: None,
            completed_at: None,
        };
        state.jobs.insert(id, job.clone());
        job
    }

    pub async fn get_job(&self, id: i64) -> Result<TranscriptionJob, StoreError> {
        let state = self.state.lock().await;
        state.jobs.get(&id).cloned().ok_or(StoreError::JobNotFound(id))
    }

    /// All jobs owned by a user, newest first
    pub async fn list_jobs(&self, owner_id: i64) -> Vec<TranscriptionJob> {
        let state = self.state.lock().await;
        let mut jobs: Vec<TranscriptionJob> = state
            .jobs
            .values()
            .filter(|j| j.owner_id == owner_id)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.id.cmp(&a.id));
        jobs
    }

    /// Move a job to a new status, enforcing the lifecycle rules
    pub async fn set_status(&self, id: i64, status: JobStatus) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let job = state.jobs.get_mut(&id).ok_or(StoreError::JobNotFound(id))?;
        if !job.status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                from: job.status,
                to: status,
            });
        }
        job.status = status;
        job.updated_at = Some(Utc::now());
        Ok(())
    }

    /// Record the probed duration; None is acceptable and stored as-is
    pub async fn set_duration(&self, id: i64, duration: Option<f64>) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let job = state.jobs.get_mut(&id).ok_or(StoreError::JobNotFound(id))?;
        job.duration = duration;
        job.updated_at = Some(Utc::now());
        Ok(())
    }

    /// Persist the final transcript and move the job to `Completed`
    pub async fn finish_job(&self, id: i64, full_text: String) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let job = state.jobs.get_mut(&id).ok_or(StoreError::JobNotFound(id))?;
        if !job.status.can_transition_to(JobStatus::Completed) {
            return Err(StoreError::InvalidTransition {
                from: job.status,
                to: JobStatus::Completed,
            });
        }
        job.full_text = Some(full_text);
        job.status = JobStatus::Completed;
        let now = Utc::now();
        job.completed_at = Some(now);
        job.updated_at = Some(now);
        Ok(())
    }

    /// Append a batch of segments for a job
    pub async fn add_segments(
        &self,
        id: i64,
        batch: Vec<TranscriptionSegment>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if !state.jobs.contains_key(&id) {
            return Err(StoreError::JobNotFound(id));
        }
        state.segments.entry(id).or_default().extend(batch);
        Ok(())
    }

    /// All segments of a job, ordered by start time ascending
    pub async fn segments_for_job(
        &self,
        id: i64,
    ) -> Result<Vec<TranscriptionSegment>, StoreError> {
        let state = self.state.lock().await;
        if !state.jobs.contains_key(&id) {
            return Err(StoreError::JobNotFound(id));
        }
        let mut segments = state.segments.get(&id).cloned().unwrap_or_default();
        segments.sort_by(|a, b| {
            a.start_time
                .partial_cmp(&b.start_time)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(segments)
    }

    pub async fn segment_count(&self, id: i64) -> usize {
        let state = self.state.lock().await;
        state.segments.get(&id).map(|s| s.len()).unwrap_or(0)
    }

    /// Editorial action: mark a completed transcript as reviewed
    pub async fn mark_reviewed(&self, id: i64) -> Result<TranscriptionJob, StoreError> {
        let mut state = self.state.lock().await;
        let job = state.jobs.get_mut(&id).ok_or(StoreError::JobNotFound(id))?;
        if !job.status.can_transition_to(JobStatus::Reviewed) {
            return Err(StoreError::InvalidTransition {
                from: job.status,
                to: JobStatus::Reviewed,
            });
        }
        job.status = JobStatus::Reviewed;
        job.updated_at = Some(Utc::now());
        Ok(job.clone())
    }

    /// Remove a job and all of its segments
    pub async fn delete_job(&self, id: i64) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.jobs.remove(&id).ok_or(StoreError::JobNotFound(id))?;
        state.segments.remove(&id);
        Ok(())
    }
}

impl Default for TranscriptionStore {
    fn default() -> Self {
        Self::new()
    }
}
