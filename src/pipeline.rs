//! Transcription pipeline orchestrator
//!
//! Drives a job through its lifecycle: Pending -> Processing -> Completed or
//! Failed. One run probes the recording's duration, picks a model tier,
//! splits the recording into chunks when it exceeds the configured ceiling,
//! transcribes each chunk in order while stitching segments onto the job's
//! global timeline, and persists the merged result. Temporary chunk files are
//! removed whether the run succeeds or fails.
//!
//! Each stage returns an explicit `Result`; the terminal-state decision is
//! made exactly once, at the outermost boundary of the run.

use log::{error, info, warn};

use crate::chunker::{self, ChunkDescriptor};
use crate::config::PipelineConfig;
use crate::engine::TranscriptionEngine;
use crate::error::PipelineError;
use crate::model_select::{select_model, ModelTier};
use crate::probe::probe_duration;
use crate::store::{JobStatus, TranscriptionSegment, TranscriptionStore};

/// Merged output of all chunks of one run
struct MergedTranscript {
    full_text: String,
    segments: Vec<TranscriptionSegment>,
}

/// Run the transcription pipeline for one job.
///
/// The job is left in a terminal state (`Completed` or `Failed`) in every
/// case except a store failure while marking it failed. The error is returned
/// to the caller for logging only; dispatch is asynchronous relative to the
/// upload response, so callers never surface it to the uploader.
pub async fn run_job(
    store: &TranscriptionStore,
    engine: &dyn TranscriptionEngine,
    config: &PipelineConfig,
    job_id: i64,
) -> Result<(), PipelineError> {
    // A missing record leaves nothing to mark failed
    let job = store.get_job(job_id).await?;

    match run_stages(store, engine, config, &job).await {
        Ok(()) => {
            info!("Job {} completed", job_id);
            Ok(())
        }
        Err(e) => {
            error!("Job {} failed: {}", job_id, e);
            if let Err(store_err) = store.set_status(job_id, JobStatus::Failed).await {
                error!("Job {} could not be marked failed: {}", job_id, store_err);
            }
            Err(e)
        }
    }
}

/// All fallible stages of one run, from the first status write through the
/// final persist. Chunk cleanup happens in here, on both paths, because only
/// this scope knows the descriptors.
async fn run_stages(
    store: &TranscriptionStore,
    engine: &dyn TranscriptionEngine,
    config: &PipelineConfig,
    job: &crate::store::TranscriptionJob,
) -> Result<(), PipelineError> {
    // Visible to status polling before any heavy work starts
    store.set_status(job.id, JobStatus::Processing).await?;
    info!("Job {} processing: {}", job.id, job.original_filename);

    // Duration is an optimization input; None is acceptable
    let duration = probe_duration(&config.ffprobe_cmd, &job.file_path);
    store.set_duration(job.id, duration).await?;

    let tier = select_model(
        duration,
        &config.thresholds,
        ModelTier::from_name(&config.default_model),
    );
    info!(
        "Job {} duration {:?}, selected model tier {}",
        job.id, duration, tier
    );

    let descriptors = chunker::split(config, &job.file_path, duration);

    let result = match transcribe_chunks(engine, &descriptors, &job.language, tier) {
        Ok(merged) => persist_result(store, job.id, merged).await,
        Err(e) => Err(e),
    };

    // Cleanup runs on both success and failure paths
    chunker::cleanup(&descriptors, &job.file_path);

    result
}

/// Transcribe every chunk in order and merge the results onto the job's
/// global timeline.
///
/// Chunks are strictly sequential: the running offset is a cumulative
/// accumulator with no parallel-merge step. A failed chunk aborts the
/// remaining sequence.
fn transcribe_chunks(
    engine: &dyn TranscriptionEngine,
    descriptors: &[ChunkDescriptor],
    language: &str,
    tier: ModelTier,
) -> Result<MergedTranscript, PipelineError> {
    let mut texts: Vec<String> = Vec::new();
    let mut segments: Vec<TranscriptionSegment> = Vec::new();
    let mut global_offset: f64 = 0.0;

    for descriptor in descriptors {
        let transcript = engine.transcribe(&descriptor.path, language, tier)?;

        let trimmed = transcript.text.trim();
        if !trimmed.is_empty() {
            texts.push(trimmed.to_string());
        }

        for raw in &transcript.segments {
            segments.push(TranscriptionSegment {
                start_time: raw.start + global_offset,
                end_time: raw.end + global_offset,
                text: raw.text.trim().to_string(),
                // Placeholder rotation, not diarization; no identity
                // continuity across chunks
                speaker: format!("Speaker_{}", raw.id.rem_euclid(5)),
                confidence: raw.no_speech_prob.unwrap_or(0.0),
            });
        }

        match descriptor.duration {
            Some(secs) => global_offset += secs,
            None => {
                // Known limitation: without this chunk's duration the offset
                // cannot advance, so later timestamps accumulate error
                warn!(
                    "Chunk {} has unknown duration; timestamps of subsequent \
                     chunks may drift",
                    descriptor.index
                );
            }
        }
    }

    Ok(MergedTranscript {
        full_text: texts.join(" "),
        segments,
    })
}

/// Persist the merged transcript as one batch and close the run
async fn persist_result(
    store: &TranscriptionStore,
    job_id: i64,
    merged: MergedTranscript,
) -> Result<(), PipelineError> {
    store.add_segments(job_id, merged.segments).await?;
    store.finish_job(job_id, merged.full_text).await?;
    Ok(())
}
