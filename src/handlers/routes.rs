// API route handlers for Transcritor API
//
// This module contains the route handlers for the transcription service.
// It implements the actual HTTP endpoints for the API.

use crate::config::HandlerConfig;
use crate::dispatcher::Dispatcher;
use crate::error::HandlerError;
use crate::handlers::form::extract_form_data;
use crate::models::{JobSnapshot, SuccessResponse, TranscriptResponse};
use crate::store::{NewJob, TranscriptionStore};
use actix_multipart::Multipart;
use actix_web::{get, post, put, web, HttpResponse};
use log::info;

// Single-tenant placeholder until request identity is wired through the
// authentication layer
const DEFAULT_OWNER_ID: i64 = 1;

/// Handler for upload requests
///
/// This endpoint receives a media file plus optional title and language,
/// creates a pending transcription record, and dispatches the pipeline.
/// The response never waits on the pipeline: progress is observed through
/// status polling.
#[post("/transcriptions")]
pub async fn upload_transcription(
    form: Multipart,
    store: web::Data<TranscriptionStore>,
    dispatcher: web::Data<Dispatcher>,
    config: web::Data<HandlerConfig>,
) -> Result<HttpResponse, HandlerError> {
    let (params, job_paths) = extract_form_data(form, &config).await?;

    let original_filename = params.original_filename.unwrap_or_default();
    let media_file = params
        .media_file
        .ok_or(HandlerError::NoMediaFile)
        .map_err(|e| e.with_cleanup(Some(&job_paths.folder)))?;

    let job = store
        .create_job(NewJob {
            owner_id: DEFAULT_OWNER_ID,
            title: params.title.unwrap_or_else(|| original_filename.clone()),
            original_filename,
            file_path: media_file,
            file_size: params.file_size as u64,
            language: params.language.unwrap_or_else(|| config.language.clone()),
        })
        .await;

    info!("Job {} created for upload {}", job.id, job_paths.id);
    dispatcher.submit(job.id);

    Ok(HttpResponse::Created().json(JobSnapshot::from_job(job, 0)))
}

/// Handler for listing a user's transcriptions, newest first
#[get("/transcriptions")]
pub async fn list_transcriptions(
    store: web::Data<TranscriptionStore>,
) -> Result<HttpResponse, HandlerError> {
    let jobs = store.list_jobs(DEFAULT_OWNER_ID).await;

    let mut snapshots = Vec::with_capacity(jobs.len());
    for job in jobs {
        let count = store.segment_count(job.id).await;
        snapshots.push(JobSnapshot::from_job(job, count));
    }

    Ok(HttpResponse::Ok().json(snapshots))
}

/// Handler for transcription status requests
///
/// Status snapshots observed here always reflect a state persisted by a
/// prior pipeline step; a poller never sees Completed or Failed without the
/// run having gone through Processing first.
#[get("/transcriptions/{job_id}")]
pub async fn transcription_status(
    job_id: web::Path<i64>,
    store: web::Data<TranscriptionStore>,
) -> Result<HttpResponse, HandlerError> {
    let job_id = job_id.into_inner();

    let job = store.get_job(job_id).await?;
    let count = store.segment_count(job_id).await;

    Ok(HttpResponse::Ok().json(JobSnapshot::from_job(job, count)))
}

/// Handler for the segment listing of a job, ordered by start time
#[get("/transcriptions/{job_id}/segments")]
pub async fn transcription_segments(
    job_id: web::Path<i64>,
    store: web::Data<TranscriptionStore>,
) -> Result<HttpResponse, HandlerError> {
    let job_id = job_id.into_inner();
    let segments = store.segments_for_job(job_id).await?;
    Ok(HttpResponse::Ok().json(segments))
}

/// Handler for the full transcript of a job
#[get("/transcriptions/{job_id}/result")]
pub async fn transcription_result(
    job_id: web::Path<i64>,
    store: web::Data<TranscriptionStore>,
) -> Result<HttpResponse, HandlerError> {
    let job_id = job_id.into_inner();

    let job = store.get_job(job_id).await?;
    let segments = store.segments_for_job(job_id).await?;

    Ok(HttpResponse::Ok().json(TranscriptResponse {
        id: job.id,
        status: job.status,
        full_text: job.full_text,
        segments,
    }))
}

/// Handler for the editorial review action
///
/// Marks a completed transcript as reviewed. Rejected for jobs in any other
/// state.
#[put("/transcriptions/{job_id}/review")]
pub async fn mark_reviewed(
    job_id: web::Path<i64>,
    store: web::Data<TranscriptionStore>,
) -> Result<HttpResponse, HandlerError> {
    let job_id = job_id.into_inner();

    store.mark_reviewed(job_id).await?;
    info!("Job {} marked as reviewed", job_id);

    Ok(HttpResponse::Ok().json(SuccessResponse {
        success: true,
        message: "Transcription marked as reviewed".to_string(),
    }))
}
