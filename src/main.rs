use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::{info, warn};
use std::sync::Arc;

// Import our modules
mod chunker;
mod config;
mod config_loader;
mod dispatcher;
mod engine;
mod error;
mod file_utils;
mod handlers;
mod model_select;
mod models;
mod pipeline;
mod probe;
mod store;

// Import the types we need
use config::{HandlerConfig, PipelineConfig};
use dispatcher::{Dispatcher, JobQueue};
use engine::{TranscriptionEngine, WhisperEngine};
use handlers::{
    list_transcriptions, mark_reviewed, transcription_result, transcription_segments,
    transcription_status, upload_transcription, Authentication,
};
use store::TranscriptionStore;

const DEFAULT_API_HOST: &str = "127.0.0.1";
const DEFAULT_API_PORT: &str = "8181";
const DEFAULT_API_TIMEOUT: u64 = 480;
const DEFAULT_API_KEEPALIVE: u64 = 480;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    // Load configuration file values into the environment (env wins)
    config_loader::load_config();

    let handler_config = HandlerConfig::default();
    let pipeline_config = Arc::new(PipelineConfig::default());

    // Create the upload directory if it doesn't exist
    if let Err(e) = handler_config.ensure_upload_dir() {
        warn!(
            "Failed to create upload directory {}: {}",
            handler_config.upload_dir, e
        );
    }

    // Record store, engine, queue and dispatcher
    let store = TranscriptionStore::new();
    let engine: Arc<dyn TranscriptionEngine> =
        Arc::new(WhisperEngine::new((*pipeline_config).clone()));
    let queue = JobQueue::start(store.clone(), Arc::clone(&engine), Arc::clone(&pipeline_config));
    let dispatcher = Dispatcher::new(queue, store.clone(), engine, Arc::clone(&pipeline_config));

    // Server settings
    let host = std::env::var("TRANSCRITOR_API_HOST")
        .unwrap_or_else(|_| DEFAULT_API_HOST.to_string());
    let port = std::env::var("TRANSCRITOR_API_PORT")
        .unwrap_or_else(|_| DEFAULT_API_PORT.to_string());
    let timeout = std::time::Duration::from_secs(
        std::env::var("TRANSCRITOR_API_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_API_TIMEOUT),
    );
    let keep_alive = std::time::Duration::from_secs(
        std::env::var("TRANSCRITOR_API_KEEPALIVE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_API_KEEPALIVE),
    );
    let workers = std::env::var("HTTP_WORKER_NUMBER")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(num_cpus::get);

    info!("Starting Transcritor API server on http://{}:{}", host, port);
    info!("Using upload directory: {}", handler_config.upload_dir);
    info!("Whisper command: {}", pipeline_config.whisper_cmd);
    info!(
        "Chunk ceiling: {} minutes, default model: {}",
        pipeline_config.max_chunk_minutes, pipeline_config.default_model
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Authentication)
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(dispatcher.clone()))
            .app_data(web::Data::new(handler_config.clone()))
            .service(upload_transcription)
            .service(list_transcriptions)
            .service(transcription_status)
            .service(transcription_segments)
            .service(transcription_result)
            .service(mark_reviewed)
    })
    .bind(format!("{}:{}", host, port))?
    .client_disconnect_timeout(timeout)
    .keep_alive(keep_alive)
    .workers(workers)
    .run()
    .await
}
