// Transcritor API configuration
//
// This module contains configuration structures and constants for the transcription service.
// It centralizes all configuration parameters and provides defaults from environment variables.

use std::env;
use std::path::PathBuf;

/// Default values for configuration
pub mod defaults {
    // Directory where uploaded recordings are stored
    pub const UPLOAD_DIR: &str = "./uploads";

    // Default language for transcription
    pub const LANGUAGE: &str = "pt";

    // External tools invoked by the pipeline
    pub const FFPROBE_CMD: &str = "ffprobe";
    pub const FFMPEG_CMD: &str = "ffmpeg";
    pub const WHISPER_CMD: &str = "whisper";

    // Directory where the whisper command writes its JSON output
    pub const WHISPER_OUTPUT_DIR: &str = "./whisper_output";

    // Recordings longer than this are cut into bounded slices
    pub const MAX_CHUNK_MINUTES: u64 = 20;

    // Model selection thresholds, in seconds of probed duration
    pub const SMALL_THRESHOLD_SECS: f64 = 300.0;
    pub const MEDIUM_THRESHOLD_SECS: f64 = 900.0;
    pub const LARGE_THRESHOLD_SECS: f64 = 1800.0;
    pub const LARGEST_THRESHOLD_SECS: f64 = 3600.0;

    // Model tier used when the duration could not be probed
    pub const DEFAULT_MODEL: &str = "base";

    // Wall-clock ceiling for one queued job. Inference over long
    // recordings is itself slow, so this is hours, not seconds.
    pub const JOB_TIMEOUT_HOURS: u64 = 4;

    // Capacity of the job queue channel
    pub const QUEUE_CAPACITY: usize = 100;

    // Upload validation
    pub const MAX_UPLOAD_SIZE: usize = 104857600; // 100MB
    pub const ALLOWED_EXTENSIONS: [&str; 8] =
        ["mp3", "wav", "m4a", "ogg", "flac", "mp4", "avi", "mov"];
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Thresholds mapping probed duration to a model tier.
///
/// Each field is the lower bound (in seconds) at which the next larger
/// tier takes over. Tunable via environment so the latency/accuracy
/// trade-off can be adjusted without redeploying.
#[derive(Clone, Debug)]
pub struct ModelThresholds {
    pub small_secs: f64,
    pub medium_secs: f64,
    pub large_secs: f64,
    pub largest_secs: f64,
}

impl Default for ModelThresholds {
    fn default() -> Self {
        Self {
            small_secs: env_or("MODEL_SMALL_THRESHOLD_SECS", defaults::SMALL_THRESHOLD_SECS),
            medium_secs: env_or("MODEL_MEDIUM_THRESHOLD_SECS", defaults::MEDIUM_THRESHOLD_SECS),
            large_secs: env_or("MODEL_LARGE_THRESHOLD_SECS", defaults::LARGE_THRESHOLD_SECS),
            largest_secs: env_or(
                "MODEL_LARGEST_THRESHOLD_SECS",
                defaults::LARGEST_THRESHOLD_SECS,
            ),
        }
    }
}

/// Configuration for the transcription pipeline
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Path to the ffprobe command used for duration probing
    pub ffprobe_cmd: String,
    /// Path to the ffmpeg command used for slicing long recordings
    pub ffmpeg_cmd: String,
    /// Path to the whisper command
    pub whisper_cmd: String,
    /// Directory where the whisper command writes its output
    pub whisper_output_dir: String,
    /// Default transcription language
    pub language: String,
    /// Model tier used when the recording duration is unknown
    pub default_model: String,
    /// Recordings longer than this many minutes are chunked
    pub max_chunk_minutes: u64,
    /// Duration thresholds for model selection
    pub thresholds: ModelThresholds,
    /// Wall-clock ceiling in hours for one queued job
    pub job_timeout_hours: u64,
    /// Capacity of the job queue channel
    pub queue_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ffprobe_cmd: env::var("FFPROBE_CMD")
                .unwrap_or_else(|_| String::from(defaults::FFPROBE_CMD)),
            ffmpeg_cmd: env::var("FFMPEG_CMD")
                .unwrap_or_else(|_| String::from(defaults::FFMPEG_CMD)),
            whisper_cmd: env::var("WHISPER_CMD")
                .unwrap_or_else(|_| String::from(defaults::WHISPER_CMD)),
            whisper_output_dir: env::var("WHISPER_OUTPUT_DIR")
                .unwrap_or_else(|_| String::from(defaults::WHISPER_OUTPUT_DIR)),
            language: env::var("TRANSCRIPTION_LANGUAGE")
                .unwrap_or_else(|_| String::from(defaults::LANGUAGE)),
            default_model: env::var("DEFAULT_MODEL")
                .unwrap_or_else(|_| String::from(defaults::DEFAULT_MODEL)),
            max_chunk_minutes: env_or("MAX_CHUNK_MINUTES", defaults::MAX_CHUNK_MINUTES),
            thresholds: ModelThresholds::default(),
            job_timeout_hours: env_or("JOB_TIMEOUT_HOURS", defaults::JOB_TIMEOUT_HOURS),
            queue_capacity: env_or("QUEUE_CAPACITY", defaults::QUEUE_CAPACITY),
        }
    }
}

/// Configuration for the HTTP handlers
#[derive(Clone, Debug)]
pub struct HandlerConfig {
    /// Directory where uploaded recordings are stored
    pub upload_dir: String,
    /// Maximum accepted upload size in bytes
    pub max_upload_size: usize,
    /// Default transcription language for uploads that omit one
    pub language: String,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            upload_dir: env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| String::from(defaults::UPLOAD_DIR)),
            max_upload_size: env_or("MAX_UPLOAD_SIZE", defaults::MAX_UPLOAD_SIZE),
            language: env::var("TRANSCRIPTION_LANGUAGE")
                .unwrap_or_else(|_| String::from(defaults::LANGUAGE)),
        }
    }
}

impl HandlerConfig {
    /// Checks an uploaded filename against the extension whitelist
    pub fn allowed_extension(filename: &str) -> bool {
        std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let e = e.to_lowercase();
                defaults::ALLOWED_EXTENSIONS.contains(&e.as_str())
            })
            .unwrap_or(false)
    }

    /// Ensures the upload directory exists
    pub fn ensure_upload_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.upload_dir)
    }
}

/// Paths allocated for one uploaded recording
#[derive(Debug, Clone)]
pub struct JobPaths {
    /// Unique folder for this upload
    pub folder: PathBuf,
    /// Media file path inside the folder
    pub media_file: PathBuf,
    /// Upload ID (UUID), used for folder naming only
    pub id: String,
}
