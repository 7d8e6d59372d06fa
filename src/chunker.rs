//! Audio chunking for long recordings
//!
//! Recordings longer than the configured ceiling are cut into contiguous,
//! non-overlapping windows with ffmpeg so each slice stays within a bounded
//! inference time. Slices live in a dedicated subdirectory named after the
//! source file and are removed when the run ends, whatever its outcome.
//! A chunking failure never aborts a job: it degrades to processing the
//! original file unchunked.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::probe::probe_duration;

/// One bounded-duration slice of the source recording
#[derive(Debug, Clone)]
pub struct ChunkDescriptor {
    /// Path to the slice, or to the original file for the identity result
    pub path: PathBuf,
    /// Position of this slice in the source recording, starting at 0
    pub index: usize,
    /// This slice's own probed duration, used to advance the global offset
    pub duration: Option<f64>,
}

impl ChunkDescriptor {
    fn identity(path: &Path, duration: Option<f64>) -> Vec<ChunkDescriptor> {
        vec![ChunkDescriptor {
            path: path.to_path_buf(),
            index: 0,
            duration,
        }]
    }
}

/// Directory that will hold the slices of `source`, derived deterministically
/// from its base name. Distinct source paths yield distinct directories, which
/// is what keeps concurrent jobs from colliding.
fn chunk_dir(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("recording");
    source
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{}_chunks", stem))
}

/// Split a recording into bounded-length slices.
///
/// Returns the identity result (a single descriptor referencing the original
/// file, no copy) when the duration is unknown or already within the ceiling,
/// and also when slicing itself fails for any reason.
pub fn split(
    config: &PipelineConfig,
    source: &Path,
    probed_duration: Option<f64>,
) -> Vec<ChunkDescriptor> {
    let chunk_secs = (config.max_chunk_minutes * 60) as f64;

    let total = match probed_duration {
        Some(total) if total > chunk_secs => total,
        _ => return ChunkDescriptor::identity(source, probed_duration),
    };

    match split_into_windows(config, source, total, chunk_secs) {
        Ok(descriptors) => {
            info!(
                "Split {} ({:.0}s) into {} chunks of at most {:.0}s",
                source.display(),
                total,
                descriptors.len(),
                chunk_secs
            );
            descriptors
        }
        Err(e) => {
            warn!(
                "Chunking failed for {}, continuing unchunked: {}",
                source.display(),
                e
            );
            // Drop any partially written slices before falling back
            cleanup_dir(&chunk_dir(source));
            ChunkDescriptor::identity(source, probed_duration)
        }
    }
}

fn split_into_windows(
    config: &PipelineConfig,
    source: &Path,
    total: f64,
    chunk_secs: f64,
) -> std::io::Result<Vec<ChunkDescriptor>> {
    let dir = chunk_dir(source);
    fs::create_dir_all(&dir)?;

    let extension = source
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("wav");
    let count = (total / chunk_secs).ceil() as usize;

    let mut descriptors = Vec::with_capacity(count);
    for index in 0..count {
        let start = index as f64 * chunk_secs;
        let out_path = dir.join(format!("chunk_{:03}.{}", index, extension));

        // The final window may be shorter; ffmpeg stops at end of input
        let output = Command::new(&config.ffmpeg_cmd)
            .arg("-y")
            .arg("-v")
            .arg("error")
            .arg("-ss")
            .arg(format!("{}", start))
            .arg("-t")
            .arg(format!("{}", chunk_secs))
            .arg("-i")
            .arg(source)
            .arg("-c")
            .arg("copy")
            .arg(&out_path)
            .output()?;

        if !output.status.success() {
            return Err(std::io::Error::other(format!(
                "ffmpeg exited with {} on chunk {}: {}",
                output.status,
                index,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let duration = probe_duration(&config.ffprobe_cmd, &out_path);
        descriptors.push(ChunkDescriptor {
            path: out_path,
            index,
            duration,
        });
    }

    Ok(descriptors)
}

/// Remove every chunk file and the chunk directory for a finished run.
///
/// Best-effort and idempotent: removal errors are logged and swallowed so a
/// cleanup failure never masks the run's actual outcome. Descriptors whose
/// path is the original file (the identity result) are left untouched.
pub fn cleanup(descriptors: &[ChunkDescriptor], original: &Path) {
    for descriptor in descriptors {
        if descriptor.path == original {
            continue;
        }
        if let Err(e) = fs::remove_file(&descriptor.path) {
            if descriptor.path.exists() {
                warn!(
                    "Failed to remove chunk file {}: {}",
                    descriptor.path.display(),
                    e
                );
            }
        }
    }
    cleanup_dir(&chunk_dir(original));
}

fn cleanup_dir(dir: &Path) {
    if !dir.exists() {
        return;
    }
    if let Err(e) = fs::remove_dir_all(dir) {
        warn!("Failed to remove chunk directory {}: {}", dir.display(), e);
    } else {
        debug!("Removed chunk directory {}", dir.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            max_chunk_minutes: 20,
            ..PipelineConfig::default()
        }
    }

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("chunker_test_{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn identity_when_duration_unknown() {
        let config = test_config();
        let source = Path::new("/tmp/hearing.mp3");
        let descriptors = split(&config, source, None);
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].path, source);
        assert_eq!(descriptors[0].index, 0);
        assert!(descriptors[0].duration.is_none());
    }

    #[test]
    fn identity_when_within_ceiling() {
        let config = test_config();
        let source = Path::new("/tmp/hearing.mp3");

        // Exactly at the ceiling still goes unchunked
        let descriptors = split(&config, source, Some(1200.0));
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].path, source);
        assert_eq!(descriptors[0].duration, Some(1200.0));

        let descriptors = split(&config, source, Some(180.0));
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].path, source);
    }

    #[test]
    fn slicing_failure_degrades_to_identity() {
        let dir = scratch_dir();
        let source = dir.join("long_hearing.mp3");
        fs::write(&source, b"not really audio").unwrap();

        let config = PipelineConfig {
            ffmpeg_cmd: "/no/such/ffmpeg".to_string(),
            max_chunk_minutes: 20,
            ..PipelineConfig::default()
        };

        let descriptors = split(&config, &source, Some(2400.0));
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].path, source);
        // The half-created chunk directory is gone
        assert!(!chunk_dir(&source).exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn cleanup_removes_chunks_and_directory() {
        let dir = scratch_dir();
        let source = dir.join("hearing.mp3");
        fs::write(&source, b"original").unwrap();

        let chunks = chunk_dir(&source);
        fs::create_dir_all(&chunks).unwrap();
        let chunk_a = chunks.join("chunk_000.mp3");
        let chunk_b = chunks.join("chunk_001.mp3");
        fs::write(&chunk_a, b"a").unwrap();
        fs::write(&chunk_b, b"b").unwrap();

        let descriptors = vec![
            ChunkDescriptor {
                path: chunk_a.clone(),
                index: 0,
                duration: Some(1200.0),
            },
            ChunkDescriptor {
                path: chunk_b.clone(),
                index: 1,
                duration: Some(600.0),
            },
        ];

        cleanup(&descriptors, &source);
        assert!(!chunk_a.exists());
        assert!(!chunk_b.exists());
        assert!(!chunks.exists());
        // The original recording is never touched
        assert!(source.exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn cleanup_is_idempotent() {
        let dir = scratch_dir();
        let source = dir.join("hearing.mp3");
        fs::write(&source, b"original").unwrap();

        let descriptors = ChunkDescriptor::identity(&source, Some(60.0));
        cleanup(&descriptors, &source);
        cleanup(&descriptors, &source);
        assert!(source.exists());

        fs::remove_dir_all(&dir).unwrap();
    }
}
