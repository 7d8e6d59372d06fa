// File utilities for Transcritor API
//
// This module contains utility functions for file operations used by the
// upload handlers. It handles creating unique per-upload folders, saving
// uploaded data, and cleaning up after errors.

use log::{error, info};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use uuid::Uuid;

use crate::config::JobPaths;

/// Allocate a unique folder and file path for an uploaded recording
///
/// Every upload gets its own UUID-named folder under `base_dir`, so two
/// concurrent jobs can never be handed the same source file path even when
/// the uploaded filenames collide.
///
/// # Errors
///
/// Returns an IO error if directory creation fails
pub fn generate_unique_job_paths(base_dir: &str, original_filename: &str) -> io::Result<JobPaths> {
    let id = Uuid::new_v4().to_string();

    let extension = Path::new(original_filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin");
    let filename = format!("recording_{}.{}", id, extension);

    let folder = Path::new(base_dir).join(&id);
    fs::create_dir_all(&folder)?;

    let media_file = folder.join(&filename);

    Ok(JobPaths {
        folder,
        media_file,
        id,
    })
}

/// Save uploaded file data to the filesystem
pub fn save_file_data(data: &[u8], file_path: &Path) -> io::Result<()> {
    let mut file = File::create(file_path)?;
    file.write_all(data)?;
    Ok(())
}

/// Clean up a folder and its contents
///
/// This function logs errors but doesn't return them to the caller
pub fn cleanup_folder(folder_path: &Path) {
    if let Err(e) = fs::remove_dir_all(folder_path) {
        error!("Failed to clean up folder {}: {}", folder_path.display(), e);
    } else {
        info!("Successfully cleaned up folder: {}", folder_path.display());
    }
}
