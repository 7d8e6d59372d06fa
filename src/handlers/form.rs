// Form data processing for Transcritor API
//
// This module handles the extraction and processing of upload form data.
// It parses multipart forms and extracts the media file and its parameters.

use actix_multipart::Multipart;
use futures::{StreamExt, TryStreamExt};
use log::{error, info};

use crate::config::{HandlerConfig, JobPaths};
use crate::error::HandlerError;
use crate::file_utils::{generate_unique_job_paths, save_file_data};
use crate::models::UploadParams;

/// Extract and process multipart form data for upload requests
///
/// # Arguments
///
/// * `form` - The multipart form from the HTTP request
/// * `config` - Handler configuration
///
/// # Returns
///
/// * `Result<(UploadParams, JobPaths), HandlerError>` - Extracted parameters and upload paths, or an error
pub async fn extract_form_data(
    mut form: Multipart,
    config: &HandlerConfig,
) -> Result<(UploadParams, JobPaths), HandlerError> {
    let mut params = UploadParams::default();
    let mut job_paths: Option<JobPaths> = None;

    config.ensure_upload_dir().map_err(|e| {
        error!("Failed to create upload directory: {}", e);
        HandlerError::FileError(e)
    })?;

    while let Ok(Some(mut field)) = form.try_next().await {
        let content_disposition = field.content_disposition();
        let field_name = content_disposition
            .and_then(|cd| cd.get_name().map(|name| name.to_string()))
            .unwrap_or_default();

        match field_name.as_str() {
            "title" | "language" => {
                // Read text parameter
                let mut value = String::new();
                while let Some(chunk) = field.next().await {
                    let chunk = chunk.map_err(|e| {
                        HandlerError::form_error(format!(
                            "Error reading field {}: {}",
                            field_name, e
                        ))
                    })?;
                    if let Ok(s) = std::str::from_utf8(&chunk) {
                        value.push_str(s);
                    }
                }

                let value = value.trim().to_string();
                if !value.is_empty() {
                    match field_name.as_str() {
                        "title" => params.title = Some(value),
                        "language" => params.language = Some(value),
                        _ => {}
                    }
                }
            }
            "file" => {
                let original_filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename().map(|name| name.to_string()))
                    .ok_or(HandlerError::NoMediaFile)?;

                if !HandlerConfig::allowed_extension(&original_filename) {
                    return Err(HandlerError::UnsupportedExtension(original_filename));
                }

                // Unique folder per upload so concurrent jobs never share a
                // source file path
                let paths = generate_unique_job_paths(&config.upload_dir, &original_filename)
                    .map_err(|e| {
                        error!("Failed to create unique upload directory: {}", e);
                        HandlerError::FileError(e)
                    })?;

                job_paths = Some(paths.clone());
                params.original_filename = Some(original_filename);
                params.folder_path = Some(paths.folder.clone());
                params.media_file = Some(paths.media_file.clone());

                let mut total_size = 0;
                let mut file_data = Vec::new();

                while let Some(chunk) = field.next().await {
                    let data = chunk.map_err(|e| {
                        HandlerError::form_error(format!("Error processing file upload: {}", e))
                            .with_cleanup(Some(&paths.folder))
                    })?;

                    total_size += data.len();
                    if total_size > config.max_upload_size {
                        return Err(
                            HandlerError::FileTooLarge(total_size, config.max_upload_size)
                                .with_cleanup(Some(&paths.folder)),
                        );
                    }

                    file_data.extend_from_slice(&data);
                }

                save_file_data(&file_data, &paths.media_file)
                    .map_err(|e| HandlerError::FileError(e).with_cleanup(Some(&paths.folder)))?;
                params.file_size = total_size;

                info!("Saved media file: {}", paths.media_file.display());
            }
            _ => {
                // Skip unknown fields
                while field.next().await.is_some() {}
            }
        }
    }

    let job_paths = job_paths.ok_or(HandlerError::NoMediaFile)?;

    Ok((params, job_paths))
}
