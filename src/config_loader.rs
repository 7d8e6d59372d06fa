// Configuration file loader for the Transcritor API
//
// The service reads all of its settings from environment variables. This
// module lets a deployment keep them in a flat TOML file instead: every
// recognized key found in the file is exported as an env var, unless the
// variable is already set. Precedence is therefore env var, then file,
// then the application defaults in `config::defaults`.

use std::env;
use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use toml::Value;

const CONFIG_FILE_PATH: &str = "transcritor_api.conf";

/// Settings the service actually reads. A key in the file that is not
/// listed here is almost certainly a typo, so it is skipped with a warning
/// instead of silently polluting the environment.
const SUPPORTED_KEYS: &[&str] = &[
    // Storage and media tooling
    "UPLOAD_DIR",
    "FFPROBE_CMD",
    "FFMPEG_CMD",
    "WHISPER_CMD",
    "WHISPER_OUTPUT_DIR",
    // Transcription behavior
    "TRANSCRIPTION_LANGUAGE",
    "DEFAULT_MODEL",
    "MAX_CHUNK_MINUTES",
    "MODEL_SMALL_THRESHOLD_SECS",
    "MODEL_MEDIUM_THRESHOLD_SECS",
    "MODEL_LARGE_THRESHOLD_SECS",
    "MODEL_LARGEST_THRESHOLD_SECS",
    // Queue and limits
    "JOB_TIMEOUT_HOURS",
    "QUEUE_CAPACITY",
    "MAX_UPLOAD_SIZE",
    // HTTP server
    "ENABLE_AUTHORIZATION",
    "TRANSCRITOR_API_TOKEN",
    "TRANSCRITOR_API_HOST",
    "TRANSCRITOR_API_PORT",
    "TRANSCRITOR_API_TIMEOUT",
    "TRANSCRITOR_API_KEEPALIVE",
    "HTTP_WORKER_NUMBER",
];

/// Loads `transcritor_api.conf` from the working directory, if present.
///
/// Returns true if the file was found and parsed.
pub fn load_config() -> bool {
    load_config_from(Path::new(CONFIG_FILE_PATH))
}

fn load_config_from(config_path: &Path) -> bool {
    if !config_path.exists() {
        debug!("Configuration file not found at: {}", config_path.display());
        return false;
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read configuration file: {}", e);
            return false;
        }
    };

    let config_values: Value = match config_content.parse() {
        Ok(values) => values,
        Err(e) => {
            warn!("Failed to parse configuration file: {}", e);
            return false;
        }
    };

    // The file is flat: one recognized key per line, scalar values only
    if let Value::Table(table) = config_values {
        for (key, value) in table {
            if !SUPPORTED_KEYS.contains(&key.as_str()) {
                warn!("Skipping unrecognized configuration key: {}", key);
                continue;
            }
            let value = match value {
                Value::String(s) => s,
                Value::Integer(i) => i.to_string(),
                Value::Float(f) => f.to_string(),
                Value::Boolean(b) => b.to_string(),
                _ => {
                    warn!("Skipping unsupported TOML value type for key: {}", key);
                    continue;
                }
            };
            if env::var(&key).is_err() {
                debug!("Setting env var from config file: {} = {}", key, value);
                env::set_var(key, value);
            } else {
                debug!("Env var already exists, skipping: {}", key);
            }
        }
    }

    info!("Configuration loaded from {}", config_path.display());
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn temp_conf(content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("transcritor_conf_{}.toml", Uuid::new_v4()));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn recognized_keys_are_exported_and_unknown_ones_skipped() {
        env::remove_var("JOB_TIMEOUT_HOURS");
        env::remove_var("THIS_KEY_DOES_NOT_EXIST");

        let path = temp_conf("JOB_TIMEOUT_HOURS = 6\nTHIS_KEY_DOES_NOT_EXIST = \"x\"\n");
        assert!(load_config_from(&path));

        assert_eq!(env::var("JOB_TIMEOUT_HOURS").unwrap(), "6");
        assert!(env::var("THIS_KEY_DOES_NOT_EXIST").is_err());

        env::remove_var("JOB_TIMEOUT_HOURS");
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn existing_env_var_wins_over_file_value() {
        env::set_var("QUEUE_CAPACITY", "77");

        let path = temp_conf("QUEUE_CAPACITY = 12\n");
        assert!(load_config_from(&path));

        assert_eq!(env::var("QUEUE_CAPACITY").unwrap(), "77");

        env::remove_var("QUEUE_CAPACITY");
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_or_malformed_file_reports_not_loaded() {
        assert!(!load_config_from(Path::new("/nonexistent/transcritor_api.conf")));

        let path = temp_conf("not really toml ===");
        assert!(!load_config_from(&path));
        fs::remove_file(path).unwrap();
    }
}
