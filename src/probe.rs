// Media duration probing
//
// Wraps the external ffprobe tool to report a recording's duration. Duration
// is an optimization input for model selection and chunking, not a
// correctness requirement, so every failure path here collapses to "unknown"
// instead of an error.

use std::path::Path;
use std::process::Command;

use log::{debug, warn};
use serde_json::Value;

/// Probe a media file's duration in seconds.
///
/// Returns `None` when the tool is missing, the file is unreadable or the
/// output cannot be parsed. The caller is expected to continue without a
/// duration.
pub fn probe_duration(ffprobe_cmd: &str, path: &Path) -> Option<f64> {
    let output = match Command::new(ffprobe_cmd)
        .arg("-v")
        .arg("error")
        .arg("-show_entries")
        .arg("format=duration:stream=codec_type,duration")
        .arg("-of")
        .arg("json")
        .arg(path)
        .output()
    {
        Ok(output) => output,
        Err(e) => {
            warn!("ffprobe failed to run for {}: {}", path.display(), e);
            return None;
        }
    };

    if !output.status.success() {
        warn!(
            "ffprobe returned non-zero status for {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return None;
    }

    let parsed: Value = match serde_json::from_slice(&output.stdout) {
        Ok(v) => v,
        Err(e) => {
            warn!("ffprobe output was not valid JSON for {}: {}", path.display(), e);
            return None;
        }
    };

    let duration = duration_from_probe(&parsed);
    match duration {
        Some(secs) => debug!("Probed {}: {:.2}s", path.display(), secs),
        None => warn!("ffprobe reported no duration for {}", path.display()),
    }
    duration
}

/// Extract a duration from parsed ffprobe JSON.
///
/// Prefers an audio or video stream's own duration, falling back to the
/// container-level one.
fn duration_from_probe(probe: &Value) -> Option<f64> {
    if let Some(streams) = probe.get("streams").and_then(|s| s.as_array()) {
        for stream in streams {
            let codec_type = stream.get("codec_type").and_then(|c| c.as_str());
            if matches!(codec_type, Some("audio") | Some("video")) {
                if let Some(secs) = parse_duration_field(stream.get("duration")) {
                    return Some(secs);
                }
            }
        }
    }
    parse_duration_field(probe.get("format").and_then(|f| f.get("duration")))
}

// ffprobe emits durations as JSON strings ("1234.56")
fn parse_duration_field(field: Option<&Value>) -> Option<f64> {
    field
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prefers_stream_duration() {
        let probe = json!({
            "streams": [
                {"codec_type": "audio", "duration": "182.5"},
            ],
            "format": {"duration": "190.0"}
        });
        assert_eq!(duration_from_probe(&probe), Some(182.5));
    }

    #[test]
    fn skips_streams_without_duration() {
        let probe = json!({
            "streams": [
                {"codec_type": "video"},
                {"codec_type": "audio", "duration": "60.0"},
            ],
            "format": {"duration": "61.0"}
        });
        assert_eq!(duration_from_probe(&probe), Some(60.0));
    }

    #[test]
    fn falls_back_to_format_duration() {
        let probe = json!({
            "streams": [{"codec_type": "data"}],
            "format": {"duration": "42.0"}
        });
        assert_eq!(duration_from_probe(&probe), Some(42.0));
    }

    #[test]
    fn unknown_when_nothing_reported() {
        assert_eq!(duration_from_probe(&json!({})), None);
        assert_eq!(
            duration_from_probe(&json!({"format": {"duration": "garbage"}})),
            None
        );
    }

    #[test]
    fn missing_tool_reports_unknown() {
        let path = Path::new("/nonexistent/recording.mp3");
        assert_eq!(probe_duration("/no/such/ffprobe", path), None);
    }
}
