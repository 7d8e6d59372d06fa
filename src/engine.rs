//! Speech-to-text engine adapter
//!
//! The engine is an opaque external call: one chunk in, raw text plus timed
//! segments out. The production implementation shells out to the whisper CLI
//! and parses its JSON output file. There is no per-chunk retry here. A
//! failed chunk fails the whole job, because a partial transcript without
//! clear provenance is unsafe to present as a result.

use std::fs;
use std::path::Path;
use std::process::Command;

use log::debug;
use serde::Deserialize;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::model_select::ModelTier;

/// One timed segment as reported by the engine, on the chunk's local timeline
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawSegment {
    #[serde(default)]
    pub id: i64,
    pub start: f64,
    pub end: f64,
    pub text: String,
    /// Probability that the segment contains no speech; absent on some models
    #[serde(default)]
    pub no_speech_prob: Option<f64>,
}

/// Full engine output for one chunk
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkTranscript {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub segments: Vec<RawSegment>,
}

/// Interface to the external speech-to-text engine
pub trait TranscriptionEngine: Send + Sync {
    fn transcribe(
        &self,
        path: &Path,
        language: &str,
        tier: ModelTier,
    ) -> Result<ChunkTranscript, PipelineError>;
}

/// Engine adapter invoking the whisper CLI
pub struct WhisperEngine {
    config: PipelineConfig,
}

impl WhisperEngine {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }
}

impl WhisperEngine {
    fn run_whisper(
        &self,
        path: &Path,
        language: &str,
        tier: ModelTier,
        run_dir: &Path,
    ) -> Result<ChunkTranscript, PipelineError> {
        debug!(
            "Transcribing {} with model {} ({})",
            path.display(),
            tier,
            language
        );

        let output = Command::new(&self.config.whisper_cmd)
            .arg(path)
            .arg("--model")
            .arg(tier.as_str())
            .arg("--language")
            .arg(language)
            .arg("--output_dir")
            .arg(run_dir)
            .arg("--output_format")
            .arg("json")
            .output()
            .map_err(|e| PipelineError::Engine(format!("Failed to run command: {}", e)))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(PipelineError::Engine(error));
        }

        // Whisper names the output file after the input audio filename
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("audio");
        let output_path = run_dir.join(format!("{}.json", stem));

        let content = fs::read_to_string(&output_path).map_err(|e| {
            PipelineError::Engine(format!(
                "Failed to read output file {}: {}",
                output_path.display(),
                e
            ))
        })?;

        let transcript: ChunkTranscript = serde_json::from_str(&content)?;
        Ok(transcript)
    }
}

impl TranscriptionEngine for WhisperEngine {
    fn transcribe(
        &self,
        path: &Path,
        language: &str,
        tier: ModelTier,
    ) -> Result<ChunkTranscript, PipelineError> {
        // Every invocation gets its own output directory. Chunk stems repeat
        // across jobs (chunk_000 and so on), so a shared directory would let
        // one concurrent run overwrite or delete another's pending transcript.
        let run_dir =
            Path::new(&self.config.whisper_output_dir).join(Uuid::new_v4().to_string());
        fs::create_dir_all(&run_dir)?;

        let result = self.run_whisper(path, language, tier, &run_dir);

        // The directory has served its purpose whatever the outcome
        let _ = fs::remove_dir_all(&run_dir);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whisper_json_output() {
        let json = r#"{
            "text": " Está aberta a audiência.",
            "segments": [
                {"id": 0, "start": 0.0, "end": 3.2, "text": " Está aberta", "no_speech_prob": 0.02},
                {"id": 1, "start": 3.2, "end": 5.0, "text": " a audiência."}
            ],
            "language": "pt"
        }"#;

        let transcript: ChunkTranscript = serde_json::from_str(json).unwrap();
        assert_eq!(transcript.text, " Está aberta a audiência.");
        assert_eq!(transcript.segments.len(), 2);
        assert_eq!(transcript.segments[0].no_speech_prob, Some(0.02));
        // Missing no_speech_prob deserializes as None, not an error
        assert_eq!(transcript.segments[1].no_speech_prob, None);
        assert_eq!(transcript.segments[1].id, 1);
    }

    #[test]
    fn tolerates_segmentless_output() {
        let transcript: ChunkTranscript = serde_json::from_str(r#"{"text": "curto"}"#).unwrap();
        assert!(transcript.segments.is_empty());
    }

    #[test]
    fn missing_command_is_an_engine_error() {
        let config = PipelineConfig {
            whisper_cmd: "/no/such/whisper".to_string(),
            whisper_output_dir: std::env::temp_dir()
                .join("engine_test_out")
                .to_string_lossy()
                .into_owned(),
            ..PipelineConfig::default()
        };
        let engine = WhisperEngine::new(config);
        let result = engine.transcribe(Path::new("/tmp/audio.mp3"), "pt", ModelTier::Tiny);
        assert!(matches!(result, Err(PipelineError::Engine(_))));
    }
}
