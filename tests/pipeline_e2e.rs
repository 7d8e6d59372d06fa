//! End-to-end pipeline tests
//!
//! These tests drive the full pipeline with scripted stand-ins for the
//! external tools (ffprobe, ffmpeg, whisper), exercising duration probing,
//! model selection, chunking, offset-correct merging and cleanup together.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use transcritor_api::config::{ModelThresholds, PipelineConfig};
use transcritor_api::pipeline::run_job;
use transcritor_api::store::{JobStatus, NewJob, TranscriptionStore};
use transcritor_api::{ModelTier, WhisperEngine};

struct TestBed {
    dir: PathBuf,
}

impl TestBed {
    fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("e2e_test_{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        Self { dir }
    }

    fn write_script(&self, name: &str, body: &str) -> String {
        let path = self.dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path.to_string_lossy().into_owned()
    }

    /// ffprobe stand-in reporting `source_secs` for the original recording
    /// and `chunk_secs` for any path containing "chunk_"
    fn fake_ffprobe(&self, source_secs: f64, chunk_secs: f64) -> String {
        self.write_script(
            "ffprobe",
            &format!(
                r#"for a; do last=$a; done
case "$last" in
  *chunk_*) d={chunk};;
  *) d={source};;
esac
printf '{{"format": {{"duration": "%s"}}}}' "$d"
"#,
                chunk = chunk_secs,
                source = source_secs
            ),
        )
    }

    /// ffmpeg stand-in that writes a dummy slice to the output path (last arg)
    fn fake_ffmpeg(&self) -> String {
        self.write_script(
            "ffmpeg",
            "for a; do last=$a; done\necho fake-slice > \"$last\"\n",
        )
    }

    /// whisper stand-in writing one JSON transcript per invocation;
    /// exits non-zero when the input path matches `fail_pattern`
    fn fake_whisper(&self, fail_pattern: &str) -> String {
        let fail_clause = if fail_pattern.is_empty() {
            String::new()
        } else {
            format!(
                "case \"$input\" in *{}*) echo 'model crashed' >&2; exit 1;; esac\n",
                fail_pattern
            )
        };
        self.write_script(
            "whisper",
            &format!(
                r#"input=$1
shift
outdir=.
while [ $# -gt 0 ]; do
  if [ "$1" = "--output_dir" ]; then outdir=$2; fi
  shift
done
{fail}stem=$(basename "$input")
stem=${{stem%.*}}
cat > "$outdir/$stem.json" <<'EOF'
{{"text": " ata da sessao ", "segments": [
  {{"id": 0, "start": 0.0, "end": 2.5, "text": " ata da", "no_speech_prob": 0.03}},
  {{"id": 1, "start": 2.5, "end": 5.0, "text": " sessao"}}
]}}
EOF
"#,
                fail = fail_clause
            ),
        )
    }

    /// whisper stand-in whose transcript text is the input path itself,
    /// held open briefly so concurrent invocations overlap
    fn fake_whisper_echoing(&self) -> String {
        self.write_script(
            "whisper",
            r#"input=$1
shift
outdir=.
while [ $# -gt 0 ]; do
  if [ "$1" = "--output_dir" ]; then outdir=$2; fi
  shift
done
stem=$(basename "$input")
stem=${stem%.*}
cat > "$outdir/$stem.json" <<EOF
{"text": "$input", "segments": []}
EOF
sleep 0.2
"#,
        )
    }

    fn config(&self, ffprobe: String, ffmpeg: String, whisper: String) -> PipelineConfig {
        PipelineConfig {
            ffprobe_cmd: ffprobe,
            ffmpeg_cmd: ffmpeg,
            whisper_cmd: whisper,
            whisper_output_dir: self.dir.join("whisper_out").to_string_lossy().into_owned(),
            language: "pt".to_string(),
            default_model: "base".to_string(),
            max_chunk_minutes: 20,
            thresholds: ModelThresholds {
                small_secs: 300.0,
                medium_secs: 900.0,
                large_secs: 1800.0,
                largest_secs: 3600.0,
            },
            job_timeout_hours: 4,
            queue_capacity: 100,
        }
    }

    fn media_file(&self, name: &str) -> PathBuf {
        let path = self.dir.join(name);
        fs::write(&path, b"fake recording bytes").unwrap();
        path
    }
}

impl Drop for TestBed {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}

fn chunk_dir_of(source: &Path) -> PathBuf {
    let stem = source.file_stem().unwrap().to_str().unwrap();
    source.parent().unwrap().join(format!("{}_chunks", stem))
}

async fn stored_job(store: &TranscriptionStore, media: PathBuf) -> i64 {
    store
        .create_job(NewJob {
            owner_id: 1,
            title: "Audiência de instrução".to_string(),
            original_filename: "hearing.mp3".to_string(),
            file_path: media,
            file_size: 20,
            language: "pt".to_string(),
        })
        .await
        .id
}

#[tokio::test]
async fn short_recording_single_chunk_completes() {
    let bed = TestBed::new();
    let media = bed.media_file("hearing.mp3");

    // 3 minutes: below every chunking and model threshold
    let config = bed.config(
        bed.fake_ffprobe(180.0, 180.0),
        bed.fake_ffmpeg(),
        bed.fake_whisper(""),
    );
    let engine = WhisperEngine::new(config.clone());
    let store = TranscriptionStore::new();
    let job_id = stored_job(&store, media.clone()).await;

    run_job(&store, &engine, &config, job_id).await.unwrap();

    let job = store.get_job(job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.duration, Some(180.0));
    assert_eq!(job.full_text.as_deref(), Some("ata da sessao"));

    // Identity path: no chunk directory was ever created
    assert!(!chunk_dir_of(&media).exists());
    assert!(media.exists());

    let segments = store.segments_for_job(job_id).await.unwrap();
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].start_time, 0.0);
    assert_eq!(segments[0].speaker, "Speaker_0");
    assert_eq!(segments[1].speaker, "Speaker_1");
    // no_speech_prob flows into confidence, missing means 0
    assert_eq!(segments[0].confidence, 0.03);
    assert_eq!(segments[1].confidence, 0.0);
}

#[tokio::test]
async fn long_recording_is_chunked_with_offset_corrected_segments() {
    let bed = TestBed::new();
    let media = bed.media_file("long_hearing.mp3");

    // 40 minutes with a 20-minute ceiling: exactly 2 chunks of 1200s
    let config = bed.config(
        bed.fake_ffprobe(2400.0, 1200.0),
        bed.fake_ffmpeg(),
        bed.fake_whisper(""),
    );
    let engine = WhisperEngine::new(config.clone());
    let store = TranscriptionStore::new();
    let job_id = stored_job(&store, media.clone()).await;

    run_job(&store, &engine, &config, job_id).await.unwrap();

    let job = store.get_job(job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.duration, Some(2400.0));
    // One text per chunk, space-joined
    assert_eq!(job.full_text.as_deref(), Some("ata da sessao ata da sessao"));

    let segments = store.segments_for_job(job_id).await.unwrap();
    assert_eq!(segments.len(), 4);

    // Second chunk's segments start at or after the first chunk's duration
    let first_chunk_end = segments[1].end_time;
    assert_eq!(segments[2].start_time, 1200.0);
    assert_eq!(segments[3].start_time, 1202.5);
    assert!(segments[2].start_time >= first_chunk_end);

    // Chunk files and directory are gone after the run
    assert!(!chunk_dir_of(&media).exists());
    assert!(media.exists());
}

#[tokio::test]
async fn engine_failure_on_second_chunk_fails_job_and_cleans_up() {
    let bed = TestBed::new();
    let media = bed.media_file("failing_hearing.mp3");

    let config = bed.config(
        bed.fake_ffprobe(2400.0, 1200.0),
        bed.fake_ffmpeg(),
        bed.fake_whisper("chunk_001"),
    );
    let engine = WhisperEngine::new(config.clone());
    let store = TranscriptionStore::new();
    let job_id = stored_job(&store, media.clone()).await;

    let result = run_job(&store, &engine, &config, job_id).await;
    assert!(result.is_err());

    let job = store.get_job(job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.full_text.is_none());
    // Nothing persisted from chunk 2 or later: the batch never committed
    assert_eq!(store.segment_count(job_id).await, 0);

    // Cleanup ran on the failure path too
    assert!(!chunk_dir_of(&media).exists());
    assert!(media.exists());
}

#[test]
fn concurrent_jobs_with_identical_chunk_stems_do_not_collide() {
    use std::sync::Arc;
    use transcritor_api::TranscriptionEngine;

    let bed = TestBed::new();
    let config = bed.config(
        bed.fake_ffprobe(180.0, 180.0),
        bed.fake_ffmpeg(),
        bed.fake_whisper_echoing(),
    );

    // Two jobs whose chunk files share the stem "chunk_000"
    let chunk_a = bed.dir.join("job_a").join("hearing_chunks").join("chunk_000.mp3");
    let chunk_b = bed.dir.join("job_b").join("hearing_chunks").join("chunk_000.mp3");
    for chunk in [&chunk_a, &chunk_b] {
        fs::create_dir_all(chunk.parent().unwrap()).unwrap();
        fs::write(chunk, b"slice").unwrap();
    }

    let engine = Arc::new(WhisperEngine::new(config));
    let handles: Vec<_> = [chunk_a.clone(), chunk_b.clone()]
        .into_iter()
        .map(|chunk| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                engine.transcribe(&chunk, "pt", ModelTier::Tiny).unwrap()
            })
        })
        .collect();

    let transcripts: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // Each job gets its own transcript back, never the other job's
    assert_eq!(transcripts[0].text, chunk_a.to_string_lossy());
    assert_eq!(transcripts[1].text, chunk_b.to_string_lossy());
}

#[tokio::test]
async fn model_tier_follows_probed_duration() {
    use transcritor_api::model_select::select_model;

    let thresholds = ModelThresholds {
        small_secs: 300.0,
        medium_secs: 900.0,
        large_secs: 1800.0,
        largest_secs: 3600.0,
    };

    // 3-minute upload
    assert_eq!(
        select_model(Some(180.0), &thresholds, ModelTier::Base),
        ModelTier::Tiny
    );
    // 40-minute upload
    assert_eq!(
        select_model(Some(2400.0), &thresholds, ModelTier::Base),
        ModelTier::Large
    );
}
