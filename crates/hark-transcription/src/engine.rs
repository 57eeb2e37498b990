//! whisper.cpp engine via `whisper-rs`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio;
use crate::init::ModelLoader;
use crate::model::{self, ModelSource};
use crate::types::{
    ResultExt, Segment, TranscribeOptions, Transcriber, Transcript, TranscriptionError,
};

/// whisper.cpp reports segment times in centiseconds.
const TIMESTAMP_SCALE: f64 = 100.0;

/// A loaded whisper model.
///
/// The context holds the weights and is only read after loading; each call
/// gets its own decoding state, so concurrent calls do not interfere.
pub struct WhisperEngine {
    name: String,
    context: WhisperContext,
    threads: usize,
}

impl WhisperEngine {
    /// Load weights from `path`. CPU- and IO-heavy; call once at startup.
    pub fn load(
        name: impl Into<String>,
        path: &Path,
        threads: usize,
    ) -> Result<Self, TranscriptionError> {
        let name = name.into();
        info!(model = %name, path = %path.display(), "loading whisper model...");
        let path_str = path.to_str().ok_or_else(|| {
            TranscriptionError::ModelNotAvailable(format!(
                "model path is not valid UTF-8: {}",
                path.display()
            ))
        })?;
        let context =
            WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
                .model("load whisper context")?;
        info!(model = %name, "whisper model ready");
        Ok(Self {
            name,
            context,
            threads: threads.max(1),
        })
    }

    fn run(
        &self,
        samples: &[f32],
        language: Option<&str>,
    ) -> Result<(Vec<Segment>, Option<String>), TranscriptionError> {
        let mut state = self.context.create_state().inference("create state")?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_n_threads(self.threads as i32);
        params.set_translate(false);
        params.set_language(Some(language.unwrap_or("auto")));
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_special(false);
        params.set_print_timestamps(false);

        let _ = state.full(params, samples).inference("full decode")?;

        let n_segments = state.full_n_segments().inference("segment count")?;
        let capacity = n_segments.max(0) as usize;
        let mut raw_text = Vec::with_capacity(capacity);
        let mut spans = Vec::with_capacity(capacity);
        for i in 0..n_segments {
            raw_text.push(state.full_get_segment_bytes(i).inference("segment text")?);
            let t0 = state.full_get_segment_t0(i).inference("segment start")?;
            let t1 = state.full_get_segment_t1(i).inference("segment end")?;
            spans.push((t0, t1));
        }

        let segments = spans
            .into_iter()
            .zip(segment_texts(raw_text))
            .map(|((t0, t1), text)| Segment {
                start: t0 as f64 / TIMESTAMP_SCALE,
                end: t1 as f64 / TIMESTAMP_SCALE,
                text,
            })
            .collect();

        let detected = match language {
            Some(lang) => Some(lang.to_string()),
            None => state
                .full_lang_id_from_state()
                .ok()
                .and_then(whisper_rs::get_lang_str)
                .map(str::to_string),
        };

        Ok((segments, detected))
    }
}

impl Transcriber for WhisperEngine {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn transcribe(
        &self,
        audio_path: &Path,
        options: &TranscribeOptions,
    ) -> Result<Transcript, TranscriptionError> {
        let decoded = audio::decode_file(audio_path)?;
        debug!(
            duration_seconds = decoded.duration_seconds,
            source_rate = decoded.source_rate,
            "audio decoded"
        );

        let (segments, language) = self.run(&decoded.samples, options.language.as_deref())?;
        let text = segments.iter().map(|s| s.text.as_str()).collect::<String>();

        Ok(Transcript {
            text,
            segments,
            language,
            duration_seconds: decoded.duration_seconds,
        })
    }
}

/// Decode per-segment token bytes.
///
/// whisper.cpp may end a segment in the middle of a multibyte character;
/// the incomplete tail is carried into the next segment. Anything still
/// invalid is replaced with U+FFFD.
fn segment_texts(raw: Vec<Vec<u8>>) -> Vec<String> {
    let count = raw.len();
    let mut texts = Vec::with_capacity(count);
    let mut pending: Vec<u8> = Vec::new();
    for (i, bytes) in raw.into_iter().enumerate() {
        pending.extend_from_slice(&bytes);
        let split = match std::str::from_utf8(&pending) {
            Err(e) if e.error_len().is_none() && i + 1 < count => e.valid_up_to(),
            _ => pending.len(),
        };
        let tail = pending.split_off(split);
        texts.push(String::from_utf8_lossy(&pending).into_owned());
        pending = tail;
    }
    texts
}

/// Loads whisper models by catalog name or path.
#[derive(Debug, Clone)]
pub struct WhisperLoader {
    /// Directory holding `ggml-<name>.bin` files.
    pub model_dir: PathBuf,
    /// Fetch missing catalog weights from `HuggingFace`.
    pub auto_download: bool,
    /// Inference threads per call.
    pub threads: usize,
}

impl ModelLoader for WhisperLoader {
    fn load(&self, name: &str) -> Result<Arc<dyn Transcriber>, TranscriptionError> {
        let source = model::resolve(name, &self.model_dir)?;
        if !model::is_model_cached(&source) {
            match (&source, self.auto_download) {
                (ModelSource::Catalog { .. }, true) => model::ensure_model(&source)?,
                _ => {
                    return Err(TranscriptionError::ModelNotAvailable(format!(
                        "model weights not found at {}",
                        source.path().display()
                    )));
                }
            }
        }
        let engine = WhisperEngine::load(source.display_name(), source.path(), self.threads)?;
        Ok(Arc::new(engine))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_character_is_carried_to_next_segment() {
        // "日本" is E6 97 A5 E6 9C AC; the second character straddles segments
        let raw = vec![
            vec![0xE6, 0x97, 0xA5, 0xE6],
            vec![0x9C, 0xAC, b'!'],
        ];
        let texts = segment_texts(raw);
        assert_eq!(texts, vec!["日".to_string(), "本!".to_string()]);
        assert_eq!(texts.concat(), "日本!");
    }

    #[test]
    fn valid_segments_pass_through() {
        let texts = segment_texts(vec![b" Hello".to_vec(), b" world.".to_vec()]);
        assert_eq!(texts, vec![" Hello", " world."]);
    }

    #[test]
    fn truncated_final_segment_is_lossy() {
        let texts = segment_texts(vec![b"ok ".to_vec(), vec![0xE6, 0x97]]);
        assert_eq!(texts[0], "ok ");
        assert!(texts[1].contains('\u{FFFD}'), "{:?}", texts[1]);
    }

    #[test]
    fn invalid_bytes_do_not_fail() {
        let texts = segment_texts(vec![vec![b'a', 0xFF, b'b'], b"c".to_vec()]);
        assert_eq!(texts, vec!["a\u{FFFD}b", "c"]);
    }

    #[test]
    fn loader_refuses_missing_weights_without_download() {
        let tmp = tempfile::tempdir().unwrap();
        let loader = WhisperLoader {
            model_dir: tmp.path().to_path_buf(),
            auto_download: false,
            threads: 1,
        };
        let err = loader.load("tiny").err().unwrap();
        assert!(err.to_string().contains("ggml-tiny.bin"), "{err}");
    }

    #[test]
    fn loader_rejects_garbage_weights() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("ggml-tiny.bin"), b"not a model").unwrap();
        let loader = WhisperLoader {
            model_dir: tmp.path().to_path_buf(),
            auto_download: false,
            threads: 1,
        };
        assert!(loader.load("tiny").is_err());
    }

    // Requires network access and model download; run with `cargo test -- --ignored`
    #[test]
    #[ignore]
    fn transcribes_silence() {
        let tmp = tempfile::tempdir().unwrap();
        let loader = WhisperLoader {
            model_dir: tmp.path().to_path_buf(),
            auto_download: true,
            threads: 2,
        };
        let engine = loader.load("tiny").unwrap();

        let wav = tmp.path().join("silence.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&wav, spec).unwrap();
        for _ in 0..32_000 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let out = engine.transcribe(&wav, &TranscribeOptions::default()).unwrap();
        assert!((out.duration_seconds - 2.0).abs() < 0.01);
        assert!(out.segments.windows(2).all(|w| w[0].start <= w[1].start));
    }
}
