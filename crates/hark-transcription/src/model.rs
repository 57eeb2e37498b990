//! Model catalog, name resolution, and `HuggingFace` download.

use std::path::{Path, PathBuf};

#[cfg(feature = "whisper")]
use crate::types::ResultExt;
use crate::types::TranscriptionError;
#[cfg(feature = "whisper")]
use tracing::{debug, info};

/// `HuggingFace` repository hosting ggml whisper weights.
pub const HF_REPO: &str = "ggerganov/whisper.cpp";

/// Model names with published ggml weights.
pub const CATALOG: &[&str] = &[
    "tiny",
    "tiny.en",
    "base",
    "base.en",
    "small",
    "small.en",
    "medium",
    "medium.en",
    "large-v1",
    "large-v2",
    "large-v3",
    "large-v3-turbo",
];

/// Where a requested model lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// A catalog model, stored as `ggml-<name>.bin`.
    Catalog {
        /// Canonical catalog name.
        name: String,
        /// Expected local path.
        path: PathBuf,
    },
    /// An explicit model file supplied by path.
    File(PathBuf),
}

impl ModelSource {
    /// Local path of the model weights.
    pub fn path(&self) -> &Path {
        match self {
            Self::Catalog { path, .. } | Self::File(path) => path,
        }
    }

    /// Human-readable model name.
    pub fn display_name(&self) -> String {
        match self {
            Self::Catalog { name, .. } => name.clone(),
            Self::File(path) => path
                .file_stem()
                .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned()),
        }
    }
}

/// Map aliases onto catalog names.
fn canonical_name(name: &str) -> &str {
    match name {
        "large" => "large-v3",
        "turbo" => "large-v3-turbo",
        other => other,
    }
}

/// Filename of a catalog model's weights.
pub fn ggml_filename(name: &str) -> String {
    format!("ggml-{name}.bin")
}

/// Resolve a configured model name against `model_dir`.
///
/// An existing file path wins; otherwise the name must be in [`CATALOG`]
/// (after alias expansion).
pub fn resolve(name: &str, model_dir: impl AsRef<Path>) -> Result<ModelSource, TranscriptionError> {
    let trimmed = name.trim();
    let as_path = Path::new(trimmed);
    if as_path.is_file() {
        return Ok(ModelSource::File(as_path.to_path_buf()));
    }

    let canonical = canonical_name(&trimmed.to_lowercase()).to_string();
    if !CATALOG.contains(&canonical.as_str()) {
        return Err(TranscriptionError::ModelNotAvailable(format!(
            "unknown model '{trimmed}' (expected one of: {})",
            CATALOG.join(", ")
        )));
    }

    let path = model_dir.as_ref().join(ggml_filename(&canonical));
    Ok(ModelSource::Catalog {
        name: canonical,
        path,
    })
}

/// Check whether the weights for `source` exist locally.
pub fn is_model_cached(source: &ModelSource) -> bool {
    source.path().is_file()
}

/// Download catalog weights from `HuggingFace` if not already cached.
///
/// Blocking: `hf-hub`'s sync API does its own HTTP. Call from a blocking
/// context at startup.
#[cfg(feature = "whisper")]
pub fn ensure_model(source: &ModelSource) -> Result<(), TranscriptionError> {
    if is_model_cached(source) {
        debug!(path = %source.path().display(), "model weights already cached");
        return Ok(());
    }

    let ModelSource::Catalog { name, path } = source else {
        return Err(TranscriptionError::ModelNotAvailable(format!(
            "model file not found: {}",
            source.path().display()
        )));
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let filename = ggml_filename(name);
    info!(model = %name, repo = HF_REPO, "downloading {filename}...");
    let api = hf_hub::api::sync::Api::new().model("HF API init")?;
    let repo = api.model(HF_REPO.to_string());
    let cached_path = repo.get(&filename).model(&format!("download {filename}"))?;

    // hf-hub caches to its own dir; copy to our model dir
    if cached_path != *path {
        let _ = std::fs::copy(&cached_path, path).model(&format!("copy {filename}"))?;
    }
    info!(path = %path.display(), "model weights ready");
    Ok(())
}
