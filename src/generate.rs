//! Generation entry points.
//!
//! [`generate`] runs the two-stage pipeline for one request and returns the
//! complete [`GenerationResult`] or the first error. [`generate_to_dir`] does
//! the same and writes the image, explanation and JSON result to disk.
//!
//! Each call is independent: the provider is resolved per call (so a key
//! chosen between two calls is picked up by the second one) and nothing is
//! cached between calls. Re-running the same request is the way to
//! regenerate.

use crate::config::GenerationConfig;
use crate::credentials::{obtain_credential, EnvCredentials};
use crate::error::IllustratorError;
use crate::output::{GenerationResult, WrittenOutput};
use crate::pipeline::{analysis, illustration};
use crate::progress::Stage;
use crate::provider::gemini::GeminiProvider;
use crate::provider::GenAiProvider;
use crate::request::GenerationRequest;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// File name of the written explanation.
pub const EXPLANATION_FILE: &str = "explanation.md";

/// File name of the written JSON result.
pub const RESULT_FILE: &str = "result.json";

/// Stem of the written illustration; the extension follows the image type.
pub const IMAGE_FILE_STEM: &str = "illustration";

/// Turn a document or URL into an explanation plus illustration.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// Any stage failure aborts the whole run; see [`IllustratorError`]. There is
/// no retry and no partial result.
pub async fn generate(
    request: &GenerationRequest,
    config: &GenerationConfig,
) -> Result<GenerationResult, IllustratorError> {
    let result = run_pipeline(request, config).await;
    if let (Err(e), Some(cb)) = (&result, &config.progress_callback) {
        cb.on_error(&e.to_string());
    }
    result
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    request: &GenerationRequest,
    config: &GenerationConfig,
) -> Result<GenerationResult, IllustratorError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| IllustratorError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate(request, config))
}

/// Run [`generate`] and write the result into `dir`.
///
/// Writes `illustration.<ext>`, `explanation.md` and `result.json`. Each file
/// is written atomically (temp file + rename).
pub async fn generate_to_dir(
    request: &GenerationRequest,
    dir: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<(GenerationResult, WrittenOutput), IllustratorError> {
    let result = generate(request, config).await?;
    let written = write_outputs(&result, dir).await?;
    Ok((result, written))
}

/// Write an existing result into `dir`, creating it if needed.
pub async fn write_outputs(
    result: &GenerationResult,
    dir: impl AsRef<Path>,
) -> Result<WrittenOutput, IllustratorError> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| IllustratorError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let image_bytes = result.decode_image()?;
    let ext = image_extension(&image_bytes, result.image_mime_type());
    let image_path = dir.join(format!("{IMAGE_FILE_STEM}.{ext}"));
    write_atomic(&image_path, &image_bytes).await?;

    let explanation_path = dir.join(EXPLANATION_FILE);
    let mut explanation = result.explanation.clone();
    if !explanation.ends_with('\n') {
        explanation.push('\n');
    }
    write_atomic(&explanation_path, explanation.as_bytes()).await?;

    let result_path = dir.join(RESULT_FILE);
    let json = serde_json::to_vec_pretty(result)
        .map_err(|e| IllustratorError::Internal(format!("serialise result: {e}")))?;
    write_atomic(&result_path, &json).await?;

    debug!("Wrote outputs to {}", dir.display());
    Ok(WrittenOutput {
        image_path,
        explanation_path,
        result_path,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run_pipeline(
    request: &GenerationRequest,
    config: &GenerationConfig,
) -> Result<GenerationResult, IllustratorError> {
    let start = Instant::now();
    let cb = config.progress_callback.as_ref();
    info!(
        "Starting generation: {} source, {} audience, {} style, language {}",
        request.source_kind, request.audience, request.style, request.target_language
    );

    let provider = resolve_provider(config).await?;
    if let Some(cb) = cb {
        cb.on_generation_start(request.source_kind);
    }

    // ── Step 1: Analysis ─────────────────────────────────────────────────
    if let Some(cb) = cb {
        cb.on_stage_start(Stage::Analysis);
    }
    let analysis = analysis::run_analysis(provider.as_ref(), request, config).await?;
    info!(
        "Analysis done with {}: {} chars explanation, {} chars image prompt",
        config.text_model,
        analysis.explanation.len(),
        analysis.image_prompt.len()
    );
    if let Some(cb) = cb {
        cb.on_stage_complete(Stage::Analysis);
    }

    // ── Step 2: Illustration ─────────────────────────────────────────────
    if let Some(cb) = cb {
        cb.on_stage_start(Stage::Illustration);
    }
    let image_url =
        illustration::run_illustration(provider.as_ref(), &analysis.image_prompt, config).await?;
    if let Some(cb) = cb {
        cb.on_stage_complete(Stage::Illustration);
    }

    // ── Step 3: Assemble ─────────────────────────────────────────────────
    let result = GenerationResult {
        image_url,
        explanation: analysis.explanation,
        generated_prompt: analysis.image_prompt,
        sources: Vec::new(),
    };

    info!(
        "Generation complete with {} in {}ms",
        config.image_model,
        start.elapsed().as_millis()
    );
    if let Some(cb) = cb {
        cb.on_generation_complete();
    }
    Ok(result)
}

/// Resolve the provider, from most-specific to least-specific:
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Explicit key** (`config.api_key`).
/// 3. **Host credential capability** (`config.credentials`).
/// 4. **Environment** ([`EnvCredentials`]).
async fn resolve_provider(
    config: &GenerationConfig,
) -> Result<Arc<dyn GenAiProvider>, IllustratorError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let key = match config.api_key {
        Some(ref key) if !key.trim().is_empty() => key.clone(),
        _ => match config.credentials {
            Some(ref creds) => obtain_credential(creds.as_ref()).await?,
            None => obtain_credential(&EnvCredentials::default()).await?,
        },
    };

    let provider = GeminiProvider::new(key, config.api_base.as_str(), config.api_timeout_secs)?;
    Ok(Arc::new(provider))
}

/// File extension for the image: sniffed from the bytes first, then from the
/// MIME type, then `bin`.
fn image_extension(bytes: &[u8], mime_type: Option<&str>) -> &'static str {
    image::guess_format(bytes)
        .ok()
        .or_else(|| mime_type.and_then(image::ImageFormat::from_mime_type))
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or("bin")
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), IllustratorError> {
    let tmp_path = temp_path_for(path);
    let to_err = |e| IllustratorError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };
    let written = match tokio::fs::write(&tmp_path, bytes).await {
        Ok(()) => tokio::fs::rename(&tmp_path, path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        // Don't leave a partial sibling behind.
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(to_err(e));
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_from_magic_bytes() {
        let png_magic = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        assert_eq!(image_extension(&png_magic, Some("image/jpeg")), "png");
    }

    #[test]
    fn extension_from_mime_when_bytes_unknown() {
        assert_eq!(image_extension(b"????", Some("image/jpeg")), "jpg");
        assert_eq!(image_extension(b"????", None), "bin");
    }

    #[test]
    fn temp_path_keeps_directory() {
        let p = temp_path_for(Path::new("/out/illustration.png"));
        assert_eq!(p, PathBuf::from("/out/illustration.png.tmp"));
    }

    #[tokio::test]
    async fn failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory at the target path makes the rename fail.
        let target = dir.path().join("illustration.png");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), b"x").unwrap();

        let err = write_atomic(&target, b"bytes").await.unwrap_err();

        assert!(matches!(err, IllustratorError::OutputWriteFailed { .. }));
        assert!(!temp_path_for(&target).exists());
        assert!(target.join("keep").exists());
    }

    #[tokio::test]
    async fn write_atomic_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("explanation.md");
        std::fs::write(&target, b"old").unwrap();

        write_atomic(&target, b"new").await.unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"new");
        assert!(!temp_path_for(&target).exists());
    }

    fn keyless_config() -> GenerationConfig {
        GenerationConfig::builder()
            .credentials(Arc::new(EnvCredentials::new([
                "MED_ILLUSTRATOR_TEST_UNSET_KEY_VAR",
            ])))
            .build()
            .unwrap()
    }

    #[test]
    fn missing_key_is_reported_before_any_call() {
        let config = keyless_config();
        let err = tokio_test::block_on(generate(&GenerationRequest::from_text("hello"), &config))
            .unwrap_err();
        assert!(matches!(err, IllustratorError::CredentialUnavailable { .. }));
    }

    #[test]
    fn sync_wrapper_runs_without_a_runtime() {
        let err = generate_sync(&GenerationRequest::from_text("hello"), &keyless_config())
            .unwrap_err();
        assert!(err.is_auth());
    }
}
