//! End-to-end tests against the live Gemini API.
//!
//! These tests make real (billed) model calls. They are gated behind the
//! `E2E_ENABLED` environment variable and an API key, so they do not run in
//! CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 GEMINI_API_KEY=... cargo test --test e2e -- --nocapture
//!
//! To restrict to a specific test:
//!   E2E_ENABLED=1 cargo test --test e2e test_text_document -- --nocapture

use med_illustrator::{
    generate, generate_to_dir, Audience, GenerationConfig, GenerationRequest,
    IllustrationStyle, IllustratorError,
};
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn output_dir(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("target/e2e-output")
        .join(name)
}

/// Skip this test unless E2E_ENABLED is set *and* a key is available.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let has_key = ["GEMINI_API_KEY", "GOOGLE_API_KEY", "API_KEY"]
            .iter()
            .any(|v| std::env::var(v).map(|k| !k.trim().is_empty()).unwrap_or(false));
        if !has_key {
            println!("SKIP: no GEMINI_API_KEY / GOOGLE_API_KEY / API_KEY set");
            return;
        }
    }};
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("med_illustrator=debug")
        .with_test_writer()
        .try_init();
}

/// Assert the result is usable: a decodable image and non-empty text.
fn assert_result_quality(result: &med_illustrator::GenerationResult, context: &str) {
    assert!(
        !result.explanation.trim().is_empty(),
        "[{context}] explanation is empty"
    );
    assert!(
        !result.generated_prompt.trim().is_empty(),
        "[{context}] image prompt is empty"
    );
    assert!(
        result.image_url.starts_with("data:image/"),
        "[{context}] image_url is not an image data URI: {:.40}",
        result.image_url
    );

    let bytes = result.decode_image().expect("image payload decodes");
    let img = image::load_from_memory(&bytes).expect("payload is a real image");
    assert!(img.width() > 0 && img.height() > 0, "[{context}] empty image");

    // First explanation line should not be a leftover code fence.
    let first_line = result.explanation.lines().next().unwrap_or("");
    assert!(
        !first_line.starts_with("```"),
        "[{context}] explanation starts with a code fence: {first_line:?}"
    );
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_text_document() {
    e2e_skip_unless_ready!();
    init_tracing();

    let request = GenerationRequest::from_text(
        "Insulin is a hormone made by the pancreas. It lets glucose from food \
         enter the body's cells to be used for energy. In type 1 diabetes the \
         pancreas makes little or no insulin, so blood sugar rises.",
    )
    .language("Spanish")
    .audience(Audience::Kids)
    .style(IllustrationStyle::ComicBook);

    let result = generate(&request, &GenerationConfig::from_env())
        .await
        .expect("generation succeeds");

    println!("explanation:\n{}", result.explanation);
    println!("image prompt:\n{}", result.generated_prompt);
    assert_result_quality(&result, "text");
}

#[tokio::test]
async fn test_url_source() {
    e2e_skip_unless_ready!();
    init_tracing();

    let request = GenerationRequest::from_url("https://en.wikipedia.org/wiki/Measles")
        .audience(Audience::Adults)
        .style(IllustrationStyle::WhiteBoard);

    let result = generate(&request, &GenerationConfig::from_env())
        .await
        .expect("generation succeeds");

    assert_result_quality(&result, "url");
}

#[tokio::test]
async fn test_generate_to_dir() {
    e2e_skip_unless_ready!();
    init_tracing();

    let dir = output_dir("to_dir");
    let request = GenerationRequest::from_text(
        "Vaccines train the immune system to recognise a germ without causing the disease.",
    )
    .style(IllustrationStyle::PixelArt);

    let (result, written) = generate_to_dir(&request, &dir, &GenerationConfig::from_env())
        .await
        .expect("generation succeeds");

    assert_result_quality(&result, "to_dir");
    assert!(written.image_path.exists());
    assert!(written.explanation_path.exists());
    assert!(written.result_path.exists());
    println!("wrote {}", written.image_path.display());
}

#[tokio::test]
async fn test_invalid_key_is_auth_error() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
        return;
    }
    init_tracing();

    let config = GenerationConfig::builder()
        .api_key("not-a-real-key")
        .build()
        .unwrap();
    let err = generate(&GenerationRequest::from_text("hello"), &config)
        .await
        .unwrap_err();

    assert!(
        err.is_auth(),
        "expected an auth error for a bogus key, got: {err}"
    );
    assert!(matches!(err, IllustratorError::Auth { .. }));
}
