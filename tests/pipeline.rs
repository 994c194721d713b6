//! End-to-end tests for edgequake-quizgen.
//!
//! These drive the public API with in-memory documents. The model is either
//! a scripted in-process [`GenerationCapability`] or, for the HTTP client, a
//! local wiremock server, so no network access or API key is needed.
//!
//! Run with:
//!   cargo test --test pipeline

use async_trait::async_trait;
use edgequake_quizgen::{
    generate, generate_from_bytes, generate_to_dir, ArtifactFormat, GenerationCapability,
    GenerationConfig, GenerationError, GenerationProgressCallback, GenerationRequest,
    GenerationResponse, GenerationResult, PromptTemplate, QuizGenError, SegmentError,
    SegmentationStrategy,
};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Replays a fixed list of outcomes, one per call, and records every prompt.
/// Once the script runs out it echoes the prompt back.
#[derive(Default)]
struct Scripted {
    script: Mutex<VecDeque<Result<GenerationResponse, GenerationError>>>,
    prompts: Mutex<Vec<String>>,
}

impl Scripted {
    fn new(script: Vec<Result<GenerationResponse, GenerationError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn echo() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationCapability for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        match self.script.lock().unwrap().pop_front() {
            Some(outcome) => outcome,
            None => Ok(GenerationResponse::Content(request.prompt.clone())),
        }
    }
}

fn content(s: &str) -> Result<GenerationResponse, GenerationError> {
    Ok(GenerationResponse::Content(s.to_string()))
}

/// Config with a bare `{text}` prompt so generated text mirrors the segment.
fn config_with(generator: Arc<Scripted>) -> GenerationConfig {
    GenerationConfig::builder()
        .generator(generator)
        .prompt(PromptTemplate::new("{text}").unwrap())
        .artifact_format(ArtifactFormat::Text)
        .build()
        .unwrap()
}

fn artifact_text(bytes: &[u8]) -> String {
    String::from_utf8(bytes.to_vec()).unwrap()
}

// ── Orchestration scenarios ──────────────────────────────────────────────────

#[tokio::test]
async fn delimiter_units_become_numbered_entries() {
    let gen = Scripted::new(vec![content("qA"), content("qB"), content("qC")]);
    let config = config_with(gen.clone());

    let output = generate_from_bytes(b"A+++++B+++++C", "unita.txt", &config)
        .await
        .unwrap();

    assert_eq!(gen.prompts(), vec!["A", "B", "C"]);
    assert_eq!(output.stats.total_segments, 3);
    assert_eq!(output.stats.generated, 3);
    assert_eq!(output.stats.omitted, 0);
    assert_eq!(
        artifact_text(&output.artifact.bytes),
        "1. -------------------------\nqA\n\n\
         2. -------------------------\nqB\n\n\
         3. -------------------------\nqC\n\n"
    );
}

#[tokio::test]
async fn unrecognized_response_is_omitted_and_numbering_stays_contiguous() {
    let gen = Scripted::new(vec![
        content("first"),
        Ok(GenerationResponse::Unrecognized("content is null".into())),
        content("third"),
    ]);
    let config = config_with(gen.clone());

    let output = generate_from_bytes(b"A+++++B+++++C", "unita.txt", &config)
        .await
        .unwrap();

    // Every segment was still submitted.
    assert_eq!(gen.prompts().len(), 3);
    assert_eq!(output.results.len(), 3);
    assert_eq!(output.stats.generated, 2);
    assert_eq!(output.stats.omitted, 1);

    let omissions: Vec<_> = output.omissions().collect();
    assert_eq!(omissions.len(), 1);
    assert_eq!(omissions[0].segment_index, 1);
    assert!(matches!(
        omissions[0].error,
        SegmentError::UnrecognizedResponse { segment: 2, .. }
    ));

    let entries: Vec<_> = output
        .artifact
        .entries
        .iter()
        .map(|e| (e.position, e.text.as_str()))
        .collect();
    assert_eq!(entries, vec![(1, "first"), (2, "third")]);
}

#[tokio::test]
async fn failed_call_is_omitted_without_stopping_the_run() {
    let gen = Scripted::new(vec![
        Err(GenerationError::Api {
            status: 429,
            message: "rate limited".into(),
        }),
        content("second"),
    ]);
    let config = config_with(gen);

    let output = generate_from_bytes(b"A+++++B", "unita.txt", &config)
        .await
        .unwrap();

    assert!(matches!(
        output.results[0],
        GenerationResult::Omitted(ref o) if matches!(o.error, SegmentError::GenerationFailed { segment: 1, .. })
    ));
    assert_eq!(output.artifact.entries.len(), 1);
    assert_eq!(output.artifact.entries[0].position, 1);
    assert_eq!(output.artifact.entries[0].text, "second");
}

#[tokio::test]
async fn generated_markdown_is_stripped_before_assembly() {
    let gen = Scripted::new(vec![content(
        "## Domanda\n**Che cos'è** la *mitosi*?\n- a) divisione\n- b) fusione\n",
    )]);
    let config = config_with(gen);

    let output = generate_from_bytes(b"testo", "unita.txt", &config)
        .await
        .unwrap();

    assert_eq!(
        output.artifact.entries[0].text,
        "Domanda\nChe cos'è la mitosi?\na) divisione\nb) fusione\n"
    );
}

#[tokio::test]
async fn source_markdown_is_normalised_before_segmentation() {
    let gen = Scripted::echo();
    let config = config_with(gen.clone());

    generate_from_bytes(b"# Unit\n**bold** text", "unita.txt", &config)
        .await
        .unwrap();

    assert_eq!(gen.prompts(), vec!["Unit\nbold text"]);
}

#[tokio::test]
async fn fixed_count_splits_into_equal_pieces() {
    let gen = Scripted::echo();
    let mut config = config_with(gen.clone());
    config.segmentation = SegmentationStrategy::FixedCount(3);

    let text = "x".repeat(100);
    let output = generate_from_bytes(text.as_bytes(), "unita.txt", &config)
        .await
        .unwrap();

    let lens: Vec<usize> = gen.prompts().iter().map(|p| p.len()).collect();
    assert_eq!(lens, vec![33, 33, 34]);
    assert_eq!(output.artifact.entries.len(), 3);
}

#[tokio::test]
async fn empty_document_still_yields_one_submission() {
    let gen = Scripted::echo();
    let config = config_with(gen.clone());

    let output = generate_from_bytes(b"", "vuoto.txt", &config)
        .await
        .unwrap();

    assert_eq!(gen.prompts(), vec![""]);
    assert_eq!(output.stats.total_segments, 1);
}

// ── Fatal conditions ─────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_credential_is_fatal_before_any_stage() {
    let config = GenerationConfig::default();
    let err = generate_from_bytes(b"A+++++B", "unita.txt", &config)
        .await
        .unwrap_err();
    assert!(matches!(err, QuizGenError::MissingCredential));
}

#[tokio::test]
async fn unsupported_format_stops_before_generation() {
    let gen = Scripted::echo();
    let config = config_with(gen.clone());

    let err = generate_from_bytes(b"A+++++B", "slides.pptx", &config)
        .await
        .unwrap_err();

    assert!(matches!(err, QuizGenError::UnsupportedFormat { .. }));
    assert!(gen.prompts().is_empty());
}

#[tokio::test]
async fn missing_file_is_fatal() {
    let config = config_with(Scripted::echo());
    let err = generate("/definitely/not/here.txt", &config).await.unwrap_err();
    assert!(matches!(err, QuizGenError::FileNotFound { .. }));
}

// ── Output artifact ──────────────────────────────────────────────────────────

#[tokio::test]
async fn generate_to_dir_writes_timestamped_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("unita.txt");
    std::fs::write(&input, "uno+++++due").unwrap();

    let out_dir = dir.path().join("out");
    let mut config = config_with(Scripted::echo());
    config.output_dir = out_dir.clone();

    let (path, stats) = generate_to_dir(input.to_str().unwrap(), &config)
        .await
        .unwrap();

    assert_eq!(stats.generated, 2);
    assert_eq!(path.parent().unwrap(), out_dir);
    let name = path.file_name().unwrap().to_str().unwrap();
    let pattern = regex::Regex::new(r"^domande_multiple_del_\d{2}_ora_\d{2}\.txt$").unwrap();
    assert!(pattern.is_match(name), "unexpected file name {name}");
    assert!(std::fs::read_to_string(&path)
        .unwrap()
        .starts_with("1. -------------------------\nuno\n\n"));
}

#[tokio::test]
async fn docx_input_and_output() {
    use docx_rs::{Docx, Paragraph, Run};

    let mut buf = std::io::Cursor::new(Vec::new());
    Docx::new()
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Primo")))
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text("+++++")))
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Secondo")))
        .build()
        .pack(&mut buf)
        .unwrap();

    let gen = Scripted::echo();
    let mut config = config_with(gen.clone());
    config.artifact_format = ArtifactFormat::Docx;

    let output = generate_from_bytes(&buf.into_inner(), "unita.docx", &config)
        .await
        .unwrap();

    assert_eq!(gen.prompts(), vec!["Primo\n\n", "\n\nSecondo"]);
    assert!(output.artifact.file_name.ends_with(".docx"));
    assert!(output.artifact.bytes.starts_with(b"PK"));
}

// ── Progress events ──────────────────────────────────────────────────────────

#[derive(Default)]
struct EventLog(Mutex<Vec<String>>);

impl GenerationProgressCallback for EventLog {
    fn on_run_start(&self, total: usize) {
        self.0.lock().unwrap().push(format!("run {total}"));
    }
    fn on_segment_start(&self, n: usize, _total: usize) {
        self.0.lock().unwrap().push(format!("start {n}"));
    }
    fn on_segment_complete(&self, n: usize, _total: usize, _len: usize) {
        self.0.lock().unwrap().push(format!("done {n}"));
    }
    fn on_segment_omitted(&self, n: usize, _total: usize, _reason: &str) {
        self.0.lock().unwrap().push(format!("omit {n}"));
    }
    fn on_run_complete(&self, total: usize, generated: usize) {
        self.0.lock().unwrap().push(format!("end {generated}/{total}"));
    }
}

#[tokio::test]
async fn progress_events_follow_segment_order() {
    let gen = Scripted::new(vec![
        content("a"),
        Ok(GenerationResponse::Unrecognized("none".into())),
    ]);
    let log = Arc::new(EventLog::default());
    let config = GenerationConfig::builder()
        .generator(gen)
        .progress_callback(log.clone())
        .artifact_format(ArtifactFormat::Text)
        .build()
        .unwrap();

    generate_from_bytes(b"A+++++B", "unita.txt", &config)
        .await
        .unwrap();

    assert_eq!(
        *log.0.lock().unwrap(),
        vec!["run 2", "start 1", "done 1", "start 2", "omit 2", "end 1/2"]
    );
}

// ── HTTP back-end against a local server ─────────────────────────────────────

fn completion(content: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    }))
}

fn http_config(server: &MockServer) -> GenerationConfig {
    GenerationConfig::builder()
        .api_key("sk-test")
        .api_base_url(server.uri())
        .prompt(PromptTemplate::new("Domanda su: {text}").unwrap())
        .artifact_format(ArtifactFormat::Text)
        .api_timeout_secs(5)
        .build()
        .unwrap()
}

#[tokio::test]
async fn openai_client_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_string_contains("gpt-4o-mini"))
        .respond_with(completion(json!("**Quale** organo?")))
        .expect(2)
        .mount(&server)
        .await;

    let output = generate_from_bytes(b"cuore+++++polmoni", "unita.txt", &http_config(&server))
        .await
        .unwrap();

    assert_eq!(output.stats.generated, 2);
    assert_eq!(output.artifact.entries[0].text, "Quale organo?");
}

#[tokio::test]
async fn openai_null_content_is_omitted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("SALTA"))
        .respond_with(completion(serde_json::Value::Null))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(completion(json!("ok")))
        .mount(&server)
        .await;

    let output = generate_from_bytes(b"uno+++++SALTA+++++tre", "unita.txt", &http_config(&server))
        .await
        .unwrap();

    assert_eq!(output.stats.omitted, 1);
    assert!(matches!(
        output.omissions().next().map(|o| &o.error),
        Some(SegmentError::UnrecognizedResponse { segment: 2, .. })
    ));
    let positions: Vec<_> = output.artifact.entries.iter().map(|e| e.position).collect();
    assert_eq!(positions, vec![1, 2]);
}

#[tokio::test]
async fn openai_http_error_is_segment_local() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" }
        })))
        .mount(&server)
        .await;

    let output = generate_from_bytes(b"uno", "unita.txt", &http_config(&server))
        .await
        .unwrap();

    match &output.results[0] {
        GenerationResult::Omitted(o) => match &o.error {
            SegmentError::GenerationFailed { detail, .. } => {
                assert!(detail.contains("401"), "{detail}");
                assert!(detail.contains("Incorrect API key"), "{detail}");
            }
            other => panic!("expected GenerationFailed, got {other:?}"),
        },
        other => panic!("expected omission, got {other:?}"),
    }
    assert!(output.artifact.entries.is_empty());
}
