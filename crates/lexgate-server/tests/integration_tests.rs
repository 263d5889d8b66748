//! Integration tests for the lexgate server

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use lexgate_domain::MockBackend;
use lexgate_server::{
    artifacts::ArtifactStore,
    config::ServerConfig,
    handlers::{create_router, AppState, HealthResponse, VersionResponse},
};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt; // for oneshot

/// Router plus the handles tests inspect
struct TestApp {
    app: Router,
    backend: MockBackend,
    artifacts: TempDir,
}

impl TestApp {
    fn new(config: ServerConfig, backend: MockBackend) -> Self {
        let artifacts = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(artifacts.path().join("artifacts")).unwrap();
        let state = AppState::new(config, Arc::new(backend.clone()), store);
        Self {
            app: create_router(state),
            backend,
            artifacts,
        }
    }

    /// Server-held credential configured, smoke-test mode off
    fn with_server_key() -> Self {
        Self::new(
            ServerConfig {
                client_api_key: Some("server-key".to_string()),
                ..Default::default()
            },
            MockBackend::new(),
        )
    }

    fn root(&self) -> std::path::PathBuf {
        std::fs::canonicalize(self.artifacts.path().join("artifacts")).unwrap()
    }

    async fn post(&self, uri: &str, body: Value, headers: &[(&str, &str)]) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, json_body(response).await)
    }

    async fn get(&self, uri: &str) -> axum::response::Response {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn get_report(&self, path: &str) -> StatusCode {
        let uri = format!("/artifacts/html?path={}", encode_query(path));
        self.get(&uri).await.status()
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

fn encode_query(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect()
}

fn body_with(text: Value) -> Value {
    json!({
        "text_or_documents": text,
        "prompt_description": "Extract the first word.",
        "examples": [{
            "text": "Alice met Bob.",
            "extractions": [{"extraction_class": "token", "extraction_text": "Alice"}]
        }]
    })
}

#[tokio::test]
async fn test_single_string_returns_object() {
    let t = TestApp::with_server_key();
    let (status, body) = t.post("/extract", body_with(json!("Alice met Bob")), &[]).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].is_object());
    assert_eq!(body["data"]["text"], "Alice met Bob");
    assert_eq!(body["data"]["extractions"][0]["extraction_text"], "Alice");
    assert_eq!(body["data"]["extractions"][0]["alignment_status"], "match_exact");
}

#[tokio::test]
async fn test_list_returns_array_in_order() {
    let t = TestApp::with_server_key();
    let docs = json!(["one a", "two b", "three c"]);
    let (status, body) = t.post("/extract", body_with(docs), &[]).await;

    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 3);
    assert_eq!(data[0]["text"], "one a");
    assert_eq!(data[1]["text"], "two b");
    assert_eq!(data[2]["text"], "three c");
    assert_eq!(t.backend.call_count(), 3);
}

#[tokio::test]
async fn test_single_element_list_stays_array() {
    let t = TestApp::with_server_key();
    let (_, body) = t.post("/extract", body_with(json!(["only"])), &[]).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_optional_knobs_forwarded_exactly() {
    let t = TestApp::with_server_key();

    t.post("/extract", body_with(json!("x")), &[]).await;
    let mut explicit = body_with(json!("y"));
    explicit["extraction_passes"] = json!(0);
    explicit["max_workers"] = json!(3);
    explicit["model_id"] = json!("ollama/llama3");
    t.post("/extract", explicit, &[]).await;

    let calls = t.backend.calls();
    let omitted = &calls[0].1;
    assert_eq!(omitted.extraction_passes, None);
    assert_eq!(omitted.max_workers, None);
    assert_eq!(omitted.max_char_buffer, None);
    assert_eq!(omitted.model_id, "gemini-2.5-flash");

    let given = &calls[1].1;
    assert_eq!(given.extraction_passes, Some(0));
    assert_eq!(given.max_workers, Some(3));
    assert_eq!(given.max_char_buffer, None);
    assert_eq!(given.model_id, "ollama/llama3");
}

#[tokio::test]
async fn test_missing_credential_is_401_without_engine_call() {
    let t = TestApp::new(ServerConfig::default(), MockBackend::new());
    let (status, body) = t.post("/extract", body_with(json!("x")), &[]).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("API key"));
    assert_eq!(t.backend.call_count(), 0);

    let (status, _) = t.post("/visualize", body_with(json!("x")), &[]).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(t.backend.call_count(), 0);
}

#[tokio::test]
async fn test_credential_precedence() {
    let t = TestApp::with_server_key();

    let mut inline = body_with(json!("a"));
    inline["api_key"] = json!("body-key");
    t.post("/extract", inline, &[("x-api-key", "header-key")]).await;
    t.post("/extract", body_with(json!("b")), &[("x-api-key", "header-key")])
        .await;
    t.post(
        "/extract",
        body_with(json!("c")),
        &[("x-provider-api-key", "alias-key"), ("x-api-key", "header-key")],
    )
    .await;
    t.post(
        "/extract",
        body_with(json!("d")),
        &[("x-provider-api-key", "alias-key")],
    )
    .await;
    t.post("/extract", body_with(json!("e")), &[]).await;

    let keys: Vec<_> = t
        .backend
        .calls()
        .into_iter()
        .map(|(_, params)| params.api_key)
        .collect();
    assert_eq!(
        keys,
        vec![
            Some("body-key".to_string()),
            Some("header-key".to_string()),
            Some("header-key".to_string()),
            Some("alias-key".to_string()),
            Some("server-key".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_debug_controls_internal_fields() {
    let t = TestApp::with_server_key();

    let (_, with_debug) = t.post("/extract", body_with(json!("Alice")), &[]).await;
    assert!(with_debug["data"].get("_trace").is_some());

    let mut quiet = body_with(json!("Alice"));
    quiet["debug"] = json!(false);
    let (_, without_debug) = t.post("/extract", quiet, &[]).await;
    assert!(without_debug["data"].get("_trace").is_none());
    assert!(!without_debug.to_string().contains("\"_"));
}

#[tokio::test]
async fn test_validation_errors_are_422() {
    let t = TestApp::with_server_key();

    let cases = [
        json!({"prompt_description": "p"}),
        json!({"text_or_documents": 5, "prompt_description": "p"}),
        json!({"text_or_documents": "x", "prompt_description": "p", "max_workers": "many"}),
        body_with(json!([])),
    ];
    for case in cases {
        let (status, body) = t.post("/extract", case.clone(), &[]).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", case);
        assert!(body["error"].is_string());
    }

    let request = Request::builder()
        .method("POST")
        .uri("/extract")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(t.backend.call_count(), 0);
}

#[tokio::test]
async fn test_missing_examples_rejected_unless_smoke_test() {
    let no_examples = json!({"text_or_documents": "Alice", "prompt_description": "p"});

    let strict = TestApp::with_server_key();
    let (status, _) = strict.post("/extract", no_examples.clone(), &[]).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(strict.backend.call_count(), 0);

    let smoke = TestApp::new(
        ServerConfig {
            allow_missing_credentials: true,
            ..Default::default()
        },
        MockBackend::new(),
    );
    let (status, _) = smoke.post("/extract", no_examples, &[]).await;
    assert_eq!(status, StatusCode::OK);
    let calls = smoke.backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1.api_key, None);
    assert!(calls[0].1.examples.is_empty());
}

#[tokio::test]
async fn test_upstream_failure_is_502() {
    let t = TestApp::new(
        ServerConfig {
            client_api_key: Some("k".to_string()),
            ..Default::default()
        },
        MockBackend::new().with_failure("Model 'gemini-2.5-flash' rejected the key"),
    );
    let (status, body) = t.post("/extract", body_with(json!(["a", "b"])), &[]).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Model 'gemini-2.5-flash' rejected the key");
    assert_eq!(t.backend.call_count(), 1);
}

#[tokio::test]
async fn test_visualize_writes_three_paths() {
    let t = TestApp::with_server_key();

    let (status, first) = t.post("/visualize", body_with(json!(["a b", "c d"])), &[]).await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = t.post("/visualize", body_with(json!("e f")), &[]).await;

    for key in ["run_dir", "jsonl", "html"] {
        let path = Path::new(first[key].as_str().unwrap());
        assert!(path.is_absolute());
        assert!(path.exists(), "{} missing", key);
        assert!(path.starts_with(t.root()));
    }
    assert_ne!(first["run_dir"], second["run_dir"]);

    let jsonl = std::fs::read_to_string(first["jsonl"].as_str().unwrap()).unwrap();
    let lines: Vec<Value> = jsonl
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["text"], "a b");
    assert_eq!(lines[1]["text"], "c d");
}

#[tokio::test]
async fn test_visualize_artifacts_match_extract_debug_setting() {
    let t = TestApp::new(
        ServerConfig {
            client_api_key: Some("server-key".to_string()),
            ..Default::default()
        },
        MockBackend::new().with_native_save(true),
    );

    let mut quiet = body_with(json!("Alice"));
    quiet["debug"] = json!(false);
    let (status, run) = t.post("/visualize", quiet, &[]).await;
    assert_eq!(status, StatusCode::OK);
    let jsonl = std::fs::read_to_string(run["jsonl"].as_str().unwrap()).unwrap();
    assert!(!jsonl.contains("\"_"), "{}", jsonl);

    let (_, traced) = t.post("/visualize", body_with(json!("Alice")), &[]).await;
    let jsonl = std::fs::read_to_string(traced["jsonl"].as_str().unwrap()).unwrap();
    assert!(jsonl.contains("\"_trace\":{"));
}

#[tokio::test]
async fn test_null_debug_uses_configured_engine_default() {
    let mut config = ServerConfig {
        client_api_key: Some("server-key".to_string()),
        ..Default::default()
    };
    config.extractor.debug = true;
    let t = TestApp::new(config, MockBackend::new());

    let mut body = body_with(json!("Alice"));
    body["debug"] = Value::Null;
    let (status, response) = t.post("/extract", body, &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response["data"].get("_trace").is_some());
    assert_eq!(t.backend.calls()[0].1.debug, None);
}

#[tokio::test]
async fn test_visualize_report_can_be_served() {
    let t = TestApp::with_server_key();
    let (_, run) = t.post("/visualize", body_with(json!("Alice")), &[]).await;
    let html_path = run["html"].as_str().unwrap();

    let response = t
        .get(&format!("/artifacts/html?path={}", encode_query(html_path)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
}

#[tokio::test]
async fn test_artifact_paths_outside_root_rejected() {
    let t = TestApp::with_server_key();
    let root = t.root();
    let base = root.parent().unwrap();

    let sibling = base.join("artifacts-other");
    std::fs::create_dir(&sibling).unwrap();
    std::fs::write(sibling.join("report.html"), "<html>secret</html>").unwrap();
    std::fs::write(base.join("outside.html"), "<html>secret</html>").unwrap();

    let attempts = [
        format!("{}/../outside.html", root.display()),
        format!("{}/../artifacts-other/report.html", root.display()),
        sibling.join("report.html").display().to_string(),
        base.join("outside.html").display().to_string(),
        format!("{}/../does-not-exist.html", root.display()),
        "../outside.html".to_string(),
    ];
    for path in &attempts {
        assert_eq!(t.get_report(path).await, StatusCode::BAD_REQUEST, "{}", path);
    }

    #[cfg(unix)]
    {
        let link = root.join("escape.html");
        std::os::unix::fs::symlink(base.join("outside.html"), &link).unwrap();
        assert_eq!(
            t.get_report(&link.display().to_string()).await,
            StatusCode::BAD_REQUEST
        );
    }
}

#[tokio::test]
async fn test_artifact_missing_or_not_html_is_404() {
    let t = TestApp::with_server_key();
    let root = t.root();
    std::fs::write(root.join("notes.txt"), "plain").unwrap();

    assert_eq!(
        t.get_report(&root.join("nope.html").display().to_string()).await,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        t.get_report(&root.join("notes.txt").display().to_string()).await,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_health_endpoint() {
    let t = TestApp::with_server_key();
    let response = t.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let health: HealthResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(health.status, "ok");
    assert!(chrono::DateTime::parse_from_rfc3339(&health.time).is_ok());
}

#[tokio::test]
async fn test_version_endpoint() {
    let t = TestApp::new(
        ServerConfig {
            model_id: "ollama/llama3".to_string(),
            client_api_key: Some("never-shown".to_string()),
            ..Default::default()
        },
        MockBackend::new(),
    );
    let response = t.get("/version").await;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(!String::from_utf8_lossy(&bytes).contains("never-shown"));

    let version: VersionResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(version.app, "lexgate");
    assert_eq!(version.model_default, "ollama/llama3");
    assert_eq!(version.artifacts_dir, t.root().display().to_string());
    assert!(!version.allow_missing_credentials);
}
