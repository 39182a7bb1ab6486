//! End-to-end tests: the checker router served on a local port, talking to
//! mock classification and storage services over real HTTP.

mod common;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    routing::post,
    Router,
};
use base64::{engine::general_purpose, Engine as _};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use marmot_checker::server::router;
use marmot_checker::CheckerPipeline;

use common::{jpeg_bytes, label_reply, png_bytes, temp_files_left, test_config, API_KEY};

struct MockServices {
    classify_status: StatusCode,
    classify_reply: String,
    storage_status: StatusCode,
    classify_calls: AtomicUsize,
    api_keys: Mutex<Vec<String>>,
    content_types: Mutex<Vec<String>>,
    payloads: Mutex<Vec<serde_json::Value>>,
    stored: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MockServices {
    fn new(classify_status: StatusCode, classify_reply: String, storage_status: StatusCode) -> Arc<Self> {
        Arc::new(Self {
            classify_status,
            classify_reply,
            storage_status,
            classify_calls: AtomicUsize::new(0),
            api_keys: Mutex::new(Vec::new()),
            content_types: Mutex::new(Vec::new()),
            payloads: Mutex::new(Vec::new()),
            stored: Mutex::new(Vec::new()),
        })
    }

    fn labels(labels: &[&str]) -> Arc<Self> {
        Self::new(StatusCode::OK, label_reply(labels), StatusCode::OK)
    }
}

async fn annotate(
    State(mock): State<Arc<MockServices>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    mock.classify_calls.fetch_add(1, Ordering::SeqCst);
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    mock.content_types.lock().unwrap().push(content_type);
    mock.api_keys
        .lock()
        .unwrap()
        .push(query.get("key").cloned().unwrap_or_default());
    if let Ok(payload) = serde_json::from_slice(&body) {
        mock.payloads.lock().unwrap().push(payload);
    }
    (mock.classify_status, mock.classify_reply.clone())
}

async fn postfile(
    State(mock): State<Arc<MockServices>>,
    Path(filename): Path<String>,
    body: Bytes,
) -> StatusCode {
    mock.stored.lock().unwrap().push((filename, body.to_vec()));
    mock.storage_status
}

async fn spawn(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// An address nothing is listening on.
async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Where the checker sends its outbound calls.
enum Target {
    Mock,
    Unreachable,
}

struct Harness {
    checker: SocketAddr,
    mock: Arc<MockServices>,
    temp_dir: TempDir,
    http: reqwest::Client,
}

impl Harness {
    async fn start(mock: Arc<MockServices>, allow_list: &str, max_upload_bytes: usize) -> Self {
        Self::start_with(mock, allow_list, max_upload_bytes, Target::Mock, Target::Mock).await
    }

    async fn start_with(
        mock: Arc<MockServices>,
        allow_list: &str,
        max_upload_bytes: usize,
        classification: Target,
        storage: Target,
    ) -> Self {
        let services = Router::new()
            .route("/v1/annotate", post(annotate))
            .route("/postfile/:filename", post(postfile))
            .with_state(mock.clone());
        let services_addr = spawn(services).await;
        let dead_addr = closed_addr().await;
        let classification_addr = match classification {
            Target::Mock => services_addr,
            Target::Unreachable => dead_addr,
        };
        let storage_addr = match storage {
            Target::Mock => services_addr,
            Target::Unreachable => dead_addr,
        };

        let temp_dir = tempfile::tempdir().unwrap();
        let config = test_config(
            temp_dir.path(),
            allow_list,
            &format!("http://{}/v1/annotate", classification_addr),
            &storage_addr.to_string(),
            max_upload_bytes,
        );
        let pipeline = Arc::new(CheckerPipeline::from_config(&config).unwrap());
        let checker = spawn(router(pipeline, config.server.max_upload_bytes)).await;

        Self {
            checker,
            mock,
            temp_dir,
            http: reqwest::Client::new(),
        }
    }

    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> (StatusCode, serde_json::Value) {
        let response = self
            .http
            .post(format!("http://{}/postImage/ignored/{}", self.checker, filename))
            .body(bytes)
            .send()
            .await
            .unwrap();
        let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
        let body = response.json().await.unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    fn stored(&self) -> Vec<(String, Vec<u8>)> {
        self.mock.stored.lock().unwrap().clone()
    }

    fn classify_calls(&self) -> usize {
        self.mock.classify_calls.load(Ordering::SeqCst)
    }
}

#[tokio::test]
async fn test_matching_upload_is_stored() {
    let harness = Harness::start(MockServices::labels(&["marmot"]), "marmot,groundhog", 1 << 20).await;
    let image = png_bytes();

    let (status, body) = harness.upload("marmot.png", image.clone()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["forwarded"], true);
    assert_eq!(body["is_match"], true);
    assert_eq!(body["matched"], "marmot");
    assert_eq!(body["descriptors"], serde_json::json!(["marmot"]));
    assert_eq!(body["allow_list"], serde_json::json!(["marmot", "groundhog"]));

    assert_eq!(harness.classify_calls(), 1);
    assert_eq!(*harness.mock.api_keys.lock().unwrap(), vec![API_KEY.to_string()]);
    assert_eq!(
        *harness.mock.content_types.lock().unwrap(),
        vec!["application/json".to_string()]
    );

    let payloads = harness.mock.payloads.lock().unwrap().clone();
    let content = payloads[0]["requests"][0]["image"]["content"].as_str().unwrap();
    assert_eq!(general_purpose::STANDARD.decode(content).unwrap(), image);

    let stored = harness.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0], ("marmot.png".to_string(), image));

    assert_eq!(temp_files_left(harness.temp_dir.path()), 0);
}

#[tokio::test]
async fn test_unmatched_upload_is_not_stored() {
    let harness = Harness::start(MockServices::labels(&["cat"]), "marmot", 1 << 20).await;

    let (status, body) = harness.upload("cat.png", png_bytes()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["forwarded"], false);
    assert_eq!(body["is_match"], false);
    assert!(body["report"].as_str().unwrap().contains("does not match any of [marmot]"));
    assert!(harness.stored().is_empty());
    assert_eq!(temp_files_left(harness.temp_dir.path()), 0);
}

#[tokio::test]
async fn test_jpeg_upload_rejected_without_remote_calls() {
    let harness = Harness::start(MockServices::labels(&["marmot"]), "marmot", 1 << 20).await;

    let (status, body) = harness.upload("marmot.png", jpeg_bytes()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "input");
    assert_eq!(harness.classify_calls(), 0);
    assert!(harness.stored().is_empty());
    assert_eq!(temp_files_left(harness.temp_dir.path()), 0);
}

#[tokio::test]
async fn test_classification_rejection_is_bad_gateway_and_server_keeps_serving() {
    let mock = MockServices::new(
        StatusCode::FORBIDDEN,
        r#"{"error": {"code": 403, "message": "API key not valid"}}"#.to_string(),
        StatusCode::OK,
    );
    let harness = Harness::start(mock, "marmot", 1 << 20).await;

    let (status, body) = harness.upload("marmot.png", png_bytes()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], "remote");
    assert!(!body["error"].as_str().unwrap().contains(API_KEY));

    let (status, _) = harness.upload("marmot.png", png_bytes()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(harness.classify_calls(), 2);

    let health = harness
        .http
        .get(format!("http://{}/health", harness.checker))
        .send()
        .await
        .unwrap();
    assert!(health.status().is_success());
    assert!(harness.stored().is_empty());
    assert_eq!(temp_files_left(harness.temp_dir.path()), 0);
}

#[tokio::test]
async fn test_malformed_classification_reply_is_server_error() {
    let mock = MockServices::new(StatusCode::OK, "<html>oops</html>".to_string(), StatusCode::OK);
    let harness = Harness::start(mock, "marmot", 1 << 20).await;

    let (status, body) = harness.upload("marmot.png", png_bytes()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["kind"], "parse");
    assert!(harness.stored().is_empty());
}

#[tokio::test]
async fn test_storage_failure_is_bad_gateway() {
    let mock = MockServices::new(
        StatusCode::OK,
        label_reply(&["marmot"]),
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    let harness = Harness::start(mock, "marmot", 1 << 20).await;

    let (status, body) = harness.upload("marmot.png", png_bytes()).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], "remote");
    assert_eq!(harness.stored().len(), 1);
    assert_eq!(temp_files_left(harness.temp_dir.path()), 0);
}

#[tokio::test]
async fn test_oversized_upload_rejected() {
    let harness = Harness::start(MockServices::labels(&["marmot"]), "marmot", 64).await;

    let (status, _) = harness.upload("marmot.png", png_bytes()).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(harness.classify_calls(), 0);
}

#[tokio::test]
async fn test_unreachable_classification_service_is_bad_gateway() {
    let harness = Harness::start_with(
        MockServices::labels(&["marmot"]),
        "marmot",
        1 << 20,
        Target::Unreachable,
        Target::Mock,
    )
    .await;

    let (status, body) = harness.upload("marmot.png", png_bytes()).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], "remote");
    assert!(body["error"].as_str().unwrap().starts_with("classification"));
    assert!(!body["error"].as_str().unwrap().contains(API_KEY));
    assert!(harness.stored().is_empty());
    assert_eq!(temp_files_left(harness.temp_dir.path()), 0);
}

#[tokio::test]
async fn test_unreachable_storage_service_is_bad_gateway() {
    let harness = Harness::start_with(
        MockServices::labels(&["marmot"]),
        "marmot",
        1 << 20,
        Target::Mock,
        Target::Unreachable,
    )
    .await;

    let (status, body) = harness.upload("marmot.png", png_bytes()).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], "remote");
    assert!(body["error"].as_str().unwrap().starts_with("storage"));
    assert_eq!(harness.classify_calls(), 1);
    assert_eq!(temp_files_left(harness.temp_dir.path()), 0);
}
