//! KmsClient tests against an in-process mock KMS.
#![allow(clippy::tests_outside_test_module)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use enclave_kms::{AliasEntry, Encryptor, KmsClient, KmsError};
use serde_json::{Value, json};

/// What the mock answers to `TrentService.Encrypt`.
#[derive(Clone, Copy)]
enum EncryptMode {
    Ok,
    Reject,
    Garbage,
}

#[derive(Debug, Clone)]
struct Recorded {
    target: String,
    content_type: String,
    body: Value,
}

#[derive(Clone)]
struct MockState {
    mode: EncryptMode,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

async fn kms_handler(
    State(state): State<MockState>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    let target = header("x-amz-target");
    let body: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    state.requests.lock().unwrap().push(Recorded {
        target: target.clone(),
        content_type: header("content-type"),
        body: body.clone(),
    });

    match target.as_str() {
        "TrentService.Encrypt" => match state.mode {
            EncryptMode::Ok => {
                let plaintext = body["Plaintext"].as_str().unwrap_or_default();
                let reply = json!({
                    "CiphertextBlob": format!("CT:{plaintext}"),
                    "KeyId": "arn:aws:kms:us-east-1:000000000000:key/k1",
                });
                (StatusCode::OK, reply.to_string())
            }
            EncryptMode::Reject => (
                StatusCode::BAD_REQUEST,
                r#"{"__type":"NotFoundException"}"#.to_string(),
            ),
            EncryptMode::Garbage => (StatusCode::OK, "<html>oops</html>".to_string()),
        },
        "TrentService.ListKeys" => (
            StatusCode::OK,
            json!({"Keys": [{"KeyId": "k1"}, {"KeyId": "k2"}]}).to_string(),
        ),
        "TrentService.ListAliases" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "alias listing unavailable".to_string(),
        ),
        _ => (StatusCode::NOT_FOUND, String::new()),
    }
}

struct MockKms {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockKms {
    async fn start(mode: EncryptMode) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            mode,
            requests: requests.clone(),
        };
        let app = Router::new()
            .route("/kms", post(kms_handler))
            .with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self { addr, requests }
    }

    fn client(&self) -> KmsClient {
        KmsClient::new(
            format!("http://{}", self.addr),
            "alias/dev-key",
            Duration::from_secs(10),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

#[tokio::test]
async fn encrypt_sends_base64_plaintext_and_returns_blob() {
    let mock = MockKms::start(EncryptMode::Ok).await;
    let kms = mock.client();

    let ciphertext = kms.encrypt(b"hello").await.unwrap();
    assert_eq!(ciphertext, "CT:aGVsbG8=");

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].target, "TrentService.Encrypt");
    assert_eq!(requests[0].content_type, "application/x-amz-json-1.1");
    assert_eq!(
        requests[0].body,
        json!({"KeyId": "alias/dev-key", "Plaintext": "aGVsbG8="})
    );
}

#[tokio::test]
async fn non_success_status_is_backend_error() {
    let mock = MockKms::start(EncryptMode::Reject).await;
    let err = mock.client().encrypt(b"hello").await.unwrap_err();
    match err {
        KmsError::Backend { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("NotFoundException"));
        }
        other => panic!("expected backend error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_json_is_decode_error() {
    let mock = MockKms::start(EncryptMode::Garbage).await;
    let err = mock.client().encrypt(b"hello").await.unwrap_err();
    assert!(matches!(err, KmsError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_backend_is_http_error() {
    // Bind then drop to get a port nothing listens on.
    let port = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let kms = KmsClient::new(
        format!("http://127.0.0.1:{port}"),
        "alias/dev-key",
        Duration::from_secs(2),
        Duration::from_secs(2),
    )
    .unwrap();
    let err = kms.encrypt(b"hello").await.unwrap_err();
    assert!(matches!(err, KmsError::Http(_)), "got {err:?}");
    assert!(kms.verify_configuration().await.is_err());
}

#[tokio::test]
async fn verify_configuration_tolerates_failed_listing() {
    let mock = MockKms::start(EncryptMode::Ok).await;
    let inventory = mock.client().verify_configuration().await.unwrap();

    assert_eq!(inventory.keys, vec!["k1".to_string(), "k2".to_string()]);
    // ListAliases answered 500: logged, not fatal.
    assert_eq!(inventory.aliases, Vec::<AliasEntry>::new());

    let targets: Vec<String> = mock.requests().into_iter().map(|r| r.target).collect();
    assert_eq!(targets, ["TrentService.ListKeys", "TrentService.ListAliases"]);
    assert!(mock.requests().iter().all(|r| r.body == json!({})));
}

async fn stalled_handler() -> (StatusCode, String) {
    tokio::time::sleep(Duration::from_secs(3)).await;
    (StatusCode::OK, "{}".to_string())
}

#[tokio::test]
async fn slow_backend_is_cut_off_by_client_timeout() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/kms", post(stalled_handler));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let kms = KmsClient::new(
        format!("http://{addr}"),
        "alias/dev-key",
        Duration::from_millis(100),
        Duration::from_millis(100),
    )
    .unwrap();

    let start = Instant::now();
    let err = kms.encrypt(b"hello").await.unwrap_err();
    assert!(matches!(err, KmsError::Http(_)), "got {err:?}");
    assert!(start.elapsed() < Duration::from_secs(2), "{:?}", start.elapsed());

    let start = Instant::now();
    assert!(kms.verify_configuration().await.is_err());
    assert!(start.elapsed() < Duration::from_secs(2), "{:?}", start.elapsed());
}
