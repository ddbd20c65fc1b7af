//! End-to-end tests of the signing service over in-memory request bodies.

use std::future::Future;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::service::Service;
use restsign_auth::compute_signature;
use restsign_core::SharedSecret;
use restsign_http::{EchoHandler, SignHttpConfig, SignHttpService, SigningPolicy};

const SECRET: &str = "k";

fn service() -> SignHttpService<EchoHandler> {
    let config = SignHttpConfig {
        secret: Some(SharedSecret::from(SECRET)),
        policy: SigningPolicy::new(false).require("/orders").require("/upload"),
        server_name: "node-1".to_owned(),
        ..SignHttpConfig::default()
    };
    SignHttpService::new(EchoHandler, config)
}

fn sign(canonical: &str) -> String {
    compute_signature(&SharedSecret::from(SECRET), canonical)
}

async fn send(
    service: &SignHttpService<EchoHandler>,
    request: http::Request<Full<Bytes>>,
) -> (http::StatusCode, http::HeaderMap, Bytes) {
    let response = service.call(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, body)
}

#[tokio::test]
async fn test_should_accept_correctly_signed_get() {
    let signature = sign("GET$http://host/orders?status=open$x-client$abc$");
    let request = http::Request::get("http://host/orders?status=open")
        .header("x-client", "abc")
        .header("hisv", signature)
        .body(Full::new(Bytes::new()))
        .unwrap();

    let (status, headers, body) = send(&service(), request).await;
    assert_eq!(status, http::StatusCode::OK);
    assert_eq!(headers.get("rest-server").unwrap(), "node-1");

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["path"], "/orders");
}

#[tokio::test]
async fn test_should_pin_wire_signature_for_lowercase_header() {
    let request = http::Request::get("http://host/orders?status=open")
        .header("X-Client", "abc")
        .header("hisv", "T/qGZaUHRk5x+ur/DOkC4RT8FgnaB8r+uCs6dSAUFD4=")
        .body(Full::new(Bytes::new()))
        .unwrap();

    let (status, _, _) = send(&service(), request).await;
    assert_eq!(status, http::StatusCode::OK);
}

#[tokio::test]
async fn test_should_reject_missing_signature_with_416() {
    let request = http::Request::get("http://host/orders")
        .body(Full::new(Bytes::new()))
        .unwrap();

    let (status, headers, body) = send(&service(), request).await;
    assert_eq!(status, http::StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(body.as_ref(), b"signature missed");
    assert!(
        headers
            .get(http::header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
}

#[tokio::test]
async fn test_should_reject_wrong_signature_with_416() {
    let request = http::Request::get("http://host/orders")
        .header("hisv", "AAAA")
        .body(Full::new(Bytes::new()))
        .unwrap();

    let (status, _, body) = send(&service(), request).await;
    assert_eq!(status, http::StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(body.as_ref(), b"invalid signature");
}

#[tokio::test]
async fn test_should_reject_tampered_parameter() {
    let signature = sign("GET$http://host/orders?status=open$");
    let request = http::Request::get("http://host/orders?status=closed")
        .header("hisv", signature)
        .body(Full::new(Bytes::new()))
        .unwrap();

    let (status, _, _) = send(&service(), request).await;
    assert_eq!(status, http::StatusCode::RANGE_NOT_SATISFIABLE);
}

#[tokio::test]
async fn test_should_accept_signed_json_post() {
    let signature = sign(r#"POST$http://host/orders$_json${"id":1}$"#);
    let request = http::Request::post("http://host/orders")
        .header("content-type", "application/json")
        .header("hisv", signature)
        .body(Full::new(Bytes::from(r#"{"id":1}"#)))
        .unwrap();

    let (status, _, body) = send(&service(), request).await;
    assert_eq!(status, http::StatusCode::OK);

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["body"], r#"{"id":1}"#);
}

#[tokio::test]
async fn test_should_skip_query_params_repeated_in_form_body() {
    let signature = sign("POST$http://host/orders?a=1$b$2$");
    let request = http::Request::post("http://host/orders?a=1")
        .header("content-type", "application/x-www-form-urlencoded")
        .header("hisv", signature)
        .body(Full::new(Bytes::from("b=2&a=1")))
        .unwrap();

    let (status, _, _) = send(&service(), request).await;
    assert_eq!(status, http::StatusCode::OK);
}

#[tokio::test]
async fn test_should_accept_signed_multipart_upload() {
    let body = "--xyz\r\n\
         Content-Disposition: form-data; name=\"title\"\r\n\
         \r\n\
         t\r\n\
         --xyz\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\
         Content-Type: text/plain\r\n\
         \r\n\
         hello\r\n\
         --xyz\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"b.txt\"\r\n\
         Content-Type: text/plain\r\n\
         \r\n\
         world\r\n\
         --xyz--\r\n";
    let signature = sign(
        "POST$http://host/upload$file$XUFAKrxLKna5cZ2REBfFkg==$fXkwN6B2AYZXSwKC8vQ15w==$title$t$",
    );
    let request = http::Request::post("http://host/upload")
        .header("content-type", "multipart/form-data; boundary=xyz")
        .header("hisv", signature)
        .body(Full::new(Bytes::from(body)))
        .unwrap();

    let (status, _, _) = send(&service(), request).await;
    assert_eq!(status, http::StatusCode::OK);
}

#[tokio::test]
async fn test_should_reject_malformed_multipart_with_400() {
    let request = http::Request::post("http://host/upload")
        .header("content-type", "multipart/form-data; boundary=xyz")
        .header("hisv", "AAAA")
        .body(Full::new(Bytes::from("not a multipart body")))
        .unwrap();

    let (status, _, body) = send(&service(), request).await;
    assert_eq!(status, http::StatusCode::BAD_REQUEST);
    assert_eq!(body.as_ref(), b"malformed multipart file");
}

#[tokio::test]
async fn test_should_pass_unsigned_request_on_exempt_route() {
    let request = http::Request::get("http://host/public/info")
        .body(Full::new(Bytes::new()))
        .unwrap();

    let (status, _, _) = send(&service(), request).await;
    assert_eq!(status, http::StatusCode::OK);
}

#[tokio::test]
async fn test_should_echo_caller_trace_id_and_sign_it() {
    let signature = sign("GET$http://host/orders$hici$t-1$");
    let request = http::Request::get("http://host/orders")
        .header("hici", "t-1")
        .header("hisv", signature)
        .body(Full::new(Bytes::new()))
        .unwrap();

    let (status, headers, _) = send(&service(), request).await;
    assert_eq!(status, http::StatusCode::OK);
    assert_eq!(headers.get("hici").unwrap(), "t-1");
}

#[tokio::test]
async fn test_should_generate_trace_id_on_rejection() {
    let request = http::Request::get("http://host/orders")
        .body(Full::new(Bytes::new()))
        .unwrap();

    let (_, headers, _) = send(&service(), request).await;
    let trace_id = headers.get("hici").unwrap().to_str().unwrap();
    assert_eq!(trace_id.len(), 36);
}

#[tokio::test]
async fn test_should_answer_health_check_without_signature() {
    let request = http::Request::get("http://host/health")
        .body(Full::new(Bytes::new()))
        .unwrap();

    let (status, _, body) = send(&service(), request).await;
    assert_eq!(status, http::StatusCode::OK);

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "running");
}

#[tokio::test]
async fn test_should_honor_configured_signature_header_and_delimiter() {
    let global = restsign_core::RestSignConfig {
        secret: Some(SharedSecret::from(SECRET)),
        signature_header: "x-sign".to_owned(),
        delimiter: '|',
        sign_default: true,
        ..restsign_core::RestSignConfig::default()
    };
    let service = SignHttpService::new(EchoHandler, SignHttpConfig::from_config(&global));

    let signature = sign("GET|http://host/any|");
    let request = http::Request::get("http://host/any")
        .header("x-sign", signature)
        .body(Full::new(Bytes::new()))
        .unwrap();

    let (status, _, _) = send(&service, request).await;
    assert_eq!(status, http::StatusCode::OK);
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Run `scenario` under a formatting subscriber capped at `level` and return
/// everything it wrote.
fn capture_logs(level: tracing::Level, scenario: impl Future<Output = ()>) -> String {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(level)
        .finish();

    tracing::subscriber::with_default(subscriber, || tokio_test::block_on(scenario));
    logs.contents()
}

fn malformed_upload(path: &str) -> http::Request<Full<Bytes>> {
    http::Request::post(format!("http://host{path}"))
        .header("content-type", "multipart/form-data; boundary=xyz")
        .body(Full::new(Bytes::from("not a multipart body")))
        .unwrap()
}

#[test]
fn test_should_audit_exempt_route_with_abbreviated_canonical_string() {
    let long = "a".repeat(150);
    let logs = capture_logs(tracing::Level::INFO, async {
        let request = http::Request::get("http://host/public/info")
            .header("x-note", long.as_str())
            .header("hici", "t-9")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let (status, _, _) = send(&service(), request).await;
        assert_eq!(status, http::StatusCode::OK);
    });

    let request_line = logs
        .lines()
        .find(|line| line.contains("canonical="))
        .expect("request audit line");
    assert!(request_line.contains("restsign::audit"));
    assert!(request_line.contains("trace_id=t-9"));
    assert!(request_line.contains(&format!(
        "GET$http://host/public/info$x-note${}...$hici$t-9$",
        "a".repeat(97)
    )));
    assert!(request_line.contains("(empty)"));
    assert!(!logs.contains(&long));

    let response_line = logs
        .lines()
        .find(|line| line.contains("status=200"))
        .expect("response audit line");
    assert!(response_line.contains("restsign::audit"));
    assert!(response_line.contains("trace_id=t-9"));
    assert!(response_line.contains("elapsed_ms="));
    assert!(
        response_line.contains("headers=hici=t-9&rest-server=node-1&Content-Type=application/json")
    );
    assert!(!logs.contains("signature verified"));
}

#[test]
fn test_should_audit_verification_without_logging_sign_string() {
    let long = "b".repeat(150);
    let signature = sign(&format!("GET$http://host/orders$x-note${long}$"));
    let logs = capture_logs(tracing::Level::INFO, async {
        let request = http::Request::get("http://host/orders")
            .header("x-note", long.as_str())
            .header("hisv", signature.as_str())
            .body(Full::new(Bytes::new()))
            .unwrap();
        let (status, _, _) = send(&service(), request).await;
        assert_eq!(status, http::StatusCode::OK);
    });

    assert!(logs.contains("signature verified"));
    assert!(logs.contains("reason=OK"));
    assert!(logs.contains(&format!("x-note${}...$", "b".repeat(97))));
    assert!(!logs.contains(&long));
}

#[test]
fn test_should_audit_rejection_with_reason() {
    let logs = capture_logs(tracing::Level::INFO, async {
        let request = http::Request::get("http://host/orders")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let (status, _, _) = send(&service(), request).await;
        assert_eq!(status, http::StatusCode::RANGE_NOT_SATISFIABLE);
    });

    assert!(logs.contains("signature rejected"));
    assert!(logs.contains("reason=MISSING"));
    assert!(logs.contains("status=416"));
}

#[test]
fn test_should_canonicalize_exempt_route_only_when_audit_enabled() {
    let logs = capture_logs(tracing::Level::WARN, async {
        let (status, _, _) = send(&service(), malformed_upload("/public/upload")).await;
        assert_eq!(status, http::StatusCode::OK);
    });
    assert!(!logs.contains("restsign::audit"));

    let logs = capture_logs(tracing::Level::INFO, async {
        let (status, _, body) = send(&service(), malformed_upload("/public/upload")).await;
        assert_eq!(status, http::StatusCode::BAD_REQUEST);
        assert_eq!(body.as_ref(), b"malformed multipart file");
    });
    assert!(logs.contains("status=400"));
}
