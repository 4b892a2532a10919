//! APIクライアントのテスト
//!
//! ローカルに1リクエストだけ応答するHTTPサーバーを立てて検証する

use mls_compare::api::{ApiClient, ReportBackend};
use mls_compare::error::MlsCompareError;
use mls_compare_common::ManualPropertyInput;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// 1リクエストを受けて固定レスポンスを返す。ハンドルは受信したリクエスト全体
async fn serve_once(status: &'static str, content_type: &'static str, body: Vec<u8>) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;

        let head = format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            content_type,
            body.len()
        );
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(&body).await.unwrap();
        socket.shutdown().await.unwrap();
        request
    });

    (format!("http://{}", addr), handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length = head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    String::from_utf8_lossy(&buf).to_string()
}

fn client(base_url: &str, token: Option<&str>) -> ApiClient {
    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    ApiClient::with_http(http, base_url, token.map(str::to_string))
}

fn json_body(value: serde_json::Value) -> Vec<u8> {
    value.to_string().into_bytes()
}

#[tokio::test]
async fn test_bearer_token_sent_when_configured() {
    let (url, server) = serve_once("200 OK", "application/json", json_body(serde_json::json!({ "files": [] }))).await;

    let listing = client(&url, Some("secret-token")).list_files().await.unwrap();
    let request = server.await.unwrap();

    assert_eq!(listing["files"], serde_json::json!([]));
    assert!(request.starts_with("GET /files HTTP/1.1"));
    assert!(request.to_lowercase().contains("authorization: bearer secret-token"));
}

#[tokio::test]
async fn test_no_authorization_header_without_token() {
    let (url, server) = serve_once("200 OK", "application/json", json_body(serde_json::json!({}))).await;

    client(&url, None).list_files().await.unwrap();
    let request = server.await.unwrap();

    assert!(!request.to_lowercase().contains("authorization:"));
}

#[tokio::test]
async fn test_generate_report_query_parameters() {
    let body = serde_json::json!({
        "success": true,
        "message": "Report generated",
        "report_id": "rpt_42",
        "report_url": "/download-report/rpt_42",
        "report_data": {
            "property_comparison": {},
            "price_analysis": {},
            "appraisal_report": ["Line one"]
        },
        "graphs_generated": ["chart.png"]
    });
    let (url, server) = serve_once("200 OK", "application/json", json_body(body)).await;

    let ids = vec!["comp_1".to_string(), "comp_2".to_string()];
    let response = client(&url, None).generate_report("input_1", &ids).await.unwrap();
    let request = server.await.unwrap();

    assert!(request.starts_with("GET /generate-report?"));
    assert!(request.contains("input_file=input_1"));
    assert!(request.contains("comparison_files=comp_1%2Ccomp_2"));
    assert!(response.success);
    assert_eq!(response.report_id, "rpt_42");
    assert_eq!(response.report_data.appraisal_report, vec!["Line one"]);
}

#[tokio::test]
async fn test_manual_report_sends_camel_case_json() {
    let body = serde_json::json!({ "success": true, "message": "", "report_id": "rpt_m" });
    let (url, server) = serve_once("200 OK", "application/json", json_body(body)).await;

    let manual = ManualPropertyInput {
        address: "12 Oak St".into(),
        living_sq_ft: "2500".into(),
        list_price: "450000".into(),
        ..Default::default()
    };
    let response = client(&url, None)
        .generate_report_manual(&manual, &["comp_1".to_string()])
        .await
        .unwrap();
    let request = server.await.unwrap();

    assert!(request.starts_with("POST /generate-report-manual?comparison_files=comp_1 HTTP/1.1"));
    assert!(request.contains("\"livingSqFt\":\"2500\""));
    assert!(request.contains("\"isRental\":false"));
    assert_eq!(response.report_id, "rpt_m");
}

#[tokio::test]
async fn test_error_detail_becomes_message() {
    let body = json_body(serde_json::json!({ "detail": "Report not found" }));
    let (url, server) = serve_once("404 Not Found", "application/json", body).await;

    let err = client(&url, None).download_report("missing").await.unwrap_err();
    let request = server.await.unwrap();

    assert!(request.starts_with("GET /download-report/missing HTTP/1.1"));
    match err {
        MlsCompareError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Report not found");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_error_without_detail_uses_generic_message() {
    let (url, server) = serve_once("500 Internal Server Error", "text/plain", b"boom".to_vec()).await;

    let err = client(&url, None).download_report("rpt_1").await.unwrap_err();
    server.await.unwrap();

    assert_eq!(err.to_string(), "Download failed");
}

#[tokio::test]
async fn test_non_string_detail_uses_generic_message() {
    let body = json_body(serde_json::json!({ "detail": [{ "loc": ["query"], "msg": "field required" }] }));
    let (url, server) = serve_once("422 Unprocessable Entity", "application/json", body).await;

    let err = client(&url, None).list_files().await.unwrap_err();
    server.await.unwrap();

    assert_eq!(err.user_message("unused"), "Failed to list files");
}

#[tokio::test]
async fn test_download_returns_bytes() {
    let (url, server) = serve_once("200 OK", "application/pdf", b"%PDF-1.4 data".to_vec()).await;

    let bytes = client(&url, Some("t")).download_report("rpt_1").await.unwrap();
    server.await.unwrap();

    assert_eq!(bytes, b"%PDF-1.4 data");
}

#[tokio::test]
async fn test_delete_file() {
    let body = json_body(serde_json::json!({ "success": true, "message": "File deleted" }));
    let (url, server) = serve_once("200 OK", "application/json", body).await;

    let response = client(&url, None).delete_file("comp_1").await.unwrap();
    let request = server.await.unwrap();

    assert!(request.starts_with("DELETE /files/comp_1 HTTP/1.1"));
    assert!(response.success);
    assert_eq!(response.message, "File deleted");
}

#[tokio::test]
async fn test_file_id_is_escaped_in_path() {
    let body = json_body(serde_json::json!({ "success": true, "message": "File deleted" }));
    let (url, server) = serve_once("200 OK", "application/json", body).await;

    client(&url, None).delete_file("comp 1/x?y").await.unwrap();
    let request = server.await.unwrap();

    assert!(request.starts_with("DELETE /files/comp%201%2Fx%3Fy HTTP/1.1"));
}
