//! Integration tests for the data export client against a mock MDM API.

use domain::services::{
    build_export_request, DownloadTarget, DownloadedContent, ExportGateway, ExportRequestInput,
};
use domain::GatewayError;
use mdm_client::{DataExportClient, MdmClientConfig};
use serde_json::json;
use shared::TenantCrn;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CRN: &str = "crn:v1:bluemix:public:mdm:us-south:a/123:tenant-1::";

fn crn() -> TenantCrn {
    CRN.parse().unwrap()
}

fn client(server: &MockServer) -> DataExportClient {
    let mut config = MdmClientConfig::new(server.uri());
    config.api_key = Some("test-key".to_string());
    config.retry_backoff_ms = 1;
    config.max_retries = 2;
    DataExportClient::new(config).unwrap()
}

#[tokio::test]
async fn test_create_export_splits_body_and_query() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/data_exports"))
        .and(query_param("crn", CRN))
        .and(query_param("compression_type", "zip"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_json(json!({
            "export_type": "entity",
            "format": "csv",
            "search_criteria": {
                "search_type": "entity",
                "query": {
                    "operation": "and",
                    "expressions": [{"value": "*"}]
                },
                "filters": [{"type": "entity"}]
            }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-transaction-id", "tx-123")
                .set_body_json(json!({
                    "job_id": "23863905037872091",
                    "job_type": "export",
                    "status": "queued",
                    "export_type": "entity",
                    "process_ids": []
                })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = build_export_request(&ExportRequestInput::default()).unwrap();
    let job = client(&server)
        .create_export(&crn(), &request)
        .await
        .unwrap();

    assert_eq!(job.job_id, "23863905037872091");
    assert_eq!(job.status, "queued");

    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert!(body.get("compression_type").is_none());
    assert!(body.get("compression").is_none());
}

#[tokio::test]
async fn test_create_without_compression_omits_query_param() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/data_exports"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"job_id": "1", "status": "not_started"})),
        )
        .mount(&server)
        .await;

    let request = build_export_request(&ExportRequestInput {
        compression: domain::models::Compression::None,
        ..Default::default()
    })
    .unwrap();
    client(&server)
        .create_export(&crn(), &request)
        .await
        .unwrap();

    let received = server.received_requests().await.unwrap();
    let keys: Vec<String> = received[0]
        .url
        .query_pairs()
        .map(|(key, _)| key.into_owned())
        .collect();
    assert_eq!(keys, vec!["crn".to_string()]);
}

#[tokio::test]
async fn test_create_failure_preserves_body_and_is_not_retried() {
    let server = MockServer::start().await;
    let remote_body = r#"{"errors":[{"code":"invalid_search_criteria","message":"Filter type unknown"}]}"#;

    Mock::given(method("POST"))
        .and(path("/data_exports"))
        .respond_with(ResponseTemplate::new(503).set_body_string(remote_body))
        .expect(1)
        .mount(&server)
        .await;

    let request = build_export_request(&ExportRequestInput::default()).unwrap();
    let err = client(&server)
        .create_export(&crn(), &request)
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(503));
    assert_eq!(err.response_body(), Some(remote_body));
    assert!(err.to_string().starts_with("503 Service Unavailable for url: "));
}

#[tokio::test]
async fn test_get_export_retries_transient_failures() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data_exports/42"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data_exports/42"))
        .and(query_param("crn", CRN))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "status": "running",
            "start_time": "2025-01-10T10:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let job = client(&server).get_export(&crn(), "42").await.unwrap();
    assert_eq!(job.job_id, "42");
    assert_eq!(job.status, "running");
}

#[tokio::test]
async fn test_get_export_client_error_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data_exports/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_string(r#"{"message":"export not found"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .get_export(&crn(), "missing")
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(404));
    assert_eq!(err.response_body(), Some(r#"{"message":"export not found"}"#));
}

#[tokio::test]
async fn test_get_export_gives_up_after_max_retries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data_exports/42"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(3)
        .mount(&server)
        .await;

    let err = client(&server).get_export(&crn(), "42").await.unwrap_err();
    assert_eq!(err.status_code(), Some(502));
    assert_eq!(err.response_body(), Some("bad gateway"));
}

#[tokio::test]
async fn test_get_export_invalid_json_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data_exports/42"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client(&server).get_export(&crn(), "42").await.unwrap_err();
    assert!(matches!(err, GatewayError::Decode(_)));
}

#[tokio::test]
async fn test_network_failure_is_reported() {
    let mut config = MdmClientConfig::new("http://127.0.0.1:1");
    config.max_retries = 0;
    let client = DataExportClient::new(config).unwrap();

    let err = client.get_export(&crn(), "42").await.unwrap_err();
    assert!(matches!(err, GatewayError::Network(_)));
    assert_eq!(err.status_code(), None);
}

#[tokio::test]
async fn test_download_to_memory_uses_disposition_name() {
    let server = MockServer::start().await;
    let payload: Vec<u8> = (0..=255u8).cycle().take(70_000).collect();

    Mock::given(method("GET"))
        .and(path("/data_exports/42/download"))
        .and(query_param("crn", CRN))
        .and(header("accept", "application/octet-stream"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-disposition", r#"attachment; filename="report.csv""#)
                .set_body_raw(payload.clone(), "application/zip"),
        )
        .mount(&server)
        .await;

    let download = client(&server)
        .download_export(&crn(), "42", DownloadTarget::Memory)
        .await
        .unwrap();

    assert_eq!(download.export_id, "42");
    assert_eq!(download.file_name, "report.csv");
    assert_eq!(download.content_type, "application/zip");
    assert_eq!(download.file_size, payload.len() as u64);
    assert_eq!(download.content, DownloadedContent::Memory(payload));
}

#[tokio::test]
async fn test_download_without_disposition_falls_back() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data_exports/42/download"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"a,b\n1,2\n".to_vec(), "text/csv"))
        .mount(&server)
        .await;

    let download = client(&server)
        .download_export(&crn(), "42", DownloadTarget::Memory)
        .await
        .unwrap();
    assert_eq!(download.file_name, "42.csv");
    assert_eq!(download.file_size, 8);
}

#[tokio::test]
async fn test_download_to_disk_streams_file() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let payload = b"id,name\n1,Smith\n2,Jones\n".to_vec();

    Mock::given(method("GET"))
        .and(path("/data_exports/42/download"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-disposition", "attachment; filename=export_42.csv")
                .set_body_raw(payload.clone(), "text/csv"),
        )
        .mount(&server)
        .await;

    let download = client(&server)
        .download_export(
            &crn(),
            "42",
            DownloadTarget::Directory(dir.path().to_path_buf()),
        )
        .await
        .unwrap();

    let expected_path = dir.path().join("export_42.csv");
    assert_eq!(download.file_name, "export_42.csv");
    assert_eq!(download.file_size, payload.len() as u64);
    assert_eq!(download.content, DownloadedContent::Disk(expected_path.clone()));
    assert_eq!(std::fs::read(expected_path).unwrap(), payload);
}

#[tokio::test]
async fn test_download_into_missing_directory_is_io_error() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/data_exports/42/download"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"x".to_vec(), "text/csv"))
        .mount(&server)
        .await;

    let err = client(&server)
        .download_export(
            &crn(),
            "42",
            DownloadTarget::Directory(dir.path().join("does-not-exist")),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Io(_)));
}

#[tokio::test]
async fn test_download_before_ready_surfaces_remote_error() {
    let server = MockServer::start().await;
    let remote_body = r#"{"message":"Export job is still processing"}"#;

    Mock::given(method("GET"))
        .and(path("/data_exports/42/download"))
        .respond_with(ResponseTemplate::new(409).set_body_string(remote_body))
        .mount(&server)
        .await;

    let err = client(&server)
        .download_export(&crn(), "42", DownloadTarget::Memory)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(409));
    assert_eq!(err.response_body(), Some(remote_body));
}
