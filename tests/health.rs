mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{As, TestApp};

#[tokio::test]
async fn health_endpoint_reports_db_ok() -> Result<()> {
    let t = TestApp::new().await?;

    // no identity needed
    let (status, body) = t.get("/api/health", As::Anonymous).await?;
    assert_eq!(status, StatusCode::OK, "health endpoint did not return 200");
    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["db_ok"], json!(true), "expected db_ok: true, got: {body}");

    Ok(())
}
