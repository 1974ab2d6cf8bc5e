use super::*;
use axum::body::to_bytes;
use tower::ServiceExt;

use crate::state::test_helpers::test_app_state;

fn test_router() -> Router {
    let options = LeptosOptions::builder().output_name("dhan-terminal").build();
    app(test_app_state(), options)
}

async fn get_path(path: &str) -> (StatusCode, String) {
    let response = test_router()
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

fn assert_sidebar(html: &str) {
    for href in ["href=\"/\"", "href=\"/config\"", "href=\"/strategies\"", "href=\"/control\""] {
        assert!(html.contains(href), "missing sidebar link {href}");
    }
    assert!(html.contains("Dhan Algo Terminal"));
}

#[tokio::test]
async fn health_reports_service_name() {
    let (status, body) = get_path("/health").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json, serde_json::json!({ "status": "ok", "service": "dhan-algo-terminal" }));
}

#[tokio::test]
async fn unknown_api_path_is_json_404() {
    let (status, body) = get_path("/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["detail"], "Not Found");
}

#[tokio::test]
async fn available_strategies_need_no_database() {
    let (status, body) = get_path("/api/strategies/available").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    let names: Vec<&str> = json["strategies"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s["name"].as_str())
        .collect();
    assert!(names.contains(&"ema_crossover"));
}

#[tokio::test]
async fn scheduler_status_starts_stopped() {
    let (status, body) = get_path("/api/control/scheduler-status").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json, serde_json::json!({ "running": false, "status": "stopped" }));
}

#[tokio::test]
async fn dashboard_renders_with_sidebar() {
    let (status, html) = get_path("/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("System Status"));
    assert_sidebar(&html);
}

#[tokio::test]
async fn each_view_renders_its_heading() {
    for (path, heading, tagline) in [
        ("/config", "Configuration", "Dhan API Settings"),
        ("/strategies", "Strategies", "Manage Trading Strategies"),
        ("/control", "Controls", "Kill Switch"),
    ] {
        let (status, html) = get_path(path).await;
        assert_eq!(status, StatusCode::OK, "{path}");
        assert!(html.contains(heading), "{path} missing {heading}");
        assert!(html.contains(tagline), "{path} missing {tagline}");
        assert_sidebar(&html);
    }
}

#[tokio::test]
async fn unknown_path_renders_not_found_with_sidebar() {
    let (status, html) = get_path("/unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(html.contains("Page Not Found"));
    assert_sidebar(&html);

    let (status, _) = get_path("/config/extra").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
