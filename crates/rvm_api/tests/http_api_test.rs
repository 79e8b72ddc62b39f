use axum::body::Body;
use axum::Router;
use chrono::{Duration, Utc};
use common::domain::{DomainError, MockDeviceRepository, NewDevice};
use common::memory::InMemoryDeviceRepository;
use http::{Method, Request, StatusCode};
use rvm_api::domain::RvmService;
use rvm_api::http::{build_router, DeviceResponse, HttpLoggingConfig};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// A(Cairo, 1h ago), B(Alexandria, never used), C(Cairo, 30h ago), D(Giza, inactive)
async fn seeded_router() -> Router {
    let now = Utc::now();
    let repository = InMemoryDeviceRepository::with_devices([
        NewDevice::new("A").with_last_usage(Some(now - Duration::hours(1))),
        NewDevice::new("B").with_location("Alexandria"),
        NewDevice::new("C").with_last_usage(Some(now - Duration::hours(30))),
        NewDevice::new("D")
            .with_location("Giza")
            .with_active(false)
            .with_last_usage(Some(now)),
    ])
    .await;

    let service = Arc::new(RvmService::new(Arc::new(repository)));
    build_router(service, HttpLoggingConfig::default())
}

async fn send(router: Router, method: Method, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn list_names(uri: &str) -> Vec<String> {
    let (status, body) = send(seeded_router().await, Method::GET, uri).await;
    assert_eq!(status, StatusCode::OK, "GET {uri}");

    let devices: Vec<DeviceResponse> = serde_json::from_slice(&body).unwrap();
    devices.into_iter().map(|d| d.name).collect()
}

#[tokio::test]
async fn test_list_orders_by_last_usage_with_never_used_last() {
    assert_eq!(list_names("/rvms").await, vec!["A", "C", "B"]);
}

#[tokio::test]
async fn test_list_accepts_trailing_slash() {
    assert_eq!(list_names("/rvms/").await, vec!["A", "C", "B"]);
}

#[tokio::test]
async fn test_list_response_shape() {
    let (status, body) = send(seeded_router().await, Method::GET, "/rvms").await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_slice(&body).unwrap();
    let never_used = &json[2];
    assert_eq!(never_used["id"], 2);
    assert_eq!(never_used["name"], "B");
    assert_eq!(never_used["location"], "Alexandria");
    assert_eq!(never_used["is_active"], true);
    assert!(never_used["last_usage"].is_null());
    assert!(json[0]["last_usage"].is_string());
}

#[tokio::test]
async fn test_list_filters() {
    assert_eq!(list_names("/rvms?loc=cai").await, vec!["A", "C"]);
    assert_eq!(list_names("/rvms?loc=ALEX").await, vec!["B"]);
    assert_eq!(list_names("/rvms?location=Cairo").await, vec!["A", "C"]);
    assert!(list_names("/rvms?location=cairo").await.is_empty());
    assert_eq!(list_names("/rvms?recent=true").await, vec!["A"]);
    assert_eq!(list_names("/rvms?recent=1&loc=cai").await, vec!["A"]);
    assert_eq!(list_names("/rvms?loc=%20cai%20").await, vec!["A", "C"]);
    assert_eq!(list_names("/rvms?location=%20Cairo").await, vec!["A", "C"]);
}

#[tokio::test]
async fn test_list_ignores_unknown_and_malformed_params() {
    let unfiltered = vec!["A", "C", "B"];

    assert_eq!(list_names("/rvms?foo=bar").await, unfiltered);
    assert_eq!(list_names("/rvms?recent=maybe").await, unfiltered);
    assert_eq!(list_names("/rvms?recent=false").await, unfiltered);
    assert_eq!(list_names("/rvms?loc=").await, unfiltered);
    assert_eq!(list_names("/rvms?loc=%20%20").await, unfiltered);
}

#[tokio::test]
async fn test_list_never_returns_inactive_devices() {
    assert!(list_names("/rvms?loc=giza").await.is_empty());
    assert!(list_names("/rvms?location=Giza").await.is_empty());
}

#[tokio::test]
async fn test_get_device() {
    for uri in ["/rvms/1", "/rvms/1/"] {
        let (status, body) = send(seeded_router().await, Method::GET, uri).await;
        assert_eq!(status, StatusCode::OK, "GET {uri}");

        let device: DeviceResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(device.id, 1);
        assert_eq!(device.name, "A");
    }
}

#[tokio::test]
async fn test_get_device_not_found_cases() {
    // missing, inactive, filtered out, non-numeric
    for uri in ["/rvms/99", "/rvms/4", "/rvms/2?recent=true", "/rvms/abc"] {
        let (status, body) = send(seeded_router().await, Method::GET, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "GET {uri}");

        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
    }
}

#[tokio::test]
async fn test_write_methods_not_allowed() {
    for (method, uri) in [
        (Method::POST, "/rvms"),
        (Method::PUT, "/rvms/1"),
        (Method::PATCH, "/rvms/1/"),
        (Method::DELETE, "/rvms/1"),
    ] {
        let (status, _) = send(seeded_router().await, method.clone(), uri).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method} {uri}");
    }
}

#[tokio::test]
async fn test_store_failure_returns_service_unavailable() {
    let mut mock_repo = MockDeviceRepository::new();
    mock_repo
        .expect_list_active_devices()
        .returning(|| Err(DomainError::RepositoryError(anyhow::anyhow!("connection refused"))));
    let service = Arc::new(RvmService::new(Arc::new(mock_repo)));
    let router = build_router(service, HttpLoggingConfig::default());

    let (status, body) = send(router, Method::GET, "/rvms").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["code"], "STORE_UNAVAILABLE");
    assert!(!json["message"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_healthz() {
    let (status, body) = send(seeded_router().await, Method::GET, "/healthz").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}
