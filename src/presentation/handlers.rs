// HTTP request handlers
use crate::infrastructure::http_response::{json_error, json_message};
use crate::presentation::app_state::AppState;
use crate::presentation::dashboard_view::{render_page, DashboardView};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
};
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current reading and graph series straight from the vendor
pub async fn get_glucose(State(state): State<Arc<AppState>>) -> Response {
    match state.glucose_service.current().await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) if e.is_not_found() => {
            tracing::warn!("No glucose data for the configured connection");
            json_message(StatusCode::NOT_FOUND, "Glucose data not found")
        }
        Err(e) => {
            tracing::error!("Error fetching glucose data: {}", e);
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error fetching glucose data",
                e,
            )
        }
    }
}

/// Any verb other than GET on the glucose route
pub async fn method_not_allowed() -> Response {
    json_message(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

/// Dashboard page rendered from the latest poll state
pub async fn dashboard_page(State(state): State<Arc<AppState>>) -> Html<String> {
    let poll_state = state.dashboard.borrow().clone();
    Html(render_page(&poll_state, &state.dashboard_settings))
}

/// Latest poll state as JSON
pub async fn dashboard_state(State(state): State<Arc<AppState>>) -> Json<DashboardView> {
    let view = DashboardView::from_state(&state.dashboard.borrow());
    Json(view)
}

#[cfg(test)]
mod tests {
    use crate::application::glucose_service::GlucoseService;
    use crate::application::glucose_source::{FetchError, GlucoseSource};
    use crate::application::poller::{PollState, Poller, FETCH_ERROR_MESSAGE};
    use crate::domain::reading::GlucoseFetch;
    use crate::infrastructure::config::DashboardSettings;
    use crate::presentation::app_state::AppState;
    use crate::presentation::router::build_router;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    /// Returns whatever the test put in `next`
    struct FixedSource {
        next: Mutex<Option<Result<GlucoseFetch, FetchError>>>,
    }

    impl FixedSource {
        fn returning(result: Result<GlucoseFetch, FetchError>) -> Arc<Self> {
            Arc::new(Self {
                next: Mutex::new(Some(result)),
            })
        }

        fn set(&self, result: Result<GlucoseFetch, FetchError>) {
            *self.next.lock().unwrap() = Some(result);
        }
    }

    #[async_trait]
    impl GlucoseSource for FixedSource {
        async fn fetch_glucose(&self) -> Result<GlucoseFetch, FetchError> {
            self.next
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(FetchError::NotFound))
        }
    }

    fn fetch_from(reading: Value) -> GlucoseFetch {
        GlucoseFetch {
            reading: serde_json::from_value(reading).unwrap(),
            series: serde_json::from_value(json!([
                {"Timestamp": "1/15/2024 10:13:45 AM", "Value": 138, "MeasurementColor": 1},
                {"Timestamp": "1/15/2024 10:18:45 AM", "Value": 146, "MeasurementColor": 2}
            ]))
            .unwrap(),
        }
    }

    fn fetch(value: i64, trend_arrow: i64) -> GlucoseFetch {
        fetch_from(json!({
            "Timestamp": "1/15/2024 10:23:45 AM",
            "Value": value,
            "ValueInMgPerDl": value,
            "TrendArrow": trend_arrow,
            "MeasurementColor": 2
        }))
    }

    fn app(source: Arc<FixedSource>, dashboard: PollState) -> axum::Router {
        let (_tx, rx) = tokio::sync::watch::channel(dashboard);
        build_router(Arc::new(AppState {
            glucose_service: GlucoseService::new(source),
            dashboard: rx,
            dashboard_settings: DashboardSettings::default(),
        }))
    }

    async fn send(app: axum::Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_glucose_route_returns_simplified_reading() {
        let source = FixedSource::returning(Ok(fetch(150, 5)));
        let (status, body) = send(app(source, PollState::default()), "GET", "/api/glucose").await;

        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json["glucose"],
            json!({
                "value": 150,
                "trend": 5,
                "timestamp": "1/15/2024 10:23:45 AM",
                "measurementColor": 2
            })
        );
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains(r#""value":150,"#));
        assert!(!text.contains("150.0"));
        assert_eq!(
            json["glucoseGraphData"],
            json!([
                {"Timestamp": "1/15/2024 10:13:45 AM", "Value": 138, "MeasurementColor": 1},
                {"Timestamp": "1/15/2024 10:18:45 AM", "Value": 146, "MeasurementColor": 2}
            ])
        );
    }

    #[tokio::test]
    async fn test_glucose_route_tolerates_null_fields() {
        let source = FixedSource::returning(Ok(fetch_from(json!({
            "Timestamp": "1/15/2024 10:23:45 AM",
            "Value": 150,
            "TrendArrow": null,
            "MeasurementColor": null,
            "isHigh": null
        }))));
        let (status, body) = send(app(source, PollState::default()), "GET", "/api/glucose").await;

        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["glucose"]["value"], 150);
        assert!(json["glucose"]["measurementColor"].is_null());
        assert!(json["glucose"]["trend"].is_null());
        assert!(json["glucose"]["isHigh"].is_null());
    }

    #[tokio::test]
    async fn test_glucose_route_not_found() {
        let source = FixedSource::returning(Err(FetchError::NotFound));
        let (status, body) = send(app(source, PollState::default()), "GET", "/api/glucose").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Glucose data not found");
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn test_glucose_route_vendor_failure() {
        let source = FixedSource::returning(Err(FetchError::Status {
            status: 401,
            body: "unauthorized".to_string(),
        }));
        let (status, body) = send(app(source, PollState::default()), "GET", "/api/glucose").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Error fetching glucose data");
        assert!(json["error"].as_str().unwrap().contains("401"));
    }

    #[tokio::test]
    async fn test_glucose_route_rejects_other_methods() {
        for method in ["POST", "PUT", "DELETE", "PATCH"] {
            let source = FixedSource::returning(Ok(fetch(100, 3)));
            let (status, body) = send(app(source, PollState::default()), method, "/api/glucose").await;

            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
            let json: Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(json["message"], "Method not allowed");
        }
    }

    #[tokio::test]
    async fn test_glucose_route_rejects_head() {
        let source = FixedSource::returning(Ok(fetch(100, 3)));
        let (status, _) = send(app(source.clone(), PollState::default()), "HEAD", "/api/glucose").await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        // The vendor is never called
        assert!(source.next.lock().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_health_check() {
        let source = FixedSource::returning(Err(FetchError::NotFound));
        let (status, body) = send(app(source, PollState::default()), "GET", "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }

    #[tokio::test]
    async fn test_dashboard_after_poll_classifies_reading() {
        let source = FixedSource::returning(Ok(fetch(150, 5)));
        let poller = Poller::new(source.clone());
        poller.run_cycle().await;
        let state = poller.subscribe().borrow().clone();

        let (status, body) = send(app(source, state), "GET", "/api/dashboard").await;

        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["reading"]["value"], 150);
        assert_eq!(json["reading"]["level"], "high");
        assert_eq!(json["reading"]["trendLabel"], "Rising");
        assert_eq!(json["reading"]["mmol"], "8.3");
        assert_eq!(json["reading"]["isHigh"], false);
        assert_eq!(json["series"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_dashboard_survives_missing_glucose_item() {
        let source = FixedSource::returning(Err(FetchError::NotFound));
        let poller = Poller::new(source.clone());
        poller.run_cycle().await;
        let state = poller.subscribe().borrow().clone();

        let (status, body) = send(app(source, state), "GET", "/").await;

        assert_eq!(status, StatusCode::OK);
        let html = String::from_utf8(body).unwrap();
        assert!(html.contains(FETCH_ERROR_MESSAGE));
        assert!(html.contains("Loading data..."));
    }

    #[tokio::test]
    async fn test_dashboard_keeps_chart_after_failed_poll() {
        let source = FixedSource::returning(Ok(fetch(150, 5)));
        let poller = Poller::new(source.clone());
        poller.run_cycle().await;
        source.set(Err(FetchError::Status {
            status: 502,
            body: String::new(),
        }));
        poller.run_cycle().await;
        let state = poller.subscribe().borrow().clone();

        let (status, body) = send(app(source, state), "GET", "/").await;

        assert_eq!(status, StatusCode::OK);
        let html = String::from_utf8(body).unwrap();
        assert!(html.contains(">150<"));
        assert!(html.contains(FETCH_ERROR_MESSAGE));
        assert!(html.contains("<polyline"));
    }
}
