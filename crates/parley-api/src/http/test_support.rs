//! Router harness for handler tests: a throwaway database and the mock
//! model backend.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tempfile::TempDir;
use tower::ServiceExt;

use parley_types::config::ParleyConfig;

use crate::http::router::build_router;
use crate::state::{ApiState, AppState};

pub struct TestApp {
    pub state: ApiState,
    router: Router,
    _tmp: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let mut config = ParleyConfig::default();
        config.llm.mock = true;
        let app_state = AppState::open(tmp.path().to_path_buf(), config)
            .await
            .unwrap();
        let state = app_state.api_state().unwrap();
        Self {
            router: build_router(state.clone()),
            state,
            _tmp: tmp,
        }
    }

    pub async fn text(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    pub async fn json(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let (status, text) = self.text(request).await;
        let value = if text.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text).unwrap()
        };
        (status, value)
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn delete(uri: &str) -> Request<Body> {
    Request::delete(uri).body(Body::empty()).unwrap()
}
