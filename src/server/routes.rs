//! Axum route handlers for the page-transformation core's HTTP server.
//!
//! # Routes
//!
//! - `GET  /health`    — Returns `{"status": "ok", "version": "..."}`
//! - `POST /transform` — Accepts a transform request, runs the pipeline

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;

use crate::composer::ThemeInfo;
use crate::gateway::CompletePrompt;
use crate::pipeline::{self, TransformRequest};

/// Shared application state for the HTTP server: the LLM call boundary.
#[derive(Clone)]
pub struct AppState {
    pub complete_prompt: Arc<dyn CompletePrompt>,
}

impl AppState {
    pub fn new(complete_prompt: Arc<dyn CompletePrompt>) -> Self {
        Self { complete_prompt }
    }
}

/// Build the axum router with all routes.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/transform", post(transform_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET /health — liveness probe.
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "service": "synthos-core",
    }))
}

/// Wire shape for `POST /transform`, mirroring the pipeline's
/// `transform_page` argument object field for field.
#[derive(Debug, Deserialize)]
struct TransformRequestBody {
    annotated_source: String,
    message: String,
    max_tokens: u32,
    instructions: Option<String>,
    model_instructions: Option<String>,
    theme_info: Option<ThemeInfo>,
    scripts: Option<String>,
    connectors: Option<String>,
    agents: Option<String>,
    route_hints: Option<String>,
    custom_transform_instructions: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct TransformResponseBody {
    html: String,
    change_count: usize,
}

/// POST /transform — run one annotate/prompt/mutate/repair/clean cycle.
///
/// Only a first-pass LLM transport failure is surfaced as a non-2xx
/// response; every other failure mode folds into a `200 OK` result
/// carrying an embedded error block.
async fn transform_handler(
    State(state): State<AppState>,
    Json(body): Json<TransformRequestBody>,
) -> Result<Json<TransformResponseBody>, (StatusCode, Json<Value>)> {
    let request = TransformRequest {
        annotated_source: body.annotated_source,
        message: body.message,
        max_tokens: body.max_tokens,
        instructions: body.instructions,
        model_instructions: body.model_instructions,
        theme_info: body.theme_info,
        scripts: body.scripts,
        connectors: body.connectors,
        agents: body.agents,
        route_hints: body.route_hints,
        custom_transform_instructions: body.custom_transform_instructions,
    };

    let outcome = pipeline::transform_page(request, state.complete_prompt.as_ref())
        .await
        .map_err(|failure| {
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "error": failure.error })),
            )
        })?;

    Ok(Json(TransformResponseBody {
        html: outcome.html,
        change_count: outcome.change_count,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{CompletionRequest, CompletionResult};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    struct FixedResponse(&'static str);

    #[async_trait]
    impl CompletePrompt for FixedResponse {
        async fn complete(&self, _request: CompletionRequest) -> CompletionResult {
            CompletionResult::Completed(self.0.to_string())
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl CompletePrompt for AlwaysFails {
        async fn complete(&self, _request: CompletionRequest) -> CompletionResult {
            CompletionResult::Failed("connection reset".to_string())
        }
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let state = AppState::new(Arc::new(FixedResponse("[]")));
        let app = app_router(state);

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "synthos-core");
    }

    #[tokio::test]
    async fn test_transform_endpoint_applies_change_list() {
        let (annotated, _) = crate::annotator::assign_node_ids(
            r#"<html><body><p id="x">Old</p></body></html>"#,
        )
        .unwrap();
        let node_id = {
            let dom = crate::dom::parse_document(&annotated);
            let mut id = None;
            crate::dom::walk_elements(&dom.document, &mut |n| {
                if id.is_none() && crate::dom::tag_name(n).as_deref() == Some("p") {
                    id = crate::dom::get_attr(n, "data-node-id");
                }
            });
            id.unwrap()
        };
        let response = format!(r#"[{{"op":"update","nodeId":"{}","html":"New"}}]"#, node_id);
        let state = AppState::new(Arc::new(FixedResponse(Box::leak(response.into_boxed_str()))));
        let app = app_router(state);

        let req_body = serde_json::json!({
            "annotated_source": annotated,
            "message": "change it",
            "max_tokens": 1000,
        });

        let request = Request::builder()
            .method("POST")
            .uri("/transform")
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_string(&req_body).unwrap()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["change_count"], 1);
        assert!(json["html"].as_str().unwrap().contains("New"));
    }

    #[tokio::test]
    async fn test_transform_endpoint_surfaces_transport_failure() {
        let state = AppState::new(Arc::new(AlwaysFails));
        let app = app_router(state);

        let req_body = serde_json::json!({
            "annotated_source": "<html><body><p>a</p></body></html>",
            "message": "do something",
            "max_tokens": 1000,
        });

        let request = Request::builder()
            .method("POST")
            .uri("/transform")
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_string(&req_body).unwrap()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
