//! synthos-core HTTP server binary.
//!
//! Starts an axum HTTP server that exposes `transform_page` over HTTP.
//!
//! # Environment Variables
//!
//! - `PORT` — HTTP port (default: 8080)
//! - `SYNTHOS_MODEL` — model identifier passed to the default LLM gateway
//!   (default: "gpt-4o")
//! - `RUST_LOG` — Tracing filter (default: "info,synthos=debug")
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin server
//! ```

use std::sync::Arc;

use synthos_core::llm::LLM;
use synthos_core::server::{app_router, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,synthos=debug".into()),
        )
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let bind_addr = format!("0.0.0.0:{}", port);

    let model = std::env::var("SYNTHOS_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
    let gateway = LLM::new(model).as_complete_prompt_adapter();
    let state = AppState::new(Arc::new(gateway));

    let app = app_router(state);

    tracing::info!("synthos-core server starting on {}", bind_addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health    — liveness probe");
    tracing::info!("  POST /transform — run the page-transformation pipeline");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app)
        .await
        .expect("Server failed");
}
