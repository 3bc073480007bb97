//! HTTP server for the page-transformation core.
//!
//! Exposes `transform_page` as a minimal HTTP service, matching the
//! "ambient plumbing" sizing note in this core's design — no auth, no
//! page storage, no multi-tenant routing.
//!
//! # Endpoints
//!
//! - `GET  /health`    — Liveness probe
//! - `POST /transform` — Run one annotate/prompt/mutate/repair/clean cycle

pub mod routes;

pub use routes::{app_router, AppState};
