//! Crate-wide error types.
//!
//! `CoreError` covers the genuinely-thrown conditions the pipeline catches
//! and turns into an embedded error block: an `UnknownOp` the parser
//! accepted syntactically but the mutator cannot type, and lower-level
//! HTML parse/serialize failures. Domain-level mutation failures (missing
//! node, missing parent, locked target) never become a `CoreError` — they
//! are recorded directly as [`crate::change_list::FailedOp`] reasons.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown op '{0}'")]
    UnknownOp(String),

    #[error("html parse/serialize error: {0}")]
    Html(String),
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("response was not valid JSON and no JSON array could be extracted")]
    NoJsonArrayFound,
}
