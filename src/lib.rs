//! # synthos-core
//!
//! The page-transformation core of SynthOS, a conversational web-page
//! builder: annotate an HTML document with transient node ids, obtain a
//! change list from an LLM, apply it with deterministic DOM surgery,
//! self-heal partial failures with one bounded repair round-trip, clean
//! the result, and return new HTML plus diagnostics.
//!
//! The entry point is [`pipeline::transform_page`]. Everything else is a
//! component of that pipeline: [`annotator`] mints and strips node ids,
//! [`composer`] builds the prompt, [`gateway`] is the LLM call boundary,
//! [`parser`] extracts a change list from raw model output, [`mutator`]
//! applies it, [`repair`] retries failed operations once, and [`dedup`] /
//! [`error_injection`] clean up the final HTML.

pub mod annotator;
pub mod change_list;
pub mod composer;
pub mod dedup;
pub mod dom;
pub mod error;
pub mod error_injection;
pub mod gateway;
pub mod llm;
pub mod llms;
pub mod mutator;
pub mod parser;
pub mod pipeline;
pub mod repair;
pub mod server;
pub mod telemetry;
pub mod types;

pub use composer::ThemeInfo;
pub use error::CoreError;
pub use gateway::{CompletePrompt, CompletionRequest, CompletionResult};
pub use pipeline::{transform_page, TransformOutcome, TransformRequest, TransportFailure};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
