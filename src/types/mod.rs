//! Type definitions for CrewAI.
//!
//! Corresponds to `crewai/types/`.

pub mod crew_chat;
pub mod hitl;
pub mod streaming;
pub mod usage_metrics;
pub mod utils;
