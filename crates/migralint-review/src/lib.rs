//! Convention review orchestration.
//!
//! Provides the review pipeline: prompt assembly from templates, the
//! provider client, verdict reporting, and GitHub PR comments.

pub mod github;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod report;
