//! Core types, configuration, and error handling for migralint.
//!
//! This crate provides the shared foundation used by the other crates:
//! - [`LintError`]: unified error type using `thiserror`
//! - [`LintConfig`]: environment plus optional `.migralint.toml` settings
//! - Shared types: [`ChangedFile`], [`DiffBundle`], [`ReviewVerdict`],
//!   [`Provider`], [`VerdictPolicy`]

pub mod config;
mod error;
mod types;

pub use config::{
    ClassifyConfig, GithubConfig, LintConfig, LintSettings, PromptConfig, ReviewConfig, RunContext,
};
pub use error::LintError;
pub use types::{
    ApiShape, ChangedFile, DiffBundle, FileCategory, Provider, ReviewVerdict, VerdictPolicy,
    PASS_TOKEN,
};

/// A convenience `Result` type for migralint operations.
pub type Result<T> = std::result::Result<T, LintError>;
