//! gitlab-lint - Validate GitLab CI configuration
//!
//! Sends a `.gitlab-ci.yml` to the GitLab CI lint API and turns the answer
//! into a pass/fail verdict. Parameters fall back to the variables a GitLab
//! CI job exposes, so the same invocation works locally and in a pipeline.

// Allow multiple crate versions from dependencies (can't easily control)
#![allow(clippy::multiple_crate_versions)]

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod verdict;

// Re-export commonly used types
pub use cli::VerdictDisplay;
pub use client::{LintClient, LintEndpoint};
pub use config::{AccessToken, Domain, LintArgs, LintParams};
pub use error::{LintError, Result};
pub use verdict::{LintResponse, ResponseShape, Verdict};
