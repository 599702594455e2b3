//! Error types for linting runs

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, LintError>;

/// Everything that can stop a lint run before a verdict is reached
#[derive(Debug, Error)]
pub enum LintError {
    /// The domain is not a valid hostname
    #[error("{domain} does not conform to RFC1035: {reason}")]
    InvalidDomain {
        /// The rejected domain
        domain: String,
        /// Which rule it broke
        reason: &'static str,
    },

    /// The CI configuration file is missing or unreadable
    #[error("Cannot read CI configuration '{}': {source}", .path.display())]
    FileAccess {
        /// Path that was checked or read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The lint endpoint answered with something other than 200
    #[error(
        "API endpoint returned invalid response ({status}): \n {body} \n\
         confirm your `domain`, `project`, and `token` have been set correctly"
    )]
    Api {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// The request never produced a response
    #[error("Request to {url} failed")]
    Transport {
        /// Target URL, without query parameters
        url: String,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// The response body was not JSON
    #[error("Failed to decode lint response")]
    Decode(#[source] serde_json::Error),
}

impl LintError {
    /// Whether the message is meant for the user even without `--verbose`
    ///
    /// Anything else is an unexpected failure and is collapsed to a generic
    /// message unless verbose output was requested.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::InvalidDomain { .. } | Self::FileAccess { .. } | Self::Api { .. }
        )
    }
}
