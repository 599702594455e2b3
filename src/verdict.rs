//! Lint response interpretation
//!
//! The global `ci/lint` endpoint answers with a `status` string while the
//! project-scoped one answers with a `valid` boolean. Both are folded into a
//! single [`Verdict`].

use serde_json::Value;

use crate::error::{LintError, Result};

/// Which of the two response shapes the API returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `{"status": "valid" | "invalid", ...}` from `/ci/lint`
    Status {
        /// Whether `status` was `"valid"`
        valid: bool,
    },
    /// `{"valid": bool, ...}` from `/projects/:id/ci/lint`
    ValidFlag {
        /// Value of the `valid` field; non-booleans read as `false`
        valid: bool,
    },
    /// Neither key was present
    Unrecognized,
}

impl ResponseShape {
    /// Whether this shape reports a valid configuration
    #[must_use]
    pub const fn is_valid(self) -> bool {
        match self {
            Self::Status { valid } | Self::ValidFlag { valid } => valid,
            Self::Unrecognized => false,
        }
    }
}

/// A decoded lint response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintResponse {
    /// Shape and validity
    pub shape: ResponseShape,
    /// Error messages reported by GitLab
    pub errors: Vec<String>,
    /// Warning messages reported by GitLab
    pub warnings: Vec<String>,
}

impl LintResponse {
    /// Decode a raw response body
    pub fn parse(body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body).map_err(LintError::Decode)?;
        Ok(Self::from_value(&value))
    }

    /// Classify an already decoded JSON document
    ///
    /// When both keys are present the `valid` flag takes precedence.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let shape = if let Some(valid) = value.get("valid") {
            ResponseShape::ValidFlag {
                valid: valid.as_bool().unwrap_or(false),
            }
        } else if let Some(status) = value.get("status") {
            ResponseShape::Status {
                valid: status.as_str() == Some("valid"),
            }
        } else {
            ResponseShape::Unrecognized
        };

        Self {
            shape,
            errors: messages(value, "errors"),
            warnings: messages(value, "warnings"),
        }
    }

    /// Reduce to a verdict
    #[must_use]
    pub const fn verdict(&self) -> Verdict {
        if self.shape.is_valid() {
            Verdict::Valid
        } else {
            Verdict::Invalid
        }
    }
}

/// Outcome of a lint run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// GitLab accepted the configuration
    Valid,
    /// GitLab rejected the configuration, or the answer was unrecognizable
    Invalid,
}

impl Verdict {
    /// Process exit code for this verdict
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Valid => 0,
            Self::Invalid => 1,
        }
    }
}

fn messages(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map_or_else(|| item.to_string(), str::to_string)
                })
                .collect()
        })
        .unwrap_or_default()
}
