//! CLI output formatting
//!
//! Human-readable rendering of lint verdicts and failures.

pub mod display;

pub use display::failure_message;
pub use display::render_failure;
pub use display::VerdictDisplay;
