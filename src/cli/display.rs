//! Verdict display
//!
//! Renders lint results and failures. All output goes to stderr so stdout
//! remains clean for piping.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::error::LintError;
use crate::verdict::{LintResponse, Verdict};

/// Shown instead of the error chain when not running verbose
pub const GENERIC_FAILURE: &str = "Oops. Something went wrong.";

/// Display handler for one lint result
pub struct VerdictDisplay {
    file: PathBuf,
}

impl VerdictDisplay {
    /// Create a display handler for the linted file
    #[must_use]
    pub fn new(file: &Path) -> Self {
        Self {
            file: file.to_path_buf(),
        }
    }

    /// Print the verdict, then every error and warning GitLab reported
    pub fn render(&self, response: &LintResponse) {
        // A closed stderr leaves nothing to report to
        let _ = self.render_to(&mut std::io::stderr().lock(), response);
    }

    /// Write the report to `out`
    pub fn render_to<W: Write>(&self, out: &mut W, response: &LintResponse) -> io::Result<()> {
        let verdict = response.verdict();
        let mark = match verdict {
            Verdict::Valid => "✓".green().bold(),
            Verdict::Invalid => "✗".red().bold(),
        };
        writeln!(
            out,
            "{mark} {} {}",
            headline(verdict),
            format!("({})", self.file.display()).dimmed()
        )?;

        for error in &response.errors {
            writeln!(out, "  {} {}", "error:".red().bold(), error)?;
        }
        for warning in &response.warnings {
            writeln!(out, "  {} {}", "warning:".yellow().bold(), warning)?;
        }
        Ok(())
    }
}

/// One-line summary of a verdict
#[must_use]
pub const fn headline(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Valid => "GitLab CI configuration is valid",
        Verdict::Invalid => "GitLab CI configuration is invalid",
    }
}

/// Message to show for a failed run
///
/// Verbose runs get the full error chain. Otherwise only errors the user can
/// act on (bad domain, missing file, API rejection) are shown as-is.
#[must_use]
pub fn failure_message(err: &anyhow::Error, verbose: bool) -> String {
    if verbose {
        return format!("{err:?}");
    }
    err.downcast_ref::<LintError>()
        .filter(|lint| lint.is_user_facing())
        .map_or_else(|| GENERIC_FAILURE.to_string(), ToString::to_string)
}

/// Print a failed run to stderr
pub fn render_failure(err: &anyhow::Error, verbose: bool) {
    eprintln!(
        "{} {}",
        "error:".red().bold(),
        failure_message(err, verbose)
    );
}
