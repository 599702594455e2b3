//! gll - GitLab CI lint
//!
//! CLI entry point: resolve parameters, lint once, exit with the verdict.

// Allow multiple crate versions from dependencies (can't easily control)
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use gitlab_lint::cli::{render_failure, VerdictDisplay};
use gitlab_lint::client::LintClient;
use gitlab_lint::config::LintArgs;
use gitlab_lint::verdict::Verdict;

/// Validate a .gitlab-ci.yml against the GitLab CI lint API
///
/// Every option can also be set through a `GLL_` prefixed variable. Inside a
/// GitLab CI job, unset options fall back to `GITLAB_PRIVATE_TOKEN`,
/// `CI_COMMIT_REF_NAME`, `CI_PROJECT_ID`, `CI_CONFIG_PATH` and `CI_SERVER_HOST`.
#[derive(Parser, Debug)]
#[command(name = "gll", version, about)]
struct Cli {
    /// Gitlab FQDN, no protocol or trailing slash [default: gitlab.com]
    #[arg(short, long, env = "GLL_DOMAIN")]
    domain: Option<String>,

    /// Gitlab project ID
    #[arg(short, long, env = "GLL_PROJECT")]
    project: Option<String>,

    /// Gitlab personal access token
    #[arg(short, long, env = "GLL_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Path to .gitlab-ci.yml, starts in local directory [default: .gitlab-ci.yml]
    #[arg(short, long, env = "GLL_FILE")]
    file: Option<PathBuf>,

    /// Suppresses TLS validity failures
    #[arg(short, long, env = "GLL_INSECURE")]
    insecure: bool,

    /// Git reference to use for validation context
    #[arg(short, long, env = "GLL_REFERENCE")]
    reference: Option<String>,

    /// Enable verbose logging, useful for debugging and CI systems
    #[arg(short, long, env = "GLL_VERBOSE")]
    verbose: bool,
}

impl From<Cli> for LintArgs {
    fn from(cli: Cli) -> Self {
        Self {
            domain: cli.domain,
            project: cli.project,
            token: cli.token,
            file: cli.file,
            insecure: cli.insecure,
            reference: cli.reference,
        }
    }
}

/// Resolve, lint, display. Returns the verdict for the exit code.
async fn run(args: LintArgs) -> Result<Verdict> {
    let params = args.resolve().context("Invalid lint parameters")?;
    let client = LintClient::new(&params).context("Failed to create HTTP client")?;

    let response = client
        .lint(&params)
        .await
        .with_context(|| format!("Failed to lint '{}'", params.file.display()))?;

    let verdict = response.verdict();
    debug!(
        ?verdict,
        errors = response.errors.len(),
        warnings = response.warnings.len(),
        "Lint finished"
    );
    VerdictDisplay::new(&params.file).render(&response);
    Ok(verdict)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    let verbose = cli.verbose;

    if let Err(err) = gitlab_lint::logging::init(verbose) {
        eprintln!("{err:#}");
    }

    let exit_code = match run(cli.into()).await {
        Ok(verdict) => verdict.exit_code(),
        Err(err) => {
            render_failure(&err, verbose);
            1
        }
    };
    std::process::exit(exit_code);
}
