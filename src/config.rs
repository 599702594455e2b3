//! Parameter resolution
//!
//! Merges what the user passed on the command line with what a GitLab CI job
//! exposes in its environment. Every field follows the same chain: explicit
//! value, then CI variable, then default.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{LintError, Result};

/// Host used when neither a flag nor the CI environment names one
pub const DEFAULT_DOMAIN: &str = "gitlab.com";

/// CI configuration file looked up in the working directory by default
pub const DEFAULT_FILE: &str = ".gitlab-ci.yml";

/// Personal access token (`CI_JOB_TOKEN` is not accepted by the lint API)
pub const TOKEN_VAR: &str = "GITLAB_PRIVATE_TOKEN";
/// Branch or tag the pipeline runs for
pub const REFERENCE_VAR: &str = "CI_COMMIT_REF_NAME";
/// Numeric project id of the running job
pub const PROJECT_VAR: &str = "CI_PROJECT_ID";
/// Custom CI configuration path set in the project settings
pub const FILE_VAR: &str = "CI_CONFIG_PATH";
/// Host of the GitLab instance running the job
pub const DOMAIN_VAR: &str = "CI_SERVER_HOST";

const MAX_DOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// A hostname that passed FQDN validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain(String);

impl Domain {
    /// Validate `value` as a fully qualified domain name
    pub fn parse(value: &str) -> Result<Self> {
        check_fqdn(value).map_err(|reason| LintError::InvalidDomain {
            domain: value.to_string(),
            reason,
        })?;
        Ok(Self(value.to_string()))
    }

    /// The domain as given, including any trailing dot
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A GitLab access token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for placing on the wire
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Parameters as received from the command line, before any fallback
#[derive(Debug, Clone, Default)]
pub struct LintArgs {
    /// GitLab host
    pub domain: Option<String>,
    /// Project id or path
    pub project: Option<String>,
    /// Personal access token
    pub token: Option<String>,
    /// Path to the CI configuration
    pub file: Option<PathBuf>,
    /// Skip TLS certificate verification
    pub insecure: bool,
    /// Git reference used as validation context
    pub reference: Option<String>,
}

/// Fully resolved parameters for one lint run
#[derive(Debug, Clone)]
pub struct LintParams {
    /// Validated GitLab host
    pub domain: Domain,
    /// Project id or path; selects the project lint endpoint when set
    pub project: Option<String>,
    /// Access token sent as `private_token`
    pub token: Option<AccessToken>,
    /// Existing CI configuration file
    pub file: PathBuf,
    /// Skip TLS certificate verification
    pub insecure: bool,
    /// Git reference sent as `ref` together with `dry_run`
    pub reference: Option<String>,
}

impl LintArgs {
    /// Resolve against the process environment
    pub fn resolve(self) -> Result<LintParams> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Resolve against an arbitrary variable lookup
    ///
    /// Empty strings, whether passed explicitly or found in the environment,
    /// count as absent. The domain is validated and the file is checked for
    /// existence here, so both failures surface before any network traffic.
    pub fn resolve_with<F>(self, env: F) -> Result<LintParams>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = fallback("token", self.token, TOKEN_VAR, &env).map(AccessToken::new);
        let reference = fallback("reference", self.reference, REFERENCE_VAR, &env);
        let project = fallback("project", self.project, PROJECT_VAR, &env);
        let file = self
            .file
            .filter(|p| !p.as_os_str().is_empty())
            .or_else(|| from_env("file", FILE_VAR, &env).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE));
        // Only consulted while the domain would otherwise be the default, so
        // an explicit choice is never clobbered by the runner's host.
        let domain = fallback("domain", self.domain, DOMAIN_VAR, &env)
            .unwrap_or_else(|| DEFAULT_DOMAIN.to_string());

        let params = LintParams {
            domain: Domain::parse(&domain)?,
            project,
            token,
            file,
            insecure: self.insecure,
            reference,
        };
        check_file(&params.file)?;

        debug!(?params, "Resolved lint parameters");
        Ok(params)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn fallback<F>(field: &str, explicit: Option<String>, var: &str, env: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(explicit).or_else(|| from_env(field, var, env))
}

fn from_env<F>(field: &str, var: &str, env: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let value = non_empty(env(var))?;
    debug!(field, var, "Set from environment");
    Some(value)
}

fn check_file(path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|source| LintError::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;
    if !metadata.is_file() {
        return Err(LintError::FileAccess {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
        });
    }
    Ok(())
}

/// Check hostname syntax: labels of letters, digits and hyphens, joined by
/// dots, with an optional trailing root dot.
fn check_fqdn(value: &str) -> std::result::Result<(), &'static str> {
    let name = value.strip_suffix('.').unwrap_or(value);

    if name.is_empty() {
        return Err("domain is empty");
    }
    if name.len() > MAX_DOMAIN_LEN {
        return Err("domain is longer than 253 characters");
    }

    let labels: Vec<&str> = name.split('.').collect();
    if labels.len() < 2 {
        return Err("domain needs at least two labels");
    }

    for label in &labels {
        if label.is_empty() {
            return Err("domain contains an empty label");
        }
        if label.len() > MAX_LABEL_LEN {
            return Err("labels may be at most 63 characters");
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err("labels may only contain letters, digits and hyphens");
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err("labels may not start or end with a hyphen");
        }
    }

    if labels
        .last()
        .is_some_and(|tld| tld.chars().all(|c| c.is_ascii_digit()))
    {
        return Err("top-level label cannot be all numeric");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    /// A temp dir holding a CI file, and args pointing at it.
    fn fixture() -> (TempDir, LintArgs) {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join(".gitlab-ci.yml");
        std::fs::write(&file, "stages: [test]\n").unwrap();
        let args = LintArgs {
            file: Some(file),
            ..LintArgs::default()
        };
        (dir, args)
    }

    #[test]
    fn test_token_falls_back_to_environment() {
        let (_dir, args) = fixture();
        let params = args
            .resolve_with(env_of(&[(TOKEN_VAR, "glpat-from-env")]))
            .unwrap();
        assert_eq!(params.token.unwrap().expose(), "glpat-from-env");
    }

    #[test]
    fn test_explicit_token_wins_over_environment() {
        let (_dir, mut args) = fixture();
        args.token = Some("glpat-flag".to_string());
        let params = args
            .resolve_with(env_of(&[(TOKEN_VAR, "glpat-from-env")]))
            .unwrap();
        assert_eq!(params.token.unwrap().expose(), "glpat-flag");
    }

    #[test]
    fn test_reference_and_project_fall_back_to_environment() {
        let (_dir, args) = fixture();
        let params = args
            .resolve_with(env_of(&[(REFERENCE_VAR, "main"), (PROJECT_VAR, "4242")]))
            .unwrap();
        assert_eq!(params.reference.as_deref(), Some("main"));
        assert_eq!(params.project.as_deref(), Some("4242"));
    }

    #[test]
    fn test_empty_values_count_as_absent() {
        let (_dir, mut args) = fixture();
        args.token = Some(String::new());
        let params = args
            .resolve_with(env_of(&[(TOKEN_VAR, "glpat-env"), (PROJECT_VAR, "")]))
            .unwrap();
        assert_eq!(params.token.unwrap().expose(), "glpat-env");
        assert!(params.project.is_none());
    }

    #[test]
    fn test_file_falls_back_to_ci_config_path() {
        let (dir, _) = fixture();
        let custom = dir.path().join("ci/pipeline.yml");
        std::fs::create_dir_all(custom.parent().unwrap()).unwrap();
        std::fs::write(&custom, "stages: [build]\n").unwrap();

        let params = LintArgs::default()
            .resolve_with(env_of(&[(FILE_VAR, custom.to_str().unwrap())]))
            .unwrap();
        assert_eq!(params.file, custom);
    }

    #[test]
    fn test_default_domain_without_environment() {
        let (_dir, args) = fixture();
        let params = args.resolve_with(no_env).unwrap();
        assert_eq!(params.domain.as_str(), DEFAULT_DOMAIN);
        assert!(params.token.is_none());
        assert!(params.reference.is_none());
        assert!(params.project.is_none());
    }

    #[test]
    fn test_default_domain_replaced_by_ci_server_host() {
        let (_dir, args) = fixture();
        let params = args
            .resolve_with(env_of(&[(DOMAIN_VAR, "gitlab.example.com")]))
            .unwrap();
        assert_eq!(params.domain.as_str(), "gitlab.example.com");
    }

    #[test]
    fn test_explicit_domain_never_overridden() {
        let (_dir, mut args) = fixture();
        args.domain = Some("git.internal.example".to_string());
        let params = args
            .resolve_with(env_of(&[(DOMAIN_VAR, "gitlab.example.com")]))
            .unwrap();
        assert_eq!(params.domain.as_str(), "git.internal.example");
    }

    #[test]
    fn test_invalid_domain_from_environment_rejected() {
        let (_dir, args) = fixture();
        let err = args
            .resolve_with(env_of(&[(DOMAIN_VAR, "gitlab.example.com:8443")]))
            .unwrap_err();
        assert!(matches!(err, LintError::InvalidDomain { .. }));
    }

    #[test]
    fn test_missing_file_rejected() {
        let args = LintArgs {
            file: Some(PathBuf::from("/nonexistent/.gitlab-ci.yml")),
            ..LintArgs::default()
        };
        let err = args.resolve_with(no_env).unwrap_err();
        assert!(matches!(err, LintError::FileAccess { .. }));
    }

    #[test]
    fn test_directory_rejected_as_file() {
        let dir = TempDir::new().unwrap();
        let args = LintArgs {
            file: Some(dir.path().to_path_buf()),
            ..LintArgs::default()
        };
        let err = args.resolve_with(no_env).unwrap_err();
        assert!(err.to_string().contains("not a regular file"));
    }

    #[test]
    fn test_domain_checked_before_file() {
        let args = LintArgs {
            domain: Some("not a host".to_string()),
            file: Some(PathBuf::from("/nonexistent/.gitlab-ci.yml")),
            ..LintArgs::default()
        };
        let err = args.resolve_with(no_env).unwrap_err();
        assert!(matches!(err, LintError::InvalidDomain { .. }));
    }

    #[test]
    fn test_resolve_reads_process_environment() {
        let (_dir, args) = fixture();
        temp_env::with_vars(
            [
                (TOKEN_VAR, Some("glpat-process")),
                (REFERENCE_VAR, None),
                (PROJECT_VAR, None),
                (FILE_VAR, None),
                (DOMAIN_VAR, None),
            ],
            || {
                let params = args.resolve().unwrap();
                assert_eq!(params.token.unwrap().expose(), "glpat-process");
                assert_eq!(params.domain.as_str(), DEFAULT_DOMAIN);
            },
        );
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = AccessToken::new("glpat-secret");
        assert!(!format!("{token:?}").contains("glpat-secret"));
    }

    #[test]
    fn test_valid_domains() {
        for domain in [
            "gitlab.com",
            "gitlab.com.",
            "git.internal.example.org",
            "my-gitlab.example.io",
            "a1.b2",
        ] {
            assert!(Domain::parse(domain).is_ok(), "{domain} should be valid");
        }
    }

    #[test]
    fn test_invalid_domains() {
        let long_label = format!("{}.com", "a".repeat(64));
        let long_name = format!("{}com", "abcdefghi.".repeat(26));
        for domain in [
            "",
            ".",
            "localhost",
            "https://gitlab.com",
            "gitlab.com/",
            "gitlab..com",
            "-gitlab.com",
            "gitlab-.com",
            "git_lab.com",
            "10.0.0.1",
            long_label.as_str(),
            long_name.as_str(),
        ] {
            assert!(Domain::parse(domain).is_err(), "{domain} should be invalid");
        }
    }
}
