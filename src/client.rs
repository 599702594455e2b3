//! GitLab CI lint API client
//!
//! Issues exactly one `POST .../ci/lint` per run. See
//! <https://docs.gitlab.com/ee/api/lint.html>.

use std::path::Path;

use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use tracing::debug;

use crate::config::{Domain, LintParams};
use crate::error::{LintError, Result};
use crate::verdict::LintResponse;

/// Request body for the lint endpoints
#[derive(Debug, Serialize)]
struct LintRequest<'a> {
    content: &'a str,
}

/// Where lint requests are sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintEndpoint {
    base: Url,
}

impl LintEndpoint {
    /// `https://{domain}/`
    pub fn for_domain(domain: &Domain) -> Result<Self> {
        let base = Url::parse(&format!("https://{domain}/")).map_err(|_| {
            LintError::InvalidDomain {
                domain: domain.to_string(),
                reason: "cannot be used as a URL host",
            }
        })?;
        Ok(Self { base })
    }

    /// Use an arbitrary base URL, e.g. a local test server
    #[must_use]
    pub const fn with_base(base: Url) -> Self {
        Self { base }
    }

    /// `{base}/api/v4/[projects/{project}/]ci/lint`
    ///
    /// The project is encoded as a single path segment, so both numeric ids
    /// and `group/project` paths are accepted.
    #[must_use]
    pub fn url(&self, project: Option<&str>) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["api", "v4"]);
            if let Some(project) = project {
                segments.extend(["projects", project]);
            }
            segments.extend(["ci", "lint"]);
        }
        url
    }
}

/// Query parameters for a lint request
///
/// `ref` is ignored by GitLab unless `dry_run` is set, so the two always
/// travel together.
#[must_use]
pub fn query_params(params: &LintParams) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(token) = &params.token {
        debug!("Setting query parameter 'private_token'");
        query.push(("private_token", token.expose().to_string()));
    }
    if let Some(reference) = &params.reference {
        debug!(%reference, "Setting query parameters 'ref' and 'dry_run'");
        query.push(("ref", reference.clone()));
        query.push(("dry_run", "true".to_string()));
    }
    query
}

/// Read the CI configuration to be linted
pub async fn read_content(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LintError::FileAccess {
            path: path.to_path_buf(),
            source,
        })
}

/// HTTP client bound to one GitLab instance
pub struct LintClient {
    http: Client,
    endpoint: LintEndpoint,
}

impl LintClient {
    /// Build a client for the resolved parameters
    ///
    /// With `insecure` set, certificate verification is turned off for this
    /// client only.
    pub fn new(params: &LintParams) -> Result<Self> {
        let endpoint = LintEndpoint::for_domain(&params.domain)?;
        if params.insecure {
            debug!("Skipping TLS certificate verification");
        }
        let http = Client::builder()
            .user_agent(concat!("gll/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(params.insecure)
            .build()
            .map_err(|source| LintError::Transport {
                url: endpoint.base.to_string(),
                source: source.without_url(),
            })?;
        Ok(Self { http, endpoint })
    }

    /// Point the client somewhere other than `https://{domain}/`
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: LintEndpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// The endpoint requests are sent to
    #[must_use]
    pub const fn endpoint(&self) -> &LintEndpoint {
        &self.endpoint
    }

    /// Read the configuration file and submit it for linting
    pub async fn lint(&self, params: &LintParams) -> Result<LintResponse> {
        let content = read_content(&params.file).await?;
        self.lint_content(&content, params).await
    }

    /// Submit already loaded configuration text for linting
    pub async fn lint_content(&self, content: &str, params: &LintParams) -> Result<LintResponse> {
        let url = self.endpoint.url(params.project.as_deref());
        debug!(%url, "Posting CI configuration");

        // reqwest would otherwise render the full URL, `private_token` included
        let transport = |source: reqwest::Error| LintError::Transport {
            url: url.to_string(),
            source: source.without_url(),
        };

        let response = self
            .http
            .post(url.clone())
            .query(&query_params(params))
            .json(&LintRequest { content })
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        debug!(%status, %body, "Lint API responded");

        if status != StatusCode::OK {
            return Err(LintError::Api {
                status: status.as_u16(),
                body,
            });
        }

        LintResponse::parse(&body)
    }
}
