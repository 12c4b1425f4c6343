//! forge::github
//!
//! GitHub forge implementation using the REST API.
//!
//! # Authentication
//!
//! A personal access token (from `GITHUB_TOKEN`) is sent as a bearer token
//! on every request. There is no refresh: a rejected token surfaces as
//! [`ForgeError::AuthFailed`].
//!
//! # Rate Limiting
//!
//! Returns `ForgeError::RateLimited` when limits are hit. No automatic
//! retry; every run is a single attempt per step.
//!
//! # Example
//!
//! ```ignore
//! use branchtale::forge::github::GitHubForge;
//! use branchtale::forge::{Forge, MergeMethod, MergePrRequest};
//!
//! let forge = GitHubForge::new(token);
//! let outcome = forge
//!     .merge_pr(MergePrRequest {
//!         owner: "acme".into(),
//!         repo: "widgets".into(),
//!         number: 42,
//!         method: MergeMethod::Merge,
//!     })
//!     .await?;
//! if !outcome.merged {
//!     println!("not merged: {}", outcome.message);
//! }
//! ```

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::traits::{
    CreatePrRequest, Forge, ForgeError, MergeOutcome, MergePrRequest, PullRequest, RepoSlug,
};

/// Default GitHub API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "branchtale-cli";

/// GitHub forge implementation.
pub struct GitHubForge {
    /// HTTP client for making requests
    client: Client,
    /// Personal access token
    token: String,
    /// API base URL (configurable for GitHub Enterprise and tests)
    api_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubForge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubForge")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl GitHubForge {
    /// Create a forge talking to `api.github.com`.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_api_base(token, DEFAULT_API_BASE)
    }

    /// Create a forge with a custom API base URL.
    pub fn with_api_base(token: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            token: token.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Build common headers for API requests.
    fn headers(&self) -> Result<HeaderMap, ForgeError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| ForgeError::AuthFailed("token contains invalid characters".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Build URL for a repository endpoint.
    fn repo_url(&self, owner: &str, repo: &str, path: &str) -> String {
        format!("{}/repos/{}/{}/{}", self.api_base, owner, repo, path)
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> Result<T, ForgeError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            })
        } else {
            Err(error_from_response(response, status).await)
        }
    }
}

/// Map an unsuccessful response to a `ForgeError`.
async fn error_from_response(response: Response, status: StatusCode) -> ForgeError {
    let required_scopes = response
        .headers()
        .get("X-Accepted-OAuth-Scopes")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let message = response_message(response).await;

    match status {
        StatusCode::UNAUTHORIZED => ForgeError::AuthFailed("Invalid or expired token".into()),
        StatusCode::FORBIDDEN => {
            let mut err_msg = format!("Permission denied: {}", message);
            if let Some(scopes) = required_scopes.filter(|s| !s.is_empty()) {
                err_msg.push_str(&format!(" [required scopes: {}]", scopes));
            }
            ForgeError::AuthFailed(err_msg)
        }
        StatusCode::NOT_FOUND => ForgeError::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS => ForgeError::RateLimited,
        _ if status.is_server_error() => ForgeError::ApiError {
            status: status.as_u16(),
            message: format!("GitHub server error: {}", message),
        },
        _ => ForgeError::ApiError {
            status: status.as_u16(),
            message,
        },
    }
}

/// Pull the `message` field out of a GitHub error body.
async fn response_message(response: Response) -> String {
    match response.json::<GitHubErrorResponse>().await {
        Ok(err) => match err.errors.as_deref() {
            Some([first, ..]) if first.message.is_some() => format!(
                "{} ({})",
                err.message,
                first.message.as_deref().unwrap_or_default()
            ),
            _ => err.message,
        },
        Err(_) => "Unknown error".to_string(),
    }
}

#[async_trait]
impl Forge for GitHubForge {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn create_pr(&self, request: CreatePrRequest) -> Result<PullRequest, ForgeError> {
        let url = self.repo_url(&request.owner, &request.repo, "pulls");

        let body = CreatePrBody {
            title: &request.title,
            body: &request.body,
            head: &request.head,
            base: &request.base,
        };

        debug!(head = %request.head, base = %request.base, "creating pull request");
        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;

        let pr: GitHubPullRequest = self.handle_response(response).await?;
        Ok(pr.into())
    }

    async fn merge_pr(&self, request: MergePrRequest) -> Result<MergeOutcome, ForgeError> {
        let url = self.repo_url(
            &request.owner,
            &request.repo,
            &format!("pulls/{}/merge", request.number),
        );

        let body = MergePrBody {
            merge_method: request.method.as_str(),
        };

        debug!(number = request.number, method = %request.method, "merging pull request");
        let response = self
            .client
            .put(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;

        let status = response.status();
        match status {
            // Not mergeable (405) or head moved (409): an outcome, not a failure
            StatusCode::METHOD_NOT_ALLOWED | StatusCode::CONFLICT => Ok(MergeOutcome {
                sha: None,
                merged: false,
                message: response_message(response).await,
            }),
            _ => {
                let merged: GitHubMergeResponse = self.handle_response(response).await?;
                Ok(MergeOutcome {
                    sha: merged.sha,
                    merged: merged.merged,
                    message: merged.message,
                })
            }
        }
    }
}

// --------------------------------------------------------------------------
// API Types
// --------------------------------------------------------------------------

/// Request body for creating a PR.
#[derive(Serialize)]
struct CreatePrBody<'a> {
    title: &'a str,
    body: &'a str,
    head: &'a str,
    base: &'a str,
}

/// Request body for merging a PR.
#[derive(Serialize)]
struct MergePrBody<'a> {
    merge_method: &'a str,
}

/// GitHub error response format.
#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
    errors: Option<Vec<GitHubErrorDetail>>,
}

/// One entry of a validation error list.
#[derive(Deserialize)]
struct GitHubErrorDetail {
    message: Option<String>,
}

/// GitHub PR response format (the fields we use).
#[derive(Deserialize)]
struct GitHubPullRequest {
    number: u64,
    html_url: String,
}

/// GitHub merge response format.
#[derive(Deserialize)]
struct GitHubMergeResponse {
    sha: Option<String>,
    merged: bool,
    message: String,
}

impl From<GitHubPullRequest> for PullRequest {
    fn from(pr: GitHubPullRequest) -> Self {
        PullRequest {
            number: pr.number,
            url: pr.html_url,
        }
    }
}

// --------------------------------------------------------------------------
// URL Parsing
// --------------------------------------------------------------------------

/// Errors from remote URL parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteUrlError {
    /// The URL does not point at github.com.
    #[error("unsupported remote URL (only github.com is supported): {url}")]
    UnsupportedHost {
        /// The offending URL
        url: String,
    },

    /// The path is not `<owner>/<repo>`.
    #[error("unsupported remote URL (expected <owner>/<repo>): {url}")]
    MalformedPath {
        /// The offending URL
        url: String,
    },
}

/// URL prefixes that address github.com.
const GITHUB_PREFIXES: [&str; 4] = [
    "git@github.com:",
    "ssh://git@github.com/",
    "https://github.com/",
    "http://github.com/",
];

/// Parse a GitHub remote URL to extract owner and repo.
///
/// Supports both SSH and HTTPS formats:
/// - `git@github.com:owner/repo.git`
/// - `ssh://git@github.com/owner/repo.git`
/// - `https://github.com/owner/repo.git`
/// - `https://github.com/owner/repo`
///
/// # Example
///
/// ```
/// use branchtale::forge::github::{parse_github_url, RemoteUrlError};
///
/// let slug = parse_github_url("git@github.com:octocat/hello-world.git").unwrap();
/// assert_eq!(slug.owner, "octocat");
/// assert_eq!(slug.repo, "hello-world");
///
/// assert!(matches!(
///     parse_github_url("https://gitlab.com/acme/widgets.git"),
///     Err(RemoteUrlError::UnsupportedHost { .. })
/// ));
/// ```
pub fn parse_github_url(url: &str) -> Result<RepoSlug, RemoteUrlError> {
    let trimmed = url.trim();
    let rest = GITHUB_PREFIXES
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .ok_or_else(|| RemoteUrlError::UnsupportedHost {
            url: url.to_string(),
        })?;

    let rest = rest.strip_suffix('/').unwrap_or(rest);
    let rest = rest.strip_suffix(".git").unwrap_or(rest);

    let malformed = || RemoteUrlError::MalformedPath {
        url: url.to_string(),
    };

    let (owner, repo) = rest.split_once('/').ok_or_else(malformed)?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return Err(malformed());
    }

    Ok(RepoSlug {
        owner: owner.to_string(),
        repo: repo.to_string(),
    })
}
