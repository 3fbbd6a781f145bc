//! GitHub REST v3 implementation of [`RepositoryHost`].

use std::time::Duration;

use adrtools_shared::{AdrToolsError, RepoSlug, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};
use url::Url;

use crate::{ContentEntry, GitReference, PullRequest, RepositoryHost, TreeEntry, branch_ref};

/// User-Agent string for host requests.
const USER_AGENT: &str = concat!("adr-tools/", env!("CARGO_PKG_VERSION"));

/// Default timeout in seconds for a single API request.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// REST API version pinned for every request.
const API_VERSION: &str = "2022-11-28";

const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Returns file bodies verbatim instead of base64 inside JSON.
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw";

/// Upper bound on search results; later pages are not requested.
const SEARCH_PAGE_SIZE: &str = "100";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// HTTP settings for [`GithubHost`].
#[derive(Debug, Clone)]
pub struct HostOptions {
    /// Timeout for HTTP requests in seconds.
    pub timeout_secs: u64,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ShaPayload {
    sha: String,
}

#[derive(Deserialize)]
struct RefPayload {
    #[serde(rename = "ref")]
    name: String,
    object: ShaPayload,
}

#[derive(Deserialize)]
struct CommitPayload {
    tree: ShaPayload,
}

#[derive(Deserialize)]
struct SearchPayload {
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    number: u64,
}

#[derive(Deserialize)]
struct PullPayload {
    head: HeadPayload,
}

#[derive(Deserialize)]
struct HeadPayload {
    #[serde(rename = "ref")]
    name: String,
}

// ---------------------------------------------------------------------------
// GithubHost
// ---------------------------------------------------------------------------

/// Authenticated client for one GitHub repository.
pub struct GithubHost {
    client: Client,
    api_base: Url,
    repo: RepoSlug,
}

impl GithubHost {
    /// Create a client for `repo` on the API at `api_url` with default options.
    pub fn new(api_url: &str, repo: RepoSlug, token: &str) -> Result<Self> {
        Self::with_options(api_url, repo, token, &HostOptions::default())
    }

    /// Create a client with explicit HTTP options.
    pub fn with_options(
        api_url: &str,
        repo: RepoSlug,
        token: &str,
        opts: &HostOptions,
    ) -> Result<Self> {
        let api_base = Url::parse(api_url)
            .map_err(|e| AdrToolsError::config(format!("invalid API URL '{api_url}': {e}")))?;
        if api_base.cannot_be_a_base() {
            return Err(AdrToolsError::config(format!(
                "invalid API URL '{api_url}': not a base URL"
            )));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| AdrToolsError::config("access token contains invalid characters"))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| AdrToolsError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base,
            repo,
        })
    }

    /// The repository this client is bound to.
    pub fn repo(&self) -> &RepoSlug {
        &self.repo
    }

    /// Build an API URL from path pieces. Pieces may contain `/` (branch names, file paths).
    fn url(&self, pieces: &[&str]) -> Result<Url> {
        let mut url = self.api_base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                AdrToolsError::config(format!("invalid API URL '{}'", self.api_base))
            })?;
            segments.pop_if_empty();
            for piece in pieces {
                segments.extend(piece.split('/').filter(|s| !s.is_empty()));
            }
        }
        Ok(url)
    }

    /// Build a URL under `/repos/{owner}/{repo}/`.
    fn repo_url(&self, pieces: &[&str]) -> Result<Url> {
        let mut all = vec!["repos", self.repo.owner.as_str(), self.repo.repo.as_str()];
        all.extend_from_slice(pieces);
        self.url(&all)
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| AdrToolsError::Network(format!("{operation}: {e}")))?;
        check_status(operation, response).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = self.send(operation, request).await?;
        let body = response
            .text()
            .await
            .map_err(|e| AdrToolsError::Network(format!("{operation}: failed to read body: {e}")))?;

        serde_json::from_str(&body).map_err(|e| {
            AdrToolsError::validation(format!("{operation}: unexpected response: {e}"))
        })
    }
}

#[async_trait]
impl RepositoryHost for GithubHost {
    #[instrument(skip(self))]
    async fn get_reference(&self, branch: &str) -> Result<GitReference> {
        let url = self.repo_url(&["git", "ref", "heads", branch])?;
        let payload: RefPayload = self
            .send_json("get reference", self.client.get(url))
            .await?;

        debug!(reference = %payload.name, sha = %payload.object.sha, "resolved reference");
        Ok(GitReference {
            name: payload.name,
            sha: payload.object.sha,
        })
    }

    #[instrument(skip(self))]
    async fn get_commit_tree(&self, commit_sha: &str) -> Result<String> {
        let url = self.repo_url(&["git", "commits", commit_sha])?;
        let payload: CommitPayload = self
            .send_json("get commit", self.client.get(url))
            .await?;
        Ok(payload.tree.sha)
    }

    #[instrument(skip(self))]
    async fn list_directory(&self, path: &str, git_ref: &str) -> Result<Vec<ContentEntry>> {
        let url = self.repo_url(&["contents", path])?;
        let entries: Vec<ContentEntry> = self
            .send_json(
                "list directory",
                self.client.get(url).query(&[("ref", git_ref)]),
            )
            .await?;

        debug!(entries = entries.len(), "listed directory");
        Ok(entries)
    }

    #[instrument(skip(self))]
    async fn get_file_content(&self, path: &str, git_ref: &str) -> Result<Option<String>> {
        let operation = "get file content";
        let url = self.repo_url(&["contents", path])?;
        let response = self
            .client
            .get(url)
            .query(&[("ref", git_ref)])
            .header(ACCEPT, RAW_MEDIA_TYPE)
            .send()
            .await
            .map_err(|e| AdrToolsError::Network(format!("{operation}: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("file not found");
            return Ok(None);
        }

        let response = check_status(operation, response).await?;
        let body = response
            .text()
            .await
            .map_err(|e| AdrToolsError::Network(format!("{operation}: failed to read body: {e}")))?;
        Ok(Some(body))
    }

    #[instrument(skip(self))]
    async fn search_open_labeled_requests(&self, label: &str) -> Result<Vec<u64>> {
        let query = format!("repo:{} is:pr is:open label:{label}", self.repo);
        let url = self.url(&["search", "issues"])?;
        let payload: SearchPayload = self
            .send_json(
                "search review requests",
                self.client
                    .get(url)
                    .query(&[("q", query.as_str()), ("per_page", SEARCH_PAGE_SIZE)]),
            )
            .await?;

        Ok(payload.items.into_iter().map(|item| item.number).collect())
    }

    #[instrument(skip(self))]
    async fn get_request_source_branch(&self, number: u64) -> Result<String> {
        let number = number.to_string();
        let url = self.repo_url(&["pulls", number.as_str()])?;
        let payload: PullPayload = self
            .send_json("get review request", self.client.get(url))
            .await?;
        Ok(payload.head.name)
    }

    #[instrument(skip_all, fields(bytes = content.len()))]
    async fn create_blob(&self, content: &str) -> Result<String> {
        let url = self.repo_url(&["git", "blobs"])?;
        let body = json!({ "content": content, "encoding": "utf-8" });
        let payload: ShaPayload = self
            .send_json("create blob", self.client.post(url).json(&body))
            .await?;
        Ok(payload.sha)
    }

    #[instrument(skip(self, entries), fields(entries = entries.len()))]
    async fn create_tree(&self, base_tree: &str, entries: &[TreeEntry]) -> Result<String> {
        let url = self.repo_url(&["git", "trees"])?;
        let tree: Vec<_> = entries
            .iter()
            .map(|e| json!({ "path": e.path, "mode": e.mode, "type": "blob", "sha": e.sha }))
            .collect();
        let body = json!({ "base_tree": base_tree, "tree": tree });
        let payload: ShaPayload = self
            .send_json("create tree", self.client.post(url).json(&body))
            .await?;
        Ok(payload.sha)
    }

    #[instrument(skip(self, message))]
    async fn create_commit(&self, parent: &str, tree: &str, message: &str) -> Result<String> {
        let url = self.repo_url(&["git", "commits"])?;
        let body = json!({ "message": message, "tree": tree, "parents": [parent] });
        let payload: ShaPayload = self
            .send_json("create commit", self.client.post(url).json(&body))
            .await?;
        Ok(payload.sha)
    }

    #[instrument(skip(self))]
    async fn create_ref(&self, branch: &str, sha: &str) -> Result<()> {
        let url = self.repo_url(&["git", "refs"])?;
        let body = json!({ "ref": branch_ref(branch), "sha": sha });
        self.send("create reference", self.client.post(url).json(&body))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_ref(&self, branch: &str, sha: &str) -> Result<()> {
        let url = self.repo_url(&["git", "refs", "heads", branch])?;
        let body = json!({ "sha": sha, "force": false });
        self.send("update reference", self.client.patch(url).json(&body))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn create_pull_request(
        &self,
        title: &str,
        base: &str,
        head: &str,
    ) -> Result<PullRequest> {
        let url = self.repo_url(&["pulls"])?;
        let body = json!({ "title": title, "base": base, "head": head });
        self.send_json("create review request", self.client.post(url).json(&body))
            .await
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Turn a non-success response into [`AdrToolsError::Host`].
async fn check_status(operation: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(AdrToolsError::host(
        operation,
        status.as_u16(),
        error_message(&body, status),
    ))
}

/// Prefer the API's `message` field, fall back to the raw body, then the status reason.
fn error_message(body: &str, status: StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        status.canonical_reason().unwrap_or("unknown error").to_string()
    } else {
        trimmed.to_string()
    }
}
