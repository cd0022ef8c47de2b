//! GitHub-backed verifiable data registry.
//!
//! Documents are committed through the GitHub contents API and served back
//! from `raw.githubusercontent.com`. Publishing is an upsert: the current
//! blob sha is looked up first (404 means a new file) and passed along
//! with the new content.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use cornerstone_core::model::GithubSettings;
use cornerstone_core::{Error, Result};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::{USER_AGENT, error_for_status, json_body, send_error};

const SERVICE: &str = "github";
const FETCH_SERVICE: &str = "vdr";

/// Public GitHub API.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// A registry that documents can be published to and fetched from.
#[async_trait]
pub trait Vdr: Send + Sync {
    /// Publish `content` at `path` and return its public URL.
    async fn publish(
        &self,
        settings: &GithubSettings,
        path: &str,
        content: &[u8],
        message: &str,
    ) -> Result<String>;

    /// Fetch a JSON document by URL.
    async fn fetch_json(&self, url: &str) -> Result<Value>;

    /// Registry name for diagnostics.
    fn name(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct ContentsEntry {
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutContentsBody<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

/// GitHub contents API client.
#[derive(Debug, Clone)]
pub struct GithubVdr {
    http: reqwest::Client,
    api_base: String,
}

impl Default for GithubVdr {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

impl GithubVdr {
    /// Create a client for the API at `api_base` (GitHub Enterprise or a mock).
    pub fn new(api_base: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_base)
    }

    /// Create a client on a preconfigured `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, api_base: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// The API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn contents_url(&self, settings: &GithubSettings, path: &str) -> Result<Url> {
        let raw = format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base,
            settings.owner.trim(),
            settings.repo.trim(),
            settings.repo_path(path)
        );
        Url::parse(&raw).map_err(|e| Error::config(format!("invalid GitHub API URL '{raw}': {e}")))
    }

    fn request(&self, method: reqwest::Method, url: Url, token: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    /// Sha of the file currently at `url` on `branch`, if it exists.
    async fn existing_sha(&self, url: &Url, branch: &str, token: &str) -> Result<Option<String>> {
        let mut lookup = url.clone();
        lookup.query_pairs_mut().append_pair("ref", branch);

        let response = self
            .request(reqwest::Method::GET, lookup, token)
            .send()
            .await
            .map_err(|e| send_error(SERVICE, e))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = error_for_status(SERVICE, response).await?;
        let entry: ContentsEntry = json_body(SERVICE, response).await?;
        Ok(Some(entry.sha))
    }
}

#[async_trait]
impl Vdr for GithubVdr {
    async fn publish(
        &self,
        settings: &GithubSettings,
        path: &str,
        content: &[u8],
        message: &str,
    ) -> Result<String> {
        let token = settings
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::config("GitHub token is not configured"))?;
        let public_url = settings.vdr_url(path)?;
        let url = self.contents_url(settings, path)?;
        let branch = settings.branch.trim();

        let sha = self.existing_sha(&url, branch, token).await?;
        let body = PutContentsBody {
            message,
            content: BASE64.encode(content),
            branch,
            sha,
        };

        let response = self
            .request(reqwest::Method::PUT, url, token)
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(SERVICE, e))?;
        error_for_status(SERVICE, response).await?;

        log::info!(
            "Published {} to {}/{}@{}",
            settings.repo_path(path),
            settings.owner,
            settings.repo,
            branch
        );
        Ok(public_url)
    }

    async fn fetch_json(&self, url: &str) -> Result<Value> {
        let parsed = Url::parse(url)
            .map_err(|e| Error::validation_field("source_url", format!("invalid URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::validation_field(
                "source_url",
                "only http(s) URLs can be fetched",
            ));
        }

        let response = self
            .http
            .get(parsed)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| send_error(FETCH_SERVICE, e))?;
        let response = error_for_status(FETCH_SERVICE, response).await?;
        json_body(FETCH_SERVICE, response).await
    }

    fn name(&self) -> &str {
        SERVICE
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn settings() -> GithubSettings {
        GithubSettings {
            owner: "cornerstone".into(),
            repo: "vdr".into(),
            branch: "main".into(),
            base_path: "types".into(),
            token: Some("ghp_x".into()),
        }
    }

    #[test]
    fn test_contents_url() {
        let vdr = GithubVdr::new("https://api.github.com/");
        let url = vdr.contents_url(&settings(), "/member.json").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/cornerstone/vdr/contents/types/member.json"
        );
    }

    #[test]
    fn test_default_api_base() {
        assert_eq!(GithubVdr::default().api_base(), DEFAULT_API_BASE);
    }

    #[test]
    fn test_put_body_omits_missing_sha() {
        let body = PutContentsBody {
            message: "m",
            content: BASE64.encode(b"{}"),
            branch: "main",
            sha: None,
        };
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(value["content"], "e30=");
        assert!(value.get("sha").is_none());
    }
}
