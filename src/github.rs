//! Pull request creation through the GitHub REST API.

use crate::traits::{PullRequest, PullRequestClient, PullRequestError};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, instrument};

#[derive(Debug, Serialize)]
struct CreatePullRequestBody<'a> {
    title: &'a str,
    head: &'a str,
    base: &'a str,
    body: &'a str,
}

pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(api_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    fn pulls_url(&self, owner: &str, repo: &str) -> String {
        format!("{}/repos/{}/{}/pulls", self.api_url, owner, repo)
    }
}

#[async_trait]
impl PullRequestClient for GitHubClient {
    #[instrument(skip(self, request), fields(head = %request.head, base = %request.base))]
    async fn create_pull_request(&self, request: &PullRequest) -> Result<(), PullRequestError> {
        let mut builder = self
            .http
            .post(self.pulls_url(&request.owner, &request.repo))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", concat!("fixbot/", env!("CARGO_PKG_VERSION")))
            .json(&CreatePullRequestBody {
                title: &request.title,
                head: &request.head,
                base: &request.base,
                body: &request.body,
            });
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| PullRequestError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PullRequestError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!("Pull request created");
        Ok(())
    }
}
