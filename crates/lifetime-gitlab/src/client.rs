use async_trait::async_trait;
use lifetime_core::config::GitLabConfig;
use lifetime_core::types::{Commit, MergeRequest, Project};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::GitLabError;
use crate::SourceControl;

/// Paginated client for the GitLab REST v4 API.
pub struct GitLabClient {
    client: reqwest::Client,
    base: Url,
    token: Option<String>,
    page_size: u32,
}

impl GitLabClient {
    pub fn new(config: &GitLabConfig) -> Result<Self, GitLabError> {
        let base = Url::parse(&config.url)
            .map_err(|e| GitLabError::Config(format!("Invalid GitLab URL '{}': {}", config.url, e)))?;
        if base.cannot_be_a_base() {
            return Err(GitLabError::Config(format!(
                "GitLab URL '{}' cannot be used as a base",
                config.url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("commit-lifetime/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base,
            token: config.resolved_token(),
            page_size: config.page_size.clamp(1, 100),
        })
    }

    /// `<base>/api/v4/<segments...>`
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["api", "v4"]).extend(segments);
        }
        url
    }

    /// Fetch every page of a list endpoint, following `X-Next-Page`.
    async fn get_all<T: DeserializeOwned>(
        &self,
        resource: &str,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, GitLabError> {
        let mut items = Vec::new();
        let mut page: u32 = 1;

        loop {
            let mut url = self.endpoint(segments);
            url.query_pairs_mut()
                .extend_pairs(query)
                .append_pair("per_page", &self.page_size.to_string())
                .append_pair("page", &page.to_string());

            let mut request = self.client.get(url);
            if let Some(token) = &self.token {
                request = request.header("PRIVATE-TOKEN", token);
            }

            let response = request.send().await?;
            let status = response.status();
            if status == StatusCode::FORBIDDEN {
                return Err(GitLabError::Forbidden {
                    resource: resource.to_string(),
                });
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(GitLabError::Listing {
                    resource: resource.to_string(),
                    status: status.as_u16(),
                    body,
                });
            }

            let next = next_page(response.headers());
            let batch: Vec<T> = response.json().await?;
            debug!("{}: page {} returned {} items", resource, page, batch.len());
            items.extend(batch);

            match next {
                Some(n) if n > page => page = n,
                _ => break,
            }
        }

        Ok(items)
    }
}

/// Parse the `X-Next-Page` header. Blank on the last page.
fn next_page(headers: &HeaderMap) -> Option<u32> {
    headers
        .get("x-next-page")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

#[async_trait]
impl SourceControl for GitLabClient {
    async fn projects(&self) -> Result<Vec<Project>, GitLabError> {
        self.get_all("projects", &["projects"], &[]).await
    }

    async fn merged_merge_requests(
        &self,
        project: &Project,
        updated_after: &str,
    ) -> Result<Vec<MergeRequest>, GitLabError> {
        let id = project.id.to_string();
        self.get_all(
            &format!("merge requests of {}", project.name),
            &["projects", &id, "merge_requests"],
            &[("state", "merged"), ("updated_after", updated_after)],
        )
        .await
    }

    async fn merge_request_commits(
        &self,
        project: &Project,
        mr: &MergeRequest,
    ) -> Result<Vec<Commit>, GitLabError> {
        let id = project.id.to_string();
        let iid = mr.iid.to_string();
        self.get_all(
            &format!("commits of {}!{}", project.name, mr.iid),
            &["projects", &id, "merge_requests", &iid, "commits"],
            &[],
        )
        .await
    }
}
