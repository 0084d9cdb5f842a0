use lifetime_analytics::SummaryRow;
use lifetime_core::config::PowerBiConfig;
use tracing::{info, warn};

use crate::auth::{acquire_token, Credentials};
use crate::error::PublishError;

/// Result of a best-effort call to Power BI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Succeeded,
    /// Nothing was sent. An empty row set is not posted as `[]`; the
    /// streaming endpoint has nothing to add and the cleared table stays empty.
    Skipped,
    /// The service answered with a non-success status.
    Rejected { status: u16, body: String },
    /// The request never got a response.
    Unreachable(String),
}

impl PublishOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PublishOutcome::Succeeded)
    }
}

/// Pushes summary rows to a streaming dataset, optionally clearing it first.
pub struct Publisher {
    client: reqwest::Client,
    config: PowerBiConfig,
    push_url: String,
}

impl Publisher {
    /// `None` when no push URL is configured.
    pub fn from_config(config: &PowerBiConfig) -> Result<Option<Self>, PublishError> {
        let Some(push_url) = config.push_url.clone() else {
            return Ok(None);
        };

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("commit-lifetime/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Some(Self {
            client,
            config: config.clone(),
            push_url,
        }))
    }

    pub fn push_url(&self) -> &str {
        &self.push_url
    }

    /// Clear (when `dataset_id` is given) and then push `rows`.
    ///
    /// Only authentication and configuration problems during clearing are
    /// returned as errors; HTTP failures are logged.
    pub async fn publish(
        &self,
        rows: &[SummaryRow],
        dataset_id: Option<&str>,
    ) -> Result<PublishOutcome, PublishError> {
        if let Some(dataset_id) = dataset_id {
            self.clear_rows(dataset_id).await?;
        }
        Ok(self.push_rows(rows).await)
    }

    /// Delete every row of the configured table in `dataset_id`.
    pub async fn clear_rows(&self, dataset_id: &str) -> Result<PublishOutcome, PublishError> {
        let workspace_id = self
            .config
            .workspace_id
            .as_deref()
            .ok_or_else(|| PublishError::Config("powerbi.workspace_id is not set".into()))?;
        let credentials = Credentials::from_config(&self.config)?;
        let token = acquire_token(&self.client, &self.config, &credentials).await?;

        let url = format!(
            "{}/groups/{}/datasets/{}/tables/{}/rows",
            self.config.api_base.trim_end_matches('/'),
            workspace_id,
            dataset_id,
            self.config.table
        );

        let request = self.client.delete(&url).bearer_auth(token);
        let outcome = send(request).await;
        match &outcome {
            PublishOutcome::Succeeded => info!("Clearing of Power BI dataset succeeded."),
            PublishOutcome::Rejected { status, body } => {
                warn!("Power BI clear failed with status code {}:\n{}", status, body)
            }
            PublishOutcome::Unreachable(e) => warn!("Power BI clear failed: {}", e),
            PublishOutcome::Skipped => {}
        }
        Ok(outcome)
    }

    /// POST `rows` as a JSON array to the push URL.
    pub async fn push_rows(&self, rows: &[SummaryRow]) -> PublishOutcome {
        if rows.is_empty() {
            info!("No summary rows to push to Power BI.");
            return PublishOutcome::Skipped;
        }

        let request = self.client.post(&self.push_url).json(rows);
        let outcome = send(request).await;
        match &outcome {
            PublishOutcome::Succeeded => info!("Push of {} rows to Power BI succeeded.", rows.len()),
            PublishOutcome::Rejected { status, body } => {
                warn!("Push to Power BI failed with status code {}:\n{}", status, body)
            }
            PublishOutcome::Unreachable(e) => warn!("Push to Power BI failed: {}", e),
            PublishOutcome::Skipped => {}
        }
        outcome
    }
}

async fn send(request: reqwest::RequestBuilder) -> PublishOutcome {
    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => return PublishOutcome::Unreachable(e.to_string()),
    };

    let status = response.status();
    if status.is_success() {
        return PublishOutcome::Succeeded;
    }
    let body = response.text().await.unwrap_or_default();
    PublishOutcome::Rejected {
        status: status.as_u16(),
        body,
    }
}
