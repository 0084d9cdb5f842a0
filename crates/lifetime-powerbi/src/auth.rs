use lifetime_core::config::PowerBiConfig;
use serde::Deserialize;
use tracing::debug;

use crate::error::PublishError;

/// App registration credentials for the client-credentials grant.
#[derive(Clone)]
pub struct Credentials {
    pub tenant_id: String,
    pub client_id: String,
    client_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Collect credentials from config and environment.
    pub fn from_config(config: &PowerBiConfig) -> Result<Self, PublishError> {
        let tenant_id = config
            .tenant_id
            .clone()
            .ok_or_else(|| PublishError::Config("powerbi.tenant_id is not set".into()))?;
        let client_id = config
            .client_id
            .clone()
            .ok_or_else(|| PublishError::Config("powerbi.client_id is not set".into()))?;
        let client_secret = config.resolved_client_secret().ok_or_else(|| {
            PublishError::Config(format!(
                "no client secret in config or ${}",
                config.client_secret_env.as_deref().unwrap_or("POWERBI_CLIENT_SECRET")
            ))
        })?;
        Ok(Self::new(tenant_id, client_id, client_secret))
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Request an access token for the Power BI API.
///
/// Any failure, including transport errors, is reported as
/// [`PublishError::Auth`].
pub async fn acquire_token(
    client: &reqwest::Client,
    config: &PowerBiConfig,
    credentials: &Credentials,
) -> Result<String, PublishError> {
    let url = format!(
        "{}/{}/oauth2/token",
        config.authority_host.trim_end_matches('/'),
        credentials.tenant_id
    );
    debug!("Requesting Power BI token from {}", url);

    let response = client
        .post(&url)
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("resource", config.resource.as_str()),
        ])
        .send()
        .await
        .map_err(|e| PublishError::Auth(format!("token request failed: {}", e)))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| PublishError::Auth(format!("failed to read token response: {}", e)))?;

    let parsed: Option<TokenResponse> = serde_json::from_str(&body).ok();
    match parsed {
        Some(TokenResponse {
            access_token: Some(token),
            ..
        }) if status.is_success() => Ok(token),
        Some(TokenResponse {
            error,
            error_description,
            ..
        }) => Err(PublishError::Auth(format!(
            "status {}: {}",
            status.as_u16(),
            error_description
                .or(error)
                .unwrap_or_else(|| "no access token in response".into())
        ))),
        None => Err(PublishError::Auth(format!(
            "status {}: {}",
            status.as_u16(),
            body
        ))),
    }
}
