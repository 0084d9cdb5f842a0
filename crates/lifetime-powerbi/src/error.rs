use thiserror::Error;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Failed to parse dataset id from the Power BI push URL '{0}'")]
    DatasetId(String),

    #[error("Power BI configuration error: {0}")]
    Config(String),

    #[error("Failed to get Power BI access token: {0}")]
    Auth(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
