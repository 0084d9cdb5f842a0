use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitLabError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Access to {resource} is forbidden")]
    Forbidden { resource: String },

    #[error("Listing {resource} failed with status {status}: {body}")]
    Listing {
        resource: String,
        status: u16,
        body: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl GitLabError {
    pub fn is_forbidden(&self) -> bool {
        matches!(self, GitLabError::Forbidden { .. })
    }
}
