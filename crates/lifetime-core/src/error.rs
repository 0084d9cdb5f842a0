use thiserror::Error;

#[derive(Error, Debug)]
pub enum LifetimeError {
    #[error("Invalid timestamp '{input}': {message}")]
    Timestamp { input: String, message: String },

    #[error("Report window is empty: after {after} is later than before {before}")]
    EmptyWindow { after: String, before: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LifetimeError>;
