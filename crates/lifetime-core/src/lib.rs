pub mod config;
pub mod error;
pub mod types;
pub mod window;

pub use config::AppConfig;
pub use error::LifetimeError;
pub use types::{CommitRecord, Granularity, Observation};
pub use window::ReportWindow;
