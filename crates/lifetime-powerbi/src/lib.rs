//! Publishing summary rows to a Power BI streaming dataset.
//!
//! Pushes go straight to the dataset's push URL. Clearing goes through the
//! Power BI REST API and needs an Azure AD token acquired with client
//! credentials.

pub mod auth;
pub mod dataset;
pub mod error;
pub mod publisher;

pub use dataset::parse_dataset_id;
pub use error::PublishError;
pub use publisher::{PublishOutcome, Publisher};
