//! GitLab ingestion for commit-lifetime.
//!
//! [`GitLabClient`] talks to the REST v4 API; [`Ingestor`] walks projects,
//! merged merge requests and their commits through the [`SourceControl`]
//! trait and turns qualifying commits into [`CommitRecord`]s.
//!
//! [`CommitRecord`]: lifetime_core::CommitRecord

pub mod client;
pub mod error;
pub mod ingest;

use async_trait::async_trait;
use lifetime_core::types::{Commit, MergeRequest, Project};

pub use client::GitLabClient;
pub use error::GitLabError;
pub use ingest::{IngestOptions, IngestStats, Ingestion, Ingestor};

/// Read access to a source-control host.
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Every project visible to the caller.
    async fn projects(&self) -> Result<Vec<Project>, GitLabError>;

    /// Merged merge requests of `project` updated after `updated_after`.
    async fn merged_merge_requests(
        &self,
        project: &Project,
        updated_after: &str,
    ) -> Result<Vec<MergeRequest>, GitLabError>;

    /// Commits that make up `mr`.
    async fn merge_request_commits(
        &self,
        project: &Project,
        mr: &MergeRequest,
    ) -> Result<Vec<Commit>, GitLabError>;
}
