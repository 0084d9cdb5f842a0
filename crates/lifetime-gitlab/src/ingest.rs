//! Walks projects, merged merge requests and commits into commit records.

use chrono::{DateTime, Utc};
use lifetime_core::types::{MergeRequest, Project};
use lifetime_core::{CommitRecord, Observation, ReportWindow};
use tracing::{debug, info, warn};

use crate::error::GitLabError;
use crate::SourceControl;

/// Which merge requests count toward the report.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub window: ReportWindow,
    pub target_branches: Vec<String>,
    /// Log every commit as it is recorded.
    pub debug: bool,
}

impl IngestOptions {
    /// The merge time of `mr` if it is merged, targets a configured branch,
    /// and was merged inside the window.
    pub fn qualifying_merge_time(&self, mr: &MergeRequest) -> Option<DateTime<Utc>> {
        let merged_at = mr.merged_at?;
        if !self.target_branches.iter().any(|b| *b == mr.target_branch) {
            return None;
        }
        if !self.window.contains(merged_at) {
            return None;
        }
        Some(merged_at)
    }
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub projects_scanned: usize,
    pub projects_skipped: usize,
    pub merge_requests_seen: usize,
    pub merge_requests_accepted: usize,
    pub commits_recorded: usize,
}

/// Everything ingestion produced.
#[derive(Debug, Clone, Default)]
pub struct Ingestion {
    pub records: Vec<CommitRecord>,
    pub stats: IngestStats,
}

impl Ingestion {
    pub fn observations(&self) -> Vec<Observation> {
        self.records.iter().map(CommitRecord::observation).collect()
    }
}

/// Sequential ingestion over a [`SourceControl`] host.
pub struct Ingestor<'a, S: SourceControl + ?Sized> {
    source: &'a S,
    options: IngestOptions,
}

impl<'a, S: SourceControl + ?Sized> Ingestor<'a, S> {
    pub fn new(source: &'a S, options: IngestOptions) -> Self {
        Self { source, options }
    }

    /// Ingest every visible project.
    ///
    /// Failing to enumerate projects aborts the run. A project whose merge
    /// requests or commits cannot be listed is logged and skipped whole.
    pub async fn run(&self) -> Result<Ingestion, GitLabError> {
        let projects = self.source.projects().await?;
        info!("Found {} projects", projects.len());

        let mut ingestion = Ingestion::default();
        for project in &projects {
            ingestion.stats.projects_scanned += 1;
            info!("Group: {} Project: {}", project.group(), project.name);

            match self.ingest_project(project, &mut ingestion.stats).await {
                Ok(records) => {
                    ingestion.stats.commits_recorded += records.len();
                    ingestion.records.extend(records);
                }
                Err(e) if e.is_forbidden() => {
                    ingestion.stats.projects_skipped += 1;
                    warn!("Forbidden merge requests in project {}: {}", project.name, e);
                }
                Err(e) => {
                    ingestion.stats.projects_skipped += 1;
                    warn!("Skipping project {}: {}", project.name, e);
                }
            }
        }

        let stats = &ingestion.stats;
        info!(
            "Ingested {} commits from {} of {} merge requests across {} projects ({} skipped)",
            stats.commits_recorded,
            stats.merge_requests_accepted,
            stats.merge_requests_seen,
            stats.projects_scanned,
            stats.projects_skipped,
        );

        Ok(ingestion)
    }

    async fn ingest_project(
        &self,
        project: &Project,
        stats: &mut IngestStats,
    ) -> Result<Vec<CommitRecord>, GitLabError> {
        let updated_after = self.options.window.updated_after_param();
        let merge_requests = self
            .source
            .merged_merge_requests(project, &updated_after)
            .await?;

        let mut records = Vec::new();
        for mr in &merge_requests {
            stats.merge_requests_seen += 1;
            let Some(merged_at) = self.options.qualifying_merge_time(mr) else {
                continue;
            };
            stats.merge_requests_accepted += 1;

            info!(
                "MR IID:{} created_at:{} merged_at:{} target_branch:{} source_branch:{}",
                mr.iid,
                mr.created_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "-".into()),
                merged_at.to_rfc3339(),
                mr.target_branch,
                mr.source_branch,
            );

            for commit in self.source.merge_request_commits(project, mr).await? {
                let record = CommitRecord::new(project, mr, &commit, merged_at);
                if self.options.debug {
                    debug!(
                        "Commit {} '{}' created_at:{} lifetime:{:.2}h",
                        commit.id,
                        commit.title,
                        commit.created_at.to_rfc3339(),
                        record.lifetime_hours,
                    );
                }
                records.push(record);
            }
        }

        Ok(records)
    }
}
