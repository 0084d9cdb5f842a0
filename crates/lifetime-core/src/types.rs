use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Owning namespace of a project, as returned by the GitLab projects API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub full_path: String,
}

/// A project visible to the configured token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    pub namespace: Namespace,
}

impl Project {
    /// The organizational group this project's commits are reported under.
    pub fn group(&self) -> &str {
        &self.namespace.full_path
    }
}

/// A merge request as returned by `GET /projects/:id/merge_requests`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeRequest {
    pub iid: u64,
    #[serde(default)]
    pub title: String,
    pub target_branch: String,
    pub source_branch: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// When the merge request was merged. `None` for merge requests that were
    /// never merged, or whose merge time GitLab did not record.
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
}

/// A commit belonging to a merge request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub id: String,
    #[serde(default)]
    pub short_id: String,
    #[serde(default)]
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// One ingested commit, written verbatim to the CSV report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    #[serde(rename = "Group")]
    pub group: String,
    #[serde(rename = "Project")]
    pub project: String,
    #[serde(rename = "Commit_ID")]
    pub commit_id: String,
    /// Merge time of the containing merge request.
    #[serde(rename = "Committed_date")]
    pub committed_date: DateTime<Utc>,
    #[serde(rename = "Created_at")]
    pub created_at: DateTime<Utc>,
    /// Raw difference; negative when the commit postdates the merge.
    #[serde(rename = "lifetime_hours")]
    pub lifetime_hours: f64,
    #[serde(rename = "Target_Branch")]
    pub target_branch: String,
    #[serde(rename = "Source_Branch")]
    pub source_branch: String,
}

impl CommitRecord {
    /// Build a record for `commit`, merged through `mr` at `merged_at`.
    pub fn new(
        project: &Project,
        mr: &MergeRequest,
        commit: &Commit,
        merged_at: DateTime<Utc>,
    ) -> Self {
        Self {
            group: project.group().to_string(),
            project: project.name.clone(),
            commit_id: commit.id.clone(),
            committed_date: merged_at,
            created_at: commit.created_at,
            lifetime_hours: lifetime_hours(commit.created_at, merged_at),
            target_branch: mr.target_branch.clone(),
            source_branch: mr.source_branch.clone(),
        }
    }

    /// The statistics sample this record contributes.
    pub fn observation(&self) -> Observation {
        Observation {
            day: self.committed_date.date_naive(),
            group: self.group.clone(),
            lifetime_hours: self.lifetime_hours.max(0.0),
        }
    }
}

/// A single lifetime sample: one commit, bucketed by merge day and group.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub day: NaiveDate,
    pub group: String,
    pub lifetime_hours: f64,
}

impl Observation {
    pub fn new(day: NaiveDate, group: impl Into<String>, lifetime_hours: f64) -> Self {
        Self {
            day,
            group: group.into(),
            lifetime_hours,
        }
    }
}

/// Period a summary row covers. Rows are keyed by the period's first day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    /// ISO week, starting Monday.
    Week,
    Month,
    Year,
}

impl Granularity {
    /// First day of the period containing `date`.
    pub fn period_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Day => date,
            Granularity::Week => {
                date - chrono::Duration::days(date.weekday().num_days_from_monday() as i64)
            }
            Granularity::Month => date.with_day(1).unwrap_or(date),
            Granularity::Year => date.with_ordinal(1).unwrap_or(date),
        }
    }
}

impl std::str::FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "daily" => Ok(Granularity::Day),
            "week" | "weekly" => Ok(Granularity::Week),
            "month" | "monthly" => Ok(Granularity::Month),
            "year" | "yearly" => Ok(Granularity::Year),
            other => Err(format!(
                "unknown granularity '{}' (expected day, week, month or year)",
                other
            )),
        }
    }
}

/// Fractional hours from `created` to `merged`.
///
/// Negative for rebased or amended commits whose creation time is after the
/// merge. [`CommitRecord::observation`] clamps those to zero.
pub fn lifetime_hours(created: DateTime<Utc>, merged: DateTime<Utc>) -> f64 {
    let millis = (merged - created).num_milliseconds();
    millis as f64 / 3_600_000.0
}
