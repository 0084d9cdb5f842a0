use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use lifetime_analytics::{Aggregator, ReportGenerator};
use lifetime_core::config::{parse_branch_list, PowerBiConfig};
use lifetime_core::{AppConfig, Granularity, ReportWindow};
use lifetime_gitlab::{GitLabClient, IngestOptions, Ingestor};
use lifetime_powerbi::{parse_dataset_id, Publisher};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "commit-lifetime",
    about = "Generate csv report of commit lifetime for merge requests",
    version,
    author
)]
struct Cli {
    /// Path to config file (default: ~/.config/commit-lifetime/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// URL of gitlab instance to query
    #[arg(long = "gitlab_url")]
    gitlab_url: Option<String>,

    /// GitLab private token (falls back to $GITLAB_TOKEN)
    #[arg(long = "gitlab_token")]
    gitlab_token: Option<String>,

    /// Access token for jira, requires read access.
    #[arg(long = "jira_token")]
    jira_token: String,

    /// URL to push data to a Power BI streaming dataset. Skipped if not provided.
    #[arg(long = "powerbi_url")]
    powerbi_url: Option<String>,

    /// Retrieve merge requests merged at or after this ISO 8601 date.
    #[arg(long)]
    after: Option<String>,

    /// Limit merge requests to those merged at or before this ISO 8601 date.
    #[arg(long)]
    before: Option<String>,

    /// Enable debug log output
    #[arg(long)]
    debug: bool,

    /// Generate report for the last full UTC day.
    #[arg(long = "last_day")]
    last_day: bool,

    /// Clears out all existing Power BI rows first.
    #[arg(long = "clear_powerbi")]
    clear_powerbi: bool,

    /// Comma-separated merge request target branches to count.
    #[arg(long = "target_branches")]
    target_branches: Option<String>,

    /// CSV output path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Aggregation period: day, week, month or year
    #[arg(long)]
    granularity: Option<Granularity>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up tracing.
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| {
            "commit_lifetime=info,lifetime_gitlab=info,lifetime_analytics=info,lifetime_powerbi=info,warn"
                .into()
        }))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Load config.
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AppConfig::load()?,
    };
    apply_overrides(&mut config, &cli);

    tracing::debug!(
        "jira token supplied ({} chars); not used by this report",
        cli.jira_token.len()
    );

    let window = if cli.last_day {
        ReportWindow::last_full_day(Utc::now())
    } else {
        ReportWindow::parse(&config.report.after, config.report.before.as_deref())?
    };

    // A bad push URL must fail before any GitLab traffic.
    let dataset_id = resolve_dataset_id(&config.powerbi)?;

    tracing::info!(
        "Retrieving merge requests from {} into branches {:?}",
        window,
        config.gitlab.target_branches
    );

    let client = GitLabClient::new(&config.gitlab)?;
    let options = IngestOptions {
        window,
        target_branches: config.gitlab.target_branches.clone(),
        debug: cli.debug,
    };
    let ingestion = Ingestor::new(&client, options)
        .run()
        .await
        .context("Failed to enumerate GitLab projects")?;

    ReportGenerator::write_csv(&config.report.output, &ingestion.records)
        .with_context(|| format!("Failed to write {}", config.report.output.display()))?;

    let mut aggregator = Aggregator::new(config.report.granularity);
    aggregator.extend(&ingestion.observations());
    let rows = aggregator.summarize();
    tracing::info!(
        "Aggregated {} commits into {} {:?} periods",
        aggregator.total_samples(),
        aggregator.active_days(),
        config.report.granularity
    );

    for line in ReportGenerator::text_summary(&rows).lines() {
        tracing::info!("{}", line);
    }

    match Publisher::from_config(&config.powerbi)? {
        Some(publisher) => {
            publisher.publish(&rows, dataset_id.as_deref()).await?;
        }
        None => tracing::info!("No Power BI push URL configured; skipping publish."),
    }

    Ok(())
}

/// Dataset id to clear, when clearing is requested and a push URL is set.
fn resolve_dataset_id(config: &PowerBiConfig) -> Result<Option<String>> {
    match (&config.push_url, config.clear) {
        (Some(url), true) => Ok(Some(parse_dataset_id(url).context(
            "Failed to parse dataset id from the PowerBI Push URL, are you sure the URL is valid?",
        )?)),
        (None, true) => {
            tracing::warn!("--clear_powerbi has no effect without a Power BI push URL");
            Ok(None)
        }
        _ => Ok(None),
    }
}

/// Apply command-line flags on top of file configuration.
fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(url) = &cli.gitlab_url {
        config.gitlab.url = url.clone();
    }
    if let Some(token) = &cli.gitlab_token {
        config.gitlab.token = Some(token.clone());
    }
    if let Some(branches) = &cli.target_branches {
        config.gitlab.target_branches = parse_branch_list(branches);
    }
    if let Some(url) = &cli.powerbi_url {
        config.powerbi.push_url = Some(url.clone());
    }
    if cli.clear_powerbi {
        config.powerbi.clear = true;
    }
    if let Some(after) = &cli.after {
        config.report.after = after.clone();
    }
    if let Some(before) = &cli.before {
        config.report.before = Some(before.clone());
    }
    if let Some(output) = &cli.output {
        config.report.output = output.clone();
    }
    if let Some(granularity) = cli.granularity {
        config.report.granularity = granularity;
    }
}
