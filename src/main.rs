//! scheduled-merge CLI

use anyhow::{Context, Result};
use clap::Parser;
use scheduled_merge::clock::SystemClock;
use scheduled_merge::config::{
    DEFAULT_CONFIG_FILE_PATH, DEFAULT_GITLAB_BASE_URL, DEFAULT_SCHEDULED_LABEL, GitLabConfig,
    TaskConfig,
};
use scheduled_merge::logging::init_tracing;
use scheduled_merge::merge::{BatchRunner, MergeEngine};
use scheduled_merge::platform::{GitLabService, PlatformService};
use scheduled_merge::trigger::{TaskSchedule, run_periodically};
use std::sync::Arc;
use tracing::{Level, info};

/// Merge labelled GitLab merge requests inside per-repository merge windows
#[derive(Parser, Debug)]
#[command(name = "scheduled-merge", version, about)]
struct Cli {
    /// Token with which to authenticate with GitLab
    #[arg(short = 't', long, env = "GITLAB_TOKEN", hide_env_values = true)]
    gitlab_token: String,

    /// Base URL of the GitLab API to use
    #[arg(long, env = "GITLAB_BASE_URL", default_value = DEFAULT_GITLAB_BASE_URL)]
    gitlab_base_url: String,

    /// Name of the label which indicates an MR should be scheduled
    #[arg(long, env = "SCHEDULED_LABEL", default_value = DEFAULT_SCHEDULED_LABEL)]
    scheduled_label: String,

    /// Path of the config file in the repo which configures merge windows
    #[arg(long, env = "CONFIG_FILE_PATH", default_value = DEFAULT_CONFIG_FILE_PATH)]
    config_file_path: String,

    /// How often to process merge requests: "@every <duration>" or a cron expression
    #[arg(long, env = "TASK_SCHEDULE", default_value = "@every 15m")]
    task_schedule: String,

    /// Process merge requests once and exit
    #[arg(long)]
    once: bool,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: Level,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json, cli.log_level);

    let schedule: TaskSchedule = cli
        .task_schedule
        .parse()
        .context("invalid task schedule")?;
    let gitlab_config = GitLabConfig::new(&cli.gitlab_token, &cli.gitlab_base_url)?;
    let task_config = TaskConfig {
        scheduled_label: cli.scheduled_label,
        config_file_path: cli.config_file_path,
    };

    let platform: Arc<dyn PlatformService> = Arc::new(GitLabService::new(&gitlab_config)?);
    let me = platform
        .current_user()
        .await
        .context("failed to get current user information from GitLab")?;
    info!(user = %me.username, "authenticated with GitLab");

    let engine = MergeEngine::new(platform, task_config, me.id);
    let runner = BatchRunner::new(engine, Arc::new(SystemClock));

    if cli.once {
        let outcomes = runner.run().await?.into_result()?;
        info!(processed = outcomes.len(), "batch finished");
        return Ok(());
    }

    info!(schedule = %cli.task_schedule, "starting task");
    run_periodically(&runner, &schedule, async {
        tokio::signal::ctrl_c().await.ok();
    })
    .await;

    Ok(())
}
