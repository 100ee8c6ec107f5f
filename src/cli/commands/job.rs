//! Transformation job CLI commands.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use console::style;
use indicatif::ProgressBar;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::cli::output::progress::{create_job_progress, ProgressBarExt};
use crate::cli::output::table::{create_table, job_status_cell, outcome_cell, text_cell};
use crate::cli::output::{output, truncate, CommandOutput};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Config, Job, JobRequest, JobResults, JobStatus, TransformationKind, TransformationOutcome, VerificationLevel,
};
use crate::infrastructure::setup::build_orchestrator;
use crate::services::JobOrchestrator;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Args, Debug)]
pub struct JobArgs {
    #[command(subcommand)]
    pub command: JobCommands,
}

#[derive(Subcommand, Debug)]
pub enum JobCommands {
    /// Create a transformation job
    Submit(SubmitArgs),
    /// Execute a pending job in the foreground
    Run {
        /// Job ID
        id: Uuid,
    },
    /// Show a job's status and counters
    Status {
        /// Job ID
        id: Uuid,
    },
    /// List a job's per-file outcomes
    Results {
        /// Job ID
        id: Uuid,
        #[arg(long, default_value_t = 50)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Request cancellation; a running job stops at its next batch boundary
    Cancel {
        /// Job ID
        id: Uuid,
    },
    /// List recent jobs
    List {
        /// Filter by status (pending, running, completed, failed, cancelled)
        #[arg(short, long)]
        status: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// List transformation kinds
    Kinds,
    /// List verification levels
    Levels,
}

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Repository identifier used by collaborators and in workspace names
    #[arg(long)]
    pub repo_id: String,

    /// Checked-out repository to transform
    #[arg(long)]
    pub repo_path: PathBuf,

    /// Transformation kind (refactor, optimize, prune, merge, modernize, fix_security)
    #[arg(short, long)]
    pub kind: String,

    /// Verification level (none, basic, standard, strict)
    #[arg(short, long)]
    pub level: Option<String>,

    /// Restrict the job to these files, relative to the repository root
    #[arg(long = "file")]
    pub files: Vec<String>,

    /// Restrict the job to these languages
    #[arg(long = "language")]
    pub languages: Vec<String>,

    #[arg(long)]
    pub batch_size: Option<u32>,

    #[arg(long)]
    pub max_file_size_kb: Option<u32>,

    /// Write rewrites even when verification fails
    #[arg(long)]
    pub no_safe_mode: bool,

    #[arg(long)]
    pub branch: Option<String>,

    /// Run the job now and wait for it to finish
    #[arg(short, long)]
    pub wait: bool,
}

impl SubmitArgs {
    fn into_request(self) -> Result<JobRequest> {
        let repo_path = std::fs::canonicalize(&self.repo_path)
            .with_context(|| format!("Repository path {} does not exist", self.repo_path.display()))?;

        Ok(JobRequest {
            repo_id: self.repo_id,
            repo_url: repo_path.display().to_string(),
            branch: self.branch,
            transformation_type: self.kind,
            file_paths: (!self.files.is_empty()).then_some(self.files),
            languages: (!self.languages.is_empty()).then_some(self.languages),
            verification_level: self.level,
            safe_mode: self.no_safe_mode.then_some(false),
            batch_size: self.batch_size,
            max_file_size_kb: self.max_file_size_kb,
            ..JobRequest::default()
        })
    }
}

#[derive(Debug, serde::Serialize)]
pub struct JobOutput {
    pub id: Uuid,
    pub repo_id: String,
    pub kind: String,
    pub verification_level: String,
    pub safe_mode: bool,
    pub status: String,
    pub total_files: u32,
    pub processed_files: u32,
    pub successful_transformations: u32,
    pub failed_transformations: u32,
    pub progress: f64,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Job> for JobOutput {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id,
            repo_id: job.spec.repo_id.clone(),
            kind: job.spec.kind.as_str().to_string(),
            verification_level: job.spec.verification_level.as_str().to_string(),
            safe_mode: job.spec.safe_mode,
            status: job.status.as_str().to_string(),
            total_files: job.total_files,
            processed_files: job.processed_files,
            successful_transformations: job.successful_transformations,
            failed_transformations: job.failed_transformations,
            progress: job.progress(),
            error: job.error.clone(),
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

impl CommandOutput for JobOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Job {}", style(self.id).bold()),
            format!("  Status:      {}", status_style(&self.status)),
            format!("  Repository:  {}", self.repo_id),
            format!("  Kind:        {}", self.kind),
            format!(
                "  Level:       {}{}",
                self.verification_level,
                if self.safe_mode { " (safe mode)" } else { "" }
            ),
            format!(
                "  Files:       {}/{} processed, {} succeeded, {} failed",
                self.processed_files, self.total_files, self.successful_transformations, self.failed_transformations
            ),
        ];
        if let Some(error) = &self.error {
            lines.push(format!("  Error:       {}", style(error).red()));
        }
        lines.push(format!("  Created:     {}", self.created_at.format("%Y-%m-%d %H:%M:%S UTC")));
        lines.push(format!("  Updated:     {}", self.updated_at.format("%Y-%m-%d %H:%M:%S UTC")));
        lines.join("\n")
    }
}

fn status_style(status: &str) -> console::StyledObject<&str> {
    match JobStatus::from_str(status) {
        Some(JobStatus::Completed) => style(status).green(),
        Some(JobStatus::Failed) => style(status).red(),
        Some(JobStatus::Running) => style(status).cyan(),
        Some(JobStatus::Cancelled) => style(status).dim(),
        _ => style(status),
    }
}

#[derive(Debug, serde::Serialize)]
pub struct SubmitOutput {
    pub job: JobOutput,
    pub started: bool,
}

impl CommandOutput for SubmitOutput {
    fn to_human(&self) -> String {
        if self.started {
            return self.job.to_human();
        }
        format!(
            "Job created: {}\n  Start it with: reforge job run {}",
            style(self.job.id).bold(),
            self.job.id
        )
    }
}

#[derive(Debug, serde::Serialize)]
pub struct OutcomeOutput {
    pub file_path: String,
    pub status: String,
    pub language: Option<String>,
    pub model: Option<String>,
    pub applied: bool,
    pub verified: bool,
    pub summary: String,
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl From<&TransformationOutcome> for OutcomeOutput {
    fn from(outcome: &TransformationOutcome) -> Self {
        Self {
            file_path: outcome.file_path.clone(),
            status: outcome.status_label().to_string(),
            language: outcome.language.clone(),
            model: outcome.model.clone(),
            applied: outcome.applied,
            verified: outcome.verification.verified,
            summary: outcome.summary.clone(),
            error: outcome.error.clone(),
            duration_ms: outcome.duration_ms,
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ResultsOutput {
    pub job_id: Uuid,
    pub status: String,
    pub total: u64,
    pub offset: u32,
    pub outcomes: Vec<OutcomeOutput>,
}

impl From<&JobResults> for ResultsOutput {
    fn from(results: &JobResults) -> Self {
        Self {
            job_id: results.job.id,
            status: results.job.status.as_str().to_string(),
            total: results.total,
            offset: 0,
            outcomes: results.outcomes.iter().map(OutcomeOutput::from).collect(),
        }
    }
}

impl CommandOutput for ResultsOutput {
    fn to_human(&self) -> String {
        if self.outcomes.is_empty() {
            return format!("No results recorded for job {} ({}).", self.job_id, self.status);
        }

        let mut table = create_table(&["File", "Result", "Model", "Verified", "Details"]);
        for outcome in &self.outcomes {
            let details = outcome.error.as_deref().unwrap_or(&outcome.summary);
            table.add_row(vec![
                text_cell(&outcome.file_path, 48),
                outcome_cell(&outcome.status),
                text_cell(outcome.model.as_deref().unwrap_or("-"), 24),
                text_cell(if outcome.verified { "yes" } else { "no" }, 3),
                text_cell(details, 60),
            ]);
        }

        let first = u64::from(self.offset) + 1;
        let last = u64::from(self.offset) + self.outcomes.len() as u64;
        format!("{table}\nShowing {first}-{last} of {} result(s)", self.total)
    }
}

#[derive(Debug, serde::Serialize)]
pub struct JobListOutput {
    pub jobs: Vec<JobOutput>,
}

impl CommandOutput for JobListOutput {
    fn to_human(&self) -> String {
        if self.jobs.is_empty() {
            return "No jobs found.".to_string();
        }

        let mut table = create_table(&["ID", "Repository", "Kind", "Status", "Progress", "Created"]);
        for job in &self.jobs {
            table.add_row(vec![
                text_cell(&job.id.to_string(), 36),
                text_cell(&job.repo_id, 24),
                text_cell(&job.kind, 12),
                job_status_cell(&job.status),
                text_cell(&format!("{}/{}", job.processed_files, job.total_files), 12),
                text_cell(&job.created_at.format("%Y-%m-%d %H:%M").to_string(), 16),
            ]);
        }
        format!("{table}\nShowing {} job(s)", self.jobs.len())
    }
}

#[derive(Debug, serde::Serialize)]
pub struct NamedItem {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, serde::Serialize)]
pub struct CatalogOutput {
    pub title: &'static str,
    pub items: Vec<NamedItem>,
}

impl CommandOutput for CatalogOutput {
    fn to_human(&self) -> String {
        let mut table = create_table(&[self.title, "Description"]);
        for item in &self.items {
            table.add_row(vec![text_cell(item.name, 16), text_cell(item.description, 80)]);
        }
        table.to_string()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.items).unwrap_or_default()
    }
}

fn kinds_output(kinds: &[TransformationKind]) -> CatalogOutput {
    CatalogOutput {
        title: "Kind",
        items: kinds
            .iter()
            .map(|k| NamedItem {
                name: k.as_str(),
                description: k.description(),
            })
            .collect(),
    }
}

fn levels_output(levels: &[VerificationLevel]) -> CatalogOutput {
    CatalogOutput {
        title: "Level",
        items: levels
            .iter()
            .map(|l| NamedItem {
                name: l.as_str(),
                description: l.description(),
            })
            .collect(),
    }
}

pub async fn execute(args: JobArgs, json_mode: bool, config: &Config) -> Result<()> {
    let connect = || async move {
        build_orchestrator(config)
            .await
            .context("Failed to initialize. Run 'reforge init' first or check your configuration.")
    };

    match args.command {
        JobCommands::Submit(submit) => {
            let wait = submit.wait;
            let request = submit.into_request()?;
            let orchestrator = connect().await?;
            if wait {
                let job_id = orchestrator.submit(request).await?;
                let job = follow(&orchestrator, job_id, orchestrator.wait(job_id), json_mode).await?;
                output(&SubmitOutput { job: JobOutput::from(&job), started: true }, json_mode);
            } else {
                let job = orchestrator.create(request).await?;
                output(&SubmitOutput { job: JobOutput::from(&job), started: false }, json_mode);
            }
        }
        JobCommands::Run { id } => {
            let orchestrator = connect().await?;
            let run = orchestrator.run(id).instrument(info_span!("job", job_id = %id));
            let job = follow(&orchestrator, id, run, json_mode).await?;
            output(&JobOutput::from(&job), json_mode);
        }
        JobCommands::Status { id } => {
            let orchestrator = connect().await?;
            let job = orchestrator.get_status(id).await?;
            output(&JobOutput::from(&job), json_mode);
        }
        JobCommands::Results { id, limit, offset } => {
            let orchestrator = connect().await?;
            let results = orchestrator.get_results(id, limit, offset).await?;
            let out = ResultsOutput {
                offset,
                ..ResultsOutput::from(&results)
            };
            output(&out, json_mode);
        }
        JobCommands::Cancel { id } => {
            let orchestrator = connect().await?;
            let job = orchestrator.cancel(id).await?;
            output(&JobOutput::from(&job), json_mode);
        }
        JobCommands::List { status, limit } => {
            let status = status
                .map(|s| {
                    JobStatus::from_str(&s).ok_or_else(|| DomainError::ValidationFailed(format!("Unknown job status: {s}")))
                })
                .transpose()?;
            let jobs = connect().await?.list_jobs(status, limit).await?;
            output(
                &JobListOutput {
                    jobs: jobs.iter().map(JobOutput::from).collect(),
                },
                json_mode,
            );
        }
        JobCommands::Kinds => output(&kinds_output(&TransformationKind::ALL), json_mode),
        JobCommands::Levels => output(&levels_output(&VerificationLevel::ALL), json_mode),
    }

    Ok(())
}

/// Drive `done` to completion while rendering progress; Ctrl-C requests
/// cancellation once and keeps waiting for the job to stop.
async fn follow<T>(
    orchestrator: &Arc<JobOrchestrator>,
    job_id: Uuid,
    done: impl Future<Output = DomainResult<T>>,
    json_mode: bool,
) -> Result<Job> {
    let pb = create_job_progress(json_mode);
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    let mut cancel_sent = false;
    tokio::pin!(done);

    loop {
        tokio::select! {
            result = &mut done => {
                result?;
                break;
            }
            _ = ticker.tick() => {
                let job = orchestrator.get_status(job_id).await?;
                update_progress(&pb, &job);
            }
            _ = tokio::signal::ctrl_c(), if !cancel_sent => {
                cancel_sent = true;
                pb.set_message("cancelling after the current batch");
                match orchestrator.cancel(job_id).await {
                    Ok(_) | Err(DomainError::AlreadyTerminal { .. }) => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }

    let job = orchestrator.get_status(job_id).await?;
    update_progress(&pb, &job);
    match job.status {
        JobStatus::Completed => pb.finish_success("completed"),
        JobStatus::Cancelled => pb.finish_warning("cancelled"),
        _ => pb.finish_error(truncate(job.error.as_deref().unwrap_or(job.status.as_str()), 60)),
    }
    Ok(job)
}

fn update_progress(pb: &ProgressBar, job: &Job) {
    pb.set_length(u64::from(job.total_files));
    pb.set_position(u64::from(job.processed_files));
    if job.failed_transformations > 0 {
        pb.set_message(format!("({} failed)", job.failed_transformations));
    }
}
