//! Main entry point for the variant orchestrator binary
//!
//! Wires the real services into the orchestrator and exposes the batch
//! operations as subcommands.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::signal;

use orchestrator::{
    core::validate,
    services::{ConsoleNotifier, FileCheckpointStore, HttpAssetUploader, HttpRenderApi, ResumePolicy},
    ConfigOverrides, EngineConfig, Orchestrator, OrchestratorResult, RunOutcome, RunSummary,
};
use shared::{logging, GenerationRequest};

/// Batch generator for short-video variants
#[derive(Parser)]
#[command(name = "variant-orchestrator")]
#[command(about = "Plans and renders batches of video variants with resumable progress")]
pub struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Render backend base URL (overrides RENDER_API_URL)
    #[arg(long, global = true)]
    pub render_url: Option<String>,

    /// Asset upload endpoint (overrides UPLOAD_API_URL)
    #[arg(long, global = true)]
    pub upload_url: Option<String>,

    /// Checkpoint directory (overrides CHECKPOINT_DIR)
    #[arg(long, global = true)]
    pub checkpoint_dir: Option<PathBuf>,

    /// User the checkpoint belongs to (overrides GENERATOR_USER)
    #[arg(long, global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a batch from a JSON job file
    Generate {
        #[arg(long)]
        job: PathBuf,

        /// Resume an interrupted run without asking
        #[arg(long, conflicts_with = "discard")]
        resume: bool,

        /// Discard an interrupted run without asking
        #[arg(long)]
        discard: bool,
    },
    /// Resume the interrupted run of a job file
    Resume {
        #[arg(long)]
        job: PathBuf,
    },
    /// Discard any interrupted run
    Discard,
    /// Print the size of a job's combination space
    Count {
        #[arg(long)]
        job: PathBuf,
    },
}

type CliOrchestrator = Orchestrator<HttpRenderApi, HttpAssetUploader, FileCheckpointStore, ConsoleNotifier>;

async fn load_job(path: &Path) -> anyhow::Result<GenerationRequest> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read job file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid job file {}", path.display()))
}

fn build_orchestrator(config: &EngineConfig, policy: ResumePolicy) -> OrchestratorResult<CliOrchestrator> {
    let render = HttpRenderApi::new(&config.render_url)?;
    let uploader = HttpAssetUploader::new(&config.upload_url)?;
    let store = FileCheckpointStore::new(&config.checkpoint_dir, &config.user).with_quota(config.checkpoint_quota_bytes);
    let notifier = ConsoleNotifier::new(policy);

    Ok(Orchestrator::new(render, uploader, store, notifier).with_expected_item(config.expected_item))
}

/// Ctrl-C behaves like the host going away: checkpoint, then exit
fn install_interrupt_handler(orchestrator: &CliOrchestrator) {
    let session = orchestrator.session_handle();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                let saved = session.visibility_hidden().await;
                logging::log_shutdown(if saved {
                    "interrupted, checkpoint saved"
                } else {
                    "interrupted"
                });
                std::process::exit(130);
            }
            Err(err) => {
                tracing::error!("❌ Signal handling failed: {}", err);
            }
        }
    });
}

fn print_summary(summary: &RunSummary) {
    let verb = match summary.outcome {
        RunOutcome::Completed => "finished",
        RunOutcome::Cancelled => "cancelled",
    };
    println!(
        "Run {} {}: {} generated, {} failed, {} planned",
        summary.run_id, verb, summary.generated, summary.failed, summary.total
    );
    for url in &summary.media_urls {
        println!("{url}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_tracing_with_level(Some(&args.log_level));

    let config = EngineConfig::from_env()?.with_overrides(ConfigOverrides {
        render_url: args.render_url.clone(),
        upload_url: args.upload_url.clone(),
        checkpoint_dir: args.checkpoint_dir.clone(),
        user: args.user.clone(),
    });
    tracing::debug!("Configuration: {:?}", config);

    match args.command {
        Command::Count { job } => {
            let request = load_job(&job).await?;
            println!("{}", validate(&request)?.space());
        }
        Command::Discard => {
            let orchestrator = build_orchestrator(&config, ResumePolicy::AlwaysDiscard)?;
            orchestrator.discard_pending().await?;
        }
        Command::Resume { job } => {
            let request = load_job(&job).await?;
            let orchestrator = build_orchestrator(&config, ResumePolicy::AlwaysResume)?;
            install_interrupt_handler(&orchestrator);

            match orchestrator.startup(Some(&request)).await? {
                Some(summary) => print_summary(&summary),
                None => println!("Nothing to resume"),
            }
        }
        Command::Generate { job, resume, discard } => {
            let request = load_job(&job).await?;
            let policy = match (resume, discard) {
                (true, _) => ResumePolicy::AlwaysResume,
                (_, true) => ResumePolicy::AlwaysDiscard,
                _ => ResumePolicy::Ask,
            };
            let orchestrator = build_orchestrator(&config, policy)?;
            install_interrupt_handler(&orchestrator);

            let summary = match orchestrator.startup(Some(&request)).await? {
                Some(summary) => summary,
                None => orchestrator.start(&request).await?,
            };
            print_summary(&summary);
        }
    }

    Ok(())
}
