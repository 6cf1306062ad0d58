//! Onboarding Walkthrough CLI
//!
//! Drives one employee through a scripted sequence of section results and an
//! optional certification, then prints the resulting overview as JSON.
//!
//! Usage:
//!   cargo run --features cli --bin onboarding-walkthrough -- \
//!     --config config/onboarding.yaml \
//!     --result personal_info=complete \
//!     --result emergency_contacts=in_progress
//!
//!   # Full run through certification
//!   cargo run --features cli --bin onboarding-walkthrough -- \
//!     --result personal_info=complete --result emergency_contacts=complete \
//!     --result w4_federal=complete --result state_withholding=complete \
//!     --result direct_deposit=complete --result i9_eligibility=complete \
//!     --result benefits=complete --result policy_acknowledgment=complete \
//!     --sign "Jane Doe"
//!
//!   # Against Postgres
//!   DATABASE_URL=postgresql://localhost/onboarding \
//!     cargo run --features cli,database --bin onboarding-walkthrough -- --user <uuid>

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use onboarding_workflow::{
    MemoryRecordStore, OnboardingConfig, RecordStore, SectionStatus, WorkflowController,
};

/// Scripted walkthrough of the employee onboarding workflow
#[derive(Parser, Debug)]
#[command(name = "onboarding-walkthrough")]
#[command(about = "Record section results for one employee and print the overview")]
struct Args {
    /// YAML config with the section catalog and retry settings
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Employee id (a fresh one is generated when omitted)
    #[arg(long, short = 'u')]
    user: Option<Uuid>,

    /// Section result as section_id=status (repeatable, applied in order)
    #[arg(long = "result", short = 'r', value_parser = parse_section_result)]
    results: Vec<(String, SectionStatus)>,

    /// Certify the record with this signature after recording results
    #[arg(long, short = 's')]
    sign: Option<String>,

    /// Postgres connection string; the in-memory store is used when absent
    #[cfg(feature = "database")]
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

fn parse_section_result(s: &str) -> Result<(String, SectionStatus), String> {
    let (id, status) = s
        .split_once('=')
        .ok_or_else(|| format!("Expected section_id=status, got '{}'", s))?;
    Ok((id.trim().to_string(), status.trim().parse()?))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "onboarding_workflow=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => OnboardingConfig::load_from_file(path)?,
        None => OnboardingConfig::default(),
    };

    #[cfg(feature = "database")]
    if let Some(url) = &args.database_url {
        let store = onboarding_workflow::PgRecordStore::connect(url)
            .await
            .context("Connecting to onboarding database")?;
        store
            .ensure_schema()
            .await
            .context("Creating onboarding tables")?;
        return run(WorkflowController::from_config(store, &config), &args).await;
    }

    run(
        WorkflowController::from_config(MemoryRecordStore::new(), &config),
        &args,
    )
    .await
}

async fn run<S: RecordStore>(controller: WorkflowController<S>, args: &Args) -> Result<()> {
    let user_id = args.user.unwrap_or_else(Uuid::new_v4);
    tracing::info!(user_id = %user_id, sections = controller.catalog().len(), "Starting walkthrough");

    for (section_id, status) in &args.results {
        match controller
            .record_section_result(user_id, section_id, *status, None)
            .await
        {
            Ok(_) => tracing::info!(section_id = %section_id, status = %status, "Recorded"),
            Err(err) if err.is_retryable() => {
                return Err(err).context("Record store unavailable, try again");
            }
            Err(err) => tracing::warn!(section_id = %section_id, error = %err, "Not recorded"),
        }
    }

    if let Some(signature) = &args.sign {
        match controller.submit(user_id, signature).await {
            Ok(record) => tracing::info!(
                submitted_at = ?record.submission.map(|s| s.submitted_at),
                "Certified"
            ),
            Err(err) if err.is_retryable() => {
                return Err(err).context("Record store unavailable, try again");
            }
            Err(err) => tracing::warn!(error = %err, "Certification refused"),
        }
    }

    let overview = controller.overview(user_id).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&overview).context("Serializing overview")?
    );
    Ok(())
}
