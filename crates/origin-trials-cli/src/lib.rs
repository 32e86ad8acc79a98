#![allow(clippy::print_stdout)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use origin_trials_client::{
    AccessTokenProvider, EnvSecrets, MetadataServerTokenProvider, OriginTrialsClient,
    OriginTrialsConfig, StaticAccessToken, TrialStage,
};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "origin-trials")]
#[command(about = "Manage origin trials and security-review launch issues")]
pub struct OriginTrialsCli {
    /// Bearer token for authenticated calls. Defaults to the metadata server.
    #[arg(long, env = "OT_ACCESS_TOKEN", global = true, hide_env_values = true)]
    pub access_token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List public trials
    List,
    /// Print the end time (epoch seconds) a trial ending at MILESTONE would get
    EndTime { milestone: u32 },
    /// Create a trial from a JSON-encoded stage record
    Create {
        #[arg(long)]
        stage: PathBuf,
    },
    /// Extend a trial to a later milestone
    Extend {
        trial_id: String,
        end_milestone: u32,
        #[arg(long)]
        intent_url: String,
    },
    /// Start a trial
    Activate { trial_id: String },
    /// File a security-review launch issue for a feature gate
    LaunchIssue {
        feature_id: i64,
        gate_id: i64,
        #[arg(long)]
        continuity_id: Option<i64>,
    },
    /// Check a continuity issue
    VerifyContinuity { continuity_id: i64 },
}

pub async fn run(cli: OriginTrialsCli) -> Result<()> {
    let config = OriginTrialsConfig::from_env().context("load origin trials config")?;
    let tokens: Arc<dyn AccessTokenProvider> = match cli.access_token {
        Some(token) => Arc::new(StaticAccessToken::new(token)),
        None => Arc::new(MetadataServerTokenProvider::default()),
    };
    let client = OriginTrialsClient::new(config, Arc::new(EnvSecrets), tokens)?;

    match cli.command {
        Commands::List => print_json(&client.get_trials_list().await?),
        Commands::EndTime { milestone } => {
            print_json(&client.get_trial_end_time(milestone).await?)
        }
        Commands::Create { stage } => {
            let stage = load_stage(&stage)?;
            let outcome = client.create_origin_trial(&stage).await;
            print_json(&outcome)?;
            if outcome.trial_id().is_none() {
                bail!(
                    "trial not created: {}",
                    outcome.error_text().unwrap_or("unknown error")
                );
            }
            Ok(())
        }
        Commands::Extend {
            trial_id,
            end_milestone,
            intent_url,
        } => {
            client
                .extend_origin_trial(&trial_id, end_milestone, &intent_url)
                .await?;
            Ok(())
        }
        Commands::Activate { trial_id } => {
            client.activate_origin_trial(&trial_id).await?;
            Ok(())
        }
        Commands::LaunchIssue {
            feature_id,
            gate_id,
            continuity_id,
        } => print_json(
            &client
                .create_launch_issue(feature_id, gate_id, continuity_id)
                .await?,
        ),
        Commands::VerifyContinuity { continuity_id } => {
            print_json(&client.verify_continuity_issue(continuity_id).await?)
        }
    }
}

fn load_stage(path: &Path) -> Result<TrialStage> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read stage file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse stage file {}", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
