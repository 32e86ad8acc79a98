use clap::Parser;
use origin_trials_cli::OriginTrialsCli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = OriginTrialsCli::parse();
    tracing::debug!(command = ?cli.command, "running origin trials command");
    origin_trials_cli::run(cli).await
}
