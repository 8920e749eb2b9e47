use clap::Parser;
use tool_auditor::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "tool_auditor=debug,audit_mcp=debug,audit_report=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = cli.into_config()?;
    tracing::debug!(?config, "Resolved auditor configuration");

    let mut stdout = std::io::stdout().lock();
    let outcome = tool_auditor::run(&config, &mut stdout).await?;
    tracing::debug!(?outcome, "Audit finished");
    Ok(())
}
