//! calc-server binary
//!
//! Serves the arithmetic tools on `http://{host}:{port}/mcp` until Ctrl+C
//! or SIGTERM.

use anyhow::Context;
use calc_server::{CalcServer, MCP_PATH};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "calc-server")]
#[command(about = "Arithmetic MCP server over streamable HTTP", version)]
struct Cli {
    /// Host to bind the server to
    #[arg(long, env = "CALC_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to bind the server to
    #[arg(short, long, env = "CALC_PORT", default_value = "8002")]
    port: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "calc_server=debug,tower_http=debug"
    } else {
        "calc_server=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let server = CalcServer::default();
    let bind_addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    println!("🧮 calc-server {}", calc_server::SERVER_VERSION);
    println!("========================");
    println!("🌐 Listening on: http://{}{}", bind_addr, MCP_PATH);
    println!("🔧 Tools: {}", server.operations().names().join(", "));
    println!("\n⏹️  Press Ctrl+C to stop the server");

    calc_server::serve(listener, server, shutdown_signal()).await?;

    println!("👋 Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    println!("\n🛑 Shutdown signal received, stopping server...");
}
