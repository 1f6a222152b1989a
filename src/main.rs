use std::sync::Arc;

use botboard::config::Config;
use botboard::daemon;
use botboard::error::Result;
use botboard::interfaces::gateway::PersistenceGateway;
use botboard::providers::memory::MemoryGateway;
use botboard::providers::postgrest::PostgrestGateway;
use clap::{Parser, ValueEnum};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum GatewayKind {
    /// Hosted PostgREST + GoTrue backend.
    Postgrest,
    /// In-process tables with a single demo account; nothing is persisted.
    Memory,
}

#[derive(Parser, Debug)]
#[command(name = "botboard")]
#[command(about = "Management dashboard for hosted chatbots")]
struct Cli {
    #[arg(long, env = "BOTBOARD_CONFIG")]
    config: Option<String>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    #[arg(long, value_enum, default_value_t = GatewayKind::Postgrest)]
    gateway: GatewayKind,

    #[arg(long, default_value = "demo@botboard.local")]
    demo_email: String,

    #[arg(long, default_value = "demo")]
    demo_password: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    botboard::logging::init_tracing("botboard");
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let gateway: Arc<dyn PersistenceGateway> = match cli.gateway {
        GatewayKind::Postgrest => {
            let url = config.gateway_url()?;
            Arc::new(PostgrestGateway::new(&url, &config.gateway)?)
        }
        GatewayKind::Memory => {
            let memory = MemoryGateway::new();
            memory
                .register_account(&cli.demo_email, &cli.demo_password, Some("Demo user"))
                .await;
            tracing::info!(email = %cli.demo_email, "memory gateway with demo account");
            Arc::new(memory)
        }
    };

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!("ctrl-c handler failed: {}", err);
            futures::future::pending::<()>().await;
        }
        tracing::info!("shutting down");
    };
    daemon::run_with_shutdown(config, gateway, shutdown).await
}
