use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use lobbychat::prelude::*;

/// Multi-room chat server.
#[derive(Debug, Parser)]
#[command(name = "lobbychat", version, about)]
struct Args {
    /// JSON config file. Flags below override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:65535.
    #[arg(short, long)]
    bind: Option<String>,

    /// Wire framing.
    #[arg(short, long, value_enum)]
    transport: Option<TransportKind>,

    /// Maximum number of connected clients.
    #[arg(long)]
    max_clients: Option<usize>,
}

impl Args {
    fn into_config(self) -> Result<ServerConfig, ChatError> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)?,
            None => ServerConfig::default(),
        };
        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(transport) = self.transport {
            config.transport = transport;
        }
        if let Some(max) = self.max_clients {
            config.lobby.max_clients = max;
        }
        Ok(config)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

async fn serve(config: ServerConfig) -> Result<(), ChatError> {
    let builder = ChatServerBuilder::from_config(&config);
    tracing::info!(
        bind = %config.bind_addr,
        transport = %config.transport,
        max_clients = config.lobby.max_clients,
        "starting lobbychat"
    );
    match config.transport {
        TransportKind::Tcp => builder.build_tcp().await?.run_until(shutdown_signal()).await,
        TransportKind::WebSocket => {
            builder
                .build_websocket()
                .await?
                .run_until(shutdown_signal())
                .await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Args::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("lobbychat: {e}");
            return ExitCode::FAILURE;
        }
    };
    lobbychat::logging::init(&config.log_filter);

    match serve(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server stopped");
            ExitCode::FAILURE
        }
    }
}
