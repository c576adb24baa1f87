use anyhow::Context;
use clap::Parser;
use push_relay_lib::config::{self, Cli, Command, RelayConfig};
use push_relay_lib::push::{generate_vapid_keys, WebPushTransport};
use push_relay_lib::server::{self, ServerAppState};
use push_relay_lib::shutdown::{self, ShutdownState};
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let dotenv = config::load_dotenv();
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match dotenv {
        Ok(Some(path)) => log::info!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => log::warn!("Ignoring .env file: {}", e),
    }

    match cli.command {
        Some(Command::GenerateVapidKeys) => {
            let keys = generate_vapid_keys();
            println!("VAPID_PUBLIC_KEY={}", keys.public_key);
            println!("VAPID_PRIVATE_KEY={}", keys.private_key);
            Ok(())
        }
        None => run_server_mode(&cli),
    }
}

fn run_server_mode(cli: &Cli) -> anyhow::Result<()> {
    let config = RelayConfig::from_cli(cli).context("Invalid configuration")?;

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    rt.block_on(async {
        let shutdown_state = ShutdownState::new();
        if let Err(e) = shutdown::register_signal_handlers(shutdown_state.clone()) {
            log::warn!("Failed to register signal handlers: {}", e);
        }

        let transport = WebPushTransport::new(config.credentials.clone(), config.ttl)
            .map_err(|e| anyhow::anyhow!("Failed to create web push client: {:?}", e))?;

        let state = ServerAppState::new(
            config.credentials.public_key.clone(),
            Arc::new(transport),
            config.greeting.clone(),
            shutdown_state,
        );

        server::run_server(&config, state).await?;
        log::info!("Server stopped");
        Ok::<(), anyhow::Error>(())
    })
}
