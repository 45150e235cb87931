use crate::api::{DeviceLookup, load_choices, load_directory, new_client};
use crate::app_config::AppConfig;
use crate::cli::Cli;
use crate::console::Console;
use crate::feed::{FeedOptions, LiveFeed, RetryConfig};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader, stdin};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;
use tracing::{info, warn};

mod api;
mod app_config;
mod cli;
mod console;
mod domain;
mod extensions;
mod feed;
mod sse;
mod transport;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_max_level(config.core().log_level())
        .with_writer(std::io::stderr)
        .init();

    info!("🪵 Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    info!("✅  Loaded configuration");

    let client = new_client(&config)?;
    let api_url = config.api().url();
    let (directory, choices) = tokio::join!(load_directory(&client, api_url), load_choices(&client, api_url));
    info!("✅  Loaded {} device name(s)", directory.len());

    let push_client = transport::new_push_client(cli.transport, client.clone(), config.api())?;
    info!("✅  Using {} transport", push_client.name());

    let options = FeedOptions {
        retry: RetryConfig {
            retry_ms: config.api().retry_ms(),
            retry_max_delay: config.api().retry_max_delay(),
        },
        channel_buffer_size: config.core().channel_buffer_size(),
        max_events: config.core().max_events(),
        expanded: cli.expanded,
    };
    let mut feed = LiveFeed::new(push_client, cli.initial_filter(), options);
    let mut console = Console::new(std::io::stdout(), !cli.no_clear, directory, choices);
    if let Some(every) = config.core().directory_refresh_interval() {
        console = console.with_directory_refresh(DeviceLookup::new(client, api_url), every);
    }
    let commands = LinesStream::new(BufReader::new(stdin()).lines()).map_while(Result::ok);

    info!("🔥 {} is up and running", env!("CARGO_PKG_NAME"));
    console::run(&mut feed, commands, &mut console, config.core().refresh_interval(), shutdown_signal()).await?;

    info!("👋 {} stopped", env!("CARGO_PKG_NAME"));
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("⚠️ Unable to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
