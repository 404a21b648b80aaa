use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use poolcart::{
    catalog::source::source_from_location,
    config::Settings,
    events::inbound::{InboundEvent, run},
    handlers::HandlerContext,
    messenger::{Messenger, MessengerError, OutboundMessage},
};
use serde_json::json;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    signal::unix::{SignalKind, signal},
    sync::mpsc,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const PURGE_INTERVAL: Duration = Duration::from_secs(60);

fn init_tracing() {
    // stdout carries the outbound JSON lines
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
}

/// Prints every outbound message as one JSON line on stdout.
struct ConsoleMessenger;

#[async_trait]
impl Messenger for ConsoleMessenger {
    async fn send(&self, recipient: &str, message: OutboundMessage) -> Result<(), MessengerError> {
        let line = json!({ "to": recipient, "message": message });
        println!("{line}");
        Ok(())
    }
}

async fn read_console(events: mpsc::Sender<InboundEvent>, default_sender: String) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match InboundEvent::from_console_line(&line, &default_sender) {
            Ok(event) => events.send(event).await?,
            Err(e) => warn!("Skipping input line: {e}"),
        }
    }

    info!("End of input");

    Ok(())
}

#[derive(Parser)]
#[command(
    about = env!("CARGO_PKG_DESCRIPTION"),
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Args {
    #[arg(long, help = "(Optional) Adds the settings file path.", required = false)]
    pub config: Option<String>,

    #[arg(
        long,
        help = "(Optional) Overrides the catalog CSV location (file path or http(s) URL).",
        required = false
    )]
    pub catalog: Option<String>,

    #[arg(
        long,
        help = "(Optional) Sender used for input lines without a `<sender>\\t` prefix.",
        default_value = "console"
    )]
    pub sender: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();

    info!("Starting");

    let mut settings = Settings::load(&args.config)?;
    if let Some(catalog) = args.catalog {
        settings.catalog.source = catalog;
    }
    settings.validate()?;

    let catalog = source_from_location(&settings.catalog.source, settings.fetch_timeout())?;
    let ctx = Arc::new(HandlerContext::new(
        &settings,
        catalog,
        Arc::new(ConsoleMessenger),
    )?);

    let (tx, rx) = mpsc::channel(64);
    let runner = tokio::spawn(run(ctx, rx, PURGE_INTERVAL));
    let mut reader = tokio::spawn(read_console(tx, args.sender));

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM. Shutting down...");
        },
        _ = sigint.recv() => {
            info!("Received SIGINT. Shutting down...");
        },
        result = &mut reader => {
            match result {
                Ok(Err(e)) => error!("Error reading input: {e}"),
                Err(e) => error!("Input task failed: {e}"),
                Ok(Ok(())) => {}
            }
        }
    }

    // Dropping the reader closes the channel and lets the runner drain.
    reader.abort();
    if let Err(e) = runner.await {
        error!("Event loop failed: {e}");
    }

    Ok(())
}
