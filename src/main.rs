use std::fs::File;
use std::io::{self, BufRead};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chatvox::config::Configuration;
use chatvox::integration::Pipeline;
use chatvox::messages::ChatMessage;
use chatvox::speech::{MediaPlayer, RemoteSynthesizer};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatvox=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Optional JSON configuration file as the first argument
    let config = match std::env::args().nth(1) {
        Some(path) => {
            let file = File::open(&path).with_context(|| format!("Failed to open {}", path))?;
            serde_json::from_reader(file).with_context(|| format!("Failed to parse {}", path))?
        }
        None => Configuration::default(),
    };

    info!("Starting chatvox");

    let pipeline = Pipeline::start(
        config,
        Arc::new(RemoteSynthesizer::new()),
        Arc::new(MediaPlayer::new()),
    )?;

    // Stand-in chat source: one "user: message" per stdin line. A real chat
    // connector delivers the same ChatMessage values through on_message.
    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let Some((user, text)) = line.split_once(':') else {
            warn!(%line, "Ignoring line without a 'user: message' shape");
            continue;
        };
        pipeline.on_message(ChatMessage::new(user.trim(), text.trim()));
    }

    info!("Chat source closed, draining pending messages");
    if pipeline.shutdown().is_err() {
        warn!("Playback worker panicked during shutdown");
    }

    Ok(())
}
