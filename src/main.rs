// src/main.rs
use log::{info, warn};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

mod config;
mod errors;
mod handlers;
mod models;
mod services;
mod store;

use crate::config::Config;
use crate::handlers::{HELP, Reply, Session, handle_completion, handle_line};
use crate::services::{ExportService, ImageGenerator, ImageProcessor, ImagenService};

pub struct AppState {
    generator: Arc<dyn ImageGenerator>,
    exporter: ExportService,
    processor: ImageProcessor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting iconsmith...");

    let config = Config::from_env();
    if config.api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; generation requests will fail until it is configured");
    }
    info!("Using model {} at {}", config.model, config.base_url);

    let app_state = AppState {
        generator: Arc::new(ImagenService::new(&config)),
        exporter: ExportService::new(config.download_dir.clone()),
        processor: ImageProcessor::new(),
    };

    run_session(app_state).await
}

async fn run_session(app: AppState) -> anyhow::Result<()> {
    let (completions_tx, mut completions_rx) = mpsc::unbounded_channel();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut session = Session::new();

    println!("{}", HELP);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match handle_line(&app, &mut session, &line, &completions_tx).await {
                    Reply::Text(text) if text.is_empty() => {}
                    Reply::Text(text) => println!("{}", text),
                    Reply::Quit => break,
                }
            }
            Some(completion) = completions_rx.recv() => {
                println!("{}", handle_completion(&app, &mut session, completion));
            }
        }
    }

    if session.store.is_generating() {
        warn!("Exiting with a generation still in flight; its result is discarded");
    }
    info!(
        "Session ended with {} icons in history",
        session.store.history().len()
    );

    Ok(())
}
