mod app;
mod backend;
mod config;
mod content;
mod handler;
mod tui;
mod ui;

use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::backend::AssistantClient;
use crate::config::{Config, DEFAULT_BACKEND_URL};
use crate::content::SiteContent;

/// Terminal client for a personal research site: chat with the site's
/// assistant backend and browse publications and projects.
#[derive(Parser, Debug)]
#[command(name = "papertalk", version, about)]
struct Cli {
    /// Base URL of the assistant backend
    #[arg(long)]
    backend_url: Option<String>,

    /// API key sent as the X-API-KEY header
    #[arg(long)]
    api_key: Option<String>,

    /// Path to a site content JSON file
    #[arg(long)]
    content: Option<PathBuf>,

    /// Log file path (the terminal itself is taken over by the UI)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => dirs::config_dir()
            .map(|dir| dir.join("papertalk").join("papertalk.log"))
            .ok_or_else(|| anyhow!("no config directory for the default log file"))?,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A broken config file should not brick the client; fall back to
    // defaults and say so once logging is up.
    let (config, config_err) = match Config::load_or_init() {
        Ok(config) => (config, None),
        Err(err) => (Config::new(), Some(err)),
    };

    init_logging(cli.log_file.or_else(|| config.log_file.clone()))?;
    if let Some(err) = config_err {
        tracing::warn!("ignoring unreadable config: {err:#}");
    }

    let backend_url = cli
        .backend_url
        .or(config.backend_url)
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
    let api_key = cli.api_key.or(config.api_key);
    let content_path = cli.content.or(config.content_path);

    let content = SiteContent::load_or_default(content_path.as_deref())?;
    let client = AssistantClient::new(&backend_url, api_key);
    tracing::info!("starting against backend {}", client.base_url());

    let mut app = App::new(content, client);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut app, &mut terminal).await;
    tui::restore()?;
    result
}

async fn run(app: &mut App, terminal: &mut tui::Tui) -> Result<()> {
    let mut events = tui::EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => app.should_quit = true,
        }

        // Pick up a finished answer without blocking the event loop.
        if app
            .answer_task
            .as_ref()
            .is_some_and(|task| task.is_finished())
        {
            if let Some(task) = app.answer_task.take() {
                let result = match task.await {
                    Ok(result) => result,
                    Err(err) => Err(anyhow!("answer task panicked: {err}")),
                };
                app.complete_answer(result);
            }
        }
    }

    Ok(())
}
