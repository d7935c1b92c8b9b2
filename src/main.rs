mod actions;
mod app;
mod backend;
mod config;
mod domain;
mod error;
mod handlers;
mod infra;
mod listing;
mod logging;
mod paths;
mod terminal;
mod ui;

use crate::actions::{run_foreground_action, send_task};
use crate::app::{App, BackendEvent, BackendTask};
use crate::backend::worker_loop;
use crate::config::AppConfig;
use crate::handlers::Controller;
use crate::infra::{ChezmoiClient, ShellChezmoiClient};
use crate::terminal::{Tui, init_terminal, restore_terminal};
use crate::ui::Theme;
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    let config = match AppConfig::load_or_default() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("failed to load config, using defaults: {err:#}");
            AppConfig::default()
        }
    };
    logging::init_tracing()?;
    tracing::info!(binary = %config.binary, "starting");

    let home_dir = paths::home_dir()?;
    if !preflight(&config.binary, &home_dir)? {
        std::process::exit(1);
    }

    let mut terminal = init_terminal()?;
    let run_result = run_app(&mut terminal, &config, home_dir).await;

    restore_terminal(&mut terminal)?;
    if let Err(err) = run_result {
        tracing::error!(error = %format!("{err:#}"), "exiting with error");
        eprintln!("{err:#}");
        std::process::exit(1);
    }

    Ok(())
}

/// Returns `false` when the user declines to initialize the tool.
fn preflight(binary: &str, home_dir: &Path) -> Result<bool> {
    if !infra::is_installed(binary) {
        anyhow::bail!("chezmoi is not installed, please install chezmoi first");
    }
    if infra::is_initialized(binary, home_dir) {
        return Ok(true);
    }

    print!("chezmoi is not initialized. Do you want us to initialize it for you [Y/n]? ");
    io::stdout().flush().context("failed to flush prompt")?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("failed to read answer")?;

    if !accepts_init(&answer) {
        tracing::info!("initialization declined");
        return Ok(false);
    }
    infra::init(binary).context("failed to initialize chezmoi")?;
    Ok(true)
}

fn accepts_init(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "" | "y" | "yes")
}

async fn run_app(terminal: &mut Tui, config: &AppConfig, home_dir: std::path::PathBuf) -> Result<()> {
    let theme = Theme::from_config(config);
    let mut app = App::new(home_dir.clone(), config.notice_duration());
    let client: Arc<dyn ChezmoiClient> = Arc::new(ShellChezmoiClient::new(config.binary.clone()));

    let (task_tx, task_rx) = mpsc::unbounded_channel::<BackendTask>();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<BackendEvent>();

    tokio::spawn(worker_loop(client.clone(), task_rx, event_tx));
    let controller = Controller::new(client, home_dir, task_tx.clone());

    send_task(&mut app, &task_tx, BackendTask::Status)?;
    controller.show_all(&mut app, Instant::now());

    while !app.should_quit {
        while let Ok(event) = event_rx.try_recv() {
            controller.handle_backend_event(&mut app, event, Instant::now());
        }

        if app.is_suspended() {
            run_foreground_action(terminal, &mut app, &controller)?;
        }

        app.expire_notice(Instant::now());
        terminal.draw(|frame| ui::draw(frame, &mut app, &theme))?;

        if event::poll(Duration::from_millis(100)).context("event poll failed")?
            && let Event::Key(key) = event::read().context("event read failed")?
            && key.kind == KeyEventKind::Press
        {
            controller.handle_key(&mut app, key, Instant::now())?;
        }
    }

    tracing::info!("quit");
    Ok(())
}
