use crate::app::{App, BackendTask};
use crate::handlers::Controller;
use crate::terminal::{Tui, restore_terminal, setup_terminal};
use anyhow::Result;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;

pub(crate) fn send_task(
    app: &mut App,
    task_tx: &UnboundedSender<BackendTask>,
    task: BackendTask,
) -> Result<()> {
    app.task_dispatched();
    task_tx
        .send(task)
        .map_err(|err| anyhow::anyhow!("failed to dispatch task: {err}"))
}

/// Runs the queued screen-taking action with the terminal handed over, then
/// reclaims it. Nothing is drawn while the child runs.
pub(crate) fn run_foreground_action(
    terminal: &mut Tui,
    app: &mut App,
    controller: &Controller,
) -> Result<()> {
    let Some(request) = app.pending_foreground.take() else {
        app.resume();
        return Ok(());
    };

    restore_terminal(terminal)?;
    let started = Instant::now();
    let outcome = controller.client().run_interactive(&request);
    tracing::info!(
        request = %request.describe(),
        duration_ms = started.elapsed().as_millis() as u64,
        "terminal reclaimed"
    );
    setup_terminal()?;
    terminal.clear()?;

    controller.finish_foreground(app, &request, outcome, Instant::now());
    Ok(())
}
