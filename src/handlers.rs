use crate::actions::send_task;
use crate::app::{App, BackendEvent, BackendTask};
use crate::domain::{Action, ActionRequest, Entry, ListView};
use crate::error::Result as BrowseResult;
use crate::infra::{ChezmoiClient, ensure_success};
use crate::listing::FileListing;
use crate::paths::resolve;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;

/// Drives every state transition of the browser. All external failures end
/// up as notices on `App`; only a closed task channel is returned as an error.
pub(crate) struct Controller {
    listing: FileListing,
    client: Arc<dyn ChezmoiClient>,
    task_tx: UnboundedSender<BackendTask>,
}

enum Selection {
    Empty,
    BackReference,
    Target { entry: Entry, path: PathBuf },
}

impl Controller {
    pub(crate) fn new(
        client: Arc<dyn ChezmoiClient>,
        root_dir: PathBuf,
        task_tx: UnboundedSender<BackendTask>,
    ) -> Self {
        Self {
            listing: FileListing::new(client.clone(), root_dir),
            client,
            task_tx,
        }
    }

    pub(crate) fn client(&self) -> &dyn ChezmoiClient {
        self.client.as_ref()
    }

    pub(crate) fn handle_key(&self, app: &mut App, key: KeyEvent, now: Instant) -> Result<()> {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            app.should_quit = true;
            return Ok(());
        }
        if app.is_suspended() {
            return Ok(());
        }

        match key.code {
            KeyCode::Char('q') => app.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => app.select_next(),
            KeyCode::Char('k') | KeyCode::Up => app.select_prev(),
            KeyCode::Char('g') | KeyCode::Home => app.select_first(),
            KeyCode::Char('G') | KeyCode::End => app.select_last(),
            KeyCode::Char('m') => self.show_managed(app, now),
            KeyCode::Char('u') => self.show_unmanaged(app, now),
            KeyCode::Char('L') => self.show_all(app, now),
            KeyCode::Char('a') => self.add_selected(app, now)?,
            KeyCode::Char('r') => self.forget_selected(app, now),
            KeyCode::Char('d') => self.diff_selected(app, now),
            KeyCode::Char('D') => self.diff_all(app),
            KeyCode::Char('e') => self.edit_selected(app, now),
            KeyCode::Char('A') => self.apply(app),
            KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => self.navigate(app, now),
            KeyCode::Backspace | KeyCode::Char('h') | KeyCode::Left => {
                self.navigate_parent(app, now)
            }
            _ => {}
        }

        Ok(())
    }

    pub(crate) fn show_all(&self, app: &mut App, now: Instant) {
        let dir = app.current_dir.clone();
        self.replace_listing(app, ListView::All, self.listing.all_entries(Some(&dir)), now);
    }

    pub(crate) fn show_managed(&self, app: &mut App, now: Instant) {
        let dir = app.current_dir.clone();
        self.replace_listing(
            app,
            ListView::Managed,
            self.listing.managed_entries(Some(&dir)),
            now,
        );
    }

    pub(crate) fn show_unmanaged(&self, app: &mut App, now: Instant) {
        let dir = app.current_dir.clone();
        self.replace_listing(
            app,
            ListView::Unmanaged,
            self.listing.unmanaged_entries(Some(&dir)),
            now,
        );
    }

    fn replace_listing(
        &self,
        app: &mut App,
        view: ListView,
        entries: BrowseResult<Vec<Entry>>,
        now: Instant,
    ) -> bool {
        match entries {
            Ok(entries) => {
                app.replace_entries(view, entries);
                true
            }
            Err(err) => {
                tracing::warn!(view = view.title(), error = %err, "listing failed");
                app.notify_error(err.to_string(), now);
                false
            }
        }
    }

    /// Dispatched to the worker; the outcome arrives as a `BackendEvent`.
    pub(crate) fn add_selected(&self, app: &mut App, now: Instant) -> Result<()> {
        let Some((_, path)) = self.target_or_notice(app, now) else {
            return Ok(());
        };
        let request = ActionRequest::new(Action::Add, Some(path));
        tracing::info!(request = %request.describe(), "dispatching background action");
        send_task(app, &self.task_tx, BackendTask::RunAction { request })
    }

    /// Runs inline and blocks the loop until the tool exits.
    pub(crate) fn forget_selected(&self, app: &mut App, now: Instant) {
        let Some((_, path)) = self.target_or_notice(app, now) else {
            return;
        };
        let request = ActionRequest::new(Action::Forget, Some(path));
        tracing::info!(request = %request.describe(), "running action");

        let outcome = self
            .client
            .run(&request)
            .and_then(|result| ensure_success(request.action.label(), &result));
        match outcome {
            Ok(()) => self.show_managed(app, now),
            Err(err) => app.notify_error(err.to_string(), now),
        }
    }

    pub(crate) fn diff_selected(&self, app: &mut App, now: Instant) {
        let Some((_, path)) = self.target_or_notice(app, now) else {
            return;
        };
        app.suspend_for(ActionRequest::new(Action::Diff, Some(path)));
    }

    pub(crate) fn diff_all(&self, app: &mut App) {
        app.suspend_for(ActionRequest::new(Action::Diff, None));
    }

    /// Directories, ".." included, are rejected before target resolution.
    pub(crate) fn edit_selected(&self, app: &mut App, now: Instant) {
        if app.selected_entry().is_some_and(Entry::is_dir) {
            app.notify_error("cannot edit directory", now);
            return;
        }
        let Some((_, path)) = self.target_or_notice(app, now) else {
            return;
        };
        app.suspend_for(ActionRequest::new(Action::Edit, Some(path)));
    }

    /// Apply is directory-wide but still needs something selected.
    pub(crate) fn apply(&self, app: &mut App) {
        if app.selected_entry().is_none() {
            return;
        }
        app.suspend_for(ActionRequest::new(Action::Apply, None));
    }

    pub(crate) fn navigate(&self, app: &mut App, now: Instant) {
        let Some(entry) = app.selected_entry().cloned() else {
            return;
        };
        if !entry.is_dir() {
            app.notify_error("cannot navigate to file", now);
            return;
        }
        let Some(target) = app.selected_target() else {
            return;
        };
        self.enter(app, target, now);
    }

    pub(crate) fn navigate_parent(&self, app: &mut App, now: Instant) {
        if app.is_at_root() {
            return;
        }
        let target = resolve("..", &app.current_dir);
        self.enter(app, target, now);
    }

    fn enter(&self, app: &mut App, target: PathBuf, now: Instant) {
        let (view, entries) = if self.listing.is_root(&target) {
            (ListView::All, self.listing.all_entries(None))
        } else {
            (ListView::Directory, self.listing.directory_entries(&target))
        };

        match entries {
            Ok(entries) => {
                tracing::debug!(dir = %target.display(), "entered directory");
                app.enter_directory(target, view, entries);
            }
            Err(err) => {
                tracing::warn!(dir = %target.display(), error = %err, "navigation failed");
                app.notify_error(err.to_string(), now);
            }
        }
    }

    pub(crate) fn handle_backend_event(&self, app: &mut App, event: BackendEvent, now: Instant) {
        app.task_settled();
        match event {
            BackendEvent::ActionFinished { request, result } => {
                if let Err(err) = ensure_success(request.action.label(), &result) {
                    app.notify_error(err.to_string(), now);
                    return;
                }
                if self.refresh_after(app, &request, now) {
                    app.notify(success_message(request.action), now);
                }
            }
            BackendEvent::StatusChecked { result } => {
                tracing::debug!(duration_ms = result.duration_ms, "status probe ok");
            }
            BackendEvent::Error { context, message } => {
                tracing::warn!(%context, %message, "backend error");
                app.notify_error(message, now);
            }
        }
    }

    /// Called once the screen-taking subprocess has exited and the terminal
    /// is back in our hands.
    pub(crate) fn finish_foreground(
        &self,
        app: &mut App,
        request: &ActionRequest,
        outcome: BrowseResult<i32>,
        now: Instant,
    ) {
        app.resume();
        match outcome {
            Ok(0) => {
                tracing::info!(request = %request.describe(), "foreground action done");
                if request.action == Action::Apply && self.refresh_after(app, request, now) {
                    app.notify(success_message(request.action), now);
                }
            }
            Ok(code) => {
                tracing::warn!(request = %request.describe(), code, "foreground action failed");
                app.notify_error(
                    format!("chezmoi {} exited with code {code}", request.action.label()),
                    now,
                );
            }
            Err(err) => app.notify_error(err.to_string(), now),
        }
    }

    fn refresh_after(&self, app: &mut App, request: &ActionRequest, now: Instant) -> bool {
        let dir = app.current_dir.clone();
        let view = match request.action {
            Action::Forget => ListView::Managed,
            _ => ListView::All,
        };
        let entries = match view {
            ListView::Managed => self.listing.managed_entries(Some(&dir)),
            _ => self.listing.all_entries(Some(&dir)),
        };
        self.replace_listing(app, view, entries, now)
    }

    fn target_or_notice(&self, app: &mut App, now: Instant) -> Option<(Entry, PathBuf)> {
        match selection(app) {
            Selection::Empty => None,
            Selection::BackReference => {
                app.notify_error("no target selected", now);
                None
            }
            Selection::Target { entry, path } => Some((entry, path)),
        }
    }
}

fn selection(app: &App) -> Selection {
    match app.selected_entry() {
        None => Selection::Empty,
        Some(entry) if entry.is_back_reference() => Selection::BackReference,
        Some(entry) => Selection::Target {
            path: resolve(&entry.path, &app.current_dir),
            entry: entry.clone(),
        },
    }
}

fn success_message(action: Action) -> &'static str {
    match action {
        Action::Add => "File added successfully",
        Action::Forget => "File forgotten successfully",
        Action::Apply => "Changes applied successfully",
        Action::Edit => "Edit finished",
        Action::Diff => "Diff finished",
    }
}
