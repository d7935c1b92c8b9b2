use crate::domain::{ActionRequest, CommandResult, Entry, ListView};
use crate::paths::resolve;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browsing,
    /// A screen-taking subprocess owns the terminal.
    Suspended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub level: NoticeLevel,
    pub expires_at: Instant,
}

#[derive(Debug, Clone)]
pub enum BackendTask {
    RunAction { request: ActionRequest },
    Status,
}

#[derive(Debug, Clone)]
pub enum BackendEvent {
    ActionFinished {
        request: ActionRequest,
        result: CommandResult,
    },
    StatusChecked {
        result: CommandResult,
    },
    Error {
        context: String,
        message: String,
    },
}

pub struct App {
    pub root_dir: PathBuf,
    pub current_dir: PathBuf,
    pub view: ListView,
    entries: Vec<Entry>,
    pub selected_index: usize,
    list_scroll: usize,
    pub notice: Option<Notice>,
    notice_duration: Duration,
    pub mode: Mode,
    in_flight: usize,
    pub pending_foreground: Option<ActionRequest>,
    pub should_quit: bool,
}

impl App {
    pub fn new(root_dir: PathBuf, notice_duration: Duration) -> Self {
        Self {
            current_dir: root_dir.clone(),
            root_dir,
            view: ListView::All,
            entries: Vec::new(),
            selected_index: 0,
            list_scroll: 0,
            notice: None,
            notice_duration,
            mode: Mode::Browsing,
            in_flight: 0,
            pending_foreground: None,
            should_quit: false,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn is_at_root(&self) -> bool {
        self.current_dir == self.root_dir
    }

    /// Swaps in a freshly built listing. The selection follows the previously
    /// selected name when it survives, otherwise it is clamped.
    pub fn replace_entries(&mut self, view: ListView, entries: Vec<Entry>) {
        let previous = self.selected_entry().map(|entry| entry.name.clone());
        self.view = view;
        self.entries = entries;

        if let Some(name) = previous
            && let Some(idx) = self.entries.iter().position(|e| e.name == name)
        {
            self.selected_index = idx;
            return;
        }
        self.sync_selection_bounds();
    }

    /// Same as `replace_entries` but starts at the top, for directory changes.
    pub fn enter_directory(&mut self, dir: PathBuf, view: ListView, entries: Vec<Entry>) {
        self.current_dir = dir;
        self.view = view;
        self.entries = entries;
        self.selected_index = 0;
        self.list_scroll = 0;
    }

    pub fn selected_entry(&self) -> Option<&Entry> {
        self.entries.get(self.selected_index)
    }

    /// Absolute path of the selection, resolved against the current directory.
    pub fn selected_target(&self) -> Option<PathBuf> {
        self.selected_entry()
            .map(|entry| resolve(&entry.path, &self.current_dir))
    }

    pub fn select_next(&mut self) {
        let len = self.entries.len();
        if len == 0 {
            self.selected_index = 0;
            return;
        }
        self.selected_index = (self.selected_index + 1) % len;
    }

    pub fn select_prev(&mut self) {
        let len = self.entries.len();
        if len == 0 {
            self.selected_index = 0;
            return;
        }
        if self.selected_index == 0 {
            self.selected_index = len - 1;
        } else {
            self.selected_index -= 1;
        }
    }

    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    pub fn select_last(&mut self) {
        self.selected_index = self.entries.len().saturating_sub(1);
    }

    pub fn list_scroll(&self) -> usize {
        self.list_scroll
    }

    pub fn sync_list_scroll(&mut self, viewport_rows: usize) {
        let len = self.entries.len();
        if len == 0 {
            self.list_scroll = 0;
            return;
        }

        let rows = viewport_rows.max(1);
        if self.selected_index < self.list_scroll {
            self.list_scroll = self.selected_index;
        } else if self.selected_index >= self.list_scroll + rows {
            self.list_scroll = self.selected_index + 1 - rows;
        }

        let max_offset = len.saturating_sub(rows);
        if self.list_scroll > max_offset {
            self.list_scroll = max_offset;
        }
    }

    fn sync_selection_bounds(&mut self) {
        let len = self.entries.len();
        if len == 0 {
            self.selected_index = 0;
            self.list_scroll = 0;
        } else if self.selected_index >= len {
            self.selected_index = len - 1;
        }
    }

    pub fn notify(&mut self, message: impl Into<String>, now: Instant) {
        self.set_notice(message.into(), NoticeLevel::Info, now);
    }

    pub fn notify_error(&mut self, message: impl Into<String>, now: Instant) {
        self.set_notice(message.into(), NoticeLevel::Error, now);
    }

    fn set_notice(&mut self, message: String, level: NoticeLevel, now: Instant) {
        tracing::info!(?level, %message, "notice");
        self.notice = Some(Notice {
            message,
            level,
            expires_at: now + self.notice_duration,
        });
    }

    /// Timer tick: drops the notice once `now` reaches its expiry.
    pub fn expire_notice(&mut self, now: Instant) -> bool {
        match &self.notice {
            Some(notice) if now >= notice.expires_at => {
                self.notice = None;
                true
            }
            _ => false,
        }
    }

    pub fn task_dispatched(&mut self) {
        self.in_flight += 1;
    }

    /// Called once per backend event; each dispatched task yields exactly one.
    pub fn task_settled(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    pub fn is_suspended(&self) -> bool {
        self.mode == Mode::Suspended
    }

    pub fn suspend_for(&mut self, request: ActionRequest) {
        debug_assert!(request.action.takes_screen());
        self.mode = Mode::Suspended;
        self.pending_foreground = Some(request);
    }

    pub fn resume(&mut self) {
        self.mode = Mode::Browsing;
    }

    pub fn display_dir(&self) -> String {
        display_relative_to(&self.current_dir, &self.root_dir)
    }
}

fn display_relative_to(dir: &Path, root: &Path) -> String {
    match dir.strip_prefix(root) {
        Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Ok(rest) => format!("~/{}", rest.display()),
        Err(_) => dir.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Action;
    use pretty_assertions::assert_eq;

    fn app() -> App {
        App::new(PathBuf::from("/home/u"), Duration::from_secs(2))
    }

    fn entries(names: &[&str]) -> Vec<Entry> {
        names
            .iter()
            .map(|name| Entry::new(*name, false, false))
            .collect()
    }

    #[test]
    fn starts_browsing_at_root() {
        let app = app();
        assert_eq!(app.current_dir, PathBuf::from("/home/u"));
        assert!(app.is_at_root());
        assert_eq!(app.mode, Mode::Browsing);
        assert!(app.selected_entry().is_none());
    }

    #[test]
    fn notice_survives_until_expiry() {
        let mut app = app();
        let t = Instant::now();
        app.notify("File added successfully", t);

        assert!(!app.expire_notice(t + Duration::from_secs(1)));
        assert!(app.notice.is_some());

        assert!(app.expire_notice(t + Duration::from_secs(3)));
        assert!(app.notice.is_none());
    }

    #[test]
    fn replace_entries_keeps_selected_name() {
        let mut app = app();
        app.replace_entries(ListView::All, entries(&["a", "b", "c"]));
        app.select_next();
        app.select_next();

        app.replace_entries(ListView::Managed, entries(&["c", "a"]));
        assert_eq!(app.selected_entry().map(|e| e.name.as_str()), Some("c"));
        assert_eq!(app.view, ListView::Managed);
    }

    #[test]
    fn replace_entries_clamps_when_selection_disappears() {
        let mut app = app();
        app.replace_entries(ListView::All, entries(&["a", "b", "c"]));
        app.select_last();
        app.replace_entries(ListView::All, entries(&["x"]));
        assert_eq!(app.selected_index, 0);

        app.replace_entries(ListView::All, Vec::new());
        assert!(app.selected_entry().is_none());
    }

    #[test]
    fn selection_wraps_in_both_directions() {
        let mut app = app();
        app.replace_entries(ListView::All, entries(&["a", "b"]));
        app.select_prev();
        assert_eq!(app.selected_index, 1);
        app.select_next();
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn selected_target_resolves_against_current_dir() {
        let mut app = app();
        app.enter_directory(
            PathBuf::from("/home/u/.config"),
            ListView::Directory,
            vec![Entry::back_reference(), Entry::new("nvim", true, true)],
        );
        assert_eq!(app.selected_target(), Some(PathBuf::from("/home/u")));
        app.select_next();
        assert_eq!(
            app.selected_target(),
            Some(PathBuf::from("/home/u/.config/nvim"))
        );
    }

    #[test]
    fn busy_until_every_dispatched_task_settles() {
        let mut app = app();
        assert!(!app.is_busy());

        app.task_dispatched();
        app.task_dispatched();
        app.task_settled();
        assert!(app.is_busy());

        app.task_settled();
        assert!(!app.is_busy());
        app.task_settled();
        assert!(!app.is_busy());
    }

    #[test]
    fn suspend_and_resume_toggle_mode() {
        let mut app = app();
        app.suspend_for(ActionRequest::new(Action::Diff, None));
        assert!(app.is_suspended());
        assert!(app.pending_foreground.is_some());
        app.resume();
        assert!(!app.is_suspended());
    }

    #[test]
    fn display_dir_is_home_relative() {
        let mut app = app();
        assert_eq!(app.display_dir(), "~");
        app.enter_directory(PathBuf::from("/home/u/.config"), ListView::Directory, Vec::new());
        assert_eq!(app.display_dir(), "~/.config");
    }

    #[test]
    fn list_scroll_moves_only_at_view_edges() {
        let mut app = app();
        let names: Vec<String> = (0..20).map(|i| format!("file-{i}")).collect();
        app.replace_entries(
            ListView::All,
            names.iter().map(|n| Entry::new(n.as_str(), false, false)).collect(),
        );

        app.selected_index = 10;
        app.sync_list_scroll(5);
        assert_eq!(app.list_scroll(), 6);

        app.selected_index = 6;
        app.sync_list_scroll(5);
        assert_eq!(app.list_scroll(), 6);

        app.selected_index = 5;
        app.sync_list_scroll(5);
        assert_eq!(app.list_scroll(), 5);
    }
}
