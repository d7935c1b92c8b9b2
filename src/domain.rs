use std::path::PathBuf;

pub const BACK_REFERENCE_NAME: &str = "..";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    BackReference,
}

/// One row of a directory listing. `name` is relative to the directory the
/// listing was built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub path: String,
    pub is_managed: bool,
    pub kind: EntryKind,
}

impl Entry {
    pub fn new(name: impl Into<String>, is_managed: bool, is_dir: bool) -> Self {
        let name = name.into();
        Self {
            path: name.clone(),
            name,
            is_managed,
            kind: if is_dir {
                EntryKind::Directory
            } else {
                EntryKind::File
            },
        }
    }

    pub fn back_reference() -> Self {
        Self {
            name: BACK_REFERENCE_NAME.to_string(),
            path: BACK_REFERENCE_NAME.to_string(),
            is_managed: false,
            kind: EntryKind::BackReference,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, EntryKind::Directory | EntryKind::BackReference)
    }

    pub fn is_back_reference(&self) -> bool {
        self.kind == EntryKind::BackReference
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListView {
    All,
    Managed,
    Unmanaged,
    Directory,
}

impl ListView {
    pub fn title(self) -> &'static str {
        match self {
            ListView::All => "All",
            ListView::Managed => "Managed",
            ListView::Unmanaged => "Unmanaged",
            ListView::Directory => "Browse",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Add,
    Forget,
    Apply,
    Edit,
    Diff,
}

impl Action {
    pub fn label(self) -> &'static str {
        match self {
            Action::Add => "add",
            Action::Forget => "forget",
            Action::Apply => "apply",
            Action::Edit => "edit",
            Action::Diff => "diff",
        }
    }

    /// Screen-taking actions hand the terminal to the child process.
    pub fn takes_screen(self) -> bool {
        matches!(self, Action::Apply | Action::Edit | Action::Diff)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    pub action: Action,
    pub target: Option<PathBuf>,
}

impl ActionRequest {
    pub fn new(action: Action, target: Option<PathBuf>) -> Self {
        Self { action, target }
    }

    pub fn describe(&self) -> String {
        match &self.target {
            Some(path) => format!("{} {}", self.action.label(), path.display()),
            None => self.action.label().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}
