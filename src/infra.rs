use crate::domain::{Action, ActionRequest, CommandResult};
use crate::error::{BrowseError, Result};
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

pub const DEFAULT_BINARY: &str = "chezmoi";

/// Listing queries understood by the external tool. Output is plain text, one
/// path per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListQuery {
    Managed { scope: Option<PathBuf> },
    Unmanaged { scope: Option<PathBuf> },
    /// Every managed path below `dir`, used to classify a raw directory listing.
    ManagedUnder(PathBuf),
}

impl ListQuery {
    pub fn label(&self) -> &'static str {
        match self {
            ListQuery::Managed { .. } | ListQuery::ManagedUnder(_) => "managed",
            ListQuery::Unmanaged { .. } => "unmanaged",
        }
    }
}

pub trait ChezmoiClient: Send + Sync {
    fn list(&self, query: &ListQuery) -> Result<String>;
    fn status(&self) -> Result<CommandResult>;
    /// Runs with captured output. A non-zero exit is reported in the result,
    /// only a spawn failure is an error.
    fn run(&self, request: &ActionRequest) -> Result<CommandResult>;
    /// Runs with inherited stdio and returns the exit code.
    fn run_interactive(&self, request: &ActionRequest) -> Result<i32>;
}

#[derive(Debug, Clone)]
pub struct ShellChezmoiClient {
    binary: String,
}

impl Default for ShellChezmoiClient {
    fn default() -> Self {
        Self::new(DEFAULT_BINARY)
    }
}

impl ShellChezmoiClient {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn run_raw<I, S>(&self, label: &str, args: I) -> Result<CommandResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<OsString> = args
            .into_iter()
            .map(|arg| arg.as_ref().to_os_string())
            .collect();
        tracing::debug!(binary = %self.binary, ?args, "spawning captured command");

        let started = Instant::now();
        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|err| BrowseError::external(label, err.to_string()))?;
        let duration_ms = started.elapsed().as_millis() as u64;

        let result = CommandResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms,
        };
        tracing::debug!(
            command = label,
            exit = result.exit_code,
            duration_ms,
            "captured command finished"
        );
        Ok(result)
    }
}

impl ChezmoiClient for ShellChezmoiClient {
    fn list(&self, query: &ListQuery) -> Result<String> {
        let result = self.run_raw(query.label(), list_args(query))?;
        ensure_success(query.label(), &result)?;
        Ok(result.stdout)
    }

    fn status(&self) -> Result<CommandResult> {
        let result = self.run_raw("status", ["status"])?;
        ensure_success("status", &result)?;
        Ok(result)
    }

    fn run(&self, request: &ActionRequest) -> Result<CommandResult> {
        let args = action_to_args(request)?;
        self.run_raw(request.action.label(), &args)
    }

    fn run_interactive(&self, request: &ActionRequest) -> Result<i32> {
        let args = action_to_args(request)?;
        let label = request.action.label();
        tracing::info!(binary = %self.binary, ?args, "handing terminal to subprocess");
        let status = Command::new(&self.binary)
            .args(&args)
            .status()
            .map_err(|err| BrowseError::external(label, err.to_string()))?;
        Ok(status.code().unwrap_or(-1))
    }
}

pub fn ensure_success(command: &str, result: &CommandResult) -> Result<()> {
    if result.success() {
        return Ok(());
    }
    let stderr = result.stderr.trim();
    let message = if stderr.is_empty() {
        format!("exit code {}", result.exit_code)
    } else {
        stderr.to_string()
    };
    Err(BrowseError::external(command, message))
}

pub fn list_args(query: &ListQuery) -> Vec<OsString> {
    match query {
        ListQuery::Managed { scope: None } => vec![os("managed")],
        ListQuery::Managed { scope: Some(dir) } => vec![
            os("managed"),
            os("-i"),
            os("files"),
            os("--"),
            dir.as_os_str().to_os_string(),
        ],
        ListQuery::Unmanaged { scope: None } => vec![os("unmanaged")],
        ListQuery::Unmanaged { scope: Some(dir) } => {
            vec![os("unmanaged"), os("--"), dir.as_os_str().to_os_string()]
        }
        ListQuery::ManagedUnder(dir) => {
            vec![os("managed"), os("--"), dir.as_os_str().to_os_string()]
        }
    }
}

pub fn action_to_args(request: &ActionRequest) -> Result<Vec<OsString>> {
    let action = request.action;
    let target = request
        .target
        .as_ref()
        .map(|path| path.as_os_str().to_os_string());

    let args = match action {
        Action::Apply => vec![os("apply")],
        Action::Add => vec![os("add"), os("--"), required_target(target, action)?],
        Action::Edit => vec![os("edit"), os("--"), required_target(target, action)?],
        Action::Forget => vec![
            os("forget"),
            os("--force"),
            os("--no-tty"),
            os("--"),
            required_target(target, action)?,
        ],
        Action::Diff => {
            let mut args = vec![os("diff")];
            if let Some(path) = target {
                args.push(os("--"));
                args.push(path);
            }
            args
        }
    };

    Ok(args)
}

fn required_target(target: Option<OsString>, action: Action) -> Result<OsString> {
    target.ok_or_else(|| BrowseError::external(action.label(), "a target path is required"))
}

fn os(value: &str) -> OsString {
    OsString::from(value)
}

/// `false` only when the binary cannot be found at all.
pub fn is_installed(binary: &str) -> bool {
    match Command::new(binary)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(_) => true,
        Err(err) => err.kind() != io::ErrorKind::NotFound,
    }
}

pub fn source_dir(binary: &str, home_dir: &Path) -> PathBuf {
    let reported = Command::new(binary)
        .arg("source-path")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|path| !path.is_empty());

    match reported {
        Some(path) => PathBuf::from(path),
        None => default_source_dir(home_dir),
    }
}

pub fn default_source_dir(home_dir: &Path) -> PathBuf {
    home_dir.join(".local").join("share").join("chezmoi")
}

pub fn is_initialized(binary: &str, home_dir: &Path) -> bool {
    source_dir(binary, home_dir).exists()
}

pub fn init(binary: &str) -> Result<()> {
    let status = Command::new(binary)
        .arg("init")
        .status()
        .map_err(|err| BrowseError::external("init", err.to_string()))?;
    if !status.success() {
        return Err(BrowseError::external(
            "init",
            format!("exit code {}", status.code().unwrap_or(-1)),
        ));
    }
    Ok(())
}
