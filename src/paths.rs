use crate::error::{BrowseError, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};

fn is_separator(c: char) -> bool {
    c == '/' || c == std::path::MAIN_SEPARATOR
}

/// Joins `relative` onto `base` without touching the filesystem. `.` and `..`
/// segments are folded lexically; `..` never climbs above the root.
pub fn resolve(relative: &str, base: &Path) -> PathBuf {
    let joined = base.join(relative);
    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if out.parent().is_some() {
                    out.pop();
                }
            }
            Component::Normal(segment) => out.push(segment),
        }
    }
    out
}

/// Rejects reported lines that can never name a path.
pub fn validate_line(line: &str) -> Result<&str> {
    if line.contains('\0') {
        return Err(BrowseError::PathResolution {
            path: line.replace('\0', "\\0"),
            reason: "contains a NUL byte".to_string(),
        });
    }
    Ok(line)
}

pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(is_separator).filter(|segment| !segment.is_empty())
}

pub fn top_level_segment(path: &str) -> &str {
    segments(path).next().unwrap_or_default()
}

/// Drops everything up to and including the first separator. A line without
/// a separator names the scope itself and strips to the empty string.
pub fn strip_leading_segment(path: &str) -> &str {
    let trimmed = path.trim_start_matches(is_separator);
    match trimmed.find(is_separator) {
        Some(idx) => trimmed[idx..].trim_start_matches(is_separator),
        None => "",
    }
}

/// Directory probe that follows symlinks; any error reads as "not a directory".
pub fn is_directory(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| meta.is_dir())
        .unwrap_or(false)
}

pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| BrowseError::PathResolution {
        path: "~".to_string(),
        reason: "home directory could not be determined".to_string(),
    })
}
