use crate::domain::Entry;
use crate::error::{BrowseError, Result};
use crate::infra::{ChezmoiClient, ListQuery};
use crate::paths::{
    is_directory, resolve, segments, strip_leading_segment, top_level_segment, validate_line,
};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Reports whether `name` occurs as any segment of any managed line.
///
/// This is segment membership, not prefix matching: a file that shares its
/// name with an unrelated managed directory elsewhere also reports as
/// tracked. Callers only pass listings scoped to the directory being shown.
pub fn is_tracked(name: &str, managed_output: &str) -> bool {
    managed_output
        .lines()
        .map(str::trim)
        .any(|line| segments(line).any(|segment| segment == name))
}

/// How reported lines map onto the filesystem.
#[derive(Debug, Clone, Copy)]
pub struct ReduceScope<'a> {
    /// Directory that reported lines resolve against once stripped.
    pub base: &'a Path,
    /// Set for subdirectory queries: the tool reports paths relative to its
    /// own root, so the leading segment is dropped first.
    pub strip_leading: bool,
}

pub fn reduce_entries(raw: &str, scope: ReduceScope<'_>, is_managed: bool) -> Result<Vec<Entry>> {
    reduce_entries_with(raw, scope, is_managed, is_directory)
}

/// Collapses a raw listing to one entry per top-level directory, keeping the
/// tool's own line order.
pub fn reduce_entries_with<F>(
    raw: &str,
    scope: ReduceScope<'_>,
    is_managed: bool,
    probe: F,
) -> Result<Vec<Entry>>
where
    F: Fn(&Path) -> bool,
{
    let mut lines = Vec::new();
    for line in raw.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let line = validate_line(line)?;
        let line = if scope.strip_leading {
            strip_leading_segment(line)
        } else {
            line
        };
        if !line.is_empty() {
            lines.push(line);
        }
    }

    let mut entries = Vec::new();
    let mut seen = HashSet::new();
    let mut collapsing: Option<&str> = None;

    for line in lines {
        let top = top_level_segment(line);
        if collapsing == Some(top) {
            continue;
        }

        let is_dir = probe(&resolve(line, scope.base));
        if is_dir {
            collapsing = Some(top);
        }
        if seen.insert(line) {
            entries.push(Entry::new(line, is_managed, is_dir));
        }
    }

    Ok(entries)
}

pub struct FileListing {
    client: Arc<dyn ChezmoiClient>,
    root: PathBuf,
}

impl FileListing {
    pub fn new(client: Arc<dyn ChezmoiClient>, root: PathBuf) -> Self {
        Self { client, root }
    }

    pub fn is_root(&self, directory: &Path) -> bool {
        directory == self.root
    }

    fn scope_for(&self, directory: Option<&Path>) -> Option<PathBuf> {
        directory
            .filter(|dir| !self.is_root(dir))
            .map(Path::to_path_buf)
    }

    pub fn managed_entries(&self, directory: Option<&Path>) -> Result<Vec<Entry>> {
        let scope = self.scope_for(directory);
        let raw = self.client.list(&ListQuery::Managed {
            scope: scope.clone(),
        })?;
        self.reduce(&raw, scope.as_deref(), true)
    }

    pub fn unmanaged_entries(&self, directory: Option<&Path>) -> Result<Vec<Entry>> {
        let scope = self.scope_for(directory);
        let raw = self.client.list(&ListQuery::Unmanaged {
            scope: scope.clone(),
        })?;
        self.reduce(&raw, scope.as_deref(), false)
    }

    pub fn all_entries(&self, directory: Option<&Path>) -> Result<Vec<Entry>> {
        let managed = self.managed_entries(directory)?;
        let unmanaged = self.unmanaged_entries(directory)?;

        let mut entries = Vec::with_capacity(managed.len() + unmanaged.len() + 1);
        if self.scope_for(directory).is_some() {
            entries.push(Entry::back_reference());
        }

        let mut seen = HashSet::new();
        for entry in managed.into_iter().chain(unmanaged) {
            if seen.insert(entry.name.clone()) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// Raw contents of `directory`, sorted by name, each classified against
    /// the managed paths below it. A ".." entry leads the list.
    ///
    /// The tool refuses to list directories it knows nothing about; that
    /// classifies every child as unmanaged instead of failing. Only an
    /// unreadable directory is an error.
    pub fn directory_entries(&self, directory: &Path) -> Result<Vec<Entry>> {
        let read_dir = fs::read_dir(directory).map_err(|source| BrowseError::DirectoryRead {
            path: directory.to_path_buf(),
            source,
        })?;
        let managed = match self
            .client
            .list(&ListQuery::ManagedUnder(directory.to_path_buf()))
        {
            Ok(managed) => managed,
            Err(err) => {
                tracing::warn!(
                    dir = %directory.display(),
                    error = %err,
                    "managed classification unavailable, listing as unmanaged"
                );
                String::new()
            }
        };

        let mut entries = Vec::new();
        for child in read_dir {
            let child = child.map_err(|source| BrowseError::DirectoryRead {
                path: directory.to_path_buf(),
                source,
            })?;
            let name = child.file_name().to_string_lossy().to_string();
            let is_managed = is_tracked(&name, &managed);
            entries.push(Entry::new(name, is_managed, is_directory(&child.path())));
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries.insert(0, Entry::back_reference());

        Ok(entries)
    }

    fn reduce(&self, raw: &str, scope: Option<&Path>, is_managed: bool) -> Result<Vec<Entry>> {
        let reduce_scope = ReduceScope {
            base: scope.unwrap_or(&self.root),
            strip_leading: scope.is_some(),
        };
        reduce_entries(raw, reduce_scope, is_managed)
    }
}
