//! Search path management for `.pc` file discovery.
//!
//! [`SearchPath`] is the ordered directory list consulted when a package name
//! is turned into a metadata file. It is built from `PKG_CONFIG_PATH`, then
//! `PKG_CONFIG_LIBDIR` or the compiled-in defaults (see
//! [`crate::config::Settings`]). The first directory holding a match wins.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// The separator used in path-list environment variables.
///
/// On Unix systems this is `:`, elsewhere it is `;`.
#[cfg(unix)]
pub const PATH_SEPARATOR: char = ':';

#[cfg(not(unix))]
pub const PATH_SEPARATOR: char = ';';

/// File extension of metadata files.
pub const PC_EXTENSION: &str = "pc";

/// An ordered list of directories to search for `.pc` files.
///
/// # Examples
///
/// ```
/// use libpkgquery::path::SearchPath;
///
/// let mut sp = SearchPath::new();
/// sp.add_delimited("/opt/lib/pkgconfig::/opt/share/pkgconfig", ':');
/// sp.add("/usr/lib/pkgconfig");
/// assert_eq!(sp.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new() -> Self {
        Self { dirs: Vec::new() }
    }

    /// Parse a delimited list. Empty segments are skipped.
    pub fn from_delimited(s: &str, separator: char) -> Self {
        let mut sp = Self::new();
        sp.add_delimited(s, separator);
        sp
    }

    /// Parse a list using the platform separator.
    pub fn from_env_value(s: &str) -> Self {
        Self::from_delimited(s, PATH_SEPARATOR)
    }

    /// Append a directory. Trailing separators are stripped.
    pub fn add<P: Into<PathBuf>>(&mut self, path: P) {
        let path = path.into();
        if !path.as_os_str().is_empty() {
            self.dirs.push(normalize_path(&path));
        }
    }

    /// Append every non-empty segment of a delimited list.
    pub fn add_delimited(&mut self, s: &str, separator: char) {
        for segment in s.split(separator).filter(|p| !p.is_empty()) {
            self.add(segment);
        }
    }

    /// Remove repeated directories, keeping the first occurrence.
    pub fn deduplicate(&mut self) {
        let mut seen = HashSet::new();
        self.dirs.retain(|dir| seen.insert(dir.clone()));
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.dirs.iter()
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// Find `{stem}.pc` in the first directory that has it.
    pub fn find_pc_file(&self, stem: &str) -> Option<PathBuf> {
        let filename = format!("{stem}.{PC_EXTENSION}");
        self.dirs.iter().find_map(|dir| {
            let candidate = dir.join(&filename);
            log::trace!("probing {}", candidate.display());
            candidate.is_file().then_some(candidate)
        })
    }

    /// List every `.pc` file visible through this search path as
    /// `(stem, path)` pairs.
    ///
    /// Each directory's entries are sorted; a stem seen in an earlier
    /// directory shadows later ones. Unreadable directories are skipped.
    pub fn list_all_pc_files(&self) -> Vec<(String, PathBuf)> {
        let mut result = Vec::new();
        let mut seen = HashSet::new();

        for dir in &self.dirs {
            let Ok(entries) = fs::read_dir(dir) else {
                log::debug!("skipping unreadable search directory {}", dir.display());
                continue;
            };
            let mut files: Vec<PathBuf> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|ext| ext == PC_EXTENSION) && p.is_file())
                .collect();
            files.sort();

            for path in files {
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                if seen.insert(stem.to_string()) {
                    result.push((stem.to_string(), path));
                }
            }
        }

        result
    }
}

impl<'a> IntoIterator for &'a SearchPath {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.dirs.iter()
    }
}

impl FromIterator<PathBuf> for SearchPath {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        let mut sp = Self::new();
        for dir in iter {
            sp.add(dir);
        }
        sp
    }
}

impl std::fmt::Display for SearchPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .dirs
            .iter()
            .map(|d| d.to_string_lossy())
            .collect::<Vec<_>>()
            .join(&PATH_SEPARATOR.to_string());
        f.write_str(&joined)
    }
}

/// Strip trailing separators without touching the filesystem.
fn normalize_path(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    let trimmed = s.trim_end_matches(['/', '\\']);
    if trimmed.is_empty() {
        PathBuf::from(&s[..1])
    } else {
        PathBuf::from(trimmed)
    }
}
