//! Compiler and linker flag fragments.
//!
//! A flags field (`Cflags`, `Libs`, `Libs.private`) is split on whitespace
//! into tokens, and every token is classified by its prefix:
//!
//! - `-I...` → [`FragmentKind::Include`]
//! - `-L...` → [`FragmentKind::LibPath`]
//! - `-l...` → [`FragmentKind::Lib`]
//! - anything else → [`FragmentKind::Other`]
//!
//! Tokens are kept exactly as written. A single package's list is never
//! reordered or deduplicated; that only happens when lists from several
//! packages are merged (see [`crate::aggregate`]).

use std::path::{MAIN_SEPARATOR, Path};

/// The classification of a flag token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentKind {
    /// `-I` include directory.
    Include,
    /// `-L` library search directory.
    LibPath,
    /// `-l` library name.
    Lib,
    /// Any other token (`-D`, `-pthread`, bare paths, ...).
    Other,
}

impl FragmentKind {
    /// Classify a raw token.
    pub fn of(token: &str) -> Self {
        if token.starts_with("-I") {
            Self::Include
        } else if token.starts_with("-L") {
            Self::LibPath
        } else if token.starts_with("-l") {
            Self::Lib
        } else {
            Self::Other
        }
    }
}

/// A single classified flag token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fragment {
    kind: FragmentKind,
    token: String,
}

impl Fragment {
    /// Classify and wrap a raw token.
    ///
    /// ```
    /// use libpkgquery::fragment::{Fragment, FragmentKind};
    ///
    /// let frag = Fragment::new("-I/opt/foo/include");
    /// assert_eq!(frag.kind(), FragmentKind::Include);
    /// assert_eq!(frag.data(), "/opt/foo/include");
    /// ```
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            kind: FragmentKind::of(&token),
            token,
        }
    }

    pub fn kind(&self) -> FragmentKind {
        self.kind
    }

    /// The token as written.
    pub fn as_str(&self) -> &str {
        &self.token
    }

    /// The token without its two-character prefix for `-I`, `-L` and `-l`;
    /// the whole token otherwise.
    pub fn data(&self) -> &str {
        match self.kind {
            FragmentKind::Other => &self.token,
            _ => &self.token[2..],
        }
    }

    /// This fragment with the directory of an `-I` or `-L` flag rewritten to
    /// use the platform's path separator. Other fragments are unchanged.
    pub fn with_native_separators(&self) -> Self {
        if !matches!(self.kind, FragmentKind::Include | FragmentKind::LibPath) {
            return self.clone();
        }
        let data: String = self
            .data()
            .chars()
            .map(|c| if c == '/' || c == '\\' { MAIN_SEPARATOR } else { c })
            .collect();
        Self {
            kind: self.kind,
            token: format!("{}{data}", &self.token[..2]),
        }
    }

    /// Whether this is an `-I` or `-L` fragment naming one of `dirs`.
    pub fn names_dir_in(&self, dirs: &[String]) -> bool {
        if !matches!(self.kind, FragmentKind::Include | FragmentKind::LibPath) {
            return false;
        }
        let data = Path::new(self.data());
        dirs.iter().any(|d| Path::new(d) == data)
    }
}

/// An ordered list of fragments from one flags field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentList {
    fragments: Vec<Fragment>,
}

impl FragmentList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split an already-substituted flags string on whitespace.
    ///
    /// ```
    /// use libpkgquery::fragment::FragmentList;
    ///
    /// let list = FragmentList::parse("-L/usr/local/lib  -lfoo -pthread");
    /// assert_eq!(list.len(), 3);
    /// assert_eq!(list.render(), "-L/usr/local/lib -lfoo -pthread");
    /// ```
    pub fn parse(input: &str) -> Self {
        Self {
            fragments: input.split_whitespace().map(Fragment::new).collect(),
        }
    }

    pub fn push(&mut self, fragment: Fragment) {
        self.fragments.push(fragment);
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fragment> {
        self.fragments.iter()
    }

    /// Join the tokens with single spaces.
    pub fn render(&self) -> String {
        self.fragments
            .iter()
            .map(Fragment::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl FromIterator<Fragment> for FragmentList {
    fn from_iter<I: IntoIterator<Item = Fragment>>(iter: I) -> Self {
        Self {
            fragments: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FragmentList {
    type Item = &'a Fragment;
    type IntoIter = std::slice::Iter<'a, Fragment>;

    fn into_iter(self) -> Self::IntoIter {
        self.fragments.iter()
    }
}
