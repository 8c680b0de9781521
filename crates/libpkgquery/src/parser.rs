//! Line-level parser for `.pc` metadata files.
//!
//! The file format consists of:
//!
//! - **Variable definitions**: `name=value`, stored raw (unsubstituted)
//! - **Field declarations**: `Keyword: value`
//! - **Comments**: lines whose first non-blank character is `#`
//! - **Blank lines**
//!
//! A line ending in `\` is joined with the following line. Each logical line
//! starts with an identifier made of ASCII alphanumerics, `_` and `.`; the
//! first non-blank character after it decides whether the line is a variable
//! (`=`) or a field (`:`). Any other shape is malformed.
//!
//! This module only splits the file into raw variables and fields. Turning
//! them into a resolved [`Package`](crate::pkg::Package) is done in
//! [`crate::pkg`].

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// The fields a metadata file may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Name,
    Description,
    Version,
    URL,
    Requires,
    RequiresPrivate,
    Conflicts,
    Cflags,
    Libs,
    LibsPrivate,
    /// Any key this tool does not interpret. Such fields are ignored.
    Unknown,
}

impl Keyword {
    /// Map a field key to its keyword. Keys are case-sensitive, except that
    /// `CFlags` is accepted as a spelling of `Cflags`.
    pub fn parse(key: &str) -> Self {
        match key {
            "Name" => Self::Name,
            "Description" => Self::Description,
            "Version" => Self::Version,
            "URL" => Self::URL,
            "Requires" => Self::Requires,
            "Requires.private" => Self::RequiresPrivate,
            "Conflicts" => Self::Conflicts,
            "Cflags" | "CFlags" => Self::Cflags,
            "Libs" => Self::Libs,
            "Libs.private" => Self::LibsPrivate,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Description => "Description",
            Self::Version => "Version",
            Self::URL => "URL",
            Self::Requires => "Requires",
            Self::RequiresPrivate => "Requires.private",
            Self::Conflicts => "Conflicts",
            Self::Cflags => "Cflags",
            Self::Libs => "Libs",
            Self::LibsPrivate => "Libs.private",
            Self::Unknown => "(unknown)",
        }
    }
}

/// One classified logical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Variable { key: String, value: String },
    Field { keyword: Keyword, key: String, value: String },
    Comment,
    Blank,
}

/// A field value together with the line it was declared on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    pub value: String,
    pub line: usize,
}

/// The raw content of one metadata file.
#[derive(Debug, Clone)]
pub struct PcFile {
    /// The file this content was read from.
    pub path: PathBuf,
    /// Variable definitions in file order.
    pub variables: Vec<(String, String)>,
    /// Recognized fields. When a field is declared twice the first one is kept.
    pub fields: HashMap<Keyword, FieldValue>,
}

impl PcFile {
    /// Read and parse the file at `path`. Bytes that are not valid UTF-8
    /// are replaced rather than rejected.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let content = String::from_utf8_lossy(&bytes);
        if let std::borrow::Cow::Owned(_) = content {
            log::debug!("{}: replaced invalid UTF-8", path.display());
        }
        Self::from_str(&content, path)
    }

    /// Parse `content`; `path` is used for diagnostics and as the file's
    /// identity.
    pub fn from_str(content: &str, path: &Path) -> Result<Self> {
        let mut variables: Vec<(String, String)> = Vec::new();
        let mut fields = HashMap::new();

        for (line_no, line) in LogicalLines::new(content) {
            let malformed = |message: String| Error::Parse {
                path: path.to_path_buf(),
                line: line_no,
                message,
            };

            match parse_line(&line).map_err(malformed)? {
                Directive::Variable { key, value } => {
                    if variables.iter().any(|(k, _)| *k == key) {
                        return Err(Error::Parse {
                            path: path.to_path_buf(),
                            line: line_no,
                            message: format!("duplicate definition of variable '{key}'"),
                        });
                    }
                    variables.push((key, value));
                }
                Directive::Field {
                    keyword: Keyword::Unknown,
                    key,
                    ..
                } => {
                    log::debug!("{}:{line_no}: ignoring unknown field '{key}'", path.display());
                }
                Directive::Field { keyword, value, .. } => {
                    fields.entry(keyword).or_insert(FieldValue {
                        value,
                        line: line_no,
                    });
                }
                Directive::Comment | Directive::Blank => {}
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            variables,
            fields,
        })
    }

    /// The raw value of a variable defined in this file.
    pub fn variable(&self, key: &str) -> Option<&str> {
        self.variables
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The raw value of a field.
    pub fn field(&self, keyword: Keyword) -> Option<&FieldValue> {
        self.fields.get(&keyword)
    }

    /// The directory containing the file, bound to `${pcfiledir}`.
    pub fn directory(&self) -> PathBuf {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Classify one logical line.
fn parse_line(line: &str) -> std::result::Result<Directive, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(Directive::Blank);
    }
    if trimmed.starts_with('#') {
        return Ok(Directive::Comment);
    }

    let key_end = trimmed
        .find(|c: char| !is_identifier_char(c))
        .unwrap_or(trimmed.len());
    let key = &trimmed[..key_end];
    let rest = trimmed[key_end..].trim_start();

    if key.is_empty() {
        return Err(format!("expected a variable or field name, found '{trimmed}'"));
    }

    if let Some(value) = rest.strip_prefix('=') {
        Ok(Directive::Variable {
            key: key.to_string(),
            value: value.trim().to_string(),
        })
    } else if let Some(value) = rest.strip_prefix(':') {
        Ok(Directive::Field {
            keyword: Keyword::parse(key),
            key: key.to_string(),
            value: value.trim().to_string(),
        })
    } else {
        Err(format!("'{key}' is followed by neither '=' nor ':'"))
    }
}

/// Joins `\`-continued physical lines, yielding each logical line with the
/// 1-based number of its first physical line.
struct LogicalLines<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> LogicalLines<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            lines: content.lines().enumerate(),
        }
    }
}

impl Iterator for LogicalLines<'_> {
    type Item = (usize, String);

    fn next(&mut self) -> Option<Self::Item> {
        let (index, first) = self.lines.next()?;
        let mut buf = String::new();
        let mut current = first.strip_suffix('\r').unwrap_or(first);

        while let Some(joined) = current.strip_suffix('\\') {
            buf.push_str(joined);
            match self.lines.next() {
                Some((_, next)) => current = next.strip_suffix('\r').unwrap_or(next),
                None => return Some((index + 1, buf)),
            }
        }
        buf.push_str(current);
        Some((index + 1, buf))
    }
}
