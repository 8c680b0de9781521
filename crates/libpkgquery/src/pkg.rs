//! Package records built from parsed metadata files.
//!
//! A [`Package`] is created once per metadata file per invocation and never
//! changes afterwards. Its dependency and flag fields are substituted while
//! the record is built, against a [`VariableScope`] that layers the
//! invocation's global variables (command-line overrides and environment
//! derived values) over the file's own variables and the built-in
//! `pcfiledir`. Its variables stay raw and are expanded again on request,
//! so `--variable` sees the same overrides.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::dependency::{Dependency, parse_package_spec_list};
use crate::error::{Error, Result};
use crate::fragment::FragmentList;
use crate::parser::{Keyword, PcFile};
use crate::substitute::substitute_with;
use crate::version::Version;

/// Name of the built-in variable bound to the metadata file's directory.
pub const PCFILEDIR: &str = "pcfiledir";

/// Variable lookup for one package, highest precedence first: global
/// variables, the package's own variables, then `pcfiledir`.
#[derive(Debug, Clone, Copy)]
pub struct VariableScope<'a> {
    globals: &'a HashMap<String, String>,
    variables: &'a [(String, String)],
    source_dir: &'a Path,
}

impl<'a> VariableScope<'a> {
    pub fn new(
        globals: &'a HashMap<String, String>,
        variables: &'a [(String, String)],
        source_dir: &'a Path,
    ) -> Self {
        Self {
            globals,
            variables,
            source_dir,
        }
    }

    /// The unexpanded value bound to `name`, if any.
    pub fn lookup(&self, name: &str) -> Option<String> {
        if let Some(value) = self.globals.get(name) {
            return Some(value.clone());
        }
        if let Some((_, value)) = self.variables.iter().find(|(k, _)| k == name) {
            return Some(value.clone());
        }
        (name == PCFILEDIR).then(|| self.source_dir.display().to_string())
    }

    /// Substitute every reference in `text`.
    pub fn expand(&self, text: &str) -> Result<String> {
        substitute_with(text, |name| self.lookup(name))
    }
}

/// A parsed and substituted package.
#[derive(Debug, Clone)]
pub struct Package {
    /// The id the package was looked up by (file stem without `-uninstalled`).
    pub id: String,
    /// The metadata file this package was loaded from.
    pub path: PathBuf,
    /// The directory containing the metadata file.
    pub source_dir: PathBuf,
    /// Whether this package came from a `-uninstalled` metadata file.
    pub uninstalled: bool,

    pub name: String,
    pub description: String,
    pub version: Version,
    pub url: Option<String>,

    /// Variable definitions, unsubstituted, in file order.
    pub variables: Vec<(String, String)>,

    pub requires: Vec<Dependency>,
    pub requires_private: Vec<Dependency>,
    pub conflicts: Vec<Dependency>,

    pub cflags: FragmentList,
    pub libs: FragmentList,
    pub libs_private: FragmentList,
}

impl Package {
    /// Read, parse and substitute the metadata file at `path`.
    pub fn load(
        path: &Path,
        id: impl Into<String>,
        uninstalled: bool,
        globals: &HashMap<String, String>,
    ) -> Result<Self> {
        let pc = PcFile::from_path(path)?;
        Self::from_pc_file(&pc, id, uninstalled, globals)
    }

    /// Build a package from an already-parsed file.
    pub fn from_pc_file(
        pc: &PcFile,
        id: impl Into<String>,
        uninstalled: bool,
        globals: &HashMap<String, String>,
    ) -> Result<Self> {
        let source_dir = pc.directory();
        let scope = VariableScope::new(globals, &pc.variables, &source_dir);
        let context = pc.path.display().to_string();

        let text = |keyword: Keyword| -> Result<Option<String>> {
            match pc.field(keyword) {
                Some(field) => scope
                    .expand(&field.value)
                    .map(Some)
                    .map_err(|e| e.in_context(context.as_str())),
                None => Ok(None),
            }
        };
        let required = |keyword: Keyword, field: &'static str| -> Result<String> {
            text(keyword)?.ok_or_else(|| Error::MissingField {
                path: pc.path.clone(),
                field,
            })
        };
        let deps = |keyword: Keyword| -> Result<Vec<Dependency>> {
            let Some(value) = text(keyword)? else {
                return Ok(Vec::new());
            };
            parse_package_spec_list(&value).map_err(|e| Error::Parse {
                path: pc.path.clone(),
                line: pc.field(keyword).map_or(0, |f| f.line),
                message: format!("{}: {e}", keyword.as_str()),
            })
        };
        let flags = |keyword: Keyword| -> Result<FragmentList> {
            Ok(text(keyword)?
                .map(|value| FragmentList::parse(&value))
                .unwrap_or_default())
        };

        let package = Self {
            id: id.into(),
            path: pc.path.clone(),
            uninstalled,
            name: required(Keyword::Name, "Name")?,
            version: Version::parse(&required(Keyword::Version, "Version")?),
            description: text(Keyword::Description)?.unwrap_or_default(),
            url: text(Keyword::URL)?,
            requires: deps(Keyword::Requires)?,
            requires_private: deps(Keyword::RequiresPrivate)?,
            conflicts: deps(Keyword::Conflicts)?,
            cflags: flags(Keyword::Cflags)?,
            libs: flags(Keyword::Libs)?,
            libs_private: flags(Keyword::LibsPrivate)?,
            variables: pc.variables.clone(),
            source_dir: source_dir.clone(),
        };

        log::debug!(
            "loaded package '{}' version {} from {}",
            package.id,
            package.version,
            package.path.display()
        );
        Ok(package)
    }

    /// A multi-line description of the parsed record, for `--dump-package`.
    /// Variables are shown raw; fields as substituted.
    pub fn dump(&self) -> String {
        let join = |deps: &[Dependency]| {
            deps.iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut out = String::new();
        let _ = writeln!(out, "Package: {}", self.id);
        let _ = writeln!(out, "File: {}", self.path.display());
        let _ = writeln!(out, "Uninstalled: {}", if self.uninstalled { "yes" } else { "no" });
        let _ = writeln!(out, "Name: {}", self.name);
        let _ = writeln!(out, "Description: {}", self.description);
        let _ = writeln!(out, "Version: {}", self.version);
        if let Some(url) = &self.url {
            let _ = writeln!(out, "URL: {url}");
        }
        let _ = writeln!(out, "Variables:");
        for (name, value) in &self.variables {
            let _ = writeln!(out, "  {name}={value}");
        }
        let _ = writeln!(out, "Requires: {}", join(&self.requires));
        let _ = writeln!(out, "Requires.private: {}", join(&self.requires_private));
        let _ = writeln!(out, "Conflicts: {}", join(&self.conflicts));
        let _ = writeln!(out, "Cflags: {}", self.cflags.render());
        let _ = writeln!(out, "Libs: {}", self.libs.render());
        let _ = writeln!(out, "Libs.private: {}", self.libs_private.render());
        out
    }

    /// The lookup scope for this package's variables.
    pub fn scope<'a>(&'a self, globals: &'a HashMap<String, String>) -> VariableScope<'a> {
        VariableScope::new(globals, &self.variables, &self.source_dir)
    }

    /// The fully substituted value of a variable, or `None` when neither the
    /// globals, the package, nor the built-ins define it.
    pub fn variable(&self, name: &str, globals: &HashMap<String, String>) -> Result<Option<String>> {
        let scope = self.scope(globals);
        if scope.lookup(name).is_none() {
            return Ok(None);
        }
        // Expanded as a reference so a self-referential variable stops at
        // its own name, the same as inside a field.
        scope
            .expand(&format!("${{{name}}}"))
            .map(Some)
            .map_err(|e| e.in_context(self.path.display().to_string()))
    }
}
