//! Per-invocation package lookup and caching.
//!
//! A [`ResolutionContext`] owns the [`Settings`] for one invocation together
//! with two caches: where each requested name was located, and the
//! [`Package`] loaded for each id. A metadata file is therefore parsed at
//! most once, however many times it appears in the dependency graph.
//! Nothing here outlives the context; a new invocation starts empty.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::path::PC_EXTENSION;
use crate::pkg::Package;

/// Suffix of the in-tree variant of a metadata file.
pub const UNINSTALLED_SUFFIX: &str = "-uninstalled";

/// Where a package name was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// The id the package is known by (file stem, without `-uninstalled`).
    pub id: String,
    pub path: PathBuf,
    pub uninstalled: bool,
}

impl Location {
    fn from_path(path: PathBuf) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        match stem.strip_suffix(UNINSTALLED_SUFFIX) {
            Some(id) => Self {
                id: id.to_string(),
                path,
                uninstalled: true,
            },
            None => Self {
                id: stem,
                path,
                uninstalled: false,
            },
        }
    }
}

/// One line of `--list-all` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Lookup state for one invocation.
#[derive(Debug)]
pub struct ResolutionContext {
    settings: Settings,
    locations: HashMap<String, Location>,
    packages: HashMap<String, Rc<Package>>,
}

impl ResolutionContext {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            locations: HashMap::new(),
            packages: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Find the metadata file for `name`.
    ///
    /// A name ending in `.pc` that names an existing file is used as is.
    /// Otherwise, unless disabled, `{name}-uninstalled.pc` is looked up across
    /// the whole search path before `{name}.pc`.
    pub fn locate(&mut self, name: &str) -> Result<Location> {
        if let Some(found) = self.locations.get(name) {
            return Ok(found.clone());
        }

        let found = self.search(name).ok_or_else(|| Error::NotFound {
            name: name.to_string(),
            required_by: None,
        })?;
        log::debug!(
            "located '{name}' at {}{}",
            found.path.display(),
            if found.uninstalled { " (uninstalled)" } else { "" }
        );
        self.locations.insert(name.to_string(), found.clone());
        Ok(found)
    }

    fn search(&self, name: &str) -> Option<Location> {
        let direct = Path::new(name);
        if direct.extension().is_some_and(|ext| ext == PC_EXTENSION) && direct.is_file() {
            return Some(Location::from_path(direct.to_path_buf()));
        }

        let search_path = self.settings.search_path();
        if self.settings.prefer_uninstalled() {
            if let Some(path) = search_path.find_pc_file(&format!("{name}{UNINSTALLED_SUFFIX}")) {
                return Some(Location::from_path(path));
            }
        }
        search_path.find_pc_file(name).map(Location::from_path)
    }

    /// Locate and load `name`, reusing an already loaded package.
    pub fn load(&mut self, name: &str) -> Result<Rc<Package>> {
        let location = self.locate(name)?;
        if let Some(pkg) = self.packages.get(&location.id) {
            return Ok(Rc::clone(pkg));
        }

        let pkg = Rc::new(Package::load(
            &location.path,
            location.id.as_str(),
            location.uninstalled,
            self.settings.globals(),
        )?);
        self.packages.insert(location.id, Rc::clone(&pkg));
        Ok(pkg)
    }

    /// Whether a package with this id has been loaded.
    pub fn is_loaded(&self, id: &str) -> bool {
        self.packages.contains_key(id)
    }

    /// Parse every metadata file visible on the search path.
    ///
    /// Files that fail to parse are left out of the listing; their errors are
    /// returned alongside it.
    pub fn list_all(&self) -> (Vec<Listing>, Vec<Error>) {
        let mut listings = Vec::new();
        let mut errors = Vec::new();

        for (stem, path) in self.settings.search_path().list_all_pc_files() {
            match Package::load(&path, stem.as_str(), false, self.settings.globals()) {
                Ok(pkg) => listings.push(Listing {
                    id: stem,
                    name: pkg.name,
                    description: pkg.description,
                }),
                Err(e) => {
                    log::warn!("skipping {}: {e}", path.display());
                    errors.push(e);
                }
            }
        }

        (listings, errors)
    }
}
