//! Per-invocation configuration.
//!
//! [`Environment`] is a snapshot of the environment variables the engine
//! honours, taken once when the process starts (or built from explicit pairs
//! in tests). Nothing else in the crate reads the process environment.
//!
//! [`Settings`] is the resolved configuration handed to the engine: the
//! search path, the global variables (`--define-variable` overrides plus
//! environment-derived values), and the output filters. It is built with
//! [`SettingsBuilder`].

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::path::{PATH_SEPARATOR, SearchPath};

/// A snapshot of the relevant environment variables.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Capture `PKG_CONFIG_*` variables and the compiler include path lists
    /// from the current process.
    pub fn capture() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .filter(|(k, _)| {
                k.starts_with("PKG_CONFIG_")
                    || k == crate::ENV_C_INCLUDE_PATH
                    || k == crate::ENV_CPLUS_INCLUDE_PATH
            })
            .collect();
        Self { vars }
    }

    /// Build a snapshot from explicit pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Whether the variable is present, even if empty.
    pub fn is_set(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// The value of a variable, treating an empty value as unset.
    fn non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }
}

/// The compiled-in default search directories.
///
/// Overridable at build time with `PKGQUERY_DEFAULT_PATH`, a list in
/// `PKG_CONFIG_PATH` syntax.
pub fn default_search_dirs() -> SearchPath {
    match option_env!("PKGQUERY_DEFAULT_PATH") {
        Some(list) => SearchPath::from_env_value(list),
        None => crate::DEFAULT_PKGCONFIG_PATH.iter().map(PathBuf::from).collect(),
    }
}

/// Split a `--define-variable` argument into its name and value.
///
/// ```
/// use libpkgquery::config::parse_define;
///
/// assert_eq!(
///     parse_define("prefix=/opt").unwrap(),
///     ("prefix".to_string(), "/opt".to_string())
/// );
/// assert!(parse_define("prefix").is_err());
/// ```
pub fn parse_define(definition: &str) -> Result<(String, String)> {
    match definition.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() && !value.is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(Error::InvalidDefine {
            definition: definition.to_string(),
        }),
    }
}

/// Resolved configuration for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    search_path: SearchPath,
    globals: HashMap<String, String>,
    prefer_uninstalled: bool,
    system_includedirs: Vec<String>,
    system_libdirs: Vec<String>,
    keep_system_cflags: bool,
    keep_system_libs: bool,
    debug: bool,
}

impl Settings {
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }

    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    /// Global variables, consulted before any package variable.
    pub fn globals(&self) -> &HashMap<String, String> {
        &self.globals
    }

    /// Whether `-uninstalled` variants are searched before installed files.
    pub fn prefer_uninstalled(&self) -> bool {
        self.prefer_uninstalled
    }

    /// Include directories whose `-I` flags are dropped from output.
    /// Empty when system cflags are kept.
    pub fn filtered_includedirs(&self) -> &[String] {
        if self.keep_system_cflags {
            &[]
        } else {
            &self.system_includedirs
        }
    }

    /// Library directories whose `-L` flags are dropped from output.
    /// Empty when system libs are kept.
    pub fn filtered_libdirs(&self) -> &[String] {
        if self.keep_system_libs {
            &[]
        } else {
            &self.system_libdirs
        }
    }

    /// Whether debug output was requested through the environment.
    pub fn debug(&self) -> bool {
        self.debug
    }
}

impl Default for Settings {
    fn default() -> Self {
        SettingsBuilder::new().build()
    }
}

/// Builder for [`Settings`].
///
/// # Example
///
/// ```rust
/// use libpkgquery::config::{Environment, Settings};
///
/// let env = Environment::from_pairs([("PKG_CONFIG_PATH", "/opt/a:/opt/b")]);
/// let settings = Settings::builder()
///     .environment(&env)
///     .default_dirs(["/usr/lib/pkgconfig"])
///     .define_variable("prefix", "/opt")
///     .build();
///
/// assert_eq!(settings.search_path().len(), 3);
/// assert_eq!(settings.globals()["prefix"], "/opt");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SettingsBuilder {
    env: Environment,
    defines: Vec<(String, String)>,
    default_dirs: Option<SearchPath>,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `env` as the environment snapshot.
    pub fn environment(mut self, env: &Environment) -> Self {
        self.env = env.clone();
        self
    }

    /// Replace the compiled-in default directories.
    pub fn default_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.default_dirs = Some(dirs.into_iter().map(Into::into).collect());
        self
    }

    /// Define a global variable override (`--define-variable`).
    pub fn define_variable(mut self, name: &str, value: &str) -> Self {
        self.defines.push((name.to_string(), value.to_string()));
        self
    }

    pub fn build(self) -> Settings {
        let env = &self.env;

        // PKG_CONFIG_PATH first, then PKG_CONFIG_LIBDIR in place of the defaults.
        let mut search_path = SearchPath::new();
        if let Some(list) = env.get(crate::ENV_PKG_CONFIG_PATH) {
            search_path.add_delimited(list, PATH_SEPARATOR);
        }
        match env.get(crate::ENV_PKG_CONFIG_LIBDIR) {
            Some(list) => search_path.add_delimited(list, PATH_SEPARATOR),
            None => {
                let defaults = self.default_dirs.unwrap_or_else(default_search_dirs);
                for dir in &defaults {
                    search_path.add(dir.clone());
                }
            }
        }
        search_path.deduplicate();
        log::debug!("search path: {search_path}");

        let mut globals = HashMap::new();
        if let Some(sysroot) = env.non_empty(crate::ENV_PKG_CONFIG_SYSROOT_DIR) {
            globals.insert(crate::VAR_PC_SYSROOTDIR.to_string(), sysroot.to_string());
        }
        if let Some(top) = env.non_empty(crate::ENV_PKG_CONFIG_TOP_BUILD_DIR) {
            globals.insert(crate::VAR_PC_TOPBUILDDIR.to_string(), top.to_string());
        }
        for (name, value) in self.defines {
            globals.insert(name, value);
        }

        let mut system_includedirs: Vec<String> = crate::DEFAULT_SYSTEM_INCLUDEDIRS
            .iter()
            .map(|d| d.to_string())
            .collect();
        for var in [crate::ENV_C_INCLUDE_PATH, crate::ENV_CPLUS_INCLUDE_PATH] {
            if let Some(list) = env.non_empty(var) {
                system_includedirs.extend(
                    list.split(PATH_SEPARATOR)
                        .filter(|d| !d.is_empty())
                        .map(str::to_string),
                );
            }
        }

        Settings {
            search_path,
            globals,
            prefer_uninstalled: !env.is_set(crate::ENV_PKG_CONFIG_DISABLE_UNINSTALLED),
            system_includedirs,
            system_libdirs: crate::DEFAULT_SYSTEM_LIBDIRS
                .iter()
                .map(|d| d.to_string())
                .collect(),
            keep_system_cflags: env.is_set(crate::ENV_PKG_CONFIG_ALLOW_SYSTEM_CFLAGS),
            keep_system_libs: env.is_set(crate::ENV_PKG_CONFIG_ALLOW_SYSTEM_LIBS),
            debug: env.is_set(crate::ENV_PKG_CONFIG_DEBUG_SPEW),
        }
    }
}
