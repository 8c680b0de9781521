//! `libpkgquery`: package metadata queries compatible with pkg-config.
//!
//! This crate locates `.pc` metadata files, parses and substitutes them,
//! resolves the dependency graph they describe, and aggregates compiler and
//! linker flags from it. The `pkgquery` binary is a thin command-line layer
//! over [`query::QueryEngine`].
//!
//! # Architecture
//!
//! - [`error`]: Error type and diagnostic text
//! - [`version`]: Version parsing, total ordering and constraint operators
//! - [`substitute`]: `${name}` substitution with cycle detection
//! - [`dependency`]: `Requires`-style dependency list parsing
//! - [`fragment`]: Flag token classification
//! - [`parser`]: `.pc` file parsing into raw variables and fields
//! - [`pkg`]: Substituted package records
//! - [`path`]: Search path handling and `.pc` file discovery
//! - [`config`]: Environment snapshot and per-invocation settings
//! - [`context`]: Package lookup and the per-invocation cache
//! - [`resolver`]: Dependency graph resolution
//! - [`aggregate`]: Flag aggregation over a resolved graph
//! - [`query`]: Query modes and error reporting
//!
//! # Example
//!
//! ```rust,no_run
//! use libpkgquery::aggregate::FlagQuery;
//! use libpkgquery::config::{Environment, Settings};
//! use libpkgquery::dependency::parse_package_spec_list;
//! use libpkgquery::query::{ErrorPolicy, PackageMode, QueryEngine};
//!
//! let settings = Settings::builder()
//!     .environment(&Environment::capture())
//!     .build();
//! let mut engine = QueryEngine::new(settings, ErrorPolicy::default());
//!
//! let requested = parse_package_spec_list("zlib >= 1.2").unwrap();
//! let outcome = engine.run(&PackageMode::Flags(vec![FlagQuery::Libs]), &requested);
//! print!("{}", outcome.stdout);
//! ```

pub mod aggregate;
pub mod config;
pub mod context;
pub mod dependency;
pub mod error;
pub mod fragment;
pub mod parser;
pub mod path;
pub mod pkg;
pub mod query;
pub mod resolver;
pub mod substitute;
pub mod version;

/// The version of this library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The pkg-config version we claim compatibility with.
///
/// This is the version reported by `--version` and used for
/// `--atleast-pkgconfig-version` checks.
pub const PKGCONFIG_COMPAT_VERSION: &str = "0.29.2";

/// System library directories filtered from `-L` output.
pub const DEFAULT_SYSTEM_LIBDIRS: &[&str] = &["/usr/lib", "/lib"];

/// System include directories filtered from `-I` output.
pub const DEFAULT_SYSTEM_INCLUDEDIRS: &[&str] = &["/usr/include"];

/// Default `.pc` file search path.
#[cfg(unix)]
pub const DEFAULT_PKGCONFIG_PATH: &[&str] = &[
    "/usr/local/lib/pkgconfig",
    "/usr/local/share/pkgconfig",
    "/usr/lib/pkgconfig",
    "/usr/share/pkgconfig",
];

/// Default `.pc` file search path.
#[cfg(not(unix))]
pub const DEFAULT_PKGCONFIG_PATH: &[&str] = &[];

/// Global variable bound to `PKG_CONFIG_SYSROOT_DIR`.
pub const VAR_PC_SYSROOTDIR: &str = "pc_sysrootdir";

/// Global variable bound to `PKG_CONFIG_TOP_BUILD_DIR`.
pub const VAR_PC_TOPBUILDDIR: &str = "pc_topbuilddir";

/// The `PKG_CONFIG_PATH` environment variable name.
pub const ENV_PKG_CONFIG_PATH: &str = "PKG_CONFIG_PATH";

/// The `PKG_CONFIG_LIBDIR` environment variable name.
///
/// When set, this *replaces* the default search path instead of following it.
pub const ENV_PKG_CONFIG_LIBDIR: &str = "PKG_CONFIG_LIBDIR";

/// The `PKG_CONFIG_SYSROOT_DIR` environment variable name.
pub const ENV_PKG_CONFIG_SYSROOT_DIR: &str = "PKG_CONFIG_SYSROOT_DIR";

/// The `PKG_CONFIG_TOP_BUILD_DIR` environment variable name.
pub const ENV_PKG_CONFIG_TOP_BUILD_DIR: &str = "PKG_CONFIG_TOP_BUILD_DIR";

/// The `PKG_CONFIG_ALLOW_SYSTEM_CFLAGS` environment variable name.
pub const ENV_PKG_CONFIG_ALLOW_SYSTEM_CFLAGS: &str = "PKG_CONFIG_ALLOW_SYSTEM_CFLAGS";

/// The `PKG_CONFIG_ALLOW_SYSTEM_LIBS` environment variable name.
pub const ENV_PKG_CONFIG_ALLOW_SYSTEM_LIBS: &str = "PKG_CONFIG_ALLOW_SYSTEM_LIBS";

/// The `PKG_CONFIG_DISABLE_UNINSTALLED` environment variable name.
pub const ENV_PKG_CONFIG_DISABLE_UNINSTALLED: &str = "PKG_CONFIG_DISABLE_UNINSTALLED";

/// The `PKG_CONFIG_DEBUG_SPEW` environment variable name.
pub const ENV_PKG_CONFIG_DEBUG_SPEW: &str = "PKG_CONFIG_DEBUG_SPEW";

/// Compiler include path list; its entries are filtered like `/usr/include`.
pub const ENV_C_INCLUDE_PATH: &str = "C_INCLUDE_PATH";

/// C++ counterpart of [`ENV_C_INCLUDE_PATH`].
pub const ENV_CPLUS_INCLUDE_PATH: &str = "CPLUS_INCLUDE_PATH";
