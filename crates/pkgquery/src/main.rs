//! `pkgquery`, a drop-in replacement for pkg-config.
//!
//! Parses the command line, captures the environment once, and hands the
//! selected mode to [`QueryEngine`]. All output comes back as an
//! [`Outcome`]; this file only writes it and turns it into an exit code.

use std::io::Write;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use libpkgquery::aggregate::FlagQuery;
use libpkgquery::config::{self, Environment, Settings};
use libpkgquery::query::{self, ErrorPolicy, Outcome, PackageMode, QueryEngine};

/// Return metainformation about installed libraries.
#[derive(Parser, Debug)]
#[command(
    name = "pkgquery",
    about = "return metainformation about installed libraries",
    long_about = None,
    disable_version_flag = true,
    args_override_self = true,
)]
struct Cli {
    // ── Self information ────────────────────────────────────────────
    /// Output version of pkg-config.
    #[arg(long)]
    version: bool,

    /// Output the real version of this tool.
    #[arg(long)]
    realversion: bool,

    /// Require given version of pkg-config.
    #[arg(long = "atleast-pkgconfig-version", value_name = "VERSION")]
    atleast_pkgconfig_version: Option<String>,

    /// List all known packages.
    #[arg(long = "list-all")]
    list_all: bool,

    // ── Package modes ───────────────────────────────────────────────
    /// Print the parsed package information and exit.
    #[arg(long = "dump-package")]
    dump_package: bool,

    /// Return 0 if the module(s) exist.
    #[arg(long)]
    exists: bool,

    /// Return 0 if the uninstalled version of one or more modules or their
    /// dependencies will be used.
    #[arg(long)]
    uninstalled: bool,

    /// Output version for package.
    #[arg(long)]
    modversion: bool,

    /// Return 0 if the module is at least version VERSION.
    #[arg(long = "atleast-version", value_name = "VERSION")]
    atleast_version: Option<String>,

    /// Return 0 if the module is at exactly version VERSION.
    #[arg(long = "exact-version", value_name = "VERSION")]
    exact_version: Option<String>,

    /// Return 0 if the module is at no newer than version VERSION.
    #[arg(long = "max-version", value_name = "VERSION")]
    max_version: Option<String>,

    /// Get the value of variable named NAME.
    #[arg(long, value_name = "NAME")]
    variable: Option<String>,

    /// Set variable NAME to VALUE.
    #[arg(long = "define-variable", value_name = "NAME=VALUE")]
    define_variable: Vec<String>,

    // ── Flags ───────────────────────────────────────────────────────
    /// Output all pre-processor and compiler flags.
    #[arg(long)]
    cflags: bool,

    /// Output -I flags.
    #[arg(long = "cflags-only-I")]
    cflags_only_i: bool,

    /// Output cflags not covered by the cflags-only-I option.
    #[arg(long = "cflags-only-other")]
    cflags_only_other: bool,

    /// Output all linker flags.
    #[arg(long)]
    libs: bool,

    /// Output -l flags.
    #[arg(long = "libs-only-l")]
    libs_only_l_lower: bool,

    /// Output -L flags.
    #[arg(long = "libs-only-L")]
    libs_only_l_upper: bool,

    /// Output other libs (e.g. -pthread).
    #[arg(long = "libs-only-other")]
    libs_only_other: bool,

    /// Normalise -I and -L paths to use the correct slash for your platform.
    #[arg(long = "normalise-paths")]
    normalise_paths: bool,

    /// Output linker flags for static linking.
    #[arg(long = "static")]
    r#static: bool,

    // ── Diagnostics ─────────────────────────────────────────────────
    /// Show verbose information about missing or conflicting packages.
    #[arg(long = "print-errors")]
    print_errors: bool,

    /// Show no information about missing or conflicting packages.
    #[arg(long = "silence-errors")]
    silence_errors: bool,

    /// Print errors from --print-errors to stdout not stderr.
    #[arg(long = "errors-to-stdout")]
    errors_to_stdout: bool,

    /// Print short errors.
    #[arg(long = "short-errors")]
    short_errors: bool,

    /// Show debugging information.
    #[arg(long)]
    debug: bool,

    // ── Positional ──────────────────────────────────────────────────
    /// Package names, optionally with version constraints.
    packages: Vec<String>,
}

impl Cli {
    fn error_policy(&self) -> ErrorPolicy {
        ErrorPolicy::from_flags(
            self.print_errors,
            self.silence_errors,
            self.errors_to_stdout,
            self.short_errors,
        )
    }

    fn flag_queries(&self) -> Vec<FlagQuery> {
        [
            (self.cflags, FlagQuery::Cflags),
            (self.cflags_only_i, FlagQuery::CflagsOnlyI),
            (self.cflags_only_other, FlagQuery::CflagsOnlyOther),
            (self.libs, FlagQuery::Libs),
            (self.libs_only_l_upper, FlagQuery::LibsOnlyL),
            (self.libs_only_l_lower, FlagQuery::LibsOnlyLower),
            (self.libs_only_other, FlagQuery::LibsOnlyOther),
        ]
        .into_iter()
        .filter_map(|(set, query)| set.then_some(query))
        .collect()
    }

    /// The package mode with the highest precedence. With none selected the
    /// tool only reports through its exit status, like `--exists`.
    fn package_mode(&self) -> PackageMode {
        if self.dump_package {
            PackageMode::DumpPackage
        } else if self.exists {
            PackageMode::Exists
        } else if self.uninstalled {
            PackageMode::Uninstalled
        } else if self.modversion {
            PackageMode::Modversion
        } else if let Some(v) = &self.atleast_version {
            PackageMode::AtleastVersion(v.clone())
        } else if let Some(v) = &self.exact_version {
            PackageMode::ExactVersion(v.clone())
        } else if let Some(v) = &self.max_version {
            PackageMode::MaxVersion(v.clone())
        } else if let Some(name) = &self.variable {
            PackageMode::Variable(name.clone())
        } else {
            let queries = self.flag_queries();
            if queries.is_empty() {
                PackageMode::Exists
            } else {
                PackageMode::Flags(queries)
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let env = Environment::capture();
    init_logging(cli.debug || env.is_set(libpkgquery::ENV_PKG_CONFIG_DEBUG_SPEW));

    match run(&cli, &env) {
        Ok(outcome) => {
            write_outcome(&outcome);
            if outcome.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            if !cli.silence_errors {
                if cli.errors_to_stdout {
                    println!("{e:#}");
                } else {
                    eprintln!("{e:#}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr at debug level when asked, otherwise stay quiet.
/// `RUST_LOG` overrides either choice.
fn init_logging(debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Off
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .init();
}

fn run(cli: &Cli, env: &Environment) -> Result<Outcome> {
    // ── Self information ────────────────────────────────────────────
    if cli.version {
        return Ok(query::version());
    }
    if cli.realversion {
        return Ok(query::real_version());
    }
    if let Some(required) = &cli.atleast_pkgconfig_version {
        return Ok(query::atleast_pkgconfig_version(required));
    }

    // ── Settings ────────────────────────────────────────────────────
    let mut builder = Settings::builder().environment(env);
    for definition in &cli.define_variable {
        let (name, value) = config::parse_define(definition)?;
        builder = builder.define_variable(&name, &value);
    }
    let settings = builder.build();

    let mut engine = QueryEngine::new(settings, cli.error_policy())
        .with_static(cli.r#static)
        .with_normalised_paths(cli.normalise_paths);

    if cli.list_all {
        return Ok(engine.list_all());
    }

    // ── Package modes ───────────────────────────────────────────────
    let spec = cli.packages.join(" ");
    let mode = cli.package_mode();
    log::debug!("running {mode:?} for '{spec}'");
    Ok(engine.run_spec(&mode, &spec))
}

fn write_outcome(outcome: &Outcome) {
    // A closed pipe is not worth reporting.
    let _ = std::io::stdout().write_all(outcome.stdout.as_bytes());
    let _ = std::io::stderr().write_all(outcome.stderr.as_bytes());
}
