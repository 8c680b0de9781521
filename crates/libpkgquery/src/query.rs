//! Query modes.
//!
//! [`QueryEngine`] answers one command-line mode per call. Every call returns
//! an [`Outcome`] holding the exit status and the text destined for stdout
//! and stderr; nothing here prints. Errors become diagnostic text only here,
//! under the [`ErrorPolicy`].

use std::fmt::Write as _;

use crate::aggregate::{FlagAggregator, FlagQuery};
use crate::config::Settings;
use crate::context::ResolutionContext;
use crate::dependency::{Dependency, parse_package_spec_list};
use crate::error::Error;
use crate::resolver::{self, ResolvedGraph};
use crate::version::{Comparator, Version};

/// The result of one query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl Outcome {
    pub fn success() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failure() -> Self {
        Self::default()
    }

    fn with_success(success: bool) -> Self {
        Self {
            success,
            ..Self::default()
        }
    }

    fn line(&mut self, text: &str) {
        self.stdout.push_str(text);
        self.stdout.push('\n');
    }
}

/// How errors are shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorPolicy {
    /// `Some` when forced on or off; `None` uses the mode's default.
    pub print: Option<bool>,
    pub to_stdout: bool,
    pub short: bool,
}

impl ErrorPolicy {
    /// Build the policy from the command-line switches. Silencing wins over
    /// printing.
    pub fn from_flags(
        print_errors: bool,
        silence_errors: bool,
        errors_to_stdout: bool,
        short_errors: bool,
    ) -> Self {
        let print = if silence_errors {
            Some(false)
        } else if print_errors {
            Some(true)
        } else {
            None
        };
        Self {
            print,
            to_stdout: errors_to_stdout,
            short: short_errors,
        }
    }

    fn prints(&self, mode_default: bool) -> bool {
        self.print.unwrap_or(mode_default)
    }
}

/// The package mode of a request, in precedence order.
///
/// Errors are shown by default for [`PackageMode::Modversion`] and
/// [`PackageMode::Flags`] only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageMode {
    /// Print the parsed record of each requested package.
    DumpPackage,
    Exists,
    Uninstalled,
    Modversion,
    AtleastVersion(String),
    ExactVersion(String),
    MaxVersion(String),
    Variable(String),
    Flags(Vec<FlagQuery>),
}

impl PackageMode {
    fn prints_errors_by_default(&self) -> bool {
        matches!(self, Self::Modversion | Self::Flags(_))
    }
}

/// The report text for `--version`.
pub fn version() -> Outcome {
    let mut out = Outcome::success();
    out.line(crate::PKGCONFIG_COMPAT_VERSION);
    out
}

/// The report text for `--realversion`.
pub fn real_version() -> Outcome {
    let mut out = Outcome::success();
    out.line(&format!(
        "{} (equivalent to {})",
        crate::VERSION,
        crate::PKGCONFIG_COMPAT_VERSION
    ));
    out
}

/// Succeeds when `required` is no newer than the emulated pkg-config.
pub fn atleast_pkgconfig_version(required: &str) -> Outcome {
    let ours = Version::parse(crate::PKGCONFIG_COMPAT_VERSION);
    Outcome::with_success(Version::parse(required) <= ours)
}

/// Answers queries against one invocation's configuration.
#[derive(Debug)]
pub struct QueryEngine {
    ctx: ResolutionContext,
    policy: ErrorPolicy,
    static_linking: bool,
    normalise_paths: bool,
}

impl QueryEngine {
    pub fn new(settings: Settings, policy: ErrorPolicy) -> Self {
        Self {
            ctx: ResolutionContext::new(settings),
            policy,
            static_linking: false,
            normalise_paths: false,
        }
    }

    /// Follow `Requires.private` and emit `Libs.private`.
    pub fn with_static(mut self, static_linking: bool) -> Self {
        self.static_linking = static_linking;
        self
    }

    /// Rewrite `-I` and `-L` directories in flags output to the platform's
    /// path separator.
    pub fn with_normalised_paths(mut self, normalise: bool) -> Self {
        self.normalise_paths = normalise;
        self
    }

    pub fn context(&self) -> &ResolutionContext {
        &self.ctx
    }

    /// Parse the command-line package list `spec` and run `mode` on it. A
    /// malformed list fails under the same error policy as the mode.
    pub fn run_spec(&mut self, mode: &PackageMode, spec: &str) -> Outcome {
        match parse_package_spec_list(spec) {
            Ok(requested) => self.run(mode, &requested),
            Err(e) => {
                let mut out = Outcome::failure();
                self.report(&mut out, std::iter::once(&e), mode.prints_errors_by_default());
                out
            }
        }
    }

    /// Run a package mode over `requested`.
    pub fn run(&mut self, mode: &PackageMode, requested: &[Dependency]) -> Outcome {
        if requested.is_empty() {
            let mut out = Outcome::failure();
            if self.policy.print != Some(false) {
                self.emit(&mut out, &Error::NoPackagesSpecified);
            }
            return out;
        }

        match mode {
            PackageMode::DumpPackage => self.dump_package(requested),
            PackageMode::Exists => self.exists(requested),
            PackageMode::Uninstalled => self.uninstalled(requested),
            PackageMode::Modversion => self.modversion(requested),
            PackageMode::AtleastVersion(v) => self.atleast_version(requested, v),
            PackageMode::ExactVersion(v) => self.exact_version(requested, v),
            PackageMode::MaxVersion(v) => self.max_version(requested, v),
            PackageMode::Variable(name) => self.variable(requested, name),
            PackageMode::Flags(queries) => self.flags(requested, queries),
        }
    }

    /// The parsed record of every requested package, separated by blank
    /// lines. Nothing is printed unless the whole request resolves.
    pub fn dump_package(&mut self, requested: &[Dependency]) -> Outcome {
        let (graph, mut out) = self.resolve(requested, false);
        if out.success {
            let dumps: Vec<String> = graph.requested_packages().map(|p| p.dump()).collect();
            out.stdout.push_str(&dumps.join("\n"));
        }
        out
    }

    /// Succeeds when every requested package and its dependencies resolve.
    pub fn exists(&mut self, requested: &[Dependency]) -> Outcome {
        self.resolve(requested, false).1
    }

    /// Succeeds when resolution succeeds and some resolved package is an
    /// uninstalled variant.
    pub fn uninstalled(&mut self, requested: &[Dependency]) -> Outcome {
        let (graph, mut out) = self.resolve(requested, false);
        out.success = out.success && graph.has_uninstalled();
        out
    }

    /// One version line per requested package.
    pub fn modversion(&mut self, requested: &[Dependency]) -> Outcome {
        let (graph, mut out) = self.resolve(requested, true);
        if out.success {
            for pkg in graph.requested_packages() {
                out.line(pkg.version.as_str());
            }
        }
        out
    }

    /// Succeeds when every requested package's version is at least `target`.
    pub fn atleast_version(&mut self, requested: &[Dependency], target: &str) -> Outcome {
        self.check_version(requested, Comparator::GreaterThanEqual, target)
    }

    /// Succeeds when every requested package's version equals `target`.
    pub fn exact_version(&mut self, requested: &[Dependency], target: &str) -> Outcome {
        self.check_version(requested, Comparator::Equal, target)
    }

    /// Succeeds when every requested package's version is at most `target`.
    pub fn max_version(&mut self, requested: &[Dependency], target: &str) -> Outcome {
        self.check_version(requested, Comparator::LessThanEqual, target)
    }

    fn check_version(
        &mut self,
        requested: &[Dependency],
        comparator: Comparator,
        target: &str,
    ) -> Outcome {
        let (graph, mut out) = self.resolve(requested, false);
        let target = Version::parse(target);
        out.success = out.success
            && graph
                .requested_packages()
                .all(|pkg| comparator.eval(&pkg.version, &target));
        out
    }

    /// The value of `name` from the first requested package that defines
    /// it, then from the rest of the graph.
    pub fn variable(&mut self, requested: &[Dependency], name: &str) -> Outcome {
        let (graph, mut out) = self.resolve(requested, false);
        if !out.success {
            return out;
        }

        let globals = self.ctx.settings().globals();
        let candidates = graph.requested_packages().chain(graph.nodes());
        let mut value = None;
        for pkg in candidates {
            match pkg.variable(name, globals) {
                Ok(Some(found)) => {
                    value = Some(found);
                    break;
                }
                Ok(None) => {}
                Err(e) => {
                    out.success = false;
                    self.report(&mut out, std::iter::once(&e), false);
                    return out;
                }
            }
        }
        out.line(value.as_deref().unwrap_or(""));
        out
    }

    /// A single line of flags selected by `queries`.
    pub fn flags(&mut self, requested: &[Dependency], queries: &[FlagQuery]) -> Outcome {
        let (graph, mut out) = self.resolve(requested, true);
        if !out.success {
            return out;
        }

        let settings = self.ctx.settings();
        let aggregator = FlagAggregator::new(self.static_linking)
            .filter_includedirs(settings.filtered_includedirs())
            .filter_libdirs(settings.filtered_libdirs())
            .normalise_paths(self.normalise_paths);
        out.line(&aggregator.collect_all(graph.nodes(), queries).render());
        out
    }

    /// Every visible package, one per line. Files that fail to parse are
    /// reported and left out; the listing itself still succeeds.
    pub fn list_all(&mut self) -> Outcome {
        let (listings, errors) = self.ctx.list_all();
        let mut out = Outcome::success();
        self.report(&mut out, errors.iter(), true);

        let width = listings.iter().map(|l| l.id.len()).max().unwrap_or(0) + 1;
        for listing in &listings {
            let _ = writeln!(
                out.stdout,
                "{:<width$}{} - {}",
                listing.id, listing.name, listing.description
            );
        }
        out
    }

    fn resolve(&mut self, requested: &[Dependency], mode_prints: bool) -> (ResolvedGraph, Outcome) {
        let graph = resolver::resolve(&mut self.ctx, requested, self.static_linking);
        let mut out = Outcome::with_success(graph.is_ok());
        self.report(&mut out, graph.errors(), mode_prints);
        (graph, out)
    }

    fn report<'e>(
        &self,
        out: &mut Outcome,
        errors: impl Iterator<Item = &'e Error>,
        mode_default: bool,
    ) {
        if !self.policy.prints(mode_default) {
            return;
        }
        for error in errors {
            self.emit(out, error);
        }
    }

    fn emit(&self, out: &mut Outcome, error: &Error) {
        let text = error.diagnostic(self.policy.short);
        let dest = if self.policy.to_stdout {
            &mut out.stdout
        } else {
            &mut out.stderr
        };
        dest.push_str(&text);
        dest.push('\n');
    }
}
