//! Flag aggregation over a resolved graph.
//!
//! Each node contributes its tokens for the queried category in graph
//! order. Only the first occurrence of an exact token is kept. In static
//! mode every node's `Libs.private` follows after all public library tokens.
//! `-I` and `-L` flags naming system directories are dropped unless the
//! environment asks to keep them.

use std::collections::HashSet;
use std::rc::Rc;

use crate::fragment::{Fragment, FragmentKind, FragmentList};
use crate::pkg::Package;

/// Which tokens a flags query selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagQuery {
    Cflags,
    CflagsOnlyI,
    CflagsOnlyOther,
    Libs,
    LibsOnlyL,
    LibsOnlyLower,
    LibsOnlyOther,
}

impl FlagQuery {
    /// Queries in the order their output is combined on one line.
    pub const OUTPUT_ORDER: [FlagQuery; 7] = [
        FlagQuery::CflagsOnlyI,
        FlagQuery::CflagsOnlyOther,
        FlagQuery::Cflags,
        FlagQuery::LibsOnlyL,
        FlagQuery::LibsOnlyLower,
        FlagQuery::LibsOnlyOther,
        FlagQuery::Libs,
    ];

    pub fn is_cflags(self) -> bool {
        matches!(self, Self::Cflags | Self::CflagsOnlyI | Self::CflagsOnlyOther)
    }

    /// Whether a fragment of `kind` belongs in this query's output.
    pub fn accepts(self, kind: FragmentKind) -> bool {
        match self {
            Self::Cflags | Self::Libs => true,
            Self::CflagsOnlyI => kind == FragmentKind::Include,
            Self::CflagsOnlyOther => kind != FragmentKind::Include,
            Self::LibsOnlyL => kind == FragmentKind::LibPath,
            Self::LibsOnlyLower => kind == FragmentKind::Lib,
            Self::LibsOnlyOther => !matches!(kind, FragmentKind::LibPath | FragmentKind::Lib),
        }
    }
}

/// Collects flags from resolved packages.
#[derive(Debug, Clone, Default)]
pub struct FlagAggregator {
    static_linking: bool,
    native_separators: bool,
    system_includedirs: Vec<String>,
    system_libdirs: Vec<String>,
}

impl FlagAggregator {
    pub fn new(static_linking: bool) -> Self {
        Self {
            static_linking,
            ..Self::default()
        }
    }

    /// Rewrite `-I` and `-L` directories to the platform's path separator.
    pub fn normalise_paths(mut self, normalise: bool) -> Self {
        self.native_separators = normalise;
        self
    }

    /// Drop `-I` flags naming any of `dirs`.
    pub fn filter_includedirs(mut self, dirs: &[String]) -> Self {
        self.system_includedirs = dirs.to_vec();
        self
    }

    /// Drop `-L` flags naming any of `dirs`.
    pub fn filter_libdirs(mut self, dirs: &[String]) -> Self {
        self.system_libdirs = dirs.to_vec();
        self
    }

    /// The tokens `query` selects from `nodes`, deduplicated.
    pub fn collect(&self, nodes: &[Rc<Package>], query: FlagQuery) -> FragmentList {
        let mut merged = Merge {
            native_separators: self.native_separators,
            ..Merge::default()
        };
        if query.is_cflags() {
            for pkg in nodes {
                merged.extend(&pkg.cflags, |f| self.keep(f, query));
            }
        } else {
            for pkg in nodes {
                merged.extend(&pkg.libs, |f| self.keep(f, query));
            }
            if self.static_linking {
                for pkg in nodes {
                    merged.extend(&pkg.libs_private, |f| self.keep(f, query));
                }
            }
        }
        merged.into_list()
    }

    /// Combine several queries onto one line, in [`FlagQuery::OUTPUT_ORDER`].
    pub fn collect_all(&self, nodes: &[Rc<Package>], queries: &[FlagQuery]) -> FragmentList {
        let mut merged = Merge::default();
        for query in FlagQuery::OUTPUT_ORDER.into_iter().filter(|q| queries.contains(q)) {
            merged.extend(&self.collect(nodes, query), |_| true);
        }
        merged.into_list()
    }

    fn keep(&self, fragment: &Fragment, query: FlagQuery) -> bool {
        if !query.accepts(fragment.kind()) {
            return false;
        }
        let system_dirs = match fragment.kind() {
            FragmentKind::Include => &self.system_includedirs,
            FragmentKind::LibPath => &self.system_libdirs,
            _ => return true,
        };
        if fragment.names_dir_in(system_dirs) {
            log::trace!("dropping system directory flag {}", fragment.as_str());
            return false;
        }
        true
    }
}

/// First-occurrence accumulator.
#[derive(Default)]
struct Merge {
    native_separators: bool,
    seen: HashSet<String>,
    out: FragmentList,
}

impl Merge {
    fn extend(&mut self, list: &FragmentList, keep: impl Fn(&Fragment) -> bool) {
        for fragment in list.iter().filter(|f| keep(*f)) {
            let fragment = if self.native_separators {
                fragment.with_native_separators()
            } else {
                fragment.clone()
            };
            if self.seen.insert(fragment.as_str().to_string()) {
                self.out.push(fragment);
            }
        }
    }

    fn into_list(self) -> FragmentList {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::PcFile;
    use std::collections::HashMap;
    use std::path::Path;

    fn pkg(id: &str, body: &str) -> Rc<Package> {
        let content = format!("Name: {id}\nVersion: 1\n{body}");
        let pc = PcFile::from_str(&content, Path::new("/pc").join(format!("{id}.pc")).as_path())
            .unwrap();
        Rc::new(Package::from_pc_file(&pc, id, false, &HashMap::new()).unwrap())
    }

    fn system() -> FlagAggregator {
        FlagAggregator::new(false)
            .filter_includedirs(&["/usr/include".to_string()])
            .filter_libdirs(&["/usr/lib".to_string(), "/lib".to_string()])
    }

    #[test]
    fn first_occurrence_wins() {
        let nodes = [
            pkg("foo", "Libs: -L/opt/foo/lib -lfoo -lm\n"),
            pkg("bar", "Libs: -lbar -lm\n"),
        ];
        let libs = FlagAggregator::new(false).collect(&nodes, FlagQuery::Libs);
        assert_eq!(libs.render(), "-L/opt/foo/lib -lfoo -lm -lbar");
    }

    #[test]
    fn cflags_split_by_kind() {
        let nodes = [pkg("foo", "Cflags: -I/opt/foo/include -DFOO -pthread\n")];
        let agg = FlagAggregator::new(false);
        assert_eq!(agg.collect(&nodes, FlagQuery::CflagsOnlyI).render(), "-I/opt/foo/include");
        assert_eq!(agg.collect(&nodes, FlagQuery::CflagsOnlyOther).render(), "-DFOO -pthread");
    }

    #[test]
    fn libs_split_by_kind() {
        let nodes = [pkg("foo", "Libs: -L/opt/lib -lfoo -pthread -Wl,--as-needed\n")];
        let agg = FlagAggregator::new(false);
        assert_eq!(agg.collect(&nodes, FlagQuery::LibsOnlyL).render(), "-L/opt/lib");
        assert_eq!(agg.collect(&nodes, FlagQuery::LibsOnlyLower).render(), "-lfoo");
        assert_eq!(
            agg.collect(&nodes, FlagQuery::LibsOnlyOther).render(),
            "-pthread -Wl,--as-needed"
        );
    }

    #[test]
    fn static_appends_private_libs_after_public() {
        let nodes = [
            pkg("foo", "Libs: -lfoo\nLibs.private: -lz\n"),
            pkg("bar", "Libs: -lbar\nLibs.private: -lm -lz\n"),
        ];
        let dynamic = FlagAggregator::new(false).collect(&nodes, FlagQuery::Libs);
        assert_eq!(dynamic.render(), "-lfoo -lbar");
        let stat = FlagAggregator::new(true).collect(&nodes, FlagQuery::Libs);
        assert_eq!(stat.render(), "-lfoo -lbar -lz -lm");
    }

    #[test]
    fn static_does_not_touch_cflags() {
        let nodes = [pkg("foo", "Cflags: -DFOO\nLibs.private: -lz\n")];
        let cflags = FlagAggregator::new(true).collect(&nodes, FlagQuery::Cflags);
        assert_eq!(cflags.render(), "-DFOO");
    }

    #[test]
    fn system_dirs_are_dropped() {
        let nodes = [pkg(
            "foo",
            "Cflags: -I/usr/include -I/opt/include\nLibs: -L/usr/lib -L/lib -L/opt/lib -lfoo\n",
        )];
        let agg = system();
        assert_eq!(agg.collect(&nodes, FlagQuery::Cflags).render(), "-I/opt/include");
        assert_eq!(agg.collect(&nodes, FlagQuery::Libs).render(), "-L/opt/lib -lfoo");
    }

    #[test]
    fn combined_queries_follow_output_order() {
        let nodes = [pkg("foo", "Cflags: -I/opt/include -DFOO\nLibs: -L/opt/lib -lfoo\n")];
        let agg = FlagAggregator::new(false);
        let line = agg.collect_all(&nodes, &[FlagQuery::Libs, FlagQuery::Cflags]);
        assert_eq!(line.render(), "-I/opt/include -DFOO -L/opt/lib -lfoo");

        let overlap = agg.collect_all(&nodes, &[FlagQuery::Cflags, FlagQuery::CflagsOnlyI]);
        assert_eq!(overlap.render(), "-I/opt/include -DFOO");
    }

    #[test]
    fn empty_graph() {
        assert!(FlagAggregator::new(true).collect(&[], FlagQuery::Libs).is_empty());
    }

    #[test]
    fn normalised_paths_merge_after_rewriting() {
        let sep = std::path::MAIN_SEPARATOR;
        let nodes = [
            pkg("foo", "Cflags: -I/opt/inc -DP=a/b\n"),
            pkg("bar", "Cflags: -I\\opt\\inc\n"),
        ];
        let agg = FlagAggregator::new(false).normalise_paths(true);
        assert_eq!(
            agg.collect(&nodes, FlagQuery::Cflags).render(),
            format!("-I{sep}opt{sep}inc -DP=a/b")
        );
        let raw = FlagAggregator::new(false).collect(&nodes, FlagQuery::Cflags);
        assert_eq!(raw.len(), 3);
    }
}
