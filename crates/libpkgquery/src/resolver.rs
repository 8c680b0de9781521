//! Dependency graph resolution.
//!
//! Each requested package is walked depth-first, pre-order, following
//! `Requires` in declaration order and `Requires.private` after it when
//! private dependencies are included. A package already on the current path
//! is a cycle and is skipped. A package already visited by the same request
//! is not added again, but the constraint that reached it is still checked.
//!
//! A request keeps walking past failures so that every missing package and
//! unmet constraint beneath it is reported at once. A request with any error
//! contributes no nodes; the remaining requests are unaffected.
//!
//! The resulting node order is the order flags are later aggregated in:
//! the successful requests' walks, concatenated, first occurrence kept.

use std::collections::HashSet;
use std::rc::Rc;

use crate::context::ResolutionContext;
use crate::dependency::Dependency;
use crate::error::Error;
use crate::pkg::Package;

/// The result of resolving one requested package.
#[derive(Debug)]
pub struct RequestOutcome {
    pub request: Dependency,
    /// The requested package itself, when it was found.
    pub package: Option<Rc<Package>>,
    pub errors: Vec<Error>,
}

impl RequestOutcome {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// The resolved dependency graph for a set of requests.
#[derive(Debug, Default)]
pub struct ResolvedGraph {
    requests: Vec<RequestOutcome>,
    nodes: Vec<Rc<Package>>,
}

impl ResolvedGraph {
    /// Per-request outcomes, in request order.
    pub fn requests(&self) -> &[RequestOutcome] {
        &self.requests
    }

    /// Every package reached by a successful request, in traversal order.
    pub fn nodes(&self) -> &[Rc<Package>] {
        &self.nodes
    }

    /// Whether every request resolved.
    pub fn is_ok(&self) -> bool {
        self.requests.iter().all(RequestOutcome::is_ok)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Error> {
        self.requests.iter().flat_map(|r| r.errors.iter())
    }

    /// The requested packages that resolved, in request order.
    pub fn requested_packages(&self) -> impl Iterator<Item = &Rc<Package>> {
        self.requests
            .iter()
            .filter(|r| r.is_ok())
            .filter_map(|r| r.package.as_ref())
    }

    /// Whether any resolved package came from an `-uninstalled` file.
    pub fn has_uninstalled(&self) -> bool {
        self.nodes.iter().any(|p| p.uninstalled)
    }
}

/// Resolve `requested` against the packages visible through `ctx`.
pub fn resolve(
    ctx: &mut ResolutionContext,
    requested: &[Dependency],
    include_private: bool,
) -> ResolvedGraph {
    let mut graph = ResolvedGraph::default();
    let mut committed: HashSet<String> = HashSet::new();

    for request in requested {
        let mut walk = Walk::new(include_private);
        walk.visit(ctx, request, None);
        walk.check_conflicts(&graph.nodes);

        let package = walk.order.first().cloned();
        if walk.errors.is_empty() {
            for pkg in &walk.order {
                if committed.insert(pkg.id.clone()) {
                    graph.nodes.push(Rc::clone(pkg));
                }
            }
        } else {
            log::debug!(
                "request '{request}' failed with {} error(s)",
                walk.errors.len()
            );
        }

        graph.requests.push(RequestOutcome {
            request: request.clone(),
            package,
            errors: walk.errors,
        });
    }

    graph
}

/// Traversal state for a single request.
struct Walk {
    include_private: bool,
    order: Vec<Rc<Package>>,
    visited: HashSet<String>,
    in_progress: HashSet<String>,
    errors: Vec<Error>,
}

impl Walk {
    fn new(include_private: bool) -> Self {
        Self {
            include_private,
            order: Vec::new(),
            visited: HashSet::new(),
            in_progress: HashSet::new(),
            errors: Vec::new(),
        }
    }

    fn visit(&mut self, ctx: &mut ResolutionContext, dep: &Dependency, parent: Option<&Package>) {
        let pkg = match ctx.load(&dep.name) {
            Ok(pkg) => pkg,
            Err(Error::NotFound { name, .. }) => {
                self.errors.push(Error::NotFound {
                    name,
                    required_by: parent.map(|p| p.id.clone()),
                });
                return;
            }
            Err(e) => {
                self.errors.push(e);
                return;
            }
        };

        if self.in_progress.contains(&pkg.id) {
            log::debug!("dependency cycle through '{}', skipping", pkg.id);
            return;
        }

        if !dep.is_satisfied_by(&pkg.version) {
            self.errors.push(Error::VersionConstraint {
                required_by: parent.map(|p| p.id.clone()),
                name: dep.name.clone(),
                comparator: dep.comparator,
                required: dep.version.to_string(),
                found: pkg.version.to_string(),
                url: pkg.url.clone(),
            });
            return;
        }

        if !self.visited.insert(pkg.id.clone()) {
            return;
        }
        self.order.push(Rc::clone(&pkg));

        self.in_progress.insert(pkg.id.clone());
        for child in &pkg.requires {
            self.visit(ctx, child, Some(pkg.as_ref()));
        }
        if self.include_private {
            for child in &pkg.requires_private {
                self.visit(ctx, child, Some(pkg.as_ref()));
            }
        }
        self.in_progress.remove(&pkg.id);
    }

    /// Check `Conflicts` entries in both directions: those declared by this
    /// walk's packages against this walk and the committed nodes, and those
    /// declared by committed nodes against this walk. Errors are charged to
    /// the current request.
    fn check_conflicts(&mut self, committed: &[Rc<Package>]) {
        let mut found = Vec::new();
        for pkg in &self.order {
            let candidates = self.order.iter().chain(committed);
            found.extend(conflicts_declared_by(pkg, candidates));
        }
        for pkg in committed.iter().filter(|p| !self.visited.contains(&p.id)) {
            found.extend(conflicts_declared_by(pkg, self.order.iter()));
        }
        self.errors.extend(found);
    }
}

/// Every package in `candidates` matched by a `Conflicts` entry of `pkg`.
fn conflicts_declared_by<'a>(
    pkg: &'a Package,
    candidates: impl Iterator<Item = &'a Rc<Package>> + Clone + 'a,
) -> impl Iterator<Item = Error> + 'a {
    pkg.conflicts.iter().filter_map(move |conflict| {
        candidates
            .clone()
            .find(|other| {
                other.id == conflict.name
                    && other.id != pkg.id
                    && conflict.is_satisfied_by(&other.version)
            })
            .map(|other| Error::Conflict {
                name: other.id.clone(),
                version: other.version.to_string(),
                conflict: conflict.to_string(),
                declared_by: pkg.id.clone(),
                declared_by_version: pkg.version.to_string(),
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Environment, Settings};
    use crate::dependency::parse_package_spec_list;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
            }
        }

        fn pc(&self, stem: &str, version: &str, extra: &str) -> &Self {
            let body = format!("Name: {stem}\nVersion: {version}\n{extra}");
            fs::write(self.dir.path().join(format!("{stem}.pc")), body).unwrap();
            self
        }

        fn context(&self) -> ResolutionContext {
            let dirs: [&Path; 1] = [self.dir.path()];
            let settings = Settings::builder()
                .environment(&Environment::default())
                .default_dirs(dirs.iter().map(|d| d.to_path_buf()))
                .build();
            ResolutionContext::new(settings)
        }

        fn resolve(&self, spec: &str, include_private: bool) -> ResolvedGraph {
            let requested = parse_package_spec_list(spec).unwrap();
            resolve(&mut self.context(), &requested, include_private)
        }
    }

    fn ids(graph: &ResolvedGraph) -> Vec<&str> {
        graph.nodes().iter().map(|p| p.id.as_str()).collect()
    }

    fn messages(graph: &ResolvedGraph) -> Vec<String> {
        graph.errors().map(|e| e.to_string()).collect()
    }

    #[test]
    fn preorder_in_declaration_order() {
        let fx = Fixture::new();
        fx.pc("app", "1", "Requires: b, c\n")
            .pc("b", "1", "Requires: d\n")
            .pc("c", "1", "")
            .pc("d", "1", "");
        let graph = fx.resolve("app", false);
        assert!(graph.is_ok());
        assert_eq!(ids(&graph), ["app", "b", "d", "c"]);
    }

    #[test]
    fn diamond_is_visited_once() {
        let fx = Fixture::new();
        fx.pc("top", "1", "Requires: left, right\n")
            .pc("left", "1", "Requires: base\n")
            .pc("right", "1", "Requires: base\n")
            .pc("base", "1", "");
        assert_eq!(ids(&fx.resolve("top", false)), ["top", "left", "base", "right"]);
    }

    #[test]
    fn diamond_still_checks_constraints() {
        let fx = Fixture::new();
        fx.pc("top", "1", "Requires: left, right\n")
            .pc("left", "1", "Requires: base\n")
            .pc("right", "1", "Requires: base >= 2\n")
            .pc("base", "1", "");
        let graph = fx.resolve("top", false);
        assert!(!graph.is_ok());
        assert_eq!(
            messages(&graph),
            ["Package 'right' requires 'base >= 2' but version of base is 1"]
        );
    }

    #[test]
    fn cycles_terminate() {
        let fx = Fixture::new();
        fx.pc("a", "1", "Requires: b\n").pc("b", "1", "Requires: a\n");
        let graph = fx.resolve("a", false);
        assert!(graph.is_ok());
        assert_eq!(ids(&graph), ["a", "b"]);
    }

    #[test]
    fn private_requires_only_when_included() {
        let fx = Fixture::new();
        fx.pc("app", "1", "Requires: pub\nRequires.private: priv\n")
            .pc("pub", "1", "")
            .pc("priv", "1", "");
        assert_eq!(ids(&fx.resolve("app", false)), ["app", "pub"]);
        assert_eq!(ids(&fx.resolve("app", true)), ["app", "pub", "priv"]);
    }

    #[test]
    fn missing_private_requirement_is_ignored_without_static() {
        let fx = Fixture::new();
        fx.pc("app", "1", "Requires.private: ghost\n");
        assert!(fx.resolve("app", false).is_ok());
        assert!(!fx.resolve("app", true).is_ok());
    }

    #[test]
    fn transitive_constraint_failure() {
        let fx = Fixture::new();
        fx.pc("foo", "1.0", "Requires: bar >= 1.0\n")
            .pc("bar", "0.9", "");
        let graph = fx.resolve("foo", false);
        assert!(!graph.is_ok());
        assert!(graph.nodes().is_empty());
        assert_eq!(
            messages(&graph),
            ["Package 'foo' requires 'bar >= 1.0' but version of bar is 0.9"]
        );
    }

    #[test]
    fn top_level_constraint_failure() {
        let fx = Fixture::new();
        fx.pc("bar", "0.9", "URL: https://example.org/bar\n");
        let graph = fx.resolve("bar >= 1.0", false);
        assert_eq!(
            messages(&graph),
            ["Requested 'bar >= 1.0' but version of bar is 0.9\n\
              You may find new versions of bar at https://example.org/bar"]
        );
    }

    #[test]
    fn all_errors_of_a_request_are_collected() {
        let fx = Fixture::new();
        fx.pc("app", "1", "Requires: one, two\n");
        let graph = fx.resolve("app", false);
        assert_eq!(
            messages(&graph),
            [
                "Package 'one', required by 'app', not found",
                "Package 'two', required by 'app', not found",
            ]
        );
    }

    #[test]
    fn failed_request_does_not_affect_others() {
        let fx = Fixture::new();
        fx.pc("good", "1", "").pc("bad", "1", "Requires: ghost\n");
        let graph = fx.resolve("bad good", false);
        assert!(!graph.is_ok());
        assert!(!graph.requests()[0].is_ok());
        assert!(graph.requests()[1].is_ok());
        assert_eq!(ids(&graph), ["good"]);
        assert_eq!(graph.requested_packages().count(), 1);
    }

    #[test]
    fn shared_nodes_across_requests_appear_once() {
        let fx = Fixture::new();
        fx.pc("a", "1", "Requires: common\n")
            .pc("b", "1", "Requires: common\n")
            .pc("common", "1", "");
        assert_eq!(ids(&fx.resolve("a b", false)), ["a", "common", "b"]);
    }

    #[test]
    fn conflicts_are_reported() {
        let fx = Fixture::new();
        fx.pc("new", "2", "Conflicts: old < 2\n").pc("old", "1", "");
        let graph = fx.resolve("old new", false);
        assert!(graph.requests()[0].is_ok());
        assert_eq!(
            messages(&graph),
            ["Version 1 of old creates a conflict.\n(old < 2 conflicts with new 2)"]
        );
    }

    #[test]
    fn conflicts_do_not_depend_on_request_order() {
        let fx = Fixture::new();
        fx.pc("new", "2", "Conflicts: old < 2\n").pc("old", "1", "");
        let expected = ["Version 1 of old creates a conflict.\n(old < 2 conflicts with new 2)"];

        let graph = fx.resolve("new old", false);
        assert!(!graph.is_ok());
        assert!(graph.requests()[0].is_ok());
        assert!(!graph.requests()[1].is_ok());
        assert_eq!(messages(&graph), expected);
        assert_eq!(ids(&graph), ["new"]);

        assert_eq!(messages(&fx.resolve("old new", false)), expected);
    }

    #[test]
    fn conflict_through_a_dependency_of_a_later_request() {
        let fx = Fixture::new();
        fx.pc("new", "2", "Conflicts: old\n")
            .pc("app", "1", "Requires: old\n")
            .pc("old", "1", "");
        let graph = fx.resolve("new app", false);
        assert!(!graph.requests()[1].is_ok());
        assert_eq!(ids(&graph), ["new"]);
    }

    #[test]
    fn conflict_reported_once_when_declarer_is_revisited() {
        let fx = Fixture::new();
        fx.pc("new", "2", "Conflicts: old\n")
            .pc("app", "1", "Requires: new old\n")
            .pc("old", "1", "");
        let graph = fx.resolve("new app", false);
        assert_eq!(messages(&graph).len(), 1);
    }

    #[test]
    fn unmatched_conflict_is_fine() {
        let fx = Fixture::new();
        fx.pc("new", "2", "Conflicts: old < 1\n").pc("old", "1", "");
        assert!(fx.resolve("old new", false).is_ok());
    }

    #[test]
    fn uninstalled_flag_propagates() {
        let fx = Fixture::new();
        fx.pc("app", "1", "Requires: lib\n").pc("lib-uninstalled", "1", "");
        let graph = fx.resolve("app", false);
        assert!(graph.is_ok());
        assert!(graph.has_uninstalled());
        assert!(!fx.resolve("app", false).requests()[0].package.as_ref().unwrap().uninstalled);
    }
}
