//! Edge case tests for the `pkgquery` binary.
//!
//! These exercise boundary conditions that might trip up the parser,
//! substitution, or the resolver, using throwaway `.pc` files:
//!
//! - Empty and minimal files
//! - Malformed lines and missing fields
//! - DOS line endings and missing trailing newlines
//! - Self-referential and mutually recursive variables
//! - Deep and wide dependency graphs
//! - Constraint checks on shared dependencies
//! - Whitespace in flag fields
//! - Path separator normalisation

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Build a Command for `pkgquery` searching only `dir`.
fn pkgquery_in(dir: &TempDir) -> Command {
    let path = dir.path().to_str().unwrap();
    let mut cmd = Command::cargo_bin("pkgquery").unwrap();
    cmd.env("PKG_CONFIG_PATH", path);
    cmd.env("PKG_CONFIG_LIBDIR", path);
    for var in [
        "PKG_CONFIG_SYSROOT_DIR",
        "PKG_CONFIG_TOP_BUILD_DIR",
        "PKG_CONFIG_ALLOW_SYSTEM_CFLAGS",
        "PKG_CONFIG_ALLOW_SYSTEM_LIBS",
        "PKG_CONFIG_DISABLE_UNINSTALLED",
        "PKG_CONFIG_DEBUG_SPEW",
        "C_INCLUDE_PATH",
        "CPLUS_INCLUDE_PATH",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Write `{name}.pc` into `dir`.
fn write_pc(dir: &TempDir, name: &str, content: &str) {
    fs::write(dir.path().join(format!("{name}.pc")), content).unwrap();
}

// ============================================================================
// Empty and minimal files
// ============================================================================

mod minimal_files {
    use super::*;

    #[test]
    fn empty_file_is_missing_name() {
        let dir = TempDir::new().unwrap();
        write_pc(&dir, "empty", "");
        pkgquery_in(&dir)
            .args(["--modversion", "empty"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("has no Name: field"));
    }

    #[test]
    fn name_and_version_are_enough() {
        let dir = TempDir::new().unwrap();
        write_pc(&dir, "tiny", "Name: tiny\nVersion: 0.1\n");
        pkgquery_in(&dir)
            .args(["--cflags", "--libs", "tiny"])
            .assert()
            .success()
            .stdout("\n");
    }

    #[test]
    fn missing_version() {
        let dir = TempDir::new().unwrap();
        write_pc(&dir, "nover", "Name: nover\nLibs: -lnover\n");
        pkgquery_in(&dir)
            .args(["--libs", "nover"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("has no Version: field"));
    }

    #[test]
    fn only_variables() {
        let dir = TempDir::new().unwrap();
        write_pc(&dir, "vars-only", "prefix=/usr\nlibdir=${prefix}/lib\n");
        pkgquery_in(&dir)
            .args(["--exists", "vars-only"])
            .assert()
            .failure();
    }

    #[test]
    fn empty_version_field() {
        let dir = TempDir::new().unwrap();
        write_pc(&dir, "blank", "Name: blank\nVersion:\n");
        pkgquery_in(&dir)
            .args(["--modversion", "blank"])
            .assert()
            .success()
            .stdout("\n");
    }
}

// ============================================================================
// Line handling
// ============================================================================

mod lines {
    use super::*;

    #[test]
    fn dos_line_endings() {
        let dir = TempDir::new().unwrap();
        write_pc(
            &dir,
            "dos",
            "prefix=/opt/dos\r\nName: dos\r\nVersion: 1.0\r\nLibs: -L${prefix}/lib -ldos\r\n",
        );
        pkgquery_in(&dir)
            .args(["--libs", "dos"])
            .assert()
            .success()
            .stdout("-L/opt/dos/lib -ldos\n");
    }

    #[test]
    fn no_trailing_newline() {
        let dir = TempDir::new().unwrap();
        write_pc(&dir, "nonl", "Name: nonl\nVersion: 2.0");
        pkgquery_in(&dir)
            .args(["--modversion", "nonl"])
            .assert()
            .success()
            .stdout("2.0\n");
    }

    #[test]
    fn latin1_description_still_loads() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("cafe.pc"),
            b"Name: cafe\nDescription: caf\xe9\nVersion: 1.0\nLibs: -lcafe\n",
        )
        .unwrap();
        pkgquery_in(&dir)
            .args(["--libs", "cafe"])
            .assert()
            .success()
            .stdout("-lcafe\n");
    }

    #[test]
    fn malformed_line_names_file_and_line() {
        let dir = TempDir::new().unwrap();
        write_pc(&dir, "bad", "Name: bad\nVersion: 1\n!!!\n");
        pkgquery_in(&dir)
            .args(["--modversion", "bad"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Malformed metadata"))
            .stderr(predicate::str::contains("bad.pc' line 3"));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let dir = TempDir::new().unwrap();
        write_pc(
            &dir,
            "extra",
            "Name: extra\nVersion: 1\nLicense: MIT\nX-Custom: whatever\nLibs: -lextra\n",
        );
        pkgquery_in(&dir)
            .args(["--libs", "extra"])
            .assert()
            .success()
            .stdout("-lextra\n");
    }

    #[test]
    fn duplicate_field_keeps_first() {
        let dir = TempDir::new().unwrap();
        write_pc(&dir, "dup", "Name: dup\nVersion: 1\nVersion: 2\n");
        pkgquery_in(&dir)
            .args(["--modversion", "dup"])
            .assert()
            .success()
            .stdout("1\n");
    }

    #[test]
    fn duplicate_variable_is_an_error() {
        let dir = TempDir::new().unwrap();
        write_pc(&dir, "dupvar", "a=1\na=2\nName: dupvar\nVersion: 1\n");
        pkgquery_in(&dir)
            .args(["--exists", "--print-errors", "dupvar"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("duplicate definition of variable 'a'"));
    }

    #[test]
    fn whitespace_in_flags() {
        let dir = TempDir::new().unwrap();
        write_pc(
            &dir,
            "spaces",
            "Name: spaces\nVersion: 1\nCflags:    -DA   \t-DB  \nLibs:\t-lspaces\n",
        );
        pkgquery_in(&dir)
            .args(["--cflags", "--libs", "spaces"])
            .assert()
            .success()
            .stdout("-DA -DB -lspaces\n");
    }
}

// ============================================================================
// Variable substitution
// ============================================================================

mod substitution {
    use super::*;

    #[test]
    fn self_reference_terminates() {
        let dir = TempDir::new().unwrap();
        write_pc(&dir, "selfref", "x=${x}/more\nName: selfref\nVersion: 1\nCflags: -I${x}\n");
        pkgquery_in(&dir)
            .args(["--cflags", "selfref"])
            .assert()
            .success()
            .stdout("-I${x}/more\n");
    }

    #[test]
    fn mutual_recursion_terminates() {
        let dir = TempDir::new().unwrap();
        write_pc(
            &dir,
            "mutual",
            "a=${b}\nb=${a}\nName: mutual\nVersion: 1\n",
        );
        pkgquery_in(&dir)
            .args(["--variable", "a", "mutual"])
            .assert()
            .success()
            .stdout("${a}\n");
    }

    #[test]
    fn undefined_reference_in_field() {
        let dir = TempDir::new().unwrap();
        write_pc(&dir, "undef", "Name: undef\nVersion: 1\nLibs: -L${libdir}\n");
        pkgquery_in(&dir)
            .args(["--libs", "undef"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Variable 'libdir' not defined"));
    }

    #[test]
    fn variable_defined_after_use() {
        let dir = TempDir::new().unwrap();
        write_pc(
            &dir,
            "late",
            "libdir=${prefix}/lib\nprefix=/late\nName: late\nVersion: 1\nLibs: -L${libdir}\n",
        );
        pkgquery_in(&dir)
            .args(["--libs", "late"])
            .assert()
            .success()
            .stdout("-L/late/lib\n");
    }

    #[test]
    fn unterminated_reference_is_literal() {
        let dir = TempDir::new().unwrap();
        write_pc(&dir, "open", "Name: open\nVersion: 1\nCflags: -DX=${oops\n");
        pkgquery_in(&dir)
            .args(["--cflags", "open"])
            .assert()
            .success()
            .stdout("-DX=${oops\n");
    }

    #[test]
    fn version_may_use_variables() {
        let dir = TempDir::new().unwrap();
        write_pc(&dir, "vv", "major=3\nName: vv\nVersion: ${major}.1\n");
        pkgquery_in(&dir)
            .args(["--modversion", "vv"])
            .assert()
            .success()
            .stdout("3.1\n");
        pkgquery_in(&dir)
            .args(["--atleast-version", "3.0.9", "vv"])
            .assert()
            .success();
    }
}

// ============================================================================
// Dependency graph shapes
// ============================================================================

mod graphs {
    use super::*;

    #[test]
    fn deep_chain() {
        let dir = TempDir::new().unwrap();
        let depth = 200;
        for i in 0..depth {
            let requires = if i + 1 < depth {
                format!("Requires: link{}\n", i + 1)
            } else {
                String::new()
            };
            write_pc(
                &dir,
                &format!("link{i}"),
                &format!("Name: link{i}\nVersion: 1\n{requires}Libs: -llink{i}\n"),
            );
        }
        let output = pkgquery_in(&dir).args(["--libs", "link0"]).output().unwrap();
        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout).unwrap();
        let tokens: Vec<&str> = stdout.split_whitespace().collect();
        assert_eq!(tokens.len(), depth);
        assert_eq!(tokens[0], "-llink0");
        assert_eq!(tokens[depth - 1], format!("-llink{}", depth - 1));
    }

    #[test]
    fn wide_fan_out_keeps_declaration_order() {
        let dir = TempDir::new().unwrap();
        let names: Vec<String> = (0..50).map(|i| format!("leaf{i:02}")).collect();
        for name in &names {
            write_pc(&dir, name, &format!("Name: {name}\nVersion: 1\nLibs: -l{name}\n"));
        }
        let reversed: Vec<&str> = names.iter().rev().map(String::as_str).collect();
        write_pc(
            &dir,
            "hub",
            &format!("Name: hub\nVersion: 1\nRequires: {}\n", reversed.join(", ")),
        );
        let expected: Vec<String> = reversed.iter().map(|n| format!("-l{n}")).collect();
        pkgquery_in(&dir)
            .args(["--libs", "hub"])
            .assert()
            .success()
            .stdout(format!("{}\n", expected.join(" ")));
    }

    #[test]
    fn diamond_with_unmet_constraint() {
        let dir = TempDir::new().unwrap();
        write_pc(&dir, "top", "Name: top\nVersion: 1\nRequires: left right\n");
        write_pc(&dir, "left", "Name: left\nVersion: 1\nRequires: base\n");
        write_pc(&dir, "right", "Name: right\nVersion: 1\nRequires: base > 1.5\n");
        write_pc(&dir, "base", "Name: base\nVersion: 1.5\n");
        pkgquery_in(&dir)
            .args(["--libs", "top"])
            .assert()
            .failure()
            .stderr("Package 'right' requires 'base > 1.5' but version of base is 1.5\n");
    }

    #[test]
    fn self_requirement() {
        let dir = TempDir::new().unwrap();
        write_pc(&dir, "ouroboros", "Name: ouroboros\nVersion: 1\nRequires: ouroboros\nLibs: -lo\n");
        pkgquery_in(&dir)
            .args(["--libs", "ouroboros"])
            .assert()
            .success()
            .stdout("-lo\n");
    }

    #[test]
    fn invalid_requires_field() {
        let dir = TempDir::new().unwrap();
        write_pc(&dir, "badreq", "Name: badreq\nVersion: 1\nRequires: >= 1.0\n");
        pkgquery_in(&dir)
            .args(["--libs", "badreq"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("line 3"));
    }

    #[test]
    fn text_versions_sort_after_numbers() {
        let dir = TempDir::new().unwrap();
        write_pc(&dir, "svn", "Name: svn\nVersion: 5.0-svn\n");
        pkgquery_in(&dir)
            .args(["--exists", "svn > 5.0"])
            .assert()
            .success();
        pkgquery_in(&dir)
            .args(["--exists", "svn >= 5.0.1"])
            .assert()
            .success();
    }
}

// ============================================================================
// Command-line package lists
// ============================================================================

mod package_lists {
    use super::*;

    #[test]
    fn comma_separated() {
        let dir = TempDir::new().unwrap();
        write_pc(&dir, "a", "Name: a\nVersion: 1\nLibs: -la\n");
        write_pc(&dir, "b", "Name: b\nVersion: 2\nLibs: -lb\n");
        pkgquery_in(&dir)
            .args(["--libs", "a,b"])
            .assert()
            .success()
            .stdout("-la -lb\n");
    }

    #[test]
    fn double_equals_operator() {
        let dir = TempDir::new().unwrap();
        write_pc(&dir, "a", "Name: a\nVersion: 1.0\n");
        pkgquery_in(&dir)
            .args(["--exists", "a == 1"])
            .assert()
            .success();
    }

    #[test]
    fn dangling_operator() {
        let dir = TempDir::new().unwrap();
        write_pc(&dir, "a", "Name: a\nVersion: 1.0\n");
        pkgquery_in(&dir)
            .args(["--exists", "a", ">="])
            .assert()
            .failure()
            .stderr("");
        pkgquery_in(&dir)
            .args(["--exists", "--print-errors", "a", ">="])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid dependency list 'a >='"));
        pkgquery_in(&dir)
            .args(["--modversion", "a", ">="])
            .assert()
            .failure()
            .stderr(predicate::str::contains("has no version"));
    }
}

// ============================================================================
// Path separators
// ============================================================================

#[cfg(unix)]
mod path_separators {
    use super::*;

    fn mixed_separators(dir: &TempDir) {
        write_pc(
            dir,
            "mixed",
            "Name: mixed\nVersion: 1\nCflags: -I/opt/m/include -I\\opt\\m\\include -DP=a\\b\n\
             Libs: -L\\opt\\m\\lib -lm\n",
        );
    }

    #[test]
    fn kept_verbatim_by_default() {
        let dir = TempDir::new().unwrap();
        mixed_separators(&dir);
        pkgquery_in(&dir)
            .args(["--cflags", "--libs", "mixed"])
            .assert()
            .success()
            .stdout("-I/opt/m/include -I\\opt\\m\\include -DP=a\\b -L\\opt\\m\\lib -lm\n");
    }

    #[test]
    fn normalised_paths_merge() {
        let dir = TempDir::new().unwrap();
        mixed_separators(&dir);
        pkgquery_in(&dir)
            .args(["--normalise-paths", "--cflags", "--libs", "mixed"])
            .assert()
            .success()
            .stdout("-I/opt/m/include -DP=a\\b -L/opt/m/lib -lm\n");
    }
}
