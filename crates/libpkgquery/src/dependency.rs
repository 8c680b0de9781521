//! Dependency specifications such as `glib-2.0 >= 2.50, zlib`.
//!
//! A specification list is split on commas and whitespace. Operator
//! characters (`<`, `>`, `=`, `!`) always form tokens of their own, so
//! `blerg>=5-svn` reads the same as `blerg >= 5-svn`.

use std::fmt;

use crate::error::{Error, Result};
use crate::version::{Comparator, Version, is_operator_char};

/// A single `name [op version]` requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// The package id being required.
    pub name: String,
    /// The constraint operator; [`Comparator::AlwaysMatch`] when unconstrained.
    pub comparator: Comparator,
    /// The version operand; empty when unconstrained.
    pub version: Version,
}

impl Dependency {
    /// A requirement on any version of `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comparator: Comparator::AlwaysMatch,
            version: Version::default(),
        }
    }

    /// A requirement on `name` constrained by `comparator version`.
    pub fn with_constraint(name: impl Into<String>, comparator: Comparator, version: &str) -> Self {
        Self {
            name: name.into(),
            comparator,
            version: Version::parse(version),
        }
    }

    /// Whether `found` satisfies this requirement's constraint.
    pub fn is_satisfied_by(&self, found: &Version) -> bool {
        self.comparator.eval(found, &self.version)
    }

    /// Whether this requirement carries a version constraint.
    pub fn is_constrained(&self) -> bool {
        self.comparator != Comparator::AlwaysMatch
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_constrained() {
            write!(f, "{} {} {}", self.name, self.comparator, self.version)
        } else {
            f.write_str(&self.name)
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Word(&'a str),
    Operator(&'a str),
}

fn is_separator(c: char) -> bool {
    c == ',' || c.is_whitespace()
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start: Option<(usize, bool)> = None;

    for (i, c) in text.char_indices() {
        let op = is_operator_char(c);
        match start {
            Some((s, was_op)) if is_separator(c) || was_op != op => {
                tokens.push(make_token(&text[s..i], was_op));
                start = (!is_separator(c)).then_some((i, op));
            }
            Some(_) => {}
            None if !is_separator(c) => start = Some((i, op)),
            None => {}
        }
    }
    if let Some((s, was_op)) = start {
        tokens.push(make_token(&text[s..], was_op));
    }
    tokens
}

fn make_token(s: &str, op: bool) -> Token<'_> {
    if op { Token::Operator(s) } else { Token::Word(s) }
}

/// Parse a dependency list into its clauses, in declaration order.
///
/// # Examples
///
/// ```
/// use libpkgquery::dependency::parse_package_spec_list;
///
/// let deps = parse_package_spec_list("blag < 2.3, blerg>=5-svn blork, bleck = 15").unwrap();
/// let rendered: Vec<String> = deps.iter().map(|d| d.to_string()).collect();
/// assert_eq!(rendered, ["blag < 2.3", "blerg >= 5-svn", "blork", "bleck = 15"]);
/// ```
pub fn parse_package_spec_list(text: &str) -> Result<Vec<Dependency>> {
    let invalid = |message: String| Error::InvalidDependency {
        spec: text.to_string(),
        message,
    };

    let mut deps = Vec::new();
    let mut tokens = tokenize(text).into_iter().peekable();

    while let Some(token) = tokens.next() {
        let name = match token {
            Token::Word(name) => name,
            Token::Operator(op) => {
                return Err(invalid(format!("expected a package name before '{op}'")));
            }
        };

        let Some(&Token::Operator(op)) = tokens.peek() else {
            deps.push(Dependency::new(name));
            continue;
        };
        tokens.next();

        let comparator = Comparator::from_operator(op)
            .ok_or_else(|| invalid(format!("unknown version operator '{op}'")))?;
        match tokens.next() {
            Some(Token::Word(version)) => {
                deps.push(Dependency::with_constraint(name, comparator, version));
            }
            _ => {
                return Err(invalid(format!(
                    "version operator '{op}' after '{name}' has no version"
                )));
            }
        }
    }

    Ok(deps)
}
