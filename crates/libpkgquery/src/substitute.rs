//! `${name}` variable substitution.
//!
//! A reference is `${name}` whose `$` is not itself preceded by another `$`;
//! the escaped form `$${name}` is copied through unchanged. Replacement text
//! is expanded again, so variables can be built from other variables.
//!
//! Expansion keeps an explicit set of the names currently being expanded.
//! A reference to one of those names is emitted literally instead of being
//! followed, which keeps self-referential and mutually-referential variables
//! from looping.

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};

/// Expand every reference in `text` against `vars`.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use libpkgquery::substitute::substitute;
///
/// let mut vars = HashMap::new();
/// vars.insert("prefix".to_string(), "/usr".to_string());
/// vars.insert("libdir".to_string(), "${prefix}/lib".to_string());
///
/// assert_eq!(substitute("-L${libdir}", &vars).unwrap(), "-L/usr/lib");
/// assert_eq!(substitute("$${libdir}", &vars).unwrap(), "$${libdir}");
/// ```
pub fn substitute(text: &str, vars: &HashMap<String, String>) -> Result<String> {
    substitute_with(text, |name| vars.get(name).cloned())
}

/// Expand every reference in `text`, resolving names through `lookup`.
///
/// Fails with [`Error::UndefinedVariable`] when `lookup` returns `None` for a
/// referenced name that is not already being expanded.
pub fn substitute_with<F>(text: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut expanding = HashSet::new();
    expand(text, &lookup, &mut expanding)
}

fn expand<F>(text: &str, lookup: &F, expanding: &mut HashSet<String>) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;

    for reference in references(text) {
        out.push_str(&text[copied..reference.start]);
        copied = reference.end;

        let literal = &text[reference.start..reference.end];
        if expanding.contains(reference.name) {
            log::trace!("leaving recursive reference {literal} unexpanded");
            out.push_str(literal);
            continue;
        }

        let value = lookup(reference.name).ok_or_else(|| Error::UndefinedVariable {
            variable: reference.name.to_string(),
            context: text.to_string(),
        })?;

        expanding.insert(reference.name.to_string());
        let expanded = expand(&value, lookup, expanding);
        expanding.remove(reference.name);
        out.push_str(&expanded?);
    }

    out.push_str(&text[copied..]);
    Ok(out)
}

/// List the names of every reference in `text`, first to last, duplicates
/// preserved.
///
/// # Examples
///
/// ```
/// use libpkgquery::substitute::get_all_substitutions;
///
/// assert_eq!(
///     get_all_substitutions("${lots} of ${names} ${reffed}."),
///     vec!["lots", "names", "reffed"]
/// );
/// ```
pub fn get_all_substitutions(text: &str) -> Vec<String> {
    references(text).map(|r| r.name.to_string()).collect()
}

struct Reference<'a> {
    name: &'a str,
    start: usize,
    end: usize,
}

/// Iterate over the unescaped, terminated `${...}` references of `text`.
fn references(text: &str) -> impl Iterator<Item = Reference<'_>> {
    let bytes = text.as_bytes();
    let mut pos = 0;

    std::iter::from_fn(move || {
        while let Some(offset) = text[pos..].find("${") {
            let start = pos + offset;
            pos = start + 2;

            if start > 0 && bytes[start - 1] == b'$' {
                continue;
            }

            // An unterminated reference is plain text, and so is the rest.
            let close = text[pos..].find('}')?;
            let name = &text[pos..pos + close];
            let end = pos + close + 1;
            pos = end;
            return Some(Reference { name, start, end });
        }
        None
    })
}
