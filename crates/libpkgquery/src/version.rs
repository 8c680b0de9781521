//! Version parsing and ordering.
//!
//! A version string is scanned left to right into a sequence of components:
//! each maximal run of ASCII digits becomes a [`Component::Numeric`], each
//! maximal run of alphabetic characters becomes a [`Component::Text`], and
//! everything else (`.`, `-`, `_`, `+`, whitespace, punctuation) only
//! separates components.
//!
//! Two versions are compared component by component:
//! - Numeric components compare as integers, text components by code point.
//! - A numeric component sorts before a text component at the same position.
//! - When one side runs out, a trailing `0` on the other side counts as equal
//!   to the missing component; any other trailing component makes its side
//!   the greater one.
//!
//! The result is a total order, so [`Version`] implements [`Ord`] and
//! `"2.3"` equals `"2.3.0"`.

use std::cmp::Ordering;
use std::fmt;

/// One component of a parsed version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Component {
    /// A run of decimal digits, stored without leading zeros (`"0"` for zero).
    ///
    /// Keeping the digits as text means arbitrarily long runs never overflow.
    Numeric(String),
    /// A run of alphabetic characters.
    Text(String),
}

impl Component {
    fn numeric(digits: &str) -> Self {
        let trimmed = digits.trim_start_matches('0');
        if trimmed.is_empty() {
            Component::Numeric("0".to_string())
        } else {
            Component::Numeric(trimmed.to_string())
        }
    }

    /// Whether this is the numeric component zero.
    pub fn is_zero(&self) -> bool {
        matches!(self, Component::Numeric(digits) if digits == "0")
    }
}

impl Ord for Component {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            // Without leading zeros, a longer digit run is a larger number.
            (Component::Numeric(a), Component::Numeric(b)) => {
                a.len().cmp(&b.len()).then_with(|| a.cmp(b))
            }
            (Component::Text(a), Component::Text(b)) => a.cmp(b),
            (Component::Numeric(_), Component::Text(_)) => Ordering::Less,
            (Component::Text(_), Component::Numeric(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Component {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Numeric(digits) => f.write_str(digits),
            Component::Text(text) => f.write_str(text),
        }
    }
}

/// A parsed version string.
///
/// The original text is kept for display; equality and ordering only look at
/// the components.
///
/// # Examples
///
/// ```
/// use libpkgquery::version::Version;
///
/// assert_eq!(Version::parse("2.3"), Version::parse("2.3.0"));
/// assert!(Version::parse("2.3") < Version::parse("2.3-a"));
/// assert!(Version::parse("5.0-svn") > Version::parse("2.3"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Version {
    text: String,
    components: Vec<Component>,
}

impl Version {
    /// Parse a version string. Never fails; an empty string yields the empty
    /// version.
    pub fn parse(text: &str) -> Self {
        let mut components = Vec::new();
        let mut chars = text.char_indices().peekable();

        while let Some(&(start, c)) = chars.peek() {
            if c.is_ascii_digit() {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    end = i + d.len_utf8();
                    chars.next();
                }
                components.push(Component::numeric(&text[start..end]));
            } else if c.is_alphabetic() {
                let mut end = start;
                while let Some(&(i, a)) = chars.peek() {
                    if !a.is_alphabetic() {
                        break;
                    }
                    end = i + a.len_utf8();
                    chars.next();
                }
                components.push(Component::Text(text[start..end].to_string()));
            } else {
                chars.next();
            }
        }

        Self {
            text: text.to_string(),
            components,
        }
    }

    /// The text this version was parsed from.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The parsed components.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Whether this is the empty "no constraint" version.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for i in 0..len {
            match (self.components.get(i), other.components.get(i)) {
                (Some(a), Some(b)) => match a.cmp(b) {
                    Ordering::Equal => continue,
                    decided => return decided,
                },
                (Some(extra), None) => {
                    if !extra.is_zero() {
                        return Ordering::Greater;
                    }
                }
                (None, Some(extra)) => {
                    if !extra.is_zero() {
                        return Ordering::Less;
                    }
                }
                (None, None) => break,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for Version {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

/// Compare two version strings.
///
/// # Examples
///
/// ```
/// use std::cmp::Ordering;
/// use libpkgquery::version::compare;
///
/// assert_eq!(compare("1.2.3.4.a.6", "2.3"), Ordering::Less);
/// assert_eq!(compare("2.3", "2.3.0"), Ordering::Equal);
/// ```
pub fn compare(a: &str, b: &str) -> Ordering {
    Version::parse(a).cmp(&Version::parse(b))
}

/// Version constraint operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Comparator {
    /// No constraint; any installed version satisfies it.
    #[default]
    AlwaysMatch,
    /// `<`
    LessThan,
    /// `<=`
    LessThanEqual,
    /// `=`
    Equal,
    /// `!=`
    NotEqual,
    /// `>=`
    GreaterThanEqual,
    /// `>`
    GreaterThan,
}

impl Comparator {
    /// Recognize an operator token. `==` is accepted as a spelling of `=`.
    pub fn from_operator(op: &str) -> Option<Self> {
        match op {
            "<" => Some(Self::LessThan),
            "<=" => Some(Self::LessThanEqual),
            "=" | "==" => Some(Self::Equal),
            "!=" => Some(Self::NotEqual),
            ">=" => Some(Self::GreaterThanEqual),
            ">" => Some(Self::GreaterThan),
            _ => None,
        }
    }

    /// The operator as written in a dependency list.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AlwaysMatch => "(any)",
            Self::LessThan => "<",
            Self::LessThanEqual => "<=",
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::GreaterThanEqual => ">=",
            Self::GreaterThan => ">",
        }
    }

    /// Evaluate `found <op> target`.
    pub fn eval(self, found: &Version, target: &Version) -> bool {
        match self {
            Self::AlwaysMatch => true,
            Self::LessThan => found < target,
            Self::LessThanEqual => found <= target,
            Self::Equal => found == target,
            Self::NotEqual => found != target,
            Self::GreaterThanEqual => found >= target,
            Self::GreaterThan => found > target,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check whether a character may appear in an operator token.
pub fn is_operator_char(c: char) -> bool {
    matches!(c, '<' | '>' | '!' | '=')
}
