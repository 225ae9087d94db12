//! Version strings and version range expressions.
//!
//! A version string is one to three dot-separated numeric fields,
//! optionally followed by `-<prerelease>` (lowercase alphanumerics and
//! `-`), e.g. `1`, `1.2`, `1.2.3`, `1.2.3-beta1`. The special string
//! `INFINITY` sorts above every version.
//!
//! A range expression follows the OSGI version range syntax:
//!
//! ```text
//! [<left-spec>] <version> [, <version> <right-spec>]
//! ```
//!
//! where `<left-spec>` is `[` (inclusive) or `(` (exclusive), and
//! `<right-spec>` is `]` or `)`. A bare version `v` is shorthand for
//! `[v,INFINITY)`, i.e. "v or anything newer". For example
//! `[1.2.3,4.5.6)` accepts any version `a` with `1.2.3 <= a < 4.5.6`.

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

/// Upper bound marker meaning "no ceiling".
pub const INFINITY: &str = "INFINITY";

const VERSION_SEPARATOR: char = ',';
const NUMBER_SEPARATOR: char = '.';
const PRERELEASE_SEPARATOR: char = '-';

/// Errors produced while parsing or evaluating version ranges.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum VersionError {
    /// An empty string was given where a version range was expected.
    #[error("an empty string is not a valid version range")]
    EmptyExpression,

    /// The expression contains whitespace, which the syntax forbids.
    #[error("whitespace is not permitted in version range '{expression}'")]
    Whitespace {
        /// The offending expression.
        expression: String,
    },

    /// A version string does not match the `x[.y[.z]][-pre]` schema.
    #[error("'{version}' is not a valid version string")]
    InvalidVersion {
        /// The offending version string.
        version: String,
    },

    /// The expression does not begin with `[` or `(`.
    #[error("version range '{expression}' does not begin with an inclusion or exclusion directive")]
    MissingLeftDirective {
        /// The offending expression.
        expression: String,
    },

    /// The expression does not end with `]` or `)`.
    #[error("version range '{expression}' does not end with an inclusion or exclusion directive")]
    MissingRightDirective {
        /// The offending expression.
        expression: String,
    },

    /// The expression does not contain exactly two versions.
    #[error("incorrect number of versions in range '{expression}'")]
    WrongVersionCount {
        /// The offending expression.
        expression: String,
    },

    /// Two ranges have no common versions.
    #[error("version ranges '{left}' and '{right}' do not intersect")]
    NoIntersection {
        /// The first range.
        left: String,
        /// The second range.
        right: String,
    },
}

/// Returns true if the input is a valid version string.
///
/// `INFINITY` is accepted. Fields with leading zeros are accepted and
/// compared numerically.
#[must_use]
pub fn is_version_string(expr: &str) -> bool {
    if expr.is_empty() {
        return false;
    }
    if expr == INFINITY {
        return true;
    }

    let (numbers, prerelease) = match expr.split_once(PRERELEASE_SEPARATOR) {
        Some((n, p)) => (n, p),
        None => (expr, ""),
    };

    let fields: Vec<&str> = numbers.split(NUMBER_SEPARATOR).collect();
    if fields.is_empty() || fields.len() > 3 {
        return false;
    }
    for field in &fields {
        if field.is_empty() || !field.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
    }

    prerelease
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == PRERELEASE_SEPARATOR)
}

/// Normalizes a valid version string to three numeric fields, e.g.
/// `1` becomes `1.0.0` and `1.2-beta` becomes `1.2.0-beta`.
fn normalize(expr: &str) -> String {
    if expr == INFINITY {
        return expr.to_string();
    }

    let (numbers, prerelease) = match expr.split_once(PRERELEASE_SEPARATOR) {
        Some((n, p)) => (n, p),
        None => (expr, ""),
    };

    let mut result = numbers.to_string();
    let field_count = numbers.split(NUMBER_SEPARATOR).count();
    for _ in field_count..3 {
        result.push_str(".0");
    }
    if !prerelease.is_empty() {
        result.push(PRERELEASE_SEPARATOR);
        result.push_str(prerelease);
    }
    result
}

/// Compares two version strings numerically.
///
/// `INFINITY` is greater than every version. When the numeric fields
/// are equal, prerelease tags break the tie lexicographically (and an
/// absent tag sorts before any tag).
///
/// # Errors
///
/// Returns [`VersionError::InvalidVersion`] if either input is not a
/// valid version string.
pub fn compare_versions(v1: &str, v2: &str) -> Result<Ordering, VersionError> {
    if !is_version_string(v1) {
        return Err(VersionError::InvalidVersion {
            version: v1.to_string(),
        });
    }
    if !is_version_string(v2) {
        return Err(VersionError::InvalidVersion {
            version: v2.to_string(),
        });
    }

    if v1 == v2 {
        return Ok(Ordering::Equal);
    }
    if v1 == INFINITY {
        return Ok(Ordering::Greater);
    }
    if v2 == INFINITY {
        return Ok(Ordering::Less);
    }

    let n1 = normalize(v1);
    let n2 = normalize(v2);

    let (fields1, pre1) = match n1.split_once(PRERELEASE_SEPARATOR) {
        Some((n, p)) => (n, p),
        None => (n1.as_str(), ""),
    };
    let (fields2, pre2) = match n2.split_once(PRERELEASE_SEPARATOR) {
        Some((n, p)) => (n, p),
        None => (n2.as_str(), ""),
    };

    for (f1, f2) in fields1
        .split(NUMBER_SEPARATOR)
        .zip(fields2.split(NUMBER_SEPARATOR))
    {
        // Validity was checked above, so the fields are all digits.
        let a: u64 = f1.parse().unwrap_or(0);
        let b: u64 = f2.parse().unwrap_or(0);
        match a.cmp(&b) {
            Ordering::Equal => {},
            other => return Ok(other),
        }
    }

    Ok(pre1.cmp(pre2))
}

/// A parsed version range expression.
///
/// Construct with [`VersionRange::parse`]; test membership with
/// [`VersionRange::includes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    expression: String,
    start: String,
    start_inclusive: bool,
    end: String,
    end_inclusive: bool,
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}

impl VersionRange {
    /// Parses a version range expression.
    ///
    /// A bare version string `v` is accepted as shorthand for
    /// `[v,INFINITY)`.
    ///
    /// # Errors
    ///
    /// Returns a [`VersionError`] describing the first syntax problem
    /// found.
    pub fn parse(expression: &str) -> Result<Self, VersionError> {
        if expression.is_empty() {
            return Err(VersionError::EmptyExpression);
        }
        if expression.contains(char::is_whitespace) {
            return Err(VersionError::Whitespace {
                expression: expression.to_string(),
            });
        }

        let expanded;
        let expr = if is_single_version(expression) {
            if !is_version_string(expression) {
                return Err(VersionError::InvalidVersion {
                    version: expression.to_string(),
                });
            }
            expanded = format!("[{expression},{INFINITY})");
            expanded.as_str()
        } else {
            expression
        };

        let start_inclusive = match expr.as_bytes().first() {
            Some(b'[') => true,
            Some(b'(') => false,
            _ => {
                return Err(VersionError::MissingLeftDirective {
                    expression: expression.to_string(),
                });
            },
        };
        let end_inclusive = match expr.as_bytes().last() {
            Some(b']') => true,
            Some(b')') => false,
            _ => {
                return Err(VersionError::MissingRightDirective {
                    expression: expression.to_string(),
                });
            },
        };

        let inner = &expr[1..expr.len() - 1];
        let mut versions = inner.split(VERSION_SEPARATOR);
        let (start, end) = match (versions.next(), versions.next(), versions.next()) {
            (Some(s), Some(e), None) if !s.is_empty() && !e.is_empty() => (s, e),
            _ => {
                return Err(VersionError::WrongVersionCount {
                    expression: expr.to_string(),
                });
            },
        };

        if !is_version_string(start) {
            return Err(VersionError::InvalidVersion {
                version: start.to_string(),
            });
        }
        if !is_version_string(end) {
            return Err(VersionError::InvalidVersion {
                version: end.to_string(),
            });
        }

        let mut range = Self {
            expression: String::new(),
            start: normalize(start),
            start_inclusive,
            end: normalize(end),
            end_inclusive,
        };
        range.recalc_expression();
        Ok(range)
    }

    /// Returns the canonical form of this range expression.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Returns the normalized start version.
    #[must_use]
    pub fn start_version(&self) -> &str {
        &self.start
    }

    /// Returns the normalized end version, possibly [`INFINITY`].
    #[must_use]
    pub fn end_version(&self) -> &str {
        &self.end
    }

    /// Returns true if the given version falls within this range.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::InvalidVersion`] if `version` is not a
    /// valid version string.
    pub fn includes(&self, version: &str) -> Result<bool, VersionError> {
        if !is_version_string(version) {
            return Err(VersionError::InvalidVersion {
                version: version.to_string(),
            });
        }

        let normalized = normalize(version);

        match compare_versions(&normalized, &self.start)? {
            Ordering::Less => return Ok(false),
            Ordering::Equal => return Ok(self.start_inclusive),
            Ordering::Greater => {},
        }
        if self.end == INFINITY {
            return Ok(true);
        }
        match compare_versions(&normalized, &self.end)? {
            Ordering::Greater => Ok(false),
            Ordering::Equal => Ok(self.end_inclusive),
            Ordering::Less => Ok(true),
        }
    }

    /// Narrows this range to its intersection with `other`.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::NoIntersection`] if the ranges share no
    /// versions.
    pub fn intersect_with(&mut self, other: &Self) -> Result<(), VersionError> {
        match compare_versions(&self.start, &other.start)? {
            Ordering::Equal => {
                if self.start_inclusive != other.start_inclusive {
                    self.start_inclusive = false;
                }
            },
            Ordering::Less => {
                self.start = other.start.clone();
                self.start_inclusive = other.start_inclusive;
            },
            Ordering::Greater => {},
        }

        match compare_versions(&self.end, &other.end)? {
            Ordering::Equal => {
                if self.end_inclusive != other.end_inclusive {
                    self.end_inclusive = false;
                }
            },
            Ordering::Greater => {
                self.end = other.end.clone();
                self.end_inclusive = other.end_inclusive;
            },
            Ordering::Less => {},
        }

        // The narrowed bounds must still describe a non-empty interval.
        if self.end != INFINITY {
            match compare_versions(&self.start, &self.end)? {
                Ordering::Equal => {
                    if !self.start_inclusive || !self.end_inclusive {
                        return Err(VersionError::NoIntersection {
                            left: self.expression.clone(),
                            right: other.expression.clone(),
                        });
                    }
                },
                Ordering::Greater => {
                    return Err(VersionError::NoIntersection {
                        left: self.expression.clone(),
                        right: other.expression.clone(),
                    });
                },
                Ordering::Less => {},
            }
        }

        self.recalc_expression();
        Ok(())
    }

    fn recalc_expression(&mut self) {
        let left = if self.start_inclusive { '[' } else { '(' };
        let right = if self.end_inclusive { ']' } else { ')' };
        self.expression = format!("{left}{},{}{right}", self.start, self.end);
    }
}

/// Returns true if the input looks like a bare version rather than an
/// attempt at a range expression.
fn is_single_version(expr: &str) -> bool {
    !expr.starts_with(['[', '('])
        && !expr.ends_with([']', ')'])
        && !expr.contains(VERSION_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_string_validity() {
        for good in ["1", "1.2", "1.2.3", "0.0.1", "1.1.01", "1.09.0", "1.2.3-beta1", "1-alpha", INFINITY] {
            assert!(is_version_string(good), "{good} should be valid");
        }
        for bad in ["", "a", "1.a", "2.a", "1.2.3.4", "1..2", ".1", "1.", "1.2.3-BETA!", "[1.0.0", "1,2"] {
            assert!(!is_version_string(bad), "{bad} should be invalid");
        }
    }

    #[test]
    fn test_normalize_pads_missing_fields() {
        assert_eq!(normalize("1"), "1.0.0");
        assert_eq!(normalize("1.2"), "1.2.0");
        assert_eq!(normalize("1.2.3"), "1.2.3");
        assert_eq!(normalize("1.2-beta"), "1.2.0-beta");
        assert_eq!(normalize(INFINITY), INFINITY);
    }

    #[test]
    fn test_compare_versions() {
        assert_eq!(compare_versions("1.0.0", "1").unwrap(), Ordering::Equal);
        assert_eq!(compare_versions("1.2.3", "1.2.4").unwrap(), Ordering::Less);
        assert_eq!(compare_versions("2", "1.9.9").unwrap(), Ordering::Greater);
        assert_eq!(compare_versions("1.09.0", "1.9").unwrap(), Ordering::Equal);
        assert_eq!(compare_versions(INFINITY, "999").unwrap(), Ordering::Greater);
        assert_eq!(compare_versions("999", INFINITY).unwrap(), Ordering::Less);
        assert_eq!(
            compare_versions("1.0.0-alpha", "1.0.0-beta").unwrap(),
            Ordering::Less
        );
        assert!(compare_versions("1.a", "1").is_err());
    }

    #[test]
    fn test_parse_inclusive_range() {
        let range = VersionRange::parse("[1,2]").unwrap();
        assert_eq!(range.expression(), "[1.0.0,2.0.0]");
        for v in ["1", "2", "1.0", "2.0", "1.0.0", "2.0.0", "1.1", "1.9", "1.0.1", "1.1.1", "1.1.01", "1.09.0"] {
            assert!(range.includes(v).unwrap(), "{v} should be in [1,2]");
        }
        for v in ["2.1", "2.01", "0.9.9"] {
            assert!(!range.includes(v).unwrap(), "{v} should not be in [1,2]");
        }
        assert!(range.includes("1.a").is_err());
        assert!(range.includes("").is_err());
    }

    #[test]
    fn test_parse_half_open_range() {
        let range = VersionRange::parse("[1,2)").unwrap();
        for v in ["1", "1.0", "1.0.0", "1.1", "1.9", "1.0.1", "1.1.1", "1.01.90-z", "1.1.1-custom-tag"] {
            assert!(range.includes(v).unwrap(), "{v} should be in [1,2)");
        }
        for v in ["2", "2.0", "2.0.0", "2.1", "2.1-a", "0.0.1-beta"] {
            assert!(!range.includes(v).unwrap(), "{v} should not be in [1,2)");
        }
    }

    #[test]
    fn test_exclusive_start() {
        let range = VersionRange::parse("(1.0.0,2.0.0]").unwrap();
        assert!(!range.includes("1.0.0").unwrap());
        assert!(range.includes("1.0.1").unwrap());
        assert!(range.includes("2.0.0").unwrap());

        // Boundary equality is numeric, not textual.
        let range = VersionRange::parse("(1.1,2]").unwrap();
        assert!(!range.includes("1.01").unwrap());
    }

    #[test]
    fn test_single_version_shorthand() {
        let range = VersionRange::parse("1.2.3").unwrap();
        assert_eq!(range.expression(), "[1.2.3,INFINITY)");
        assert!(range.includes("1.2.3").unwrap());
        assert!(range.includes("904.4175.1").unwrap());
        assert!(!range.includes("1.2.2").unwrap());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(VersionRange::parse(""), Err(VersionError::EmptyExpression));
        assert!(matches!(
            VersionRange::parse("[1.0.0, 2.0.0]"),
            Err(VersionError::Whitespace { .. })
        ));
        assert!(matches!(
            VersionRange::parse("1.0.0,2.0.0]"),
            Err(VersionError::MissingLeftDirective { .. })
        ));
        assert!(matches!(
            VersionRange::parse("[1.0.0,2.0.0"),
            Err(VersionError::MissingRightDirective { .. })
        ));
        assert!(matches!(
            VersionRange::parse("[1.0.0]"),
            Err(VersionError::WrongVersionCount { .. })
        ));
        assert!(matches!(
            VersionRange::parse("[1.0.0,2.0.0,3.0.0]"),
            Err(VersionError::WrongVersionCount { .. })
        ));
        assert!(matches!(
            VersionRange::parse("[1.a,2.0.0]"),
            Err(VersionError::InvalidVersion { .. })
        ));
        assert!(matches!(
            VersionRange::parse("abc"),
            Err(VersionError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn test_intersection_narrows_both_ends() {
        let mut a = VersionRange::parse("[1,4]").unwrap();
        let b = VersionRange::parse("(2,3)").unwrap();
        a.intersect_with(&b).unwrap();
        assert_eq!(a.expression(), "(2.0.0,3.0.0)");

        let mut c = VersionRange::parse("1.0.0").unwrap();
        let d = VersionRange::parse("[0.5,2.5]").unwrap();
        c.intersect_with(&d).unwrap();
        assert_eq!(c.expression(), "[1.0.0,2.5.0]");
    }

    #[test]
    fn test_intersection_empty_is_error() {
        let mut a = VersionRange::parse("[1,2]").unwrap();
        let b = VersionRange::parse("[3,4]").unwrap();
        assert!(matches!(
            a.intersect_with(&b),
            Err(VersionError::NoIntersection { .. })
        ));

        let mut c = VersionRange::parse("[1,2)").unwrap();
        let d = VersionRange::parse("[2,4]").unwrap();
        assert!(matches!(
            c.intersect_with(&d),
            Err(VersionError::NoIntersection { .. })
        ));
    }
}
