//! Time intervals with open/closed bounds.
//!
//! An [`Interval`] spans `[low, high]` where either end may be open:
//! `[a, b]` includes both endpoints, `(a, b)` excludes them. Intervals key
//! dynamic attribute values and the graph-wide time index.

use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Characters that force quoting of the value field in the textual interval
/// form.
const SPECIAL_CHARACTERS: &[char] = &[';', ',', '(', ')', '[', ']', '"', '\''];

/// A time interval with independently open or closed bounds.
///
/// `lopen`/`ropen` mark the low/high bound as open (excluded). Equality
/// requires all four fields to match. Ordering is by `low`, then `high`,
/// then bound flags (closed before open), which makes intervals usable as
/// sorted-map keys.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    low: f64,
    high: f64,
    lopen: bool,
    ropen: bool,
}

impl Interval {
    /// The interval covering all of time.
    pub const INFINITY: Self = Self {
        low: f64::NEG_INFINITY,
        high: f64::INFINITY,
        lopen: false,
        ropen: false,
    };

    /// Creates a closed interval `[low, high]`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Parse`] if a bound is NaN or `low > high`.
    pub fn new(low: f64, high: f64) -> Result<Self> {
        Self::with_bounds(low, high, false, false)
    }

    /// Creates an interval with explicit bound openness.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Parse`] if a bound is NaN, `low > high`, or the
    /// interval is a point (`low == high`) with an open bound.
    pub fn with_bounds(low: f64, high: f64, lopen: bool, ropen: bool) -> Result<Self> {
        if low.is_nan() || high.is_nan() {
            return Err(GraphError::Parse("interval bound is NaN".into()));
        }
        if low > high {
            return Err(GraphError::Parse(format!(
                "interval low {low} is greater than high {high}"
            )));
        }
        if low == high && (lopen || ropen) {
            return Err(GraphError::Parse(
                "point interval must be closed on both ends".into(),
            ));
        }
        Ok(Self {
            low,
            high,
            lopen,
            ropen,
        })
    }

    /// The lower bound.
    #[inline]
    #[must_use]
    pub const fn low(&self) -> f64 {
        self.low
    }

    /// The upper bound.
    #[inline]
    #[must_use]
    pub const fn high(&self) -> f64 {
        self.high
    }

    /// `true` if the lower bound is open.
    #[inline]
    #[must_use]
    pub const fn is_low_open(&self) -> bool {
        self.lopen
    }

    /// `true` if the upper bound is open.
    #[inline]
    #[must_use]
    pub const fn is_high_open(&self) -> bool {
        self.ropen
    }

    /// Returns `true` if the timestamp falls inside this interval, honoring
    /// bound openness.
    #[must_use]
    pub fn contains(&self, timestamp: f64) -> bool {
        let above_low = if self.lopen {
            timestamp > self.low
        } else {
            timestamp >= self.low
        };
        let below_high = if self.ropen {
            timestamp < self.high
        } else {
            timestamp <= self.high
        };
        above_low && below_high
    }

    /// Returns `true` if the two intervals share at least one point.
    ///
    /// Touching endpoints only overlap when both touching bounds are closed.
    #[must_use]
    pub fn overlaps(&self, other: &Interval) -> bool {
        if self.low > other.high || other.low > self.high {
            return false;
        }
        if self.low == other.high && (self.lopen || other.ropen) {
            return false;
        }
        if other.low == self.high && (other.lopen || self.ropen) {
            return false;
        }
        true
    }
}

// f64 bounds exclude NaN by construction, so total ordering is sound.
impl Eq for Interval {}

impl PartialOrd for Interval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Interval {
    fn cmp(&self, other: &Self) -> Ordering {
        self.low
            .partial_cmp(&other.low)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.high.partial_cmp(&other.high).unwrap_or(Ordering::Equal))
            .then_with(|| self.lopen.cmp(&other.lopen))
            .then_with(|| self.ropen.cmp(&other.ropen))
    }
}

impl std::hash::Hash for Interval {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.low.to_bits().hash(state);
        self.high.to_bits().hash(state);
        self.lopen.hash(state);
        self.ropen.hash(state);
    }
}

impl fmt::Debug for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}, {}{}",
            if self.lopen { '(' } else { '[' },
            self.low,
            self.high,
            if self.ropen { ')' } else { ']' }
        )
    }
}

/// An interval carrying an attribute value, with the textual form used by
/// dynamic attribute serialization.
///
/// The text form is `[low, high, value]` (or `(...)` for open bounds). The
/// value field is double-quoted when it contains any of `; , ( ) [ ] " '` or
/// is blank; backslash and double quote inside a quoted value are escaped
/// with a backslash.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalWithValue {
    /// The time span.
    pub interval: Interval,
    /// The value held over that span, in textual form.
    pub value: Option<String>,
}

impl IntervalWithValue {
    /// Creates an interval/value pair.
    #[must_use]
    pub fn new(interval: Interval, value: Option<String>) -> Self {
        Self { interval, value }
    }

    /// Parses the textual form, e.g. `[1.0, 2.0, "a, b"]`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Parse`] on malformed input.
    pub fn parse(input: &str) -> Result<Self> {
        let s = input.trim();
        let (lopen, ropen) = match (s.chars().next(), s.chars().last()) {
            (Some('['), Some(']')) => (false, false),
            (Some('['), Some(')')) => (false, true),
            (Some('('), Some(']')) => (true, false),
            (Some('('), Some(')')) => (true, true),
            _ => {
                return Err(GraphError::Parse(format!(
                    "interval must be delimited by brackets or parentheses: {input:?}"
                )))
            }
        };
        let fields = split_fields(&s[1..s.len() - 1])?;
        if fields.len() < 2 || fields.len() > 3 {
            return Err(GraphError::Parse(format!(
                "interval expects 2 or 3 comma-separated fields, got {}",
                fields.len()
            )));
        }
        let low = parse_bound(&fields[0])?;
        let high = parse_bound(&fields[1])?;
        let interval = Interval::with_bounds(low, high, lopen, ropen)?;
        let value = fields.into_iter().nth(2);
        Ok(Self { interval, value })
    }

    fn value_needs_quoting(value: &str) -> bool {
        value.trim().is_empty() || value.contains(SPECIAL_CHARACTERS)
    }
}

impl fmt::Display for IntervalWithValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}, {}",
            if self.interval.lopen { '(' } else { '[' },
            self.interval.low,
            self.interval.high
        )?;
        if let Some(value) = &self.value {
            if Self::value_needs_quoting(value) {
                write!(f, ", \"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))?;
            } else {
                write!(f, ", {value}")?;
            }
        }
        write!(f, "{}", if self.interval.ropen { ')' } else { ']' })
    }
}

fn parse_bound(field: &str) -> Result<f64> {
    match field.trim() {
        "-inf" | "-Infinity" => Ok(f64::NEG_INFINITY),
        "inf" | "Infinity" => Ok(f64::INFINITY),
        other => other
            .parse::<f64>()
            .map_err(|_| GraphError::Parse(format!("invalid interval bound: {other:?}"))),
    }
}

/// Splits the inner field list on commas, honoring quoted values with
/// backslash escapes.
fn split_fields(inner: &str) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = inner.chars().peekable();
    let mut quoted = false;
    let mut was_quoted = false;

    while let Some(c) = chars.next() {
        match c {
            '"' if !quoted => {
                if !current.trim().is_empty() {
                    return Err(GraphError::Parse("quote inside an unquoted value".into()));
                }
                current.clear();
                quoted = true;
                was_quoted = true;
            }
            '"' if quoted => quoted = false,
            '\\' if quoted => match chars.next() {
                Some(escaped @ ('\\' | '"')) => current.push(escaped),
                _ => return Err(GraphError::Parse("dangling escape in quoted value".into())),
            },
            ',' if !quoted => {
                fields.push(finish_field(&mut current, &mut was_quoted));
            }
            // Padding around a closed quoted value is ignored.
            c if was_quoted && !quoted && c.is_whitespace() => {}
            _ => current.push(c),
        }
    }
    if quoted {
        return Err(GraphError::Parse("unterminated quote in interval".into()));
    }
    fields.push(finish_field(&mut current, &mut was_quoted));
    Ok(fields)
}

fn finish_field(current: &mut String, was_quoted: &mut bool) -> String {
    let field = if *was_quoted {
        std::mem::take(current)
    } else {
        std::mem::take(current).trim().to_string()
    };
    *was_quoted = false;
    field
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_contains() {
        let closed = Interval::new(1.0, 3.0).unwrap();
        assert!(closed.contains(1.0));
        assert!(closed.contains(3.0));
        assert!(!closed.contains(3.1));

        let open = Interval::with_bounds(1.0, 3.0, true, true).unwrap();
        assert!(!open.contains(1.0));
        assert!(open.contains(2.0));
        assert!(!open.contains(3.0));
    }

    #[test]
    fn test_interval_overlaps() {
        let a = Interval::new(1.0, 3.0).unwrap();
        let b = Interval::new(3.0, 5.0).unwrap();
        assert!(a.overlaps(&b));

        let c = Interval::with_bounds(3.0, 5.0, true, false).unwrap();
        assert!(!a.overlaps(&c));

        let d = Interval::new(4.0, 6.0).unwrap();
        assert!(!a.overlaps(&d));
        assert!(b.overlaps(&d));
    }

    #[test]
    fn test_interval_rejects_invalid() {
        assert!(Interval::new(3.0, 1.0).is_err());
        assert!(Interval::new(f64::NAN, 1.0).is_err());
        assert!(Interval::with_bounds(1.0, 1.0, true, false).is_err());
        assert!(Interval::with_bounds(1.0, 1.0, false, false).is_ok());
    }

    #[test]
    fn test_interval_ordering() {
        let a = Interval::new(1.0, 2.0).unwrap();
        let b = Interval::new(1.0, 3.0).unwrap();
        let c = Interval::with_bounds(1.0, 3.0, true, false).unwrap();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_display() {
        assert_eq!(Interval::new(1.0, 2.5).unwrap().to_string(), "[1, 2.5]");
        assert_eq!(
            Interval::with_bounds(1.0, 2.0, true, true).unwrap().to_string(),
            "(1, 2)"
        );
    }

    #[test]
    fn test_interval_with_value_round_trip() {
        let cases = [
            "[1, 2]",
            "(1, 2)",
            "[1, 2, 30]",
            "[1, 2, \"a, b\"]",
            "[1, 2, \"say \\\"hi\\\"\"]",
            "[1, 2, \" \"]",
        ];
        for case in cases {
            let parsed = IntervalWithValue::parse(case).unwrap();
            assert_eq!(parsed.to_string(), case, "round trip failed for {case}");
        }
    }

    #[test]
    fn test_parse_quoting() {
        let parsed = IntervalWithValue::parse("[1, 2, \"a, b\"]").unwrap();
        assert_eq!(parsed.value.as_deref(), Some("a, b"));

        let parsed = IntervalWithValue::parse("[1.5, 2.5, plain]").unwrap();
        assert_eq!(parsed.value.as_deref(), Some("plain"));
        assert_eq!(parsed.interval.low(), 1.5);

        let parsed = IntervalWithValue::parse("(0, 1, \"back\\\\slash\")").unwrap();
        assert_eq!(parsed.value.as_deref(), Some("back\\slash"));

        // Padding around a quoted value does not leak into it.
        let parsed = IntervalWithValue::parse("[1, 2,   \"a, b\"  ]").unwrap();
        assert_eq!(parsed.value.as_deref(), Some("a, b"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(IntervalWithValue::parse("1, 2").is_err());
        assert!(IntervalWithValue::parse("[1]").is_err());
        assert!(IntervalWithValue::parse("[1, 2, \"open").is_err());
        assert!(IntervalWithValue::parse("[a, 2]").is_err());
    }

    #[test]
    fn test_infinite_bounds() {
        let parsed = IntervalWithValue::parse("[-Infinity, Infinity]").unwrap();
        assert_eq!(parsed.interval, Interval::INFINITY);
    }
}
