//! Attribute values and the attribute type catalog.
//!
//! [`AttributeValue`] is the dynamic type stored in element attribute arrays
//! and column indices. [`AttributeType`] is the closed catalog of types a
//! column can declare. [`HashableValue`] wraps a value with total equality
//! and hashing so it can key maps (user-id tables, equality indices).

use crate::error::{GraphError, Result};
use arcstr::ArcStr;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::interval::Interval;
use super::time::{IntervalMap, IntervalSet, TimestampMap, TimestampSet};

/// The catalog of attribute types a column can declare.
///
/// The first block are static scalar types; `List` stands in for array
/// values with structural equality; the `Timestamp*`/`Interval*` types are
/// the dynamic (time-indexed) representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeType {
    /// `bool`
    Boolean,
    /// `i8`
    Byte,
    /// `i16`
    Short,
    /// `i32`
    Integer,
    /// `i64`
    Long,
    /// `f32`
    Float,
    /// `f64`
    Double,
    /// `char`
    Char,
    /// UTF-8 string
    String,
    /// Array of values with structural equality
    List,
    /// Timestamp-keyed dynamic values
    TimestampMap,
    /// Interval-keyed dynamic values
    IntervalMap,
    /// Set of timestamps (element existence)
    TimestampSet,
    /// Set of intervals (element existence)
    IntervalSet,
}

impl AttributeType {
    /// `true` for the fixed-width numeric types, which get sorted indices.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Byte | Self::Short | Self::Integer | Self::Long | Self::Float | Self::Double
        )
    }

    /// `true` for time-indexed value types.
    #[must_use]
    pub const fn is_dynamic(self) -> bool {
        matches!(
            self,
            Self::TimestampMap | Self::IntervalMap | Self::TimestampSet | Self::IntervalSet
        )
    }

    /// `true` if an index over this type supports ordered min/max queries.
    #[must_use]
    pub const fn is_sortable(self) -> bool {
        self.is_numeric()
    }

    /// `true` for types usable as node/edge user ids.
    #[must_use]
    pub const fn is_id_type(self) -> bool {
        !self.is_dynamic() && !matches!(self, Self::List)
    }

    /// Checks whether a value can be stored in a column of this type.
    /// `Null` is assignable to every type.
    #[must_use]
    pub fn is_assignable(self, value: &AttributeValue) -> bool {
        value.is_null() || value.attribute_type() == self
    }

    /// Parses a value of this type from its plain textual form.
    ///
    /// Only the static scalar types are parsable; timestamps are plain
    /// doubles (calendar parsing is an external collaborator).
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Parse`] for malformed input or a non-parsable
    /// type.
    pub fn parse(self, input: &str) -> Result<AttributeValue> {
        let s = input.trim();
        let fail = || GraphError::Parse(format!("cannot parse {s:?} as {self}"));
        match self {
            Self::Boolean => s.parse::<bool>().map(AttributeValue::Boolean).map_err(|_| fail()),
            Self::Byte => s.parse::<i8>().map(AttributeValue::Byte).map_err(|_| fail()),
            Self::Short => s.parse::<i16>().map(AttributeValue::Short).map_err(|_| fail()),
            Self::Integer => s.parse::<i32>().map(AttributeValue::Integer).map_err(|_| fail()),
            Self::Long => s.parse::<i64>().map(AttributeValue::Long).map_err(|_| fail()),
            Self::Float => s.parse::<f32>().map(AttributeValue::Float).map_err(|_| fail()),
            Self::Double => s.parse::<f64>().map(AttributeValue::Double).map_err(|_| fail()),
            Self::Char => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(AttributeValue::Char(c)),
                    _ => Err(fail()),
                }
            }
            Self::String => Ok(AttributeValue::String(ArcStr::from(s))),
            _ => Err(GraphError::Parse(format!("{self} has no textual form"))),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Boolean => "BOOLEAN",
            Self::Byte => "BYTE",
            Self::Short => "SHORT",
            Self::Integer => "INTEGER",
            Self::Long => "LONG",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Char => "CHAR",
            Self::String => "STRING",
            Self::List => "LIST",
            Self::TimestampMap => "TIMESTAMP_MAP",
            Self::IntervalMap => "INTERVAL_MAP",
            Self::TimestampSet => "TIMESTAMP_SET",
            Self::IntervalSet => "INTERVAL_SET",
        };
        write!(f, "{name}")
    }
}

/// A dynamically-typed attribute value.
///
/// Strings use `ArcStr` and lists use `Arc` slices, so cloning a value into
/// an index is cheap. Dynamic containers are `Arc`-shared and copy-on-write
/// through `Arc::make_mut` on mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// Missing value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 8-bit signed integer
    Byte(i8),
    /// 16-bit signed integer
    Short(i16),
    /// 32-bit signed integer
    Integer(i32),
    /// 64-bit signed integer
    Long(i64),
    /// 32-bit float
    Float(f32),
    /// 64-bit float
    Double(f64),
    /// Single character
    Char(char),
    /// UTF-8 string
    String(ArcStr),
    /// Array value with structural equality
    List(Arc<[AttributeValue]>),
    /// Timestamp-keyed dynamic values
    TimestampMap(Arc<TimestampMap>),
    /// Interval-keyed dynamic values
    IntervalMap(Arc<IntervalMap>),
    /// Set of timestamps
    TimestampSet(Arc<TimestampSet>),
    /// Set of intervals
    IntervalSet(Arc<IntervalSet>),
}

impl AttributeValue {
    /// Returns `true` if this value is null.
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The catalog type of this value. `Null` carries no type of its own and
    /// reports [`AttributeType::String`]; callers that care should check
    /// [`is_null`](Self::is_null) first ([`AttributeType::is_assignable`]
    /// already does).
    #[must_use]
    pub fn attribute_type(&self) -> AttributeType {
        match self {
            Self::Null | Self::String(_) => AttributeType::String,
            Self::Boolean(_) => AttributeType::Boolean,
            Self::Byte(_) => AttributeType::Byte,
            Self::Short(_) => AttributeType::Short,
            Self::Integer(_) => AttributeType::Integer,
            Self::Long(_) => AttributeType::Long,
            Self::Float(_) => AttributeType::Float,
            Self::Double(_) => AttributeType::Double,
            Self::Char(_) => AttributeType::Char,
            Self::List(_) => AttributeType::List,
            Self::TimestampMap(_) => AttributeType::TimestampMap,
            Self::IntervalMap(_) => AttributeType::IntervalMap,
            Self::TimestampSet(_) => AttributeType::TimestampSet,
            Self::IntervalSet(_) => AttributeType::IntervalSet,
        }
    }

    /// The boolean value, if this is a `Boolean`.
    #[inline]
    #[must_use]
    pub const fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// The value widened to `i64`, for any integer variant.
    #[inline]
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Byte(v) => Some(*v as i64),
            Self::Short(v) => Some(*v as i64),
            Self::Integer(v) => Some(*v as i64),
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// The value widened to `f64`, for any numeric variant.
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Byte(v) => Some(*v as f64),
            Self::Short(v) => Some(*v as f64),
            Self::Integer(v) => Some(*v as f64),
            Self::Long(v) => Some(*v as f64),
            Self::Float(v) => Some(*v as f64),
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// The character, if this is a `Char`.
    #[inline]
    #[must_use]
    pub const fn as_char(&self) -> Option<char> {
        match self {
            Self::Char(c) => Some(*c),
            _ => None,
        }
    }

    /// The string slice, if this is a `String`.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The list contents, if this is a `List`.
    #[inline]
    #[must_use]
    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    /// The timestamp map, if this is a `TimestampMap`.
    #[must_use]
    pub fn as_timestamp_map(&self) -> Option<&TimestampMap> {
        match self {
            Self::TimestampMap(m) => Some(m),
            _ => None,
        }
    }

    /// The interval map, if this is an `IntervalMap`.
    #[must_use]
    pub fn as_interval_map(&self) -> Option<&IntervalMap> {
        match self {
            Self::IntervalMap(m) => Some(m),
            _ => None,
        }
    }

    /// Resolves the value at a point in time: dynamic values look up their
    /// container, static values return themselves.
    #[must_use]
    pub fn at_timestamp(&self, timestamp: f64) -> Option<AttributeValue> {
        match self {
            Self::TimestampMap(m) => m.get(timestamp).cloned(),
            Self::IntervalMap(m) => m.get_at(timestamp).cloned(),
            Self::Null => None,
            other => Some(other.clone()),
        }
    }

    /// Resolves the value over an interval: the first dynamic entry that
    /// falls in (or overlaps) the probe, or the value itself when static.
    #[must_use]
    pub fn over_interval(&self, interval: &Interval) -> Option<AttributeValue> {
        match self {
            Self::TimestampMap(m) => m.get_range(interval).next().map(|(_, v)| v.clone()),
            Self::IntervalMap(m) => m.get_overlapping(interval).next().map(|(_, v)| v.clone()),
            Self::Null => None,
            other => Some(other.clone()),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Byte(v) => write!(f, "{v}"),
            Self::Short(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Char(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v}"),
            Self::List(l) => {
                write!(f, "[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Self::TimestampMap(m) => write!(f, "<timestamp map, {} entries>", m.len()),
            Self::IntervalMap(m) => write!(f, "<interval map, {} entries>", m.len()),
            Self::TimestampSet(s) => write!(f, "<timestamp set, {} entries>", s.len()),
            Self::IntervalSet(s) => write!(f, "<interval set, {} entries>", s.len()),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i8> for AttributeValue {
    fn from(v: i8) -> Self {
        Self::Byte(v)
    }
}

impl From<i16> for AttributeValue {
    fn from(v: i16) -> Self {
        Self::Short(v)
    }
}

impl From<i32> for AttributeValue {
    fn from(v: i32) -> Self {
        Self::Integer(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f32> for AttributeValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<char> for AttributeValue {
    fn from(v: char) -> Self {
        Self::Char(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        Self::String(ArcStr::from(v))
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        Self::String(ArcStr::from(v))
    }
}

impl From<ArcStr> for AttributeValue {
    fn from(v: ArcStr) -> Self {
        Self::String(v)
    }
}

impl From<Vec<AttributeValue>> for AttributeValue {
    fn from(v: Vec<AttributeValue>) -> Self {
        Self::List(v.into())
    }
}

/// An [`AttributeValue`] with total equality and hashing.
///
/// Floats compare by canonical bit pattern (all NaNs equal, `-0.0 == 0.0`)
/// so values can key hash maps. Lists hash structurally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashableValue(AttributeValue);

impl HashableValue {
    /// Wraps a value.
    #[must_use]
    pub fn new(value: AttributeValue) -> Self {
        Self(value)
    }

    /// Borrows the wrapped value.
    #[must_use]
    pub fn as_value(&self) -> &AttributeValue {
        &self.0
    }

    /// Unwraps the value.
    #[must_use]
    pub fn into_inner(self) -> AttributeValue {
        self.0
    }
}

impl From<AttributeValue> for HashableValue {
    fn from(value: AttributeValue) -> Self {
        Self(value)
    }
}

const CANONICAL_NAN: u64 = 0x7ff8_0000_0000_0000;

fn canonical_f64_bits(v: f64) -> u64 {
    if v.is_nan() {
        CANONICAL_NAN
    } else if v == 0.0 {
        0
    } else {
        v.to_bits()
    }
}

fn values_eq(a: &AttributeValue, b: &AttributeValue) -> bool {
    use AttributeValue as V;
    match (a, b) {
        (V::Float(x), V::Float(y)) => {
            canonical_f64_bits(f64::from(*x)) == canonical_f64_bits(f64::from(*y))
        }
        (V::Double(x), V::Double(y)) => canonical_f64_bits(*x) == canonical_f64_bits(*y),
        (V::List(x), V::List(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(u, v)| values_eq(u, v))
        }
        _ => a == b,
    }
}

fn hash_value<H: Hasher>(value: &AttributeValue, state: &mut H) {
    use AttributeValue as V;
    std::mem::discriminant(value).hash(state);
    match value {
        V::Null => {}
        V::Boolean(v) => v.hash(state),
        V::Byte(v) => v.hash(state),
        V::Short(v) => v.hash(state),
        V::Integer(v) => v.hash(state),
        V::Long(v) => v.hash(state),
        V::Float(v) => canonical_f64_bits(f64::from(*v)).hash(state),
        V::Double(v) => canonical_f64_bits(*v).hash(state),
        V::Char(v) => v.hash(state),
        V::String(v) => v.hash(state),
        V::List(l) => {
            l.len().hash(state);
            for v in l.iter() {
                hash_value(v, state);
            }
        }
        // Dynamic containers hash by length only; equality still compares
        // contents. Dynamic values are never used as map keys in practice.
        V::TimestampMap(m) => m.len().hash(state),
        V::IntervalMap(m) => m.len().hash(state),
        V::TimestampSet(s) => s.len().hash(state),
        V::IntervalSet(s) => s.len().hash(state),
    }
}

impl PartialEq for HashableValue {
    fn eq(&self, other: &Self) -> bool {
        values_eq(&self.0, &other.0)
    }
}

impl Eq for HashableValue {}

impl Hash for HashableValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_value(&self.0, state);
    }
}
