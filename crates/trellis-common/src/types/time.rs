//! Containers backing dynamic (time-indexed) attribute values.
//!
//! A dynamic attribute is either keyed by timestamps ([`TimestampMap`]) or by
//! intervals ([`IntervalMap`]). The set variants ([`TimestampSet`],
//! [`IntervalSet`]) record when an element exists at all and back the
//! built-in timeset column.

use super::interval::Interval;
use super::value::AttributeValue;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

/// A point in time. Total ordering over `f64` so timestamps can key sorted
/// containers.
pub type Timestamp = OrderedFloat<f64>;

/// Map from timestamp to attribute value, sorted by time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimestampMap {
    map: BTreeMap<Timestamp, AttributeValue>,
}

impl TimestampMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value at a timestamp, returning the previous value.
    pub fn put(&mut self, timestamp: f64, value: AttributeValue) -> Option<AttributeValue> {
        self.map.insert(OrderedFloat(timestamp), value)
    }

    /// Removes the value at a timestamp.
    pub fn remove(&mut self, timestamp: f64) -> Option<AttributeValue> {
        self.map.remove(&OrderedFloat(timestamp))
    }

    /// The value at exactly this timestamp.
    #[must_use]
    pub fn get(&self, timestamp: f64) -> Option<&AttributeValue> {
        self.map.get(&OrderedFloat(timestamp))
    }

    /// All values whose timestamps fall inside the interval, in time order.
    pub fn get_range(&self, interval: &Interval) -> impl Iterator<Item = (f64, &AttributeValue)> {
        let low = if interval.is_low_open() {
            Bound::Excluded(OrderedFloat(interval.low()))
        } else {
            Bound::Included(OrderedFloat(interval.low()))
        };
        let high = if interval.is_high_open() {
            Bound::Excluded(OrderedFloat(interval.high()))
        } else {
            Bound::Included(OrderedFloat(interval.high()))
        };
        self.map.range((low, high)).map(|(t, v)| (t.into_inner(), v))
    }

    /// All timestamps, in order.
    pub fn timestamps(&self) -> impl Iterator<Item = f64> + '_ {
        self.map.keys().map(|t| t.into_inner())
    }

    /// The earliest timestamp.
    #[must_use]
    pub fn min_timestamp(&self) -> Option<f64> {
        self.map.keys().next().map(|t| t.into_inner())
    }

    /// The latest timestamp.
    #[must_use]
    pub fn max_timestamp(&self) -> Option<f64> {
        self.map.keys().next_back().map(|t| t.into_inner())
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// `true` if no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Map from interval to attribute value, sorted by interval bounds.
///
/// Intervals may overlap; range queries return every entry whose interval
/// intersects the probe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntervalMap {
    map: BTreeMap<Interval, AttributeValue>,
}

impl IntervalMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value for an interval, returning the previous value for an
    /// identical interval.
    pub fn put(&mut self, interval: Interval, value: AttributeValue) -> Option<AttributeValue> {
        self.map.insert(interval, value)
    }

    /// Removes the value stored under exactly this interval.
    pub fn remove(&mut self, interval: &Interval) -> Option<AttributeValue> {
        self.map.remove(interval)
    }

    /// The value stored under exactly this interval.
    #[must_use]
    pub fn get(&self, interval: &Interval) -> Option<&AttributeValue> {
        self.map.get(interval)
    }

    /// The first value whose interval contains the timestamp.
    #[must_use]
    pub fn get_at(&self, timestamp: f64) -> Option<&AttributeValue> {
        self.map
            .iter()
            .find(|(i, _)| i.contains(timestamp))
            .map(|(_, v)| v)
    }

    /// All entries whose intervals overlap the probe, in bound order.
    pub fn get_overlapping<'a>(
        &'a self,
        probe: &'a Interval,
    ) -> impl Iterator<Item = (&'a Interval, &'a AttributeValue)> {
        self.map.iter().filter(move |(i, _)| i.overlaps(probe))
    }

    /// All intervals, in bound order.
    pub fn intervals(&self) -> impl Iterator<Item = &Interval> {
        self.map.keys()
    }

    /// The lowest interval bound present.
    #[must_use]
    pub fn min_timestamp(&self) -> Option<f64> {
        self.map.keys().next().map(Interval::low)
    }

    /// The highest interval bound present.
    #[must_use]
    pub fn max_timestamp(&self) -> Option<f64> {
        self.map.keys().map(Interval::high).fold(None, |acc, h| {
            Some(acc.map_or(h, |a: f64| a.max(h)))
        })
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// `true` if no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Sorted set of timestamps at which an element exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampSet {
    set: BTreeSet<Timestamp>,
}

impl TimestampSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a timestamp, returning `true` if it was not present.
    pub fn add(&mut self, timestamp: f64) -> bool {
        self.set.insert(OrderedFloat(timestamp))
    }

    /// Removes a timestamp, returning `true` if it was present.
    pub fn remove(&mut self, timestamp: f64) -> bool {
        self.set.remove(&OrderedFloat(timestamp))
    }

    /// `true` if the timestamp is present.
    #[must_use]
    pub fn contains(&self, timestamp: f64) -> bool {
        self.set.contains(&OrderedFloat(timestamp))
    }

    /// `true` if any timestamp falls inside the interval.
    #[must_use]
    pub fn intersects(&self, interval: &Interval) -> bool {
        self.set.iter().any(|t| interval.contains(t.into_inner()))
    }

    /// All timestamps in order.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.set.iter().map(|t| t.into_inner())
    }

    /// Number of timestamps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.set.len()
    }

    /// `true` if no timestamps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

/// Sorted set of intervals over which an element exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalSet {
    set: BTreeSet<Interval>,
}

impl IntervalSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an interval, returning `true` if it was not present.
    pub fn add(&mut self, interval: Interval) -> bool {
        self.set.insert(interval)
    }

    /// Removes an interval, returning `true` if it was present.
    pub fn remove(&mut self, interval: &Interval) -> bool {
        self.set.remove(interval)
    }

    /// `true` if exactly this interval is present.
    #[must_use]
    pub fn contains(&self, interval: &Interval) -> bool {
        self.set.contains(interval)
    }

    /// `true` if any stored interval contains the timestamp.
    #[must_use]
    pub fn covers(&self, timestamp: f64) -> bool {
        self.set.iter().any(|i| i.contains(timestamp))
    }

    /// `true` if any stored interval overlaps the probe.
    #[must_use]
    pub fn intersects(&self, probe: &Interval) -> bool {
        self.set.iter().any(|i| i.overlaps(probe))
    }

    /// All intervals in bound order.
    pub fn iter(&self) -> impl Iterator<Item = &Interval> {
        self.set.iter()
    }

    /// Number of intervals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.set.len()
    }

    /// `true` if no intervals.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_map_range() {
        let mut map = TimestampMap::new();
        map.put(1.0, AttributeValue::Integer(10));
        map.put(2.0, AttributeValue::Integer(20));
        map.put(3.0, AttributeValue::Integer(30));

        let closed = Interval::new(1.0, 2.0).unwrap();
        let values: Vec<_> = map.get_range(&closed).map(|(t, _)| t).collect();
        assert_eq!(values, vec![1.0, 2.0]);

        let open = Interval::with_bounds(1.0, 3.0, true, true).unwrap();
        let values: Vec<_> = map.get_range(&open).map(|(t, _)| t).collect();
        assert_eq!(values, vec![2.0]);

        assert_eq!(map.min_timestamp(), Some(1.0));
        assert_eq!(map.max_timestamp(), Some(3.0));
    }

    #[test]
    fn test_timestamp_map_put_replaces() {
        let mut map = TimestampMap::new();
        assert!(map.put(1.0, AttributeValue::Boolean(true)).is_none());
        let old = map.put(1.0, AttributeValue::Boolean(false));
        assert_eq!(old, Some(AttributeValue::Boolean(true)));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_interval_map_overlap_query() {
        let mut map = IntervalMap::new();
        map.put(
            Interval::new(0.0, 2.0).unwrap(),
            AttributeValue::String("a".into()),
        );
        map.put(
            Interval::new(5.0, 8.0).unwrap(),
            AttributeValue::String("b".into()),
        );

        let probe = Interval::new(1.0, 6.0).unwrap();
        assert_eq!(map.get_overlapping(&probe).count(), 2);

        let probe = Interval::new(3.0, 4.0).unwrap();
        assert_eq!(map.get_overlapping(&probe).count(), 0);

        assert_eq!(map.get_at(1.5), Some(&AttributeValue::String("a".into())));
        assert!(map.get_at(3.0).is_none());
    }

    #[test]
    fn test_timestamp_set() {
        let mut set = TimestampSet::new();
        assert!(set.add(1.0));
        assert!(!set.add(1.0));
        assert!(set.contains(1.0));
        assert!(set.intersects(&Interval::new(0.0, 2.0).unwrap()));
        assert!(!set.intersects(&Interval::new(2.0, 3.0).unwrap()));
        assert!(set.remove(1.0));
        assert!(set.is_empty());
    }

    #[test]
    fn test_interval_set() {
        let mut set = IntervalSet::new();
        set.add(Interval::new(1.0, 3.0).unwrap());
        assert!(set.covers(2.0));
        assert!(!set.covers(4.0));
        assert!(set.intersects(&Interval::new(3.0, 5.0).unwrap()));
        let open = Interval::with_bounds(3.0, 5.0, true, false).unwrap();
        assert!(!set.intersects(&open));
    }
}
