//! The graph-wide time store.
//!
//! Dynamic attribute values live on the elements themselves (see
//! `trellis_common::types::time`); this module maintains the reverse
//! direction: for each element kind, which elements carry at least one
//! dynamic value at a given timestamp or interval. It answers "which
//! elements are active at time t?" without scanning attributes.
//!
//! Maintenance is gated by `Config::enable_index_time`.

use ordered_float::OrderedFloat;
use std::collections::BTreeMap;
use trellis_common::collections::{fx_set, FxHashSet};
use trellis_common::types::{Interval, Timestamp};

/// Reverse index from time to element slots for one element kind.
#[derive(Default)]
pub struct TimeIndex {
    points: BTreeMap<Timestamp, FxHashSet<u32>>,
    intervals: BTreeMap<Interval, FxHashSet<u32>>,
}

impl TimeIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an element at a point timestamp.
    pub(crate) fn add_point(&mut self, timestamp: f64, element: u32) {
        self.points
            .entry(OrderedFloat(timestamp))
            .or_insert_with(fx_set)
            .insert(element);
    }

    /// Unregisters an element from a point timestamp.
    pub(crate) fn remove_point(&mut self, timestamp: f64, element: u32) {
        if let Some(set) = self.points.get_mut(&OrderedFloat(timestamp)) {
            set.remove(&element);
            if set.is_empty() {
                self.points.remove(&OrderedFloat(timestamp));
            }
        }
    }

    /// Registers an element over an interval.
    pub(crate) fn add_interval(&mut self, interval: Interval, element: u32) {
        self.intervals
            .entry(interval)
            .or_insert_with(fx_set)
            .insert(element);
    }

    /// Unregisters an element from an interval.
    pub(crate) fn remove_interval(&mut self, interval: &Interval, element: u32) {
        if let Some(set) = self.intervals.get_mut(interval) {
            set.remove(&element);
            if set.is_empty() {
                self.intervals.remove(interval);
            }
        }
    }

    /// Drops every registration of an element.
    pub(crate) fn clear_element(&mut self, element: u32) {
        self.points.retain(|_, set| {
            set.remove(&element);
            !set.is_empty()
        });
        self.intervals.retain(|_, set| {
            set.remove(&element);
            !set.is_empty()
        });
    }

    /// Elements active at exactly this timestamp: point registrations at `t`
    /// plus interval registrations containing `t`.
    #[must_use]
    pub fn elements_at(&self, timestamp: f64) -> Vec<u32> {
        let mut result = fx_set();
        if let Some(set) = self.points.get(&OrderedFloat(timestamp)) {
            result.extend(set.iter().copied());
        }
        for (interval, set) in &self.intervals {
            if interval.contains(timestamp) {
                result.extend(set.iter().copied());
            }
        }
        let mut result: Vec<u32> = result.into_iter().collect();
        result.sort_unstable();
        result
    }

    /// Elements active somewhere in the probe interval.
    #[must_use]
    pub fn elements_overlapping(&self, probe: &Interval) -> Vec<u32> {
        let mut result = fx_set();
        for (timestamp, set) in &self.points {
            if probe.contains(timestamp.into_inner()) {
                result.extend(set.iter().copied());
            }
        }
        for (interval, set) in &self.intervals {
            if interval.overlaps(probe) {
                result.extend(set.iter().copied());
            }
        }
        let mut result: Vec<u32> = result.into_iter().collect();
        result.sort_unstable();
        result
    }

    /// The earliest time any element is registered at.
    #[must_use]
    pub fn min_timestamp(&self) -> Option<f64> {
        let point = self.points.keys().next().map(|t| t.into_inner());
        let interval = self.intervals.keys().next().map(Interval::low);
        match (point, interval) {
            (Some(p), Some(i)) => Some(p.min(i)),
            (p, i) => p.or(i),
        }
    }

    /// The latest time any element is registered at.
    #[must_use]
    pub fn max_timestamp(&self) -> Option<f64> {
        let point = self.points.keys().next_back().map(|t| t.into_inner());
        let interval = self
            .intervals
            .keys()
            .map(Interval::high)
            .fold(None, |acc: Option<f64>, h| Some(acc.map_or(h, |a| a.max(h))));
        match (point, interval) {
            (Some(p), Some(i)) => Some(p.max(i)),
            (p, i) => p.or(i),
        }
    }

    /// `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.intervals.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.points.clear();
        self.intervals.clear();
    }
}

/// The node and edge time indices plus the enablement flag.
pub struct TimeStore {
    /// Reverse time index over nodes.
    pub nodes: TimeIndex,
    /// Reverse time index over edges.
    pub edges: TimeIndex,
    enabled: bool,
}

impl TimeStore {
    /// Creates a time store; a disabled store ignores every registration.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            nodes: TimeIndex::new(),
            edges: TimeIndex::new(),
            enabled,
        }
    }

    /// `true` when the reverse index is maintained.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn node_point_added(&mut self, timestamp: f64, element: u32) {
        if self.enabled {
            self.nodes.add_point(timestamp, element);
        }
    }

    pub(crate) fn edge_point_added(&mut self, timestamp: f64, element: u32) {
        if self.enabled {
            self.edges.add_point(timestamp, element);
        }
    }

    pub(crate) fn node_interval_added(&mut self, interval: Interval, element: u32) {
        if self.enabled {
            self.nodes.add_interval(interval, element);
        }
    }

    pub(crate) fn edge_interval_added(&mut self, interval: Interval, element: u32) {
        if self.enabled {
            self.edges.add_interval(interval, element);
        }
    }

    pub(crate) fn node_removed(&mut self, element: u32) {
        if self.enabled {
            self.nodes.clear_element(element);
        }
    }

    pub(crate) fn edge_removed(&mut self, element: u32) {
        if self.enabled {
            self.edges.clear_element(element);
        }
    }

    pub(crate) fn clear_edges(&mut self) {
        self.edges.clear();
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_registrations() {
        let mut index = TimeIndex::new();
        index.add_point(1.0, 0);
        index.add_point(1.0, 1);
        index.add_point(2.0, 2);

        assert_eq!(index.elements_at(1.0), vec![0, 1]);
        assert_eq!(index.elements_at(1.5), Vec::<u32>::new());
        assert_eq!(index.min_timestamp(), Some(1.0));
        assert_eq!(index.max_timestamp(), Some(2.0));

        index.remove_point(1.0, 0);
        assert_eq!(index.elements_at(1.0), vec![1]);
    }

    #[test]
    fn test_interval_registrations() {
        let mut index = TimeIndex::new();
        index.add_interval(Interval::new(0.0, 2.0).unwrap(), 0);
        index.add_interval(Interval::new(5.0, 9.0).unwrap(), 1);
        index.add_point(6.0, 2);

        assert_eq!(index.elements_at(1.0), vec![0]);
        assert_eq!(index.elements_at(6.0), vec![1, 2]);
        assert_eq!(
            index.elements_overlapping(&Interval::new(1.0, 6.0).unwrap()),
            vec![0, 1, 2]
        );
        assert_eq!(index.min_timestamp(), Some(0.0));
        assert_eq!(index.max_timestamp(), Some(9.0));
    }

    #[test]
    fn test_clear_element() {
        let mut index = TimeIndex::new();
        index.add_point(1.0, 0);
        index.add_point(2.0, 0);
        index.add_interval(Interval::new(0.0, 3.0).unwrap(), 0);
        index.add_point(1.0, 1);

        index.clear_element(0);
        assert_eq!(index.elements_at(1.0), vec![1]);
        assert_eq!(index.elements_at(2.0), Vec::<u32>::new());
    }

    #[test]
    fn test_disabled_store_ignores_registrations() {
        let mut store = TimeStore::new(false);
        store.node_point_added(1.0, 0);
        assert!(store.nodes.is_empty());
    }
}
