//! Secondary indices over columns.
//!
//! Every column slot gets either a no-op index (column not declared indexed,
//! or dynamic) or a standard index specialized to the column type: numeric
//! types use a sorted map supporting min/max, the rest use an equality map.
//! The variant is picked once at column creation and dispatched by match.
//!
//! Null values are never indexed; elements whose value for the column is
//! null simply do not appear in the value→element map.

use arcstr::ArcStr;
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;
use trellis_common::collections::{fx_map, FxHashMap, FxHashSet};
use trellis_common::types::{AttributeType, AttributeValue, ColumnId, HashableValue};

use super::Column;

/// Sorted value→element index for a fixed-width numeric key.
#[derive(Debug, Default)]
struct SortedIndex<K: Ord + Copy> {
    map: BTreeMap<K, FxHashSet<u32>>,
    elements: usize,
}

impl<K: Ord + Copy> SortedIndex<K> {
    fn put(&mut self, key: K, element: u32) {
        if self.map.entry(key).or_default().insert(element) {
            self.elements += 1;
        }
    }

    fn remove(&mut self, key: K, element: u32) {
        if let Some(set) = self.map.get_mut(&key) {
            if set.remove(&element) {
                self.elements -= 1;
            }
            if set.is_empty() {
                self.map.remove(&key);
            }
        }
    }

    fn get(&self, key: K) -> Option<&FxHashSet<u32>> {
        self.map.get(&key)
    }

    fn min(&self) -> Option<K> {
        self.map.keys().next().copied()
    }

    fn max(&self) -> Option<K> {
        self.map.keys().next_back().copied()
    }
}

/// Unsorted value→element index keyed by equality.
#[derive(Debug)]
struct EqualityIndex<K: std::hash::Hash + Eq> {
    map: FxHashMap<K, FxHashSet<u32>>,
    elements: usize,
}

impl<K: std::hash::Hash + Eq> Default for EqualityIndex<K> {
    fn default() -> Self {
        Self {
            map: fx_map(),
            elements: 0,
        }
    }
}

impl<K: std::hash::Hash + Eq> EqualityIndex<K> {
    fn put(&mut self, key: K, element: u32) {
        if self.map.entry(key).or_default().insert(element) {
            self.elements += 1;
        }
    }

    fn remove(&mut self, key: &K, element: u32) {
        if let Some(set) = self.map.get_mut(key) {
            if set.remove(&element) {
                self.elements -= 1;
            }
            if set.is_empty() {
                self.map.remove(key);
            }
        }
    }

    fn get(&self, key: &K) -> Option<&FxHashSet<u32>> {
        self.map.get(key)
    }
}

/// The per-column index, specialized by value type.
enum ColumnIndex {
    /// Column not indexed (or dynamic): reads fall back to scanning.
    NoIndex,
    Boolean(EqualityIndex<bool>),
    Byte(SortedIndex<i8>),
    Short(SortedIndex<i16>),
    Integer(SortedIndex<i32>),
    Long(SortedIndex<i64>),
    Float(SortedIndex<OrderedFloat<f32>>),
    Double(SortedIndex<OrderedFloat<f64>>),
    Char(EqualityIndex<char>),
    Str(EqualityIndex<ArcStr>),
    List(EqualityIndex<HashableValue>),
}

impl ColumnIndex {
    fn for_column(column: &Column) -> Self {
        if !column.is_indexed() || column.is_dynamic() {
            return Self::NoIndex;
        }
        match column.value_type() {
            AttributeType::Boolean => Self::Boolean(EqualityIndex::default()),
            AttributeType::Byte => Self::Byte(SortedIndex::default()),
            AttributeType::Short => Self::Short(SortedIndex::default()),
            AttributeType::Integer => Self::Integer(SortedIndex::default()),
            AttributeType::Long => Self::Long(SortedIndex::default()),
            AttributeType::Float => Self::Float(SortedIndex::default()),
            AttributeType::Double => Self::Double(SortedIndex::default()),
            AttributeType::Char => Self::Char(EqualityIndex::default()),
            AttributeType::String => Self::Str(EqualityIndex::default()),
            AttributeType::List => Self::List(EqualityIndex::default()),
            // Dynamic types handled above.
            _ => Self::NoIndex,
        }
    }

    fn is_standard(&self) -> bool {
        !matches!(self, Self::NoIndex)
    }

    fn is_sortable(&self) -> bool {
        matches!(
            self,
            Self::Byte(_)
                | Self::Short(_)
                | Self::Integer(_)
                | Self::Long(_)
                | Self::Float(_)
                | Self::Double(_)
        )
    }

    fn put(&mut self, value: &AttributeValue, element: u32) {
        use AttributeValue as V;
        match (self, value) {
            (_, V::Null) => {}
            (Self::Boolean(idx), V::Boolean(v)) => idx.put(*v, element),
            (Self::Byte(idx), V::Byte(v)) => idx.put(*v, element),
            (Self::Short(idx), V::Short(v)) => idx.put(*v, element),
            (Self::Integer(idx), V::Integer(v)) => idx.put(*v, element),
            (Self::Long(idx), V::Long(v)) => idx.put(*v, element),
            (Self::Float(idx), V::Float(v)) => idx.put(OrderedFloat(*v), element),
            (Self::Double(idx), V::Double(v)) => idx.put(OrderedFloat(*v), element),
            (Self::Char(idx), V::Char(v)) => idx.put(*v, element),
            (Self::Str(idx), V::String(v)) => idx.put(v.clone(), element),
            (Self::List(idx), v @ V::List(_)) => {
                idx.put(HashableValue::new(v.clone()), element);
            }
            _ => {}
        }
    }

    fn remove(&mut self, value: &AttributeValue, element: u32) {
        use AttributeValue as V;
        match (self, value) {
            (_, V::Null) => {}
            (Self::Boolean(idx), V::Boolean(v)) => idx.remove(v, element),
            (Self::Byte(idx), V::Byte(v)) => idx.remove(*v, element),
            (Self::Short(idx), V::Short(v)) => idx.remove(*v, element),
            (Self::Integer(idx), V::Integer(v)) => idx.remove(*v, element),
            (Self::Long(idx), V::Long(v)) => idx.remove(*v, element),
            (Self::Float(idx), V::Float(v)) => idx.remove(OrderedFloat(*v), element),
            (Self::Double(idx), V::Double(v)) => idx.remove(OrderedFloat(*v), element),
            (Self::Char(idx), V::Char(v)) => idx.remove(v, element),
            (Self::Str(idx), V::String(v)) => idx.remove(v, element),
            (Self::List(idx), v @ V::List(_)) => {
                idx.remove(&HashableValue::new(v.clone()), element);
            }
            _ => {}
        }
    }

    fn get(&self, value: &AttributeValue) -> Option<Vec<u32>> {
        use AttributeValue as V;
        let set = match (self, value) {
            (Self::Boolean(idx), V::Boolean(v)) => idx.get(v),
            (Self::Byte(idx), V::Byte(v)) => idx.get(*v),
            (Self::Short(idx), V::Short(v)) => idx.get(*v),
            (Self::Integer(idx), V::Integer(v)) => idx.get(*v),
            (Self::Long(idx), V::Long(v)) => idx.get(*v),
            (Self::Float(idx), V::Float(v)) => idx.get(OrderedFloat(*v)),
            (Self::Double(idx), V::Double(v)) => idx.get(OrderedFloat(*v)),
            (Self::Char(idx), V::Char(v)) => idx.get(v),
            (Self::Str(idx), V::String(v)) => idx.get(v),
            (Self::List(idx), v @ V::List(_)) => idx.get(&HashableValue::new(v.clone())),
            _ => None,
        }?;
        let mut elements: Vec<u32> = set.iter().copied().collect();
        elements.sort_unstable();
        Some(elements)
    }

    fn count(&self, value: &AttributeValue) -> usize {
        self.get(value).map_or(0, |v| v.len())
    }

    fn values(&self) -> Vec<AttributeValue> {
        match self {
            Self::NoIndex => Vec::new(),
            Self::Boolean(idx) => idx.map.keys().map(|v| AttributeValue::Boolean(*v)).collect(),
            Self::Byte(idx) => idx.map.keys().map(|v| AttributeValue::Byte(*v)).collect(),
            Self::Short(idx) => idx.map.keys().map(|v| AttributeValue::Short(*v)).collect(),
            Self::Integer(idx) => idx.map.keys().map(|v| AttributeValue::Integer(*v)).collect(),
            Self::Long(idx) => idx.map.keys().map(|v| AttributeValue::Long(*v)).collect(),
            Self::Float(idx) => idx
                .map
                .keys()
                .map(|v| AttributeValue::Float(v.into_inner()))
                .collect(),
            Self::Double(idx) => idx
                .map
                .keys()
                .map(|v| AttributeValue::Double(v.into_inner()))
                .collect(),
            Self::Char(idx) => idx.map.keys().map(|v| AttributeValue::Char(*v)).collect(),
            Self::Str(idx) => idx
                .map
                .keys()
                .map(|v| AttributeValue::String(v.clone()))
                .collect(),
            Self::List(idx) => idx.map.keys().map(|v| v.as_value().clone()).collect(),
        }
    }

    fn count_values(&self) -> usize {
        match self {
            Self::NoIndex => 0,
            Self::Boolean(idx) => idx.map.len(),
            Self::Byte(idx) => idx.map.len(),
            Self::Short(idx) => idx.map.len(),
            Self::Integer(idx) => idx.map.len(),
            Self::Long(idx) => idx.map.len(),
            Self::Float(idx) => idx.map.len(),
            Self::Double(idx) => idx.map.len(),
            Self::Char(idx) => idx.map.len(),
            Self::Str(idx) => idx.map.len(),
            Self::List(idx) => idx.map.len(),
        }
    }

    fn count_elements(&self) -> usize {
        match self {
            Self::NoIndex => 0,
            Self::Boolean(idx) => idx.elements,
            Self::Byte(idx) => idx.elements,
            Self::Short(idx) => idx.elements,
            Self::Integer(idx) => idx.elements,
            Self::Long(idx) => idx.elements,
            Self::Float(idx) => idx.elements,
            Self::Double(idx) => idx.elements,
            Self::Char(idx) => idx.elements,
            Self::Str(idx) => idx.elements,
            Self::List(idx) => idx.elements,
        }
    }

    fn min_value(&self) -> Option<AttributeValue> {
        match self {
            Self::Byte(idx) => idx.min().map(AttributeValue::Byte),
            Self::Short(idx) => idx.min().map(AttributeValue::Short),
            Self::Integer(idx) => idx.min().map(AttributeValue::Integer),
            Self::Long(idx) => idx.min().map(AttributeValue::Long),
            Self::Float(idx) => idx.min().map(|v| AttributeValue::Float(v.into_inner())),
            Self::Double(idx) => idx.min().map(|v| AttributeValue::Double(v.into_inner())),
            _ => None,
        }
    }

    fn max_value(&self) -> Option<AttributeValue> {
        match self {
            Self::Byte(idx) => idx.max().map(AttributeValue::Byte),
            Self::Short(idx) => idx.max().map(AttributeValue::Short),
            Self::Integer(idx) => idx.max().map(AttributeValue::Integer),
            Self::Long(idx) => idx.max().map(AttributeValue::Long),
            Self::Float(idx) => idx.max().map(|v| AttributeValue::Float(v.into_inner())),
            Self::Double(idx) => idx.max().map(|v| AttributeValue::Double(v.into_inner())),
            _ => None,
        }
    }
}

/// All column indices of one element kind, parallel to the table's column
/// slots.
pub struct IndexStore {
    indices: Vec<Option<ColumnIndex>>,
}

impl IndexStore {
    /// Creates an empty index store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            indices: Vec::new(),
        }
    }

    /// Creates the index for a freshly added column.
    pub(crate) fn on_column_added(&mut self, column: &Column) {
        let slot = column.store_id().index();
        while self.indices.len() <= slot {
            self.indices.push(None);
        }
        self.indices[slot] = Some(ColumnIndex::for_column(column));
    }

    /// Drops the index of a removed column.
    pub(crate) fn on_column_removed(&mut self, id: ColumnId) {
        if let Some(slot) = self.indices.get_mut(id.index()) {
            *slot = None;
        }
    }

    /// Registers a value for an element.
    pub(crate) fn put(&mut self, id: ColumnId, value: &AttributeValue, element: u32) {
        if let Some(Some(index)) = self.indices.get_mut(id.index()) {
            index.put(value, element);
        }
    }

    /// Unregisters a value for an element.
    pub(crate) fn remove(&mut self, id: ColumnId, value: &AttributeValue, element: u32) {
        if let Some(Some(index)) = self.indices.get_mut(id.index()) {
            index.remove(value, element);
        }
    }

    /// Swaps an element's indexed value.
    pub(crate) fn replace(
        &mut self,
        id: ColumnId,
        old: &AttributeValue,
        new: &AttributeValue,
        element: u32,
    ) {
        if let Some(Some(index)) = self.indices.get_mut(id.index()) {
            index.remove(old, element);
            index.put(new, element);
        }
    }

    /// `true` if the column has a standard (non-noop) index.
    #[must_use]
    pub fn has_index(&self, id: ColumnId) -> bool {
        self.index(id).is_some_and(ColumnIndex::is_standard)
    }

    /// `true` if the column's index supports min/max.
    #[must_use]
    pub fn is_sortable(&self, id: ColumnId) -> bool {
        self.index(id).is_some_and(ColumnIndex::is_sortable)
    }

    /// Elements holding exactly this value, sorted by slot.
    #[must_use]
    pub fn get(&self, id: ColumnId, value: &AttributeValue) -> Vec<u32> {
        self.index(id)
            .and_then(|idx| idx.get(value))
            .unwrap_or_default()
    }

    /// Number of elements holding exactly this value.
    #[must_use]
    pub fn count(&self, id: ColumnId, value: &AttributeValue) -> usize {
        self.index(id).map_or(0, |idx| idx.count(value))
    }

    /// The distinct values present in the column.
    #[must_use]
    pub fn values(&self, id: ColumnId) -> Vec<AttributeValue> {
        self.index(id).map_or_else(Vec::new, ColumnIndex::values)
    }

    /// Number of distinct values present.
    #[must_use]
    pub fn count_values(&self, id: ColumnId) -> usize {
        self.index(id).map_or(0, ColumnIndex::count_values)
    }

    /// Number of (element, value) registrations.
    #[must_use]
    pub fn count_elements(&self, id: ColumnId) -> usize {
        self.index(id).map_or(0, ColumnIndex::count_elements)
    }

    /// The smallest value present, for sortable indices.
    #[must_use]
    pub fn min_value(&self, id: ColumnId) -> Option<AttributeValue> {
        self.index(id).and_then(ColumnIndex::min_value)
    }

    /// The largest value present, for sortable indices.
    #[must_use]
    pub fn max_value(&self, id: ColumnId) -> Option<AttributeValue> {
        self.index(id).and_then(ColumnIndex::max_value)
    }

    /// Drops every index's contents, keeping the structure.
    pub(crate) fn clear(&mut self) {
        for slot in &mut self.indices {
            if let Some(index) = slot {
                let rebuilt = match index {
                    ColumnIndex::NoIndex => ColumnIndex::NoIndex,
                    ColumnIndex::Boolean(_) => ColumnIndex::Boolean(EqualityIndex::default()),
                    ColumnIndex::Byte(_) => ColumnIndex::Byte(SortedIndex::default()),
                    ColumnIndex::Short(_) => ColumnIndex::Short(SortedIndex::default()),
                    ColumnIndex::Integer(_) => ColumnIndex::Integer(SortedIndex::default()),
                    ColumnIndex::Long(_) => ColumnIndex::Long(SortedIndex::default()),
                    ColumnIndex::Float(_) => ColumnIndex::Float(SortedIndex::default()),
                    ColumnIndex::Double(_) => ColumnIndex::Double(SortedIndex::default()),
                    ColumnIndex::Char(_) => ColumnIndex::Char(EqualityIndex::default()),
                    ColumnIndex::Str(_) => ColumnIndex::Str(EqualityIndex::default()),
                    ColumnIndex::List(_) => ColumnIndex::List(EqualityIndex::default()),
                };
                *index = rebuilt;
            }
        }
    }

    fn index(&self, id: ColumnId) -> Option<&ColumnIndex> {
        self.indices.get(id.index()).and_then(Option::as_ref)
    }
}

impl Default for IndexStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weight_store() -> (IndexStore, ColumnId) {
        let mut table = super::super::Table::new();
        let id = table
            .add_column(Column::new("weight", AttributeType::Double).indexed())
            .unwrap();
        let mut store = IndexStore::new();
        store.on_column_added(table.column_by_id(id).unwrap());
        (store, id)
    }

    #[test]
    fn test_sorted_index_min_max() {
        let (mut store, col) = weight_store();
        store.put(col, &AttributeValue::Double(0.5), 0);
        store.put(col, &AttributeValue::Double(1.5), 1);
        store.put(col, &AttributeValue::Double(1.0), 2);

        assert_eq!(store.min_value(col), Some(AttributeValue::Double(0.5)));
        assert_eq!(store.max_value(col), Some(AttributeValue::Double(1.5)));
        assert_eq!(store.count(col, &AttributeValue::Double(1.0)), 1);
        assert_eq!(store.count_values(col), 3);
        assert_eq!(store.count_elements(col), 3);
        assert!(store.is_sortable(col));

        let values = store.values(col);
        assert_eq!(
            values,
            vec![
                AttributeValue::Double(0.5),
                AttributeValue::Double(1.0),
                AttributeValue::Double(1.5)
            ]
        );
    }

    #[test]
    fn test_replace_moves_element() {
        let (mut store, col) = weight_store();
        store.put(col, &AttributeValue::Double(1.0), 7);
        store.replace(col, &AttributeValue::Double(1.0), &AttributeValue::Double(2.0), 7);

        assert_eq!(store.count(col, &AttributeValue::Double(1.0)), 0);
        assert_eq!(store.get(col, &AttributeValue::Double(2.0)), vec![7]);
        assert_eq!(store.count_elements(col), 1);
    }

    #[test]
    fn test_null_is_not_indexed() {
        let (mut store, col) = weight_store();
        store.put(col, &AttributeValue::Null, 3);
        assert_eq!(store.count_elements(col), 0);
        store.replace(col, &AttributeValue::Null, &AttributeValue::Double(1.0), 3);
        assert_eq!(store.count_elements(col), 1);
    }

    #[test]
    fn test_string_equality_index() {
        let mut table = super::super::Table::new();
        let id = table
            .add_column(Column::new("city", AttributeType::String).indexed())
            .unwrap();
        let mut store = IndexStore::new();
        store.on_column_added(table.column_by_id(id).unwrap());

        store.put(id, &AttributeValue::from("paris"), 0);
        store.put(id, &AttributeValue::from("paris"), 1);
        store.put(id, &AttributeValue::from("oslo"), 2);

        assert_eq!(store.get(id, &AttributeValue::from("paris")), vec![0, 1]);
        assert_eq!(store.count_values(id), 2);
        assert!(!store.is_sortable(id));
        assert_eq!(store.min_value(id), None);
    }

    #[test]
    fn test_list_index_structural_equality() {
        let mut table = super::super::Table::new();
        let id = table
            .add_column(Column::new("vec", AttributeType::List).indexed())
            .unwrap();
        let mut store = IndexStore::new();
        store.on_column_added(table.column_by_id(id).unwrap());

        let a = AttributeValue::from(vec![AttributeValue::Integer(1), AttributeValue::Integer(2)]);
        let b = AttributeValue::from(vec![AttributeValue::Integer(1), AttributeValue::Integer(2)]);
        store.put(id, &a, 0);
        assert_eq!(store.get(id, &b), vec![0]);
    }

    #[test]
    fn test_unindexed_column_is_noop() {
        let mut table = super::super::Table::new();
        let id = table
            .add_column(Column::new("notes", AttributeType::String))
            .unwrap();
        let mut store = IndexStore::new();
        store.on_column_added(table.column_by_id(id).unwrap());

        store.put(id, &AttributeValue::from("x"), 0);
        assert!(!store.has_index(id));
        assert_eq!(store.count(id, &AttributeValue::from("x")), 0);
    }

    #[test]
    fn test_column_removal_drops_index() {
        let (mut store, col) = weight_store();
        store.put(col, &AttributeValue::Double(1.0), 0);
        store.on_column_removed(col);
        assert!(!store.has_index(col));
        assert_eq!(store.count(col, &AttributeValue::Double(1.0)), 0);
    }
}
