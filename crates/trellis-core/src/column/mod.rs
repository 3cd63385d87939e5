//! Columns and tables.
//!
//! A [`Table`] owns the ordered set of columns for one element kind. Columns
//! get dense integer store ids; removing a column nulls its slot and the id
//! is never reused, so attribute arrays stay positionally stable for the
//! process lifetime.

pub mod index;

use arcstr::ArcStr;
use trellis_common::collections::{fx_map, FxHashMap};
use trellis_common::error::{GraphError, Result};
use trellis_common::types::{AttributeType, AttributeValue, ColumnId};

/// Where a column came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Origin {
    /// A built-in property column (id, label, timeset, weight).
    Property,
    /// A user-defined data column.
    #[default]
    Data,
}

/// A typed column definition.
#[derive(Debug, Clone)]
pub struct Column {
    id: ArcStr,
    title: ArcStr,
    value_type: AttributeType,
    origin: Origin,
    default: AttributeValue,
    indexed: bool,
    read_only: bool,
    store_id: ColumnId,
}

impl Column {
    /// Creates a data column. The key is lowercased; lookups are
    /// case-insensitive.
    #[must_use]
    pub fn new(id: &str, value_type: AttributeType) -> Self {
        let id = ArcStr::from(id.to_lowercase());
        Self {
            title: id.clone(),
            id,
            value_type,
            origin: Origin::default(),
            default: AttributeValue::Null,
            indexed: false,
            read_only: false,
            store_id: ColumnId::NULL,
        }
    }

    /// Sets the display title.
    #[must_use]
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = ArcStr::from(title);
        self
    }

    /// Sets the origin tag.
    #[must_use]
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Sets the default value new elements start with.
    #[must_use]
    pub fn with_default(mut self, default: AttributeValue) -> Self {
        self.default = default;
        self
    }

    /// Marks the column indexed.
    #[must_use]
    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    /// Marks the column read-only after element creation.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// The column key.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The display title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The declared type.
    #[must_use]
    pub fn value_type(&self) -> AttributeType {
        self.value_type
    }

    /// The origin tag.
    #[must_use]
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// The default value.
    #[must_use]
    pub fn default_value(&self) -> &AttributeValue {
        &self.default
    }

    /// `true` if a secondary index is maintained.
    #[must_use]
    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    /// `true` if the column rejects writes through the attribute API.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// `true` if values are time-indexed containers.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.value_type.is_dynamic()
    }

    /// The dense store id within the owning table.
    #[must_use]
    pub fn store_id(&self) -> ColumnId {
        self.store_id
    }
}

/// The ordered column set of one element kind.
pub struct Table {
    columns: Vec<Option<Column>>,
    id_map: FxHashMap<ArcStr, ColumnId>,
}

impl Table {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            id_map: fx_map(),
        }
    }

    /// Adds a column, assigning the next store id. Ids of removed columns
    /// are not reused.
    ///
    /// # Errors
    ///
    /// [`GraphError::Duplicate`] if the key is taken;
    /// [`GraphError::TypeMismatch`] if the default value does not fit the
    /// declared type.
    pub fn add_column(&mut self, mut column: Column) -> Result<ColumnId> {
        if self.id_map.contains_key(&column.id) {
            return Err(GraphError::Duplicate);
        }
        if !column.value_type.is_assignable(&column.default) {
            return Err(GraphError::TypeMismatch {
                expected: column.value_type,
                actual: column.default.attribute_type(),
            });
        }
        let id = ColumnId::new(self.columns.len() as u32);
        column.store_id = id;
        self.id_map.insert(column.id.clone(), id);
        self.columns.push(Some(column));
        Ok(id)
    }

    /// Removes a column. Its slot stays null forever.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotOwned`] for an unknown id.
    pub fn remove_column(&mut self, id: ColumnId) -> Result<Column> {
        let column = self
            .columns
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(GraphError::NotOwned)?;
        self.id_map.remove(&column.id);
        Ok(column)
    }

    /// Looks up a column by key (case-insensitive).
    #[must_use]
    pub fn column(&self, key: &str) -> Option<&Column> {
        let id = self.id_map.get(key.to_lowercase().as_str())?;
        self.column_by_id(*id)
    }

    /// Looks up a column by store id.
    #[must_use]
    pub fn column_by_id(&self, id: ColumnId) -> Option<&Column> {
        self.columns.get(id.index()).and_then(Option::as_ref)
    }

    /// Number of live columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.id_map.len()
    }

    /// Length of the column slot array, including removed slots. Attribute
    /// arrays size to this.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.columns.len()
    }

    /// Iterates live columns in store id order.
    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().flatten()
    }

    /// Builds a fresh attribute array populated with column defaults.
    #[must_use]
    pub(crate) fn default_attributes(&self) -> Vec<AttributeValue> {
        self.columns
            .iter()
            .map(|slot| {
                slot.as_ref()
                    .map_or(AttributeValue::Null, |c| c.default.clone())
            })
            .collect()
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}
