//! Hash index for equality lookups
//!
//! Maps a column value to the set of row ids holding it. NULLs are never
//! indexed, since no equality predicate can match them.

use super::table::RowId;
use super::value::{Tuple, Value};
use std::collections::{BTreeSet, HashMap};
use tracing::trace;

/// Single-column hash index
#[derive(Debug, Clone)]
pub struct HashIndex {
    /// Index name
    name: String,
    /// Position of the indexed column
    column: usize,
    /// Value -> row ids
    buckets: HashMap<Value, BTreeSet<RowId>>,
}

impl HashIndex {
    /// Create an empty index
    pub fn new(name: impl Into<String>, column: usize) -> Self {
        Self {
            name: name.into(),
            column,
            buckets: HashMap::new(),
        }
    }

    /// Build an index from a full scan of existing rows
    pub fn build<'a>(
        name: impl Into<String>,
        column: usize,
        rows: impl IntoIterator<Item = (RowId, &'a Tuple)>,
    ) -> Self {
        let mut index = Self::new(name, column);
        for (row_id, tuple) in rows {
            index.on_insert(row_id, tuple);
        }
        index
    }

    /// Index name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position of the indexed column
    pub fn column(&self) -> usize {
        self.column
    }

    fn key<'t>(&self, tuple: &'t Tuple) -> Option<&'t Value> {
        tuple.get(self.column).filter(|v| !v.is_null())
    }

    /// Record a newly inserted row
    pub fn on_insert(&mut self, row_id: RowId, tuple: &Tuple) {
        if let Some(value) = self.key(tuple) {
            trace!(index = %self.name, %row_id, %value, "index insert");
            self.buckets.entry(value.clone()).or_default().insert(row_id);
        }
    }

    /// Move a row between buckets if its indexed value changed
    pub fn on_update(&mut self, row_id: RowId, old: &Tuple, new: &Tuple) {
        if self.key(old) == self.key(new) {
            return;
        }
        self.on_delete(row_id, old);
        self.on_insert(row_id, new);
    }

    /// Forget a deleted row
    pub fn on_delete(&mut self, row_id: RowId, tuple: &Tuple) {
        let Some(value) = self.key(tuple) else {
            return;
        };
        trace!(index = %self.name, %row_id, %value, "index remove");
        if let Some(bucket) = self.buckets.get_mut(value) {
            bucket.remove(&row_id);
            if bucket.is_empty() {
                self.buckets.remove(value);
            }
        }
    }

    /// Row ids whose indexed value equals `value`, in row-id order
    pub fn lookup(&self, value: &Value) -> Vec<RowId> {
        self.buckets
            .get(value)
            .map(|bucket| bucket.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Total number of indexed row ids
    pub fn len(&self) -> usize {
        self.buckets.values().map(BTreeSet::len).sum()
    }

    /// Check if nothing is indexed
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Whether the buckets describe exactly the given rows
    pub fn matches<'a>(&self, rows: impl IntoIterator<Item = (RowId, &'a Tuple)>) -> bool {
        let rebuilt = HashIndex::build(self.name.clone(), self.column, rows);
        rebuilt.buckets == self.buckets
    }
}
