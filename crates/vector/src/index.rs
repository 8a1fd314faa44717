use std::collections::HashMap;
use theory_explorer_common::{Result, TheoryExplorerError};

use crate::types::Item;

/// Ordered items plus an id -> position lookup.
///
/// Positions never shift: replacing an id keeps its slot, new ids append.
/// Every vector has the same length, fixed by the first item inserted.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    items: Vec<Item>,
    positions: HashMap<String, usize>,
    dimension: Option<usize>,
}

impl VectorIndex {
    /// Create new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an index from persisted items.
    ///
    /// The lookup is always recomputed. Duplicate ids or mixed dimensions are rejected.
    pub fn from_items(items: Vec<Item>) -> Result<Self> {
        let mut index = Self::new();
        for item in items {
            if index.positions.contains_key(&item.id) {
                return Err(TheoryExplorerError::invalid_input(format!(
                    "Duplicate item id '{}'",
                    item.id
                )));
            }
            index.upsert(item)?;
        }
        Ok(index)
    }

    /// Insert or replace by id. Returns the item's position.
    pub fn upsert(&mut self, item: Item) -> Result<usize> {
        self.check_dimension(&item)?;

        let position = match self.positions.get(&item.id) {
            Some(&pos) => {
                self.items[pos] = item;
                pos
            }
            None => {
                let pos = self.items.len();
                self.positions.insert(item.id.clone(), pos);
                self.items.push(item);
                pos
            }
        };

        if self.dimension.is_none() {
            self.dimension = Some(self.items[position].vector.len());
        }
        Ok(position)
    }

    fn check_dimension(&self, item: &Item) -> Result<()> {
        if item.vector.is_empty() {
            return Err(TheoryExplorerError::invalid_input(format!(
                "Item '{}' has an empty vector",
                item.id
            )));
        }
        // serde_json writes NaN and infinities as null, which would not load back
        if item.vector.iter().any(|x| !x.is_finite()) {
            return Err(TheoryExplorerError::invalid_input(format!(
                "Item '{}' has non-finite vector values",
                item.id
            )));
        }
        match self.dimension {
            Some(expected) if expected != item.vector.len() => {
                Err(TheoryExplorerError::DimensionMismatch {
                    expected,
                    actual: item.vector.len(),
                })
            }
            _ => Ok(()),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.positions.get(id).map(|&pos| &self.items[pos])
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Items in insertion order
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Vector length shared by every item, once known
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }
}
