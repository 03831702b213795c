//! Grid descriptors and the registry that holds them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::DescriptorError;
use crate::page::Page;
use crate::row::Row;

/// Identifier of a grid surface (e.g. `tablaEmpleados`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GridId(String);

impl GridId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GridId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GridId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Structural metadata of one grid. Immutable once built.
///
/// `column_count` always equals `field_names.len()`; locked columns and the
/// identifier column are checked against it at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridDescriptor {
    id: GridId,
    endpoint: String,
    field_names: Vec<String>,
    locked_columns: BTreeSet<usize>,
    identifier_column: usize,
}

impl GridDescriptor {
    pub fn new(
        id: impl Into<GridId>,
        endpoint: impl Into<String>,
        field_names: Vec<String>,
    ) -> Result<Self, DescriptorError> {
        let id = id.into();
        if field_names.is_empty() {
            return Err(DescriptorError::NoFields(id));
        }
        Ok(Self {
            id,
            endpoint: endpoint.into(),
            field_names,
            locked_columns: BTreeSet::new(),
            identifier_column: 0,
        })
    }

    pub fn with_locked_columns(
        mut self,
        columns: impl IntoIterator<Item = usize>,
    ) -> Result<Self, DescriptorError> {
        let column_count = self.column_count();
        for column in columns {
            if column >= column_count {
                return Err(DescriptorError::LockedColumnOutOfRange {
                    grid: self.id,
                    column,
                    column_count,
                });
            }
            self.locked_columns.insert(column);
        }
        Ok(self)
    }

    pub fn with_identifier_column(mut self, column: usize) -> Result<Self, DescriptorError> {
        let column_count = self.column_count();
        if column >= column_count {
            return Err(DescriptorError::IdentifierColumnOutOfRange {
                grid: self.id,
                column,
                column_count,
            });
        }
        self.identifier_column = column;
        Ok(self)
    }

    pub fn id(&self) -> &GridId {
        &self.id
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn column_count(&self) -> usize {
        self.field_names.len()
    }

    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    pub fn locked_columns(&self) -> &BTreeSet<usize> {
        &self.locked_columns
    }

    pub fn is_locked(&self, column: usize) -> bool {
        self.locked_columns.contains(&column)
    }

    /// Column whose value must be non-empty before a save.
    pub fn identifier_column(&self) -> usize {
        self.identifier_column
    }

    pub fn identifier_field(&self) -> &str {
        &self.field_names[self.identifier_column]
    }
}

/// Registered grids in registration order.
#[derive(Debug, Default)]
pub struct GridRegistry {
    descriptors: Vec<GridDescriptor>,
}

impl GridRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or overwrite) a descriptor by id.
    ///
    /// Best-effort: if the page has no surface for the grid, the descriptor
    /// is dropped with a warning and `false` is returned.
    pub fn register(&mut self, descriptor: GridDescriptor, page: &Page) -> bool {
        if !page.has_grid(descriptor.id()) {
            log::warn!("grid {} is not present on this page; skipping registration", descriptor.id());
            return false;
        }
        log::debug!(
            "registering grid {} ({} columns, endpoint {})",
            descriptor.id(),
            descriptor.column_count(),
            descriptor.endpoint()
        );
        match self.descriptors.iter_mut().find(|d| d.id == descriptor.id) {
            Some(existing) => *existing = descriptor,
            None => self.descriptors.push(descriptor),
        }
        true
    }

    pub fn lookup(&self, id: &GridId) -> Option<&GridDescriptor> {
        self.descriptors.iter().find(|d| &d.id == id)
    }

    pub fn lookup_by_row(&self, row: &Row) -> Option<&GridDescriptor> {
        self.lookup(row.grid())
    }

    /// First registered grid whose surface is present on the page.
    pub fn primary(&self, page: &Page) -> Option<&GridDescriptor> {
        self.descriptors.iter().find(|d| page.has_grid(d.id()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &GridDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
