//! Column sort state for the listing tables.
//!
//! Purely presentational: snapshots are assembled unordered and only the
//! HTTP layer applies a `SortState` before rendering.

use crate::models::{ChildDirectoryEntry, DirectorySnapshot, FileEntry};
use serde::Deserialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortColumn {
    Name,
    Size,
    CreatedDate,
    ModifiedDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: SortColumn,
    pub order: SortOrder,
    pub default_order: SortOrder,
}

impl Default for SortState {
    fn default() -> Self {
        SortState::new(SortColumn::Name, SortOrder::Ascending)
    }
}

impl SortState {
    pub fn new(column: SortColumn, default_order: SortOrder) -> Self {
        SortState {
            column,
            order: default_order,
            default_order,
        }
    }

    /// Header click: reselecting the current column flips the order,
    /// picking another one switches to it in the default order.
    pub fn select(self, column: SortColumn) -> Self {
        if column == self.column {
            SortState {
                order: self.order.flipped(),
                ..self
            }
        } else {
            SortState {
                column,
                order: self.default_order,
                ..self
            }
        }
    }

    pub fn sort_files(&self, files: &mut [FileEntry]) {
        files.sort_by(|a, b| {
            let ordering = match self.column {
                SortColumn::Name => natord::compare(&a.entry.name, &b.entry.name),
                SortColumn::Size => a.size.cmp(&b.size),
                SortColumn::CreatedDate => a.created_date.cmp(&b.created_date),
                SortColumn::ModifiedDate => a.modified_date.cmp(&b.modified_date),
            };
            self.order.apply(ordering)
        });
    }

    /// Directories carry no size; `Size` falls back to name order.
    pub fn sort_directories(&self, directories: &mut [ChildDirectoryEntry]) {
        directories.sort_by(|a, b| {
            let ordering = match self.column {
                SortColumn::Name | SortColumn::Size => {
                    natord::compare(&a.entry.name, &b.entry.name)
                }
                SortColumn::CreatedDate => a.created_date.cmp(&b.created_date),
                SortColumn::ModifiedDate => a.modified_date.cmp(&b.modified_date),
            };
            self.order.apply(ordering)
        });
    }

    pub fn sort_snapshot(&self, snapshot: &mut DirectorySnapshot) {
        self.sort_directories(&mut snapshot.directories);
        self.sort_files(&mut snapshot.files);
    }
}
