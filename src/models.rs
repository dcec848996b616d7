use crate::sort::{SortColumn, SortOrder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shared shape of every node reachable in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub id: u64,
    pub name: String,
    pub path: String,
}

/// One directory between the root and the requested directory.
pub type AncestorEntry = DirectoryEntry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildDirectoryEntry {
    #[serde(flatten)]
    pub entry: DirectoryEntry,
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    #[serde(flatten)]
    pub entry: DirectoryEntry,
    pub size: u64,
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
}

/// Point-in-time view of one directory, its children and its ancestors.
///
/// `parents` is ordered root first and is empty for the root itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    #[serde(flatten)]
    pub entry: DirectoryEntry,
    pub parents: Vec<AncestorEntry>,
    pub directories: Vec<ChildDirectoryEntry>,
    pub files: Vec<FileEntry>,
}

#[derive(Deserialize)]
pub struct DirectoryQuery {
    pub path: Option<String>,
    pub sort: Option<SortColumn>,
    pub order: Option<SortOrder>,
}

#[derive(Deserialize)]
pub struct PathQuery {
    pub path: Option<String>,
}
