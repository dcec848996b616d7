use crate::ancestors::AncestorChainBuilder;
use crate::children::{Child, ChildEnumerator};
use crate::error::BrowseError;
use crate::models::{ChildDirectoryEntry, DirectoryEntry, DirectorySnapshot, FileEntry};
use crate::paths::{PathResolver, ResolvedPath};
use crate::stat::{NodeStat, StatGateway};
use log::{debug, info};
use std::time::Instant;

impl From<Child> for ChildDirectoryEntry {
    fn from(child: Child) -> Self {
        ChildDirectoryEntry {
            entry: DirectoryEntry {
                id: child.stat.identity,
                name: child.name,
                path: child.path.to_string(),
            },
            created_date: child.stat.created_at,
            modified_date: child.stat.modified_at,
        }
    }
}

impl From<Child> for FileEntry {
    fn from(child: Child) -> Self {
        FileEntry {
            entry: DirectoryEntry {
                id: child.stat.identity,
                name: child.name,
                path: child.path.to_string(),
            },
            size: child.stat.size_bytes,
            created_date: child.stat.created_at,
            modified_date: child.stat.modified_at,
        }
    }
}

/// Builds one `DirectorySnapshot` per request out of the resolver and the
/// gateway. Either the whole snapshot is produced or an error is.
pub struct SnapshotAssembler<G> {
    resolver: PathResolver,
    gateway: G,
    max_in_flight: usize,
}

impl<G> SnapshotAssembler<G>
where
    G: StatGateway,
{
    pub fn new(resolver: PathResolver, gateway: G, max_in_flight: usize) -> Self {
        SnapshotAssembler {
            resolver,
            gateway,
            max_in_flight,
        }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub async fn assemble(&self, raw_path: &str) -> Result<DirectorySnapshot, BrowseError> {
        let start_time = Instant::now();
        let target = self.resolver.resolve(raw_path, &self.gateway).await?;

        let enumerator = ChildEnumerator::new(&self.resolver, &self.gateway, self.max_in_flight);
        let ancestors = AncestorChainBuilder::new(&self.resolver, &self.gateway);
        let (stat, children, parents) = futures::join!(
            self.stat_target(&target),
            enumerator.list_children(&target),
            ancestors.build_chain(&target.relative),
        );

        // The target's own stat decides the error: listing a plain file
        // fails too, but the caller must see NotADirectory.
        let stat = stat?;
        if !stat.is_dir() {
            return Err(BrowseError::NotADirectory(target.relative.to_string()));
        }
        let children = children?;
        let parents = parents?;

        debug!(
            "Assembled '{}' with {} ancestors and {} children",
            target.relative,
            parents.len(),
            children.len()
        );
        let snapshot = DirectorySnapshot {
            entry: DirectoryEntry {
                id: stat.identity,
                name: target.relative.name().to_string(),
                path: target.relative.to_string(),
            },
            parents,
            directories: children.directories.into_iter().map(Into::into).collect(),
            files: children.files.into_iter().map(Into::into).collect(),
        };
        info!(
            "Snapshot of '{}' assembled in {:.2?}.",
            target.relative,
            start_time.elapsed()
        );
        Ok(snapshot)
    }

    async fn stat_target(&self, target: &ResolvedPath) -> Result<NodeStat, BrowseError> {
        self.gateway
            .stat(&target.absolute)
            .await
            .map_err(|e| BrowseError::from_io(target.relative.as_str(), e))
    }
}
