use crate::error::BrowseError;
use crate::models::{AncestorEntry, DirectoryEntry};
use crate::paths::{PathResolver, RelativePath};
use crate::stat::StatGateway;
use futures::future::try_join_all;
use log::debug;
use std::iter;

/// Every proper ancestor of `path`, root first. Empty for the root itself.
pub fn ancestor_paths(path: &RelativePath) -> Vec<RelativePath> {
    let mut chain: Vec<RelativePath> = iter::successors(path.parent(), RelativePath::parent).collect();
    chain.reverse();
    chain
}

pub struct AncestorChainBuilder<'a, G: ?Sized> {
    resolver: &'a PathResolver,
    gateway: &'a G,
}

impl<'a, G> AncestorChainBuilder<'a, G>
where
    G: StatGateway + ?Sized,
{
    pub fn new(resolver: &'a PathResolver, gateway: &'a G) -> Self {
        AncestorChainBuilder { resolver, gateway }
    }

    /// Breadcrumbs for `path`. Stats run concurrently; order is root first
    /// regardless of which completes first.
    pub async fn build_chain(&self, path: &RelativePath) -> Result<Vec<AncestorEntry>, BrowseError> {
        let lookups = ancestor_paths(path).into_iter().map(|ancestor| async move {
            let host_path = self.resolver.host_path(&ancestor);
            let stat = self
                .gateway
                .stat(&host_path)
                .await
                .map_err(|e| BrowseError::from_io(ancestor.as_str(), e))?;
            debug!("Ancestor '{}' has identity {}", ancestor, stat.identity);
            Ok::<_, BrowseError>(DirectoryEntry {
                id: stat.identity,
                name: ancestor.name().to_string(),
                path: ancestor.to_string(),
            })
        });
        try_join_all(lookups).await
    }
}
