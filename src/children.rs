use crate::error::BrowseError;
use crate::paths::{PathResolver, RelativePath, ResolvedPath};
use crate::stat::{DirChild, NodeStat, StatGateway};
use futures::stream::{self, StreamExt, TryStreamExt};
use log::debug;
use std::io;

/// Upper bound on concurrent stat calls when none is configured.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Child {
    pub name: String,
    pub path: RelativePath,
    pub stat: NodeStat,
}

/// Immediate children of one directory, split by kind. Order is unspecified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Children {
    pub directories: Vec<Child>,
    pub files: Vec<Child>,
}

impl Children {
    pub fn len(&self) -> usize {
        self.directories.len() + self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct ChildEnumerator<'a, G: ?Sized> {
    resolver: &'a PathResolver,
    gateway: &'a G,
    max_in_flight: usize,
}

impl<'a, G> ChildEnumerator<'a, G>
where
    G: StatGateway + ?Sized,
{
    pub fn new(resolver: &'a PathResolver, gateway: &'a G, max_in_flight: usize) -> Self {
        ChildEnumerator {
            resolver,
            gateway,
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Lists `dir` and stats every child concurrently.
    ///
    /// A child that disappears between the listing and its stat is dropped,
    /// as is a symlink whose target lies outside the root. Any other stat
    /// failure aborts the whole listing.
    pub async fn list_children(&self, dir: &ResolvedPath) -> Result<Children, BrowseError> {
        debug!("Listing children of '{}'", dir.relative);
        let names = self
            .gateway
            .read_dir(&dir.absolute)
            .await
            .map_err(|e| BrowseError::from_io(dir.relative.as_str(), e))?;
        let listed = names.len();

        let stats: Vec<Option<Child>> = stream::iter(names)
            .map(|child| self.stat_child(dir, child))
            .buffer_unordered(self.max_in_flight)
            .try_collect()
            .await?;

        let (directories, files): (Vec<Child>, Vec<Child>) = stats
            .into_iter()
            .flatten()
            .partition(|child| child.stat.is_dir());

        debug!(
            "Listed '{}': {} directories, {} files ({} dropped)",
            dir.relative,
            directories.len(),
            files.len(),
            listed - directories.len() - files.len()
        );
        Ok(Children { directories, files })
    }

    async fn stat_child(
        &self,
        dir: &ResolvedPath,
        child: DirChild,
    ) -> Result<Option<Child>, BrowseError> {
        let host_path = dir.absolute.join(&child.name);
        let name = child.name.to_string_lossy().into_owned();
        let path = dir.relative.child(&name);

        if child.is_symlink {
            let target = match self.gateway.canonicalize(&host_path).await {
                Ok(target) => target,
                Err(e) => return drop_if_vanished(&path, e),
            };
            if self.resolver.strip_root(&target).is_none() {
                debug!("Child '{}' links outside the root, skipping", path);
                return Ok(None);
            }
        }

        match self.gateway.stat(&host_path).await {
            Ok(stat) => Ok(Some(Child { name, path, stat })),
            Err(e) => drop_if_vanished(&path, e),
        }
    }
}

fn drop_if_vanished(path: &RelativePath, e: io::Error) -> Result<Option<Child>, BrowseError> {
    let err = BrowseError::from_io(path.as_str(), e);
    if err.is_not_found() {
        debug!("Child '{}' vanished before it could be stat'ed", path);
        Ok(None)
    } else {
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stat::fake::FakeGateway;
    use std::path::PathBuf;

    fn resolved(rel: &str) -> ResolvedPath {
        let relative = RelativePath::parse(rel).unwrap();
        let absolute = relative
            .segments()
            .fold(PathBuf::from(FakeGateway::ROOT), |p, s| p.join(s));
        ResolvedPath { relative, absolute }
    }

    fn resolver() -> PathResolver {
        PathResolver::new(PathBuf::from(FakeGateway::ROOT))
    }

    fn names(children: &[Child]) -> Vec<&str> {
        let mut names: Vec<&str> = children.iter().map(|c| c.name.as_str()).collect();
        names.sort();
        names
    }

    #[actix_rt::test]
    async fn partitions_directories_and_files() {
        let gateway = FakeGateway::new()
            .with("docs/", 0)
            .with("docs/images/", 0)
            .with("docs/readme.txt", 10)
            .with("docs/notes.md", 3)
            .with("docs/images/logo.png", 99);

        let children = ChildEnumerator::new(&resolver(), &gateway, 2)
            .list_children(&resolved("docs"))
            .await
            .unwrap();

        assert_eq!(names(&children.directories), vec!["images"]);
        assert_eq!(names(&children.files), vec!["notes.md", "readme.txt"]);
        let readme = children.files.iter().find(|c| c.name == "readme.txt").unwrap();
        assert_eq!(readme.path.as_str(), "docs/readme.txt");
        assert_eq!(readme.stat.size_bytes, 10);
    }

    #[actix_rt::test]
    async fn drops_children_deleted_mid_listing() {
        let gateway = FakeGateway::new().with("a.txt", 1).with("b.txt", 1);
        gateway.fail_stat("b.txt", io::ErrorKind::NotFound);

        let children = ChildEnumerator::new(&resolver(), &gateway, 8)
            .list_children(&resolved(""))
            .await
            .unwrap();

        assert_eq!(names(&children.files), vec!["a.txt"]);
        assert_eq!(children.len(), 1);
    }

    #[actix_rt::test]
    async fn access_denied_aborts_the_listing() {
        let gateway = FakeGateway::new().with("a.txt", 1).with("secret/", 0);
        gateway.fail_stat("secret", io::ErrorKind::PermissionDenied);

        let err = ChildEnumerator::new(&resolver(), &gateway, 8)
            .list_children(&resolved(""))
            .await
            .unwrap_err();

        assert!(matches!(err, BrowseError::AccessDenied(p) if p == "secret"));
    }

    #[actix_rt::test]
    async fn missing_directory_is_not_found() {
        let gateway = FakeGateway::new();
        let err = ChildEnumerator::new(&resolver(), &gateway, 8)
            .list_children(&resolved("gone"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(gateway.calls(), 1);
    }

    #[actix_rt::test]
    async fn stats_never_exceed_the_cap() {
        let gateway = (0..20).fold(FakeGateway::new(), |g, i| g.with(&format!("f{i}.txt"), 1));

        let children = ChildEnumerator::new(&resolver(), &gateway, 3)
            .list_children(&resolved(""))
            .await
            .unwrap();

        assert_eq!(children.files.len(), 20);
        assert!(gateway.peak_in_flight() <= 3, "peak {}", gateway.peak_in_flight());
        assert!(gateway.peak_in_flight() > 1);
    }

    #[actix_rt::test]
    async fn skips_symlinks_leaving_the_root() {
        let gateway = FakeGateway::new()
            .with("docs/", 0)
            .with("docs/readme.txt", 10)
            .with_absolute("/etc/", 0)
            .with_link("escape", "/etc")
            .with_link("alias", "/root/docs")
            .with_link("dangling", "/root/missing");

        let children = ChildEnumerator::new(&resolver(), &gateway, 4)
            .list_children(&resolved(""))
            .await
            .unwrap();

        assert_eq!(names(&children.directories), vec!["alias", "docs"]);
        assert!(children.files.is_empty());
    }
}
