use crate::error::BrowseError;
use crate::stat::StatGateway;
use log::debug;
use std::fmt;
use std::path::{Component, Path, PathBuf};

pub const PATH_SEPARATOR: char = '/';

/// A validated, normalized location below the root, `/`-separated.
///
/// The empty string is the root itself. Never contains a `..` segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RelativePath(String);

impl RelativePath {
    pub fn root() -> Self {
        RelativePath(String::new())
    }

    /// Validates untrusted input. Runs before the string reaches any
    /// filesystem primitive.
    pub fn parse(raw: &str) -> Result<Self, BrowseError> {
        let mut segments = Vec::new();
        for segment in raw.split(PATH_SEPARATOR) {
            match segment {
                ".." => return Err(BrowseError::InvalidPath(raw.to_string())),
                "" | "." => {}
                s if s.contains('\0') => return Err(BrowseError::InvalidPath(raw.to_string())),
                s => segments.push(s),
            }
        }
        Ok(RelativePath(segments.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Last segment; empty for the root.
    pub fn name(&self) -> &str {
        self.0.rsplit(PATH_SEPARATOR).next().unwrap_or("")
    }

    /// The path with its last segment stripped; `None` for the root.
    pub fn parent(&self) -> Option<RelativePath> {
        if self.is_root() {
            return None;
        }
        let parent = match self.0.rsplit_once(PATH_SEPARATOR) {
            Some((head, _)) => head,
            None => "",
        };
        Some(RelativePath(parent.to_string()))
    }

    /// Appends a single child name as read from the host.
    pub fn child(&self, name: &str) -> RelativePath {
        if self.is_root() {
            RelativePath(name.to_string())
        } else {
            RelativePath(format!("{}{}{}", self.0, PATH_SEPARATOR, name))
        }
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(PATH_SEPARATOR).filter(|s| !s.is_empty())
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A client path together with the canonical host path it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub relative: RelativePath,
    pub absolute: PathBuf,
}

/// Maps client paths onto the configured root directory.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// `root` must already be canonical; see `Config::from_env`.
    pub fn new(root: PathBuf) -> Self {
        PathResolver { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lexical join with the host separator. No filesystem access.
    pub fn host_path(&self, relative: &RelativePath) -> PathBuf {
        relative
            .segments()
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    /// Inverse of `host_path` for paths inside the root; `None` otherwise.
    pub fn strip_root(&self, absolute: &Path) -> Option<RelativePath> {
        let rest = absolute.strip_prefix(&self.root).ok()?;
        let mut segments = Vec::new();
        for component in rest.components() {
            match component {
                Component::Normal(s) => segments.push(s.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(RelativePath(segments.join("/")))
    }

    /// Validates `raw`, joins it onto the root and canonicalizes the result.
    ///
    /// Fails `InvalidPath` without touching the filesystem when `raw` holds a
    /// `..` segment, and after canonicalization when symlinks lead outside
    /// the root.
    pub async fn resolve<G>(&self, raw: &str, gateway: &G) -> Result<ResolvedPath, BrowseError>
    where
        G: StatGateway + ?Sized,
    {
        let relative = RelativePath::parse(raw)?;
        let joined = self.host_path(&relative);
        let absolute = gateway
            .canonicalize(&joined)
            .await
            .map_err(|e| BrowseError::from_io(relative.as_str(), e))?;

        if self.strip_root(&absolute).is_none() {
            debug!(
                "Path '{}' canonicalizes outside the root to {}",
                relative,
                absolute.display()
            );
            return Err(BrowseError::InvalidPath(relative.to_string()));
        }

        Ok(ResolvedPath { relative, absolute })
    }
}
