use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use std::ffi::OsString;
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs as tokio_fs;
use tokio_stream::wrappers::ReadDirStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
}

/// Metadata of one node, as reported by the host at call time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeStat {
    pub identity: u64,
    pub kind: NodeKind,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// One name returned by a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirChild {
    pub name: OsString,
    pub is_symlink: bool,
}

impl NodeStat {
    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn from_metadata(metadata: &Metadata) -> io::Result<Self> {
        let modified_at = clamp_to_utc(metadata.modified()?);
        let created_at = match metadata.created() {
            Ok(created) => clamp_to_utc(created),
            Err(_) => change_time(metadata).unwrap_or(modified_at),
        };
        let kind = if metadata.is_dir() {
            NodeKind::Directory
        } else {
            NodeKind::File
        };

        Ok(NodeStat {
            identity: identity(metadata),
            kind,
            size_bytes: metadata.len(),
            created_at,
            modified_at,
        })
    }
}

/// `None` when `time` lies outside the range chrono can represent.
pub fn to_utc(time: SystemTime) -> Option<DateTime<Utc>> {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => DateTime::from_timestamp(i64::try_from(after.as_secs()).ok()?, after.subsec_nanos()),
        Err(before) => {
            let before = before.duration();
            let secs = i64::try_from(before.as_secs()).ok()?;
            match before.subsec_nanos() {
                0 => DateTime::from_timestamp(-secs, 0),
                nanos => DateTime::from_timestamp(-secs - 1, 1_000_000_000 - nanos),
            }
        }
    }
}

/// Host timestamps beyond chrono's range saturate at its bounds.
pub fn clamp_to_utc(time: SystemTime) -> DateTime<Utc> {
    to_utc(time).unwrap_or(if time > UNIX_EPOCH {
        DateTime::<Utc>::MAX_UTC
    } else {
        DateTime::<Utc>::MIN_UTC
    })
}

#[cfg(unix)]
fn identity(metadata: &Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.ino()
}

#[cfg(not(unix))]
fn identity(_metadata: &Metadata) -> u64 {
    0
}

#[cfg(unix)]
fn change_time(metadata: &Metadata) -> Option<DateTime<Utc>> {
    use std::os::unix::fs::MetadataExt;
    DateTime::from_timestamp(metadata.ctime(), metadata.ctime_nsec() as u32)
}

#[cfg(not(unix))]
fn change_time(_metadata: &Metadata) -> Option<DateTime<Utc>> {
    None
}

/// The only boundary through which the browsing core touches the filesystem.
///
/// Paths handed in are absolute host paths; errors are raw host errors and
/// get classified by the caller, which knows the client-facing path.
#[async_trait]
pub trait StatGateway: Send + Sync {
    /// Metadata of `path`, following symlinks.
    async fn stat(&self, path: &Path) -> io::Result<NodeStat>;

    /// Immediate children of `path`, in host order. Symlinks are reported
    /// as such, not followed.
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<DirChild>>;

    async fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
}

/// `StatGateway` backed by the host filesystem through tokio.
#[derive(Debug, Clone, Default)]
pub struct FsStatGateway;

#[async_trait]
impl StatGateway for FsStatGateway {
    async fn stat(&self, path: &Path) -> io::Result<NodeStat> {
        let metadata = tokio_fs::metadata(path).await?;
        NodeStat::from_metadata(&metadata)
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<DirChild>> {
        let entries = tokio_fs::read_dir(path).await?;
        ReadDirStream::new(entries)
            .and_then(|entry| async move {
                let file_type = entry.file_type().await?;
                Ok::<_, io::Error>(DirChild {
                    name: entry.file_name(),
                    is_symlink: file_type.is_symlink(),
                })
            })
            .try_collect()
            .await
    }

    async fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        tokio_fs::canonicalize(path).await
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[actix_rt::test]
    async fn stats_files_and_directories() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("readme.txt"), b"0123456789").unwrap();
        fs::create_dir(tmp.path().join("images")).unwrap();

        let gateway = FsStatGateway;
        let file = gateway.stat(&tmp.path().join("readme.txt")).await.unwrap();
        assert_eq!(file.kind, NodeKind::File);
        assert_eq!(file.size_bytes, 10);

        let dir = gateway.stat(&tmp.path().join("images")).await.unwrap();
        assert!(dir.is_dir());
        #[cfg(unix)]
        assert_ne!(dir.identity, file.identity);
    }

    #[actix_rt::test]
    async fn missing_path_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = FsStatGateway
            .stat(&tmp.path().join("missing"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[actix_rt::test]
    async fn lists_immediate_children_only() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("a/b")).unwrap();
        fs::write(tmp.path().join("c.txt"), b"").unwrap();

        let mut names: Vec<OsString> = FsStatGateway
            .read_dir(tmp.path())
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        names.sort();
        assert_eq!(names, vec![OsString::from("a"), OsString::from("c.txt")]);
    }

    #[cfg(unix)]
    #[actix_rt::test]
    async fn listing_reports_symlinks() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("real")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("real"), tmp.path().join("link")).unwrap();

        let listed = FsStatGateway.read_dir(tmp.path()).await.unwrap();
        let link = listed.iter().find(|c| c.name == "link").unwrap();
        let real = listed.iter().find(|c| c.name == "real").unwrap();
        assert!(link.is_symlink);
        assert!(!real.is_symlink);
    }

    #[test]
    fn converts_ordinary_times() {
        let at = UNIX_EPOCH + Duration::new(1_700_000_000, 500);
        let utc = to_utc(at).unwrap();
        assert_eq!(utc.timestamp(), 1_700_000_000);
        assert_eq!(utc.timestamp_subsec_nanos(), 500);

        let before = UNIX_EPOCH - Duration::new(10, 250_000_000);
        let utc = to_utc(before).unwrap();
        assert_eq!(utc.timestamp(), -11);
        assert_eq!(utc.timestamp_subsec_nanos(), 750_000_000);
    }

    #[test]
    fn out_of_range_times_saturate() {
        let far_future = UNIX_EPOCH + Duration::from_secs(9_000_000_000_000);
        assert_eq!(to_utc(far_future), None);
        assert_eq!(clamp_to_utc(far_future), DateTime::<Utc>::MAX_UTC);

        if let Some(far_past) = UNIX_EPOCH.checked_sub(Duration::from_secs(9_000_000_000_000)) {
            assert_eq!(to_utc(far_past), None);
            assert_eq!(clamp_to_utc(far_past), DateTime::<Utc>::MIN_UTC);
        }
    }
}
