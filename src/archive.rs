use crate::paths::RelativePath;
use log::debug;
use std::fs::File;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const ROOT_ARCHIVE_STEM: &str = "archive";

/// Download name for an archive of `path`: its base name without the last
/// extension, plus `.zip`.
pub fn archive_name(path: &RelativePath) -> String {
    let stem = Path::new(path.name())
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| ROOT_ARCHIVE_STEM.to_string());
    format!("{}.zip", stem)
}

/// Zips `path` in memory on the blocking pool.
pub async fn archive(path: PathBuf) -> io::Result<Vec<u8>> {
    tokio::task::spawn_blocking(move || build_archive(&path))
        .await
        .map_err(io::Error::other)?
}

/// A file becomes a single entry named after it. A directory is archived
/// recursively with entry names relative to it. Symlinks are skipped.
pub fn build_archive(path: &Path) -> io::Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    if path.is_file() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        add_file(&mut writer, path, name, options)?;
    } else {
        let mut entries = 0usize;
        for entry in WalkDir::new(path).follow_links(false).min_depth(1) {
            let entry = entry?;
            if entry.file_type().is_symlink() {
                debug!("Skipping symlink {}", entry.path().display());
                continue;
            }

            let name = entry_name(path, entry.path())?;
            if entry.file_type().is_dir() {
                writer.add_directory(format!("{name}/"), options)?;
            } else if entry.file_type().is_file() {
                add_file(&mut writer, entry.path(), name, options)?;
            }
            entries += 1;
        }
        debug!("Archived {} entries from {}", entries, path.display());
    }

    Ok(writer.finish()?.into_inner())
}

fn add_file(
    writer: &mut ZipWriter<Cursor<Vec<u8>>>,
    path: &Path,
    name: String,
    options: SimpleFileOptions,
) -> io::Result<()> {
    let mut file = File::open(path)?;
    let large = file.metadata()?.len() >= u32::MAX as u64;
    writer.start_file(name, options.large_file(large))?;
    io::copy(&mut file, writer)?;
    Ok(())
}

fn entry_name(base: &Path, path: &Path) -> io::Result<String> {
    let rel = path.strip_prefix(base).map_err(io::Error::other)?;
    let segments: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn entry_names(bytes: Vec<u8>) -> Vec<String> {
        let zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    #[test]
    fn names_archives_after_the_stem() {
        assert_eq!(archive_name(&RelativePath::parse("docs/readme.txt").unwrap()), "readme.zip");
        assert_eq!(archive_name(&RelativePath::parse("docs").unwrap()), "docs.zip");
        assert_eq!(archive_name(&RelativePath::parse("a/b.tar.gz").unwrap()), "b.tar.zip");
        assert_eq!(archive_name(&RelativePath::root()), "archive.zip");
    }

    #[test]
    fn archives_a_single_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("readme.txt");
        fs::write(&file, b"0123456789").unwrap();

        let bytes = build_archive(&file).unwrap();
        let mut zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(zip.len(), 1);
        let mut content = String::new();
        zip.by_name("readme.txt").unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "0123456789");
    }

    #[test]
    fn archives_a_directory_recursively() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("docs/images/icons")).unwrap();
        fs::write(tmp.path().join("docs/readme.txt"), b"hi").unwrap();
        fs::write(tmp.path().join("docs/images/logo.png"), b"png").unwrap();

        let bytes = build_archive(&tmp.path().join("docs")).unwrap();
        assert_eq!(
            entry_names(bytes),
            vec!["images/", "images/icons/", "images/logo.png", "readme.txt"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn skips_symlinks() {
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("secret"), b"x").unwrap();
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.txt"), b"a").unwrap();
        std::os::unix::fs::symlink(outside.path(), tmp.path().join("link")).unwrap();

        let bytes = build_archive(tmp.path()).unwrap();
        assert_eq!(entry_names(bytes), vec!["a.txt"]);
    }
}
