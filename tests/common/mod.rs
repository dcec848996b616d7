#![allow(dead_code)]

use actix_web::web;
use dirsnap::{Browser, FsStatGateway, PathResolver, SnapshotAssembler};
use std::fs;
use tempfile::TempDir;

/// Create a directory structure from a list of relative paths.
/// Paths ending with '/' create directories; others create empty files.
pub fn create_fixture(paths: &[&str]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for p in paths {
        let full = tmp.path().join(p);
        if p.ends_with('/') {
            fs::create_dir_all(&full).unwrap();
        } else {
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&full, "").unwrap();
        }
    }
    tmp
}

/// `docs/readme.txt` (10 bytes) next to the empty `docs/images`.
pub fn docs_fixture() -> TempDir {
    let tmp = create_fixture(&["docs/images/"]);
    fs::write(tmp.path().join("docs/readme.txt"), "0123456789").unwrap();
    tmp
}

pub fn browser(tmp: &TempDir) -> Browser {
    let root = tmp.path().canonicalize().unwrap();
    SnapshotAssembler::new(PathResolver::new(root), FsStatGateway, 8)
}

pub fn browser_data(tmp: &TempDir) -> web::Data<Browser> {
    web::Data::new(browser(tmp))
}
