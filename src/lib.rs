pub mod ancestors;
pub mod archive;
pub mod children;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod paths;
pub mod snapshot;
pub mod sort;
pub mod stat;

pub use error::BrowseError;
pub use handlers::Browser;
pub use models::DirectorySnapshot;
pub use paths::PathResolver;
pub use snapshot::SnapshotAssembler;
pub use stat::{FsStatGateway, StatGateway};

use config::Config;

/// Builds the shared browsing state for the configured root.
pub fn browser_from_config(config: &Config) -> Browser {
    SnapshotAssembler::new(
        PathResolver::new(config.root_directory.clone()),
        FsStatGateway,
        config.max_concurrent_stats,
    )
}
