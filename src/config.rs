use crate::children::DEFAULT_MAX_IN_FLIGHT;
use log::{debug, warn};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ROOT_DIRECTORY is not set")]
    MissingRoot,

    #[error("ROOT_DIRECTORY '{path}' cannot be used: {source}")]
    InvalidRoot {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("ROOT_DIRECTORY '{0}' is not a directory")]
    RootNotADirectory(String),

    #[error("{name} must be {expected}, got '{value}'")]
    InvalidValue {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// PEM certificate chain and PKCS#8 key for serving over TLS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// Process-wide settings, fixed at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Canonical absolute root every client path is relative to.
    pub root_directory: PathBuf,
    pub port: u16,
    pub tls: Option<TlsPaths>,
    pub max_concurrent_stats: usize,
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if dotenv::dotenv().is_err() {
            debug!("No .env file loaded");
        }
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let root = lookup("ROOT_DIRECTORY")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingRoot)?;
        let root_directory = canonical_root(&root)?;

        let port = match lookup("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
                name: "PORT",
                expected: "a port number",
                value: v.clone(),
            })?,
            None => DEFAULT_PORT,
        };

        let max_concurrent_stats = match lookup("MAX_CONCURRENT_STATS") {
            Some(v) => match v.parse::<usize>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "MAX_CONCURRENT_STATS",
                        expected: "a positive integer",
                        value: v,
                    })
                }
            },
            None => DEFAULT_MAX_IN_FLIGHT,
        };

        let tls = match (lookup("CERT_PATH"), lookup("KEY_PATH")) {
            (Some(cert), Some(key)) => {
                if Path::new(&cert).exists() && Path::new(&key).exists() {
                    Some(TlsPaths {
                        cert_path: cert.into(),
                        key_path: key.into(),
                    })
                } else {
                    warn!("CERT_PATH or KEY_PATH points to a non-existent file. Starting without HTTPS.");
                    None
                }
            }
            (None, None) => None,
            _ => {
                warn!("Only one of CERT_PATH and KEY_PATH is set. Starting without HTTPS.");
                None
            }
        };

        Ok(Config {
            root_directory,
            port,
            tls,
            max_concurrent_stats,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn canonical_root(root: &str) -> Result<PathBuf, ConfigError> {
    let path = Path::new(root)
        .canonicalize()
        .map_err(|source| ConfigError::InvalidRoot {
            path: root.to_string(),
            source,
        })?;
    if !path.is_dir() {
        return Err(ConfigError::RootNotADirectory(root.to_string()));
    }
    Ok(path)
}
