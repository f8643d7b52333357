//! Runtime configuration loaded from the environment (and `.env`).

use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_STATIC_DIR: &str = "public";
const DEFAULT_CATALOG: &str = "data/characters.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Directory served for every non-API path
    pub static_dir: PathBuf,
    /// Seed catalog of characters and their tags
    pub catalog_path: PathBuf,
    /// Event-log snapshot restored on start and written on shutdown
    pub snapshot_path: Option<PathBuf>,
    /// Directory for file-backed visitor stats (None = keep them in memory)
    pub stats_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            catalog_path: PathBuf::from(DEFAULT_CATALOG),
            snapshot_path: None,
            stats_dir: None,
        }
    }
}

impl AppConfig {
    /// Load config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr = match non_empty_var("TAGVOTE_BIND") {
            Some(raw) => match raw.parse::<SocketAddr>() {
                Ok(addr) => addr,
                Err(e) => {
                    tracing::warn!(value = %raw, "Invalid TAGVOTE_BIND ({}), using default", e);
                    defaults.bind_addr
                }
            },
            None => defaults.bind_addr,
        };

        let static_dir = non_empty_var("TAGVOTE_STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir);
        let catalog_path = non_empty_var("TAGVOTE_CATALOG")
            .map(PathBuf::from)
            .unwrap_or(defaults.catalog_path);
        let snapshot_path = non_empty_var("TAGVOTE_SNAPSHOT").map(PathBuf::from);
        let stats_dir = non_empty_var("TAGVOTE_STATS_DIR").map(PathBuf::from);

        tracing::info!(
            bind = %bind_addr,
            static_dir = %static_dir.display(),
            catalog = %catalog_path.display(),
            snapshot = ?snapshot_path,
            stats_dir = ?stats_dir,
            "Config loaded"
        );

        Self {
            bind_addr,
            static_dir,
            catalog_path,
            snapshot_path,
            stats_dir,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
