use std::env;
use std::path::PathBuf;

/// Storage configuration.
///
/// Reads from the `CLASSBUDDY_DATA_DIR` environment variable, falling back to
/// the platform data directory (`~/.local/share/classbuddy` on Linux).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding one file per stored key.
    pub data_dir: PathBuf,
}

impl StoreConfig {
    /// Environment variable that overrides the data directory.
    pub const ENV_VAR: &str = "CLASSBUDDY_DATA_DIR";

    /// Build a config from the environment.
    ///
    /// Priority: `CLASSBUDDY_DATA_DIR` env var, then [`Self::default_data_dir`].
    pub fn from_env() -> Self {
        let data_dir = env::var(Self::ENV_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_data_dir);
        Self { data_dir }
    }

    /// Build a config from an explicit directory (useful for tests and CLI flags).
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// The platform data directory joined with `classbuddy`.
    ///
    /// Falls back to `./.classbuddy` when the platform reports no data dir.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join("classbuddy"))
            .unwrap_or_else(|| PathBuf::from(".classbuddy"))
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
