//! Configuration file management for classbuddy.
//!
//! Provides a TOML-based config file at `~/.config/classbuddy/config.toml`
//! and a resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use classbuddy_core::llm::ChatConfig;
use classbuddy_core::slides::GammaConfig;
use classbuddy_store::StoreConfig;

pub const ENV_LLM_API_KEY: &str = "CLASSBUDDY_LLM_API_KEY";
pub const ENV_LLM_URL: &str = "CLASSBUDDY_LLM_URL";
pub const ENV_LLM_MODEL: &str = "CLASSBUDDY_LLM_MODEL";
pub const ENV_GAMMA_API_KEY: &str = "GAMMA_API_KEY";
pub const ENV_GAMMA_URL: &str = "CLASSBUDDY_GAMMA_URL";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub llm: LlmSection,
    pub gamma: GammaSection,
    pub storage: StorageSection,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GammaSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the classbuddy config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/classbuddy` or
/// `~/.config/classbuddy`, on every platform.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME")
        && !xdg.trim().is_empty()
    {
        return PathBuf::from(xdg).join("classbuddy");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("classbuddy")
}

/// Return the path to the classbuddy config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. `Ok(None)` when there is no file.
pub fn load_config() -> Result<Option<ConfigFile>> {
    let path = config_path();
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to read config file at {}", path.display()));
        }
    };
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(Some(config))
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix: the file holds API keys.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(path)
}

/// `sk-a...wxyz` style rendering of a secret for terminal output.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values given on the command line. They win over everything else.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub llm_url: Option<String>,
    pub llm_model: Option<String>,
    pub gamma_url: Option<String>,
    pub data_dir: Option<PathBuf>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug, Clone)]
pub struct ClassBuddyConfig {
    pub chat: ChatConfig,
    pub gamma: GammaConfig,
    pub store: StoreConfig,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ClassBuddyConfig {
    /// Resolve configuration from the real environment and config file.
    pub fn resolve(overrides: &Overrides) -> Result<Self> {
        let file = load_config()?.unwrap_or_default();
        Ok(Self::from_sources(overrides, &file, |name| {
            std::env::var(name).ok()
        }))
    }

    /// Apply the chain CLI flag > env var > config file > default.
    ///
    /// API keys have no CLI flag; blank values at any level are skipped.
    pub fn from_sources(
        overrides: &Overrides,
        file: &ConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let env = |name: &str| non_blank(env(name));

        let chat = ChatConfig {
            base_url: non_blank(overrides.llm_url.clone())
                .or_else(|| env(ENV_LLM_URL))
                .or_else(|| non_blank(file.llm.base_url.clone()))
                .unwrap_or_else(|| ChatConfig::DEFAULT_BASE_URL.to_string()),
            api_key: env(ENV_LLM_API_KEY).or_else(|| non_blank(file.llm.api_key.clone())),
            model: non_blank(overrides.llm_model.clone())
                .or_else(|| env(ENV_LLM_MODEL))
                .or_else(|| non_blank(file.llm.model.clone()))
                .unwrap_or_else(|| ChatConfig::DEFAULT_MODEL.to_string()),
            max_tokens: file.llm.max_tokens.unwrap_or(ChatConfig::DEFAULT_MAX_TOKENS),
            timeout: ChatConfig::DEFAULT_TIMEOUT,
        };

        let gamma = GammaConfig {
            base_url: non_blank(overrides.gamma_url.clone())
                .or_else(|| env(ENV_GAMMA_URL))
                .or_else(|| non_blank(file.gamma.base_url.clone()))
                .unwrap_or_else(|| GammaConfig::DEFAULT_BASE_URL.to_string()),
            api_key: env(ENV_GAMMA_API_KEY).or_else(|| non_blank(file.gamma.api_key.clone())),
            timeout: GammaConfig::DEFAULT_TIMEOUT,
        };

        let data_dir = overrides
            .data_dir
            .clone()
            .or_else(|| env(StoreConfig::ENV_VAR).map(PathBuf::from))
            .or_else(|| file.storage.data_dir.clone())
            .unwrap_or_else(StoreConfig::default_data_dir);

        Self {
            chat,
            gamma,
            store: StoreConfig::new(data_dir),
        }
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        crate::test_util::lock_env()
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn file_config() -> ConfigFile {
        ConfigFile {
            llm: LlmSection {
                api_key: Some("file-llm-key".to_string()),
                base_url: Some("http://file-llm/v1".to_string()),
                model: Some("file-model".to_string()),
                max_tokens: Some(4096),
            },
            gamma: GammaSection {
                api_key: Some("file-gamma-key".to_string()),
                base_url: Some("http://file-gamma".to_string()),
            },
            storage: StorageSection {
                data_dir: Some(PathBuf::from("/file/data")),
            },
        }
    }

    #[test]
    fn defaults_when_nothing_set() {
        let cfg =
            ClassBuddyConfig::from_sources(&Overrides::default(), &ConfigFile::default(), env_of(&[]));
        assert_eq!(cfg.chat.base_url, ChatConfig::DEFAULT_BASE_URL);
        assert_eq!(cfg.chat.model, ChatConfig::DEFAULT_MODEL);
        assert_eq!(cfg.chat.max_tokens, ChatConfig::DEFAULT_MAX_TOKENS);
        assert_eq!(cfg.chat.api_key, None);
        assert_eq!(cfg.gamma.base_url, GammaConfig::DEFAULT_BASE_URL);
        assert_eq!(cfg.gamma.api_key, None);
        assert_eq!(cfg.store.data_dir, StoreConfig::default_data_dir());
    }

    #[test]
    fn config_file_beats_defaults() {
        let cfg = ClassBuddyConfig::from_sources(&Overrides::default(), &file_config(), env_of(&[]));
        assert_eq!(cfg.chat.base_url, "http://file-llm/v1");
        assert_eq!(cfg.chat.api_key.as_deref(), Some("file-llm-key"));
        assert_eq!(cfg.chat.model, "file-model");
        assert_eq!(cfg.chat.max_tokens, 4096);
        assert_eq!(cfg.gamma.api_key.as_deref(), Some("file-gamma-key"));
        assert_eq!(cfg.store.data_dir, PathBuf::from("/file/data"));
    }

    #[test]
    fn env_beats_config_file() {
        let env = env_of(&[
            (ENV_LLM_API_KEY, "env-llm-key"),
            (ENV_LLM_URL, "http://env-llm/v1"),
            (ENV_GAMMA_API_KEY, "env-gamma-key"),
            (StoreConfig::ENV_VAR, "/env/data"),
        ]);
        let cfg = ClassBuddyConfig::from_sources(&Overrides::default(), &file_config(), env);
        assert_eq!(cfg.chat.api_key.as_deref(), Some("env-llm-key"));
        assert_eq!(cfg.chat.base_url, "http://env-llm/v1");
        // Not set in env: falls through to the file.
        assert_eq!(cfg.chat.model, "file-model");
        assert_eq!(cfg.gamma.api_key.as_deref(), Some("env-gamma-key"));
        assert_eq!(cfg.store.data_dir, PathBuf::from("/env/data"));
    }

    #[test]
    fn cli_flag_overrides_all() {
        let overrides = Overrides {
            llm_url: Some("http://cli-llm/v1".to_string()),
            llm_model: Some("cli-model".to_string()),
            gamma_url: Some("http://cli-gamma".to_string()),
            data_dir: Some(PathBuf::from("/cli/data")),
        };
        let env = env_of(&[
            (ENV_LLM_URL, "http://env-llm/v1"),
            (ENV_LLM_MODEL, "env-model"),
            (ENV_GAMMA_URL, "http://env-gamma"),
            (StoreConfig::ENV_VAR, "/env/data"),
        ]);
        let cfg = ClassBuddyConfig::from_sources(&overrides, &file_config(), env);
        assert_eq!(cfg.chat.base_url, "http://cli-llm/v1");
        assert_eq!(cfg.chat.model, "cli-model");
        assert_eq!(cfg.gamma.base_url, "http://cli-gamma");
        assert_eq!(cfg.store.data_dir, PathBuf::from("/cli/data"));
    }

    #[test]
    fn blank_env_values_are_skipped() {
        let env = env_of(&[(ENV_LLM_API_KEY, "  "), (ENV_GAMMA_API_KEY, "")]);
        let cfg = ClassBuddyConfig::from_sources(&Overrides::default(), &file_config(), env);
        assert_eq!(cfg.chat.api_key.as_deref(), Some("file-llm-key"));
        assert_eq!(cfg.gamma.api_key.as_deref(), Some("file-gamma-key"));
    }

    #[test]
    fn partial_config_file_parses() {
        let cfg: ConfigFile = toml::from_str("[gamma]\napi_key = \"g\"\n").unwrap();
        assert_eq!(cfg.gamma.api_key.as_deref(), Some("g"));
        assert_eq!(cfg.llm, LlmSection::default());
        assert_eq!(cfg.storage.data_dir, None);
    }

    #[test]
    fn mask_secret_hides_the_middle() {
        assert_eq!(mask_secret("sk-abcdefghijklmnop"), "sk-a...mnop");
        assert_eq!(mask_secret("short"), "****");
    }

    #[test]
    fn save_and_load_config_roundtrip() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let orig_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe { std::env::set_var("XDG_CONFIG_HOME", tmp.path()) };

        let missing = load_config();
        let saved = save_config(&file_config());
        let loaded = load_config();

        match orig_xdg {
            Some(x) => unsafe { std::env::set_var("XDG_CONFIG_HOME", x) },
            None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
        }

        assert!(missing.unwrap().is_none());
        let path = saved.unwrap();
        assert_eq!(path, tmp.path().join("classbuddy").join("config.toml"));
        assert_eq!(loaded.unwrap(), Some(file_config()));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let meta = std::fs::metadata(&path).unwrap();
            assert_eq!(meta.permissions().mode() & 0o777, 0o600);
        }
    }

    #[test]
    fn corrupted_config_file_is_an_error() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("classbuddy");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.toml"), "[llm\nbroken").unwrap();

        let orig_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe { std::env::set_var("XDG_CONFIG_HOME", tmp.path()) };
        let result = ClassBuddyConfig::resolve(&Overrides::default());
        match orig_xdg {
            Some(x) => unsafe { std::env::set_var("XDG_CONFIG_HOME", x) },
            None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
        }

        let msg = format!("{:#}", result.unwrap_err());
        assert!(msg.contains("failed to parse config file"), "unexpected error: {msg}");
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let _lock = lock_env();
        let path = config_path();
        assert!(
            path.ends_with("classbuddy/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
