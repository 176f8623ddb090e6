//! Persistent configuration for think.
//!
//! One TOML record per user holds an API key and default model per
//! provider, plus the default provider. The record is loaded once per
//! process and every setter writes it straight back to disk.
//!
//! ```toml
//! defaultProvider = "openai"
//!
//! [providers.openai]
//! apiKey = "sk-..."
//! defaultModel = "gpt-4o"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, ThinkError};

pub const DEFAULT_PROVIDER: &str = "openai";
pub const CONFIG_PATH_ENV: &str = "THINK_CONFIG";

/// Settings stored for a single provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    /// Endpoint base URL override (proxies, compatible gateways).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalConfig {
    #[serde(default = "default_provider")]
    pub default_provider: String,
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            providers: BTreeMap::new(),
        }
    }
}

/// Handle to the on-disk configuration record.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    data: GlobalConfig,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

impl ConfigStore {
    /// `$THINK_CONFIG`, or `~/.think/config.toml`.
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        let home = dirs::home_dir().ok_or(ThinkError::NoHomeDir)?;
        Ok(home.join(".think").join("config.toml"))
    }

    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    /// Load the record at `path`. A missing file yields the defaults and is
    /// only created by the first setter.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = if path.exists() {
            let content =
                std::fs::read_to_string(&path).map_err(|source| ThinkError::ConfigRead {
                    path: path.clone(),
                    source,
                })?;
            toml::from_str(&content).map_err(|source| ThinkError::ConfigParse {
                path: path.clone(),
                source,
            })?
        } else {
            GlobalConfig::default()
        };
        debug!(path = %path.display(), providers = data.providers.len(), "loaded configuration");
        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.data.providers.get(provider)
    }

    pub fn api_key(&self, provider: &str) -> Option<&str> {
        self.provider_config(provider)
            .and_then(|p| non_empty(p.api_key.as_ref()))
    }

    pub fn default_model(&self, provider: &str) -> Option<&str> {
        self.provider_config(provider)
            .and_then(|p| non_empty(p.default_model.as_ref()))
    }

    pub fn api_base(&self, provider: &str) -> Option<&str> {
        self.provider_config(provider)
            .and_then(|p| non_empty(p.api_base.as_ref()))
    }

    pub fn default_provider(&self) -> &str {
        if self.data.default_provider.is_empty() {
            DEFAULT_PROVIDER
        } else {
            &self.data.default_provider
        }
    }

    pub fn set_api_key(&mut self, provider: &str, api_key: &str) -> Result<()> {
        self.provider_entry(provider).api_key = Some(api_key.to_string());
        self.save()
    }

    pub fn set_default_model(&mut self, provider: &str, model: &str) -> Result<()> {
        self.provider_entry(provider).default_model = Some(model.to_string());
        self.save()
    }

    pub fn set_api_base(&mut self, provider: &str, api_base: &str) -> Result<()> {
        self.provider_entry(provider).api_base = Some(api_base.to_string());
        self.save()
    }

    pub fn set_default_provider(&mut self, provider: &str) -> Result<()> {
        self.data.default_provider = provider.to_string();
        self.save()
    }

    fn provider_entry(&mut self, provider: &str) -> &mut ProviderConfig {
        self.data.providers.entry(provider.to_string()).or_default()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ThinkError::ConfigWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content =
            toml::to_string_pretty(&self.data).map_err(|source| ThinkError::ConfigSerialize {
                path: self.path.clone(),
                source,
            })?;
        std::fs::write(&self.path, content).map_err(|source| ThinkError::ConfigWrite {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), "saved configuration");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, ConfigStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::open(dir.path().join("think").join("config.toml")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_missing_file_yields_defaults_without_writing() {
        let (_dir, store) = temp_store();
        assert_eq!(store.default_provider(), "openai");
        assert!(store.provider_config("openai").is_none());
        assert!(store.api_key("openai").is_none());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_setters_write_through() {
        let (_dir, mut store) = temp_store();
        store.set_api_key("anthropic", "sk-ant-1").unwrap();
        store.set_default_model("anthropic", "claude-3-haiku-20240307").unwrap();
        assert!(store.path().exists());

        let reopened = ConfigStore::open(store.path()).unwrap();
        assert_eq!(reopened.api_key("anthropic"), Some("sk-ant-1"));
        assert_eq!(
            reopened.default_model("anthropic"),
            Some("claude-3-haiku-20240307")
        );
        assert!(reopened.api_key("openai").is_none());
    }

    #[test]
    fn test_set_api_key_overwrites() {
        let (_dir, mut store) = temp_store();
        store.set_api_key("openai", "old").unwrap();
        store.set_api_key("openai", "new").unwrap();
        assert_eq!(store.api_key("openai"), Some("new"));
    }

    #[test]
    fn test_default_provider_roundtrip_is_idempotent() {
        let (_dir, mut store) = temp_store();
        store.set_default_provider("anthropic").unwrap();
        store.set_default_provider("anthropic").unwrap();
        assert_eq!(store.default_provider(), "anthropic");

        let reopened = ConfigStore::open(store.path()).unwrap();
        assert_eq!(reopened.default_provider(), "anthropic");
    }

    #[test]
    fn test_file_uses_logical_key_names() {
        let (_dir, mut store) = temp_store();
        store.set_api_key("openai", "sk-1").unwrap();
        store.set_default_model("openai", "gpt-4o").unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        assert!(content.contains("defaultProvider = \"openai\""), "{content}");
        assert!(content.contains("[providers.openai]"), "{content}");
        assert!(content.contains("apiKey = \"sk-1\""), "{content}");
        assert!(content.contains("defaultModel = \"gpt-4o\""), "{content}");
    }

    #[test]
    fn test_parse_hand_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[providers.anthropic]
apiKey = "sk-ant"
apiBase = "http://localhost:9000"
"#,
        )
        .unwrap();

        let store = ConfigStore::open(&path).unwrap();
        assert_eq!(store.default_provider(), "openai");
        assert_eq!(store.api_key("anthropic"), Some("sk-ant"));
        assert_eq!(store.api_base("anthropic"), Some("http://localhost:9000"));
        assert!(store.default_model("anthropic").is_none());
    }

    #[test]
    fn test_empty_values_read_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "defaultProvider = \"\"\n[providers.openai]\napiKey = \"\"\ndefaultModel = \"\"\n",
        )
        .unwrap();

        let store = ConfigStore::open(&path).unwrap();
        assert_eq!(store.default_provider(), "openai");
        assert!(store.api_key("openai").is_none());
        assert!(store.default_model("openai").is_none());
        assert!(store.provider_config("openai").is_some());
    }

    #[test]
    fn test_invalid_file_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "defaultProvider = [").unwrap();

        let err = ConfigStore::open(&path).unwrap_err();
        assert!(matches!(err, ThinkError::ConfigParse { .. }), "{err}");
    }
}
