use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::catalog::Category;
use super::platform;
use super::player::DEFAULT_SKIP_SECS;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub mpv: MpvConfig,
}

/// Where episodes and category blurbs come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Firestore REST root, without the `/projects/...` part.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_project_id")]
    pub project_id: String,
    /// Web API key; public collections work without one.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Step for the skip back / skip forward shortcuts.
    #[serde(default = "default_skip_seconds")]
    pub skip_seconds: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub default_category: Category,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MpvConfig {
    /// Output level mpv is started with (0–100).
    #[serde(default = "default_volume")]
    pub volume: u8,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            project_id: default_project_id(),
            api_key: None,
            page_size: default_page_size(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            skip_seconds: default_skip_seconds(),
        }
    }
}

impl Default for MpvConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
        }
    }
}

fn default_base_url() -> String {
    "https://firestore.googleapis.com/v1".to_string()
}

fn default_project_id() -> String {
    "p0dcast".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_skip_seconds() -> f64 {
    DEFAULT_SKIP_SECS
}

fn default_volume() -> u8 {
    80
}

impl Config {
    /// Load from the default location, writing defaults on first run.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.sanitize();
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }

    fn sanitize(&mut self) {
        let skip = self.player.skip_seconds;
        if !skip.is_finite() || skip <= 0.0 {
            self.player.skip_seconds = default_skip_seconds();
        }
        self.catalog.page_size = self.catalog.page_size.max(1);
        self.mpv.volume = self.mpv.volume.min(100);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.catalog.base_url.starts_with("https://"));
        assert!(config.catalog.api_key.is_none());
        assert_eq!(config.player.skip_seconds, 10.0);
        assert_eq!(config.ui.default_category, Category::Podcasts);
        assert!(Config::config_path().ends_with("p0dcast/config.toml"));
    }

    #[test]
    fn test_first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.catalog.page_size, 100);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[catalog]\nproject_id = \"other\"\n\n[ui]\ndefault_category = \"funny\"\n",
        )
        .unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.catalog.project_id, "other");
        assert_eq!(config.catalog.page_size, 100);
        assert_eq!(config.ui.default_category, Category::Funny);
        assert_eq!(config.mpv.volume, 80);
    }

    #[test]
    fn test_nonsense_skip_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[player]\nskip_seconds = -4.0\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.player.skip_seconds, DEFAULT_SKIP_SECS);
    }

    #[test]
    fn test_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.catalog.api_key = Some("k".into());
        config.player.skip_seconds = 30.0;
        config.save_to(&path).unwrap();
        let back = Config::load_from(&path).unwrap();
        assert_eq!(back.catalog.api_key.as_deref(), Some("k"));
        assert_eq!(back.player.skip_seconds, 30.0);
    }
}
