use color_eyre::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Key under which the connection settings are stored
pub const CONFIG_KEY: &str = "lmstudio-config";
/// Key under which the colour theme is stored
pub const THEME_KEY: &str = "theme";

const HOME_OVERRIDE_VAR: &str = "LMCHAT_HOME";

/// Connection settings for the inference server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Config {
    /// Server base URL without trailing slashes, `None` when unset or blank
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.api_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }

    /// Selected model, `None` when unset or blank so the server picks its default
    #[must_use]
    pub fn selected_model(&self) -> Option<&str> {
        self.model.as_deref().filter(|model| !model.is_empty())
    }
}

/// Colour theme of the terminal UI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub fn as_key(self) -> &'static str {
        match self {
            Theme::Light => "theme-light",
            Theme::Dark => "theme-dark",
        }
    }

    #[must_use]
    pub fn from_key(value: &str) -> Option<Self> {
        match value.trim() {
            "theme-light" => Some(Theme::Light),
            "theme-dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Per-user directories for settings, history and logs
#[derive(Debug, Clone)]
pub struct AppDirs {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl AppDirs {
    /// Resolves platform directories, honouring `LMCHAT_HOME` when set
    pub fn resolve() -> Result<Self> {
        if let Some(home) = std::env::var_os(HOME_OVERRIDE_VAR) {
            return Ok(Self::rooted_at(PathBuf::from(home)));
        }
        let proj_dirs = ProjectDirs::from("", "", "lmchat")
            .ok_or_else(|| color_eyre::eyre::eyre!("Could not determine config directory"))?;
        Ok(Self {
            config_dir: proj_dirs.config_dir().to_path_buf(),
            data_dir: proj_dirs.data_dir().to_path_buf(),
        })
    }

    #[must_use]
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            config_dir: root.join("config"),
            data_dir: root.join("data"),
        }
    }

    #[must_use]
    pub fn history_db(&self) -> PathBuf {
        self.data_dir.join("history.db")
    }

    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("lmchat.log")
    }
}

/// Small key-value store: one file per key inside a directory
#[derive(Debug, Clone)]
pub struct Preferences {
    root: PathBuf,
}

impl Preferences {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Reads the raw value of `key`; a missing key is `Ok(None)`
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    /// Overwrites `key`; readers never observe a half-written value
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let final_path = self.key_path(key);
        let temp_path = self.root.join(format!(".{key}.tmp"));
        fs::write(&temp_path, value)?;
        fs::rename(&temp_path, &final_path)?;
        Ok(())
    }
}

/// Persists the singleton [`Config`] and the theme preference
#[derive(Debug, Clone)]
pub struct ConfigStore {
    prefs: Preferences,
}

impl ConfigStore {
    pub fn new(prefs: Preferences) -> Self {
        Self { prefs }
    }

    pub fn open(dirs: &AppDirs) -> Self {
        Self::new(Preferences::new(&dirs.config_dir))
    }

    /// Loads the config; absent or unreadable values yield an empty config
    #[must_use]
    pub fn load(&self) -> Config {
        let raw = match self.prefs.get(CONFIG_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Config::default(),
            Err(error) => {
                tracing::warn!(%error, "could not read stored config");
                return Config::default();
            }
        };

        match serde_json::from_str::<Option<Config>>(&raw) {
            Ok(config) => config.unwrap_or_default(),
            Err(error) => {
                tracing::warn!(%error, "stored config is malformed, using defaults");
                Config::default()
            }
        }
    }

    /// Overwrites the stored config
    pub fn save(&self, config: &Config) -> Result<()> {
        let json = serde_json::to_string(config)?;
        self.prefs.set(CONFIG_KEY, &json)
    }

    /// Loads, mutates and saves the config in one step
    pub fn update(&self, change: impl FnOnce(&mut Config)) -> Result<Config> {
        let mut config = self.load();
        change(&mut config);
        self.save(&config)?;
        Ok(config)
    }

    #[must_use]
    pub fn load_theme(&self) -> Theme {
        match self.prefs.get(THEME_KEY) {
            Ok(Some(value)) => Theme::from_key(&value).unwrap_or_default(),
            Ok(None) => Theme::default(),
            Err(error) => {
                tracing::warn!(%error, "could not read stored theme");
                Theme::default()
            }
        }
    }

    pub fn save_theme(&self, theme: Theme) -> Result<()> {
        self.prefs.set(THEME_KEY, theme.as_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> ConfigStore {
        ConfigStore::new(Preferences::new(dir.path().join("config")))
    }

    #[test]
    fn load_without_prior_save_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn malformed_value_falls_back_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = Preferences::new(dir.path());
        prefs.set(CONFIG_KEY, "{not json").unwrap();
        let store = ConfigStore::new(prefs.clone());
        assert_eq!(store.load(), Config::default());

        prefs.set(CONFIG_KEY, "null").unwrap();
        assert_eq!(store.load(), Config::default());

        prefs.set(CONFIG_KEY, "[1, 2]").unwrap();
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn save_uses_camel_case_and_omits_unset_fields() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = Preferences::new(dir.path());
        let store = ConfigStore::new(prefs.clone());
        store
            .save(&Config {
                api_url: Some("http://localhost:1234".to_string()),
                model: None,
            })
            .unwrap();

        let raw = prefs.get(CONFIG_KEY).unwrap().unwrap();
        assert_eq!(raw, r#"{"apiUrl":"http://localhost:1234"}"#);
        assert_eq!(
            store.load().api_url.as_deref(),
            Some("http://localhost:1234")
        );
    }

    #[test]
    fn save_overwrites_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .save(&Config {
                api_url: Some("http://a".to_string()),
                model: Some("m1".to_string()),
            })
            .unwrap();
        store
            .save(&Config {
                api_url: Some("http://b".to_string()),
                model: None,
            })
            .unwrap();

        let loaded = store.load();
        assert_eq!(loaded.api_url.as_deref(), Some("http://b"));
        assert_eq!(loaded.model, None);
    }

    #[test]
    fn update_preserves_untouched_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .save(&Config {
                api_url: Some("http://localhost:1234".to_string()),
                model: None,
            })
            .unwrap();

        let updated = store
            .update(|config| config.model = Some("qwen".to_string()))
            .unwrap();
        assert_eq!(updated.api_url.as_deref(), Some("http://localhost:1234"));
        assert_eq!(store.load().model.as_deref(), Some("qwen"));
    }

    #[test]
    fn base_url_trims_trailing_slashes_and_blank_values() {
        let config = Config {
            api_url: Some("http://localhost:1234///".to_string()),
            model: Some(String::new()),
        };
        assert_eq!(config.base_url(), Some("http://localhost:1234"));
        assert_eq!(config.selected_model(), None);

        let blank = Config {
            api_url: Some("   ".to_string()),
            model: None,
        };
        assert_eq!(blank.base_url(), None);
    }

    #[test]
    fn theme_defaults_to_light_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.load_theme(), Theme::Light);

        store.save_theme(Theme::Dark).unwrap();
        assert_eq!(store.load_theme(), Theme::Dark);
        assert_eq!(store.load_theme().toggled(), Theme::Light);
    }
}
