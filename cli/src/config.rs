//! Configuration management for apg.
//!
//! Configuration is stored in ~/.apg/config.yaml and holds named render
//! profiles. A profile only records the settings it overrides; anything
//! unset falls through to the built-in defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use apg_program::{Accent, Mode, OutputFormat, RenderConfig};
use serde::{Deserialize, Serialize};

use crate::paths::Paths;

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Name of the currently active profile.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub current_profile: String,

    /// Map of profile name to profile.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub profiles: BTreeMap<String, Profile>,

    /// Path to the config file (not serialized).
    #[serde(skip)]
    config_path: PathBuf,
}

/// Render defaults saved under a name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Profile name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent: Option<Accent>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slow: Option<bool>,

    /// Background attenuation in dB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attenuation: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_in_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_out_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,

    /// Overall synthesis timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_progress: Option<bool>,

    /// Reuse audio for repeated phrases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<bool>,
}

impl Profile {
    /// Overlays the settings this profile defines onto `config`.
    pub fn apply(&self, config: &mut RenderConfig) {
        if let Some(accent) = self.accent {
            config.accent = accent;
        }
        if let Some(lang) = &self.lang {
            config.lang = lang.clone();
        }
        if let Some(slow) = self.slow {
            config.slow = slow;
        }
        if let Some(db) = self.attenuation {
            config.attenuation_db = db;
        }
        if let Some(ms) = self.fade_in_ms {
            config.fade_in = Duration::from_millis(ms);
        }
        if let Some(ms) = self.fade_out_ms {
            config.fade_out = Duration::from_millis(ms);
        }
        if let Some(n) = self.concurrency {
            config.concurrency = n;
        }
        if let Some(format) = self.format {
            config.output_format = format;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(secs) = self.timeout {
            config.timeout = Some(Duration::from_secs(secs));
        }
        if let Some(n) = self.max_retries {
            config.max_retries = n;
        }
        if let Some(hide) = self.hide_progress {
            config.show_progress = !hide;
        }
    }
}

impl Config {
    /// Gets the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        Paths::new().ok().map(|p| p.config_file())
    }

    /// Returns the config file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Saves the configuration to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Adds or replaces a profile.
    pub fn add_profile(&mut self, name: &str, mut profile: Profile) -> anyhow::Result<()> {
        if name.trim().is_empty() {
            anyhow::bail!("profile name must be non-empty");
        }
        profile.name = name.to_string();
        self.profiles.insert(name.to_string(), profile);
        self.save()
    }

    /// Deletes a profile.
    pub fn delete_profile(&mut self, name: &str) -> anyhow::Result<()> {
        if self.profiles.remove(name).is_none() {
            anyhow::bail!("profile '{}' not found", name);
        }
        if self.current_profile == name {
            self.current_profile.clear();
        }
        self.save()
    }

    /// Sets the current profile.
    pub fn use_profile(&mut self, name: &str) -> anyhow::Result<()> {
        if !self.profiles.contains_key(name) {
            anyhow::bail!("profile '{}' not found", name);
        }
        self.current_profile = name.to_string();
        self.save()
    }

    /// Gets a specific profile.
    pub fn get_profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    /// Gets the current profile.
    pub fn get_current_profile(&self) -> Option<&Profile> {
        if self.current_profile.is_empty() {
            return None;
        }
        self.profiles.get(&self.current_profile)
    }

    /// Resolves the profile by name, or the current profile if no name is given.
    ///
    /// Naming a profile that does not exist is an error; having no current
    /// profile is not.
    pub fn resolve_profile(&self, name: Option<&str>) -> anyhow::Result<Option<&Profile>> {
        match name {
            Some(n) if !n.is_empty() => self
                .get_profile(n)
                .map(Some)
                .ok_or_else(|| anyhow::anyhow!("profile '{}' not found", n)),
            _ => Ok(self.get_current_profile()),
        }
    }

    /// Lists all profile names, sorted.
    pub fn list_profiles(&self) -> Vec<&str> {
        self.profiles.keys().map(|s| s.as_str()).collect()
    }
}

/// Loads configuration from `custom_path`, or ~/.apg/config.yaml.
///
/// A missing file yields an empty configuration; it is written on the
/// first save.
pub fn load_config(custom_path: Option<&Path>) -> anyhow::Result<Config> {
    let config_path = match custom_path {
        Some(p) => p.to_path_buf(),
        None => Config::default_config_path()
            .ok_or_else(|| anyhow::anyhow!("cannot determine config path"))?,
    };

    // Ensure config directory exists
    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut cfg: Config = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&content)?
        }
    } else {
        Config::default()
    };

    cfg.config_path = config_path;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config() -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let cfg = load_config(Some(&path)).unwrap();
        (dir, cfg)
    }

    fn calm() -> Profile {
        Profile {
            accent: Some(Accent::UK),
            attenuation: Some(12.0),
            fade_out_ms: Some(9000),
            format: Some(OutputFormat::Mp3),
            ..Default::default()
        }
    }

    #[test]
    fn test_load_missing_file() {
        let (_dir, cfg) = temp_config();
        assert!(cfg.profiles.is_empty());
        assert!(cfg.current_profile.is_empty());
        assert!(cfg.path().parent().unwrap().is_dir());
    }

    #[test]
    fn test_profile_lifecycle() {
        let (_dir, mut cfg) = temp_config();
        cfg.add_profile("calm", calm()).unwrap();
        cfg.add_profile("brisk", Profile::default()).unwrap();
        cfg.use_profile("calm").unwrap();

        let reloaded = load_config(Some(cfg.path())).unwrap();
        assert_eq!(reloaded.current_profile, "calm");
        assert_eq!(reloaded.list_profiles(), vec!["brisk", "calm"]);
        let profile = reloaded.get_current_profile().unwrap();
        assert_eq!(profile.name, "calm");
        assert_eq!(profile.accent, Some(Accent::UK));

        cfg.delete_profile("calm").unwrap();
        assert!(cfg.current_profile.is_empty());
        assert!(cfg.delete_profile("calm").is_err());
        assert!(cfg.use_profile("missing").is_err());
    }

    #[test]
    fn test_resolve_profile() {
        let (_dir, mut cfg) = temp_config();
        assert!(cfg.resolve_profile(None).unwrap().is_none());

        cfg.add_profile("calm", calm()).unwrap();
        cfg.use_profile("calm").unwrap();
        assert_eq!(cfg.resolve_profile(None).unwrap().unwrap().name, "calm");
        assert_eq!(cfg.resolve_profile(Some("")).unwrap().unwrap().name, "calm");
        assert!(cfg.resolve_profile(Some("other")).is_err());
    }

    #[test]
    fn test_yaml_shape() {
        let (_dir, mut cfg) = temp_config();
        cfg.add_profile("calm", calm()).unwrap();
        let content = std::fs::read_to_string(cfg.path()).unwrap();
        assert!(content.contains("accent: UK"));
        assert!(content.contains("format: mp3"));
        assert!(!content.contains("slow"));
    }

    #[test]
    fn test_apply_profile() {
        let mut config = RenderConfig::default();
        Profile {
            hide_progress: Some(true),
            timeout: Some(30),
            mode: Some(Mode::Book),
            ..calm()
        }
        .apply(&mut config);

        assert_eq!(config.accent, Accent::UK);
        assert_eq!(config.attenuation_db, 12.0);
        assert_eq!(config.fade_in, Duration::from_millis(3000));
        assert_eq!(config.fade_out, Duration::from_millis(9000));
        assert_eq!(config.output_format, OutputFormat::Mp3);
        assert_eq!(config.mode, Mode::Book);
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert!(!config.show_progress);
    }
}
