// File: ./src/config.rs
// Handles configuration loading, saving, and defaults.
use crate::context::AppContext;
use crate::storage::LocalStorage;
use anyhow::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;

fn default_true() -> bool {
    true
}

fn default_app_name() -> String {
    "Kinopass".to_string()
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Whether precise reminders are allowed. Off means every reminder
    /// goes through the deferred queue.
    #[serde(default = "default_true")]
    pub exact_alarms_permitted: bool,

    #[serde(default = "default_true")]
    pub notifications_enabled: bool,

    #[serde(default = "default_app_name")]
    pub app_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exact_alarms_permitted: true,
            notifications_enabled: true,
            app_name: default_app_name(),
        }
    }
}

impl Config {
    /// Load the configuration from disk.
    /// Returns a contextualized error if the file is missing, unreadable or malformed.
    pub fn load(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.get_config_file_path()?;

        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found"));
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;

        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    /// Malformed files are still reported.
    pub fn load_or_default(ctx: &dyn AppContext) -> Result<Self> {
        match Self::load(ctx) {
            Ok(cfg) => Ok(cfg),
            Err(e) if Self::is_missing_config_error(&e) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Detects whether an error means the config file was missing, either
    /// through our explicit message or an IO NotFound anywhere in the chain.
    pub fn is_missing_config_error(err: &Error) -> bool {
        if err.to_string().contains("Config file not found") {
            return true;
        }

        for cause in err.chain() {
            if let Some(io_err) = cause.downcast_ref::<std::io::Error>()
                && io_err.kind() == std::io::ErrorKind::NotFound
            {
                return true;
            }
        }

        false
    }

    pub fn save(&self, ctx: &dyn AppContext) -> Result<()> {
        let path = ctx.get_config_file_path()?;
        LocalStorage::with_lock(&path, || {
            let toml_str = toml::to_string_pretty(self)?;
            LocalStorage::atomic_write(&path, toml_str)?;
            Ok(())
        })?;
        Ok(())
    }

    pub fn get_path_string(ctx: &dyn AppContext) -> Result<String> {
        let path = ctx.get_config_file_path()?;
        Ok(path.to_string_lossy().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TestContext;

    #[test]
    fn test_missing_config_is_detected() {
        let ctx = TestContext::new();
        let err = Config::load(&ctx).unwrap_err();
        assert!(Config::is_missing_config_error(&err));
        assert_eq!(Config::load_or_default(&ctx).unwrap(), Config::default());
    }

    #[test]
    fn test_save_and_reload() {
        let ctx = TestContext::new();
        let cfg = Config {
            exact_alarms_permitted: false,
            app_name: "Kinopass Desktop".to_string(),
            ..Config::default()
        };
        cfg.save(&ctx).unwrap();
        assert_eq!(Config::load(&ctx).unwrap(), cfg);
    }

    #[test]
    fn test_partial_file_uses_field_defaults() {
        let ctx = TestContext::new();
        let path = ctx.get_config_file_path().unwrap();
        fs::write(&path, "notifications_enabled = false\n").unwrap();

        let cfg = Config::load(&ctx).unwrap();
        assert!(!cfg.notifications_enabled);
        assert!(cfg.exact_alarms_permitted);
        assert_eq!(cfg.app_name, "Kinopass");
    }

    #[test]
    fn test_malformed_file_is_not_treated_as_missing() {
        let ctx = TestContext::new();
        let path = ctx.get_config_file_path().unwrap();
        fs::write(&path, "exact_alarms_permitted = maybe").unwrap();

        let err = Config::load_or_default(&ctx).unwrap_err();
        assert!(!Config::is_missing_config_error(&err));
    }

    #[test]
    fn test_settings_from_older_files_are_ignored() {
        let ctx = TestContext::new();
        let path = ctx.get_config_file_path().unwrap();
        fs::write(&path, "theme = \"Dark\"\nexact_alarms_permitted = false\n").unwrap();

        let cfg = Config::load(&ctx).unwrap();
        assert!(!cfg.exact_alarms_permitted);
        cfg.save(&ctx).unwrap();
        assert!(!fs::read_to_string(&path).unwrap().contains("theme"));
    }
}
