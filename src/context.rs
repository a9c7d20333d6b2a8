// File: ./src/context.rs
/*! Application context abstraction for filesystem paths.

`StandardContext` resolves the data/config/cache directories through
`directories::ProjectDirs`, or under an override root (Android files dir,
`--root` on the CLI). `TestContext` creates a temporary directory for
isolated tests and removes it when dropped.

Everything that touches the filesystem takes a `&dyn AppContext`; there are
no environment-variable or global path lookups.
*/

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Defines the file system context for the application.
///
/// The trait is object-safe so callers can hold `Arc<dyn AppContext>`.
pub trait AppContext: Send + Sync + std::fmt::Debug {
    fn get_data_dir(&self) -> Result<PathBuf>;
    fn get_config_dir(&self) -> Result<PathBuf>;
    fn get_cache_dir(&self) -> Result<PathBuf>;

    fn get_config_file_path(&self) -> Result<PathBuf> {
        Ok(self.get_config_dir()?.join("config.toml"))
    }

    fn get_tickets_path(&self) -> Result<PathBuf> {
        Ok(self.get_data_dir()?.join("tickets.json"))
    }

    fn get_auth_path(&self) -> Result<PathBuf> {
        Ok(self.get_data_dir()?.join("auth.json"))
    }

    fn get_reminder_index_path(&self) -> Option<PathBuf> {
        self.get_data_dir().ok().map(|p| p.join("reminders.json"))
    }

    fn get_log_path(&self) -> Option<PathBuf> {
        self.get_cache_dir().ok().map(|p| p.join("kinopass.log"))
    }
}

// --- Production Implementation ---

#[derive(Clone, Debug)]
pub struct StandardContext {
    override_root: Option<PathBuf>,
}

impl StandardContext {
    /// When `override_root` is `Some(path)`, all directories will be created
    /// under that root using `data`, `config`, and `cache` subdirectories.
    pub fn new(override_root: Option<PathBuf>) -> Self {
        Self { override_root }
    }

    fn ensure_exists(path: PathBuf) -> Result<PathBuf> {
        if !path.exists() {
            std::fs::create_dir_all(&path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(path)
    }

    fn get_proj_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("no", "usn", "kinopass")
    }

    fn resolve(&self, sub: &str, pick: fn(&ProjectDirs) -> PathBuf) -> Result<PathBuf> {
        if let Some(root) = &self.override_root {
            return Self::ensure_exists(root.join(sub));
        }
        let proj = Self::get_proj_dirs().ok_or_else(|| anyhow::anyhow!("No home directory"))?;
        Self::ensure_exists(pick(&proj))
    }
}

impl AppContext for StandardContext {
    fn get_data_dir(&self) -> Result<PathBuf> {
        self.resolve("data", |p| p.data_dir().to_path_buf())
    }

    fn get_config_dir(&self) -> Result<PathBuf> {
        self.resolve("config", |p| p.config_dir().to_path_buf())
    }

    fn get_cache_dir(&self) -> Result<PathBuf> {
        self.resolve("cache", |p| p.cache_dir().to_path_buf())
    }
}

// --- Test Implementation ---

#[derive(Clone, Debug)]
pub struct TestContext {
    pub root: PathBuf,
}

impl TestContext {
    /// Creates a new TestContext backed by a unique temporary directory.
    pub fn new() -> Self {
        let uuid = uuid::Uuid::new_v4();
        let root = std::env::temp_dir().join(format!("kinopass_test_{}", uuid));
        // Tests will panic if this fails.
        std::fs::create_dir_all(&root).expect("failed to create TestContext temp dir");
        Self { root }
    }

    fn sub(&self, name: &str) -> Result<PathBuf> {
        let p = self.root.join(name);
        std::fs::create_dir_all(&p)?;
        Ok(p)
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AppContext for TestContext {
    fn get_data_dir(&self) -> Result<PathBuf> {
        self.sub("data")
    }

    fn get_config_dir(&self) -> Result<PathBuf> {
        self.sub("config")
    }

    fn get_cache_dir(&self) -> Result<PathBuf> {
        self.sub("cache")
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}
