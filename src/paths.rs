// File: src/paths.rs
use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// Allow injecting a base path (from Android Context)
static ANDROID_DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

const TEST_DIR_VAR: &str = "ROUTEWISE_TEST_DIR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppDir {
    Data,
    Config,
}

impl AppDir {
    fn subdir(self) -> &'static str {
        match self {
            AppDir::Data => "data",
            AppDir::Config => "config",
        }
    }

    /// Android override first, then the test override, then the OS default.
    fn resolve(self, android_root: Option<&Path>, test_root: Option<&Path>) -> Option<PathBuf> {
        // On Android, everything lives in the app's private files directory.
        if let Some(root) = android_root.or(test_root) {
            return Some(root.join(self.subdir()));
        }
        let proj = ProjectDirs::from("com", "routewise", "routewise")?;
        let dir = match self {
            AppDir::Data => proj.data_dir(),
            AppDir::Config => proj.config_dir(),
        };
        Some(dir.to_path_buf())
    }

    fn ensure(self) -> Result<PathBuf> {
        let test_root = env::var_os(TEST_DIR_VAR).map(PathBuf::from);
        let path = self
            .resolve(ANDROID_DATA_DIR.get().map(PathBuf::as_path), test_root.as_deref())
            .ok_or_else(|| anyhow::anyhow!("Could not determine {} directory", self.subdir()))?;
        if !path.exists() {
            fs::create_dir_all(&path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(path)
    }
}

pub struct AppPaths;

impl AppPaths {
    /// Initialize the Android data directory. Must be called once at startup.
    pub fn init_android_path(path: String) {
        let _ = ANDROID_DATA_DIR.set(PathBuf::from(path));
    }

    pub fn get_data_dir() -> Result<PathBuf> {
        AppDir::Data.ensure()
    }

    pub fn get_config_dir() -> Result<PathBuf> {
        AppDir::Config.ensure()
    }

    pub fn get_config_file_path() -> Result<PathBuf> {
        Ok(Self::get_config_dir()?.join("config.toml"))
    }

    pub fn get_state_path() -> Option<PathBuf> {
        Self::get_data_dir().ok().map(|p| p.join("state.json"))
    }
}
