// File: src/storage.rs
use crate::favourites::Favourites;
use crate::paths::AppPaths;
use crate::store::{AuthState, PersistedState, ThemeState};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(not(target_os = "android"))]
use fs2::FileExt;

/// What came back from disk, plus anything that had to be thrown away.
#[derive(Debug, Default)]
pub struct Rehydrated {
    pub state: PersistedState,
    pub warnings: Vec<String>,
}

/// Durable key-value storage for the persisted slices.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `state.json` in the platform data directory.
    pub fn default_location() -> Option<Self> {
        AppPaths::get_state_path().map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Helper to get a sidecar lock file path (e.g., "state.json.lock")
    #[cfg(not(target_os = "android"))]
    fn get_lock_path(file_path: &Path) -> PathBuf {
        let mut lock_path = file_path.to_path_buf();
        if let Some(ext) = lock_path.extension() {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".lock");
            lock_path.set_extension(new_ext);
        } else {
            lock_path.set_extension("lock");
        }
        lock_path
    }

    /// Execute a closure while holding an exclusive lock on the sidecar file.
    pub fn with_lock<F, T>(file_path: &Path, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        #[cfg(target_os = "android")]
        {
            let _ = file_path;
            f()
        }

        #[cfg(not(target_os = "android"))]
        {
            let lock_path = Self::get_lock_path(file_path);
            let file = fs::OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&lock_path)
                .with_context(|| format!("Failed to open lock file: {:?}", lock_path))?;

            file.lock_exclusive()?;
            let result = f();
            file.unlock()?;
            result
        }
    }

    /// Atomic write: Write to .tmp file then rename
    pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> Result<()> {
        let path = path.as_ref();
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, contents)?;
        fs::rename(tmp_path, path)?;
        Ok(())
    }

    pub fn save(&self, state: &PersistedState) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        Self::with_lock(&self.path, || {
            let json = serde_json::to_string_pretty(state)?;
            Self::atomic_write(&self.path, json)?;
            Ok(())
        })
    }

    /// Reads the persisted slices. Never fails on bad content: a corrupt
    /// file or slice falls back to its default and adds a warning.
    pub fn load(&self) -> Result<Rehydrated> {
        if !self.path.exists() {
            return Ok(Rehydrated::default());
        }
        let json = Self::with_lock(&self.path, || {
            fs::read_to_string(&self.path)
                .with_context(|| format!("Failed to read {:?}", self.path))
        })?;
        Ok(Self::decode(&json))
    }

    /// Like [`load`](Self::load), but unreadable files become a warning too.
    pub fn load_or_default(&self) -> Rehydrated {
        match self.load() {
            Ok(r) => r,
            Err(e) => Rehydrated {
                state: PersistedState::default(),
                warnings: vec![format!("Could not read saved state: {:#}", e)],
            },
        }
    }

    fn decode(json: &str) -> Rehydrated {
        let mut warnings = Vec::new();
        let root: Value = match serde_json::from_str(json) {
            Ok(Value::Object(map)) => Value::Object(map),
            Ok(_) | Err(_) => {
                warnings.push("Saved state is corrupt; starting fresh".to_string());
                return Rehydrated {
                    state: PersistedState::default(),
                    warnings,
                };
            }
        };

        let state = PersistedState {
            auth: slice::<AuthState>(&root, "auth", &mut warnings),
            favourites: slice::<Favourites>(&root, "favourites", &mut warnings),
            theme: slice::<ThemeState>(&root, "theme", &mut warnings),
        };
        // Repeated ids can only come from a hand-edited file.
        let state = PersistedState {
            favourites: Favourites::from_items(state.favourites.items().to_vec()),
            ..state
        };
        Rehydrated { state, warnings }
    }
}

fn slice<T: DeserializeOwned + Default>(root: &Value, key: &str, warnings: &mut Vec<String>) -> T {
    let Some(value) = root.get(key) else {
        return T::default();
    };
    match serde_json::from_value(value.clone()) {
        Ok(v) => v,
        Err(e) => {
            warnings.push(format!("Discarded saved {}: {}", key, e));
            T::default()
        }
    }
}
