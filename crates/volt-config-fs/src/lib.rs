// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Filesystem-backed `ConfigStore` for Volt tools.
//!
//! Each key maps to `<base>/<key>.json`. Keys are plain file stems, so a key
//! can never reach outside `base`. Saves go through a sibling temp file and a
//! rename, which leaves the previous blob intact if the write fails halfway.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::debug;
use volt_app_core::config::{ConfigError, ConfigStore};

const EXTENSION: &str = "json";

/// JSON files in one directory, one per key.
#[derive(Debug, Clone)]
pub struct FsConfigStore {
    base: PathBuf,
}

impl FsConfigStore {
    /// Store rooted at the platform config directory (e.g. `~/.config/volt`).
    pub fn new() -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from("dev", "flyingrobots", "Volt")
            .ok_or_else(|| ConfigError::Other("no home directory for volt config".into()))?;
        Self::with_base(dirs.config_dir())
    }

    /// Store rooted at `base`, created if missing.
    pub fn with_base(base: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let base = base.as_ref().to_path_buf();
        fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    /// Directory holding the files.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// File backing `key`. The key is not validated here.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.base.join(key).with_extension(EXTENSION)
    }

    /// Keys with a stored blob, sorted.
    pub fn keys(&self) -> Result<Vec<String>, ConfigError> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.base)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                if check_key(stem).is_ok() {
                    keys.push(stem.to_owned());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Keys are non-empty runs of ASCII alphanumerics, `-` and `_`.
fn check_key(key: &str) -> Result<(), ConfigError> {
    let valid = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(ConfigError::Other(format!("invalid config key {key:?}")))
    }
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        check_key(key)?;
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => {
                debug!(path = %path.display(), len = bytes.len(), "config loaded");
                Ok(bytes)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Err(ConfigError::NotFound),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        check_key(key)?;
        fs::create_dir_all(&self.base)?;
        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, data)?;
        if let Err(err) = fs::rename(&staging, &path) {
            let _ = fs::remove_file(&staging);
            return Err(ConfigError::Io(err));
        }
        debug!(path = %path.display(), len = data.len(), "config saved");
        Ok(())
    }
}
