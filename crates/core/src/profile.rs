//! Application profile management
//!
//! A profile is a named (app id, app key, endpoint) triple stored as TOML
//! under the user config directory. The `STRATUS_CONFIG_DIR` environment
//! variable overrides the location for test isolation.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::error::{Error, Result};

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "STRATUS_CONFIG_DIR";

const PROFILES_FILE: &str = "profiles.toml";

/// A stored application profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppProfile {
    /// Profile name
    pub name: String,
    /// Application id
    pub app_id: String,
    /// Application key
    pub app_key: String,
    /// API endpoint URL
    pub endpoint: String,
}

impl AppProfile {
    /// Build the application context for this profile
    pub fn context(&self) -> Result<AppContext> {
        AppContext::new(&self.app_id, &self.app_key, &self.endpoint)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    profiles: BTreeMap<String, AppProfile>,
}

/// Loads, persists, and queries stored profiles
#[derive(Debug)]
pub struct ProfileManager {
    path: PathBuf,
    file: ProfileFile,
}

impl ProfileManager {
    /// Open the default profile store
    pub fn new() -> Result<Self> {
        Self::with_dir(&config_dir()?)
    }

    /// Open a profile store under an explicit directory
    pub fn with_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(PROFILES_FILE);
        let file = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            toml::from_str(&raw)
                .map_err(|e| Error::Config(format!("malformed {}: {e}", path.display())))?
        } else {
            ProfileFile::default()
        };
        Ok(Self { path, file })
    }

    /// Look up a profile by name
    pub fn get(&self, name: &str) -> Result<&AppProfile> {
        self.file
            .profiles
            .get(name)
            .ok_or_else(|| Error::ProfileNotFound(name.to_string()))
    }

    /// All profiles, sorted by name
    pub fn list(&self) -> Vec<&AppProfile> {
        self.file.profiles.values().collect()
    }

    /// Add or replace a profile and persist the store
    pub fn set(&mut self, profile: AppProfile) -> Result<()> {
        // Reject unusable credentials before they are written out
        profile.context()?;
        self.file.profiles.insert(profile.name.clone(), profile);
        self.persist()
    }

    /// Remove a profile and persist the store
    pub fn remove(&mut self, name: &str) -> Result<AppProfile> {
        let removed = self
            .file
            .profiles
            .remove(name)
            .ok_or_else(|| Error::ProfileNotFound(name.to_string()))?;
        self.persist()?;
        Ok(removed)
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(&self.file)
            .map_err(|e| Error::Config(format!("cannot serialize profiles: {e}")))?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir()
        .map(|d| d.join("stratus"))
        .ok_or_else(|| Error::Config("cannot determine config directory".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn profile(name: &str) -> AppProfile {
        AppProfile {
            name: name.to_string(),
            app_id: "app1".to_string(),
            app_key: "key1".to_string(),
            endpoint: "https://api.stratus.example".to_string(),
        }
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut manager = ProfileManager::with_dir(dir.path()).unwrap();
        manager.set(profile("dev")).unwrap();
        manager.set(profile("prod")).unwrap();

        let reopened = ProfileManager::with_dir(dir.path()).unwrap();
        assert_eq!(reopened.list().len(), 2);
        assert_eq!(reopened.get("dev").unwrap().app_id, "app1");
    }

    #[test]
    fn test_get_missing() {
        let dir = TempDir::new().unwrap();
        let manager = ProfileManager::with_dir(dir.path()).unwrap();
        assert!(matches!(
            manager.get("nope"),
            Err(Error::ProfileNotFound(_))
        ));
    }

    #[test]
    fn test_remove() {
        let dir = TempDir::new().unwrap();
        let mut manager = ProfileManager::with_dir(dir.path()).unwrap();
        manager.set(profile("dev")).unwrap();
        manager.remove("dev").unwrap();
        assert!(manager.list().is_empty());

        let reopened = ProfileManager::with_dir(dir.path()).unwrap();
        assert!(reopened.list().is_empty());
    }

    #[test]
    fn test_set_rejects_bad_endpoint() {
        let dir = TempDir::new().unwrap();
        let mut manager = ProfileManager::with_dir(dir.path()).unwrap();
        let mut bad = profile("dev");
        bad.endpoint = "not a url".to_string();
        assert!(manager.set(bad).is_err());
    }

    #[test]
    fn test_profile_context() {
        let ctx = profile("dev").context().unwrap();
        assert_eq!(ctx.app_id(), "app1");
    }
}
