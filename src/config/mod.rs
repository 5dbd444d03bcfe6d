#[cfg(feature = "cli")]
pub mod cli;

use crate::core::ConfigProvider;
use crate::domain::model::LockMode;
use crate::utils::error::Result;
use crate::utils::validation::{validate_directory, validate_file_name, Validate};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_DIR: &str = "/etc/securedrop";
pub const DEFAULT_LOCK_PATH: &str = "/var/lib/securedrop/securedrop-config-migrate.lock";
pub const DEFAULT_LEGACY_CONFIG: &str = "/var/www/securedrop/config.py";

/// Environment overrides for the fixed paths, used to point test runs at a
/// scratch directory. Not exposed as flags.
pub const CONFIG_DIR_ENV: &str = "SECUREDROP_CONFIG_DIR";
pub const LOCK_PATH_ENV: &str = "SECUREDROP_MIGRATE_LOCK";
pub const LEGACY_CONFIG_ENV: &str = "SECUREDROP_LEGACY_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrateConfig {
    pub config_dir: PathBuf,
    pub lock_path: PathBuf,
    pub legacy_config: PathBuf,
    pub force: bool,
    pub lock_mode: LockMode,
}

impl MigrateConfig {
    /// The production paths.
    pub fn new(force: bool, lock_mode: LockMode) -> Self {
        Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            lock_path: PathBuf::from(DEFAULT_LOCK_PATH),
            legacy_config: PathBuf::from(DEFAULT_LEGACY_CONFIG),
            force,
            lock_mode,
        }
    }

    /// Production paths, each replaceable through its environment variable.
    pub fn from_env(force: bool, lock_mode: LockMode) -> Self {
        Self::from_lookup(force, lock_mode, |key| std::env::var_os(key))
    }

    fn from_lookup<F>(force: bool, lock_mode: LockMode, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<std::ffi::OsString>,
    {
        let mut config = Self::new(force, lock_mode);

        if let Some(dir) = lookup(CONFIG_DIR_ENV) {
            config.config_dir = PathBuf::from(dir);
        }
        if let Some(lock) = lookup(LOCK_PATH_ENV) {
            config.lock_path = PathBuf::from(lock);
        }
        if let Some(legacy) = lookup(LEGACY_CONFIG_ENV) {
            config.legacy_config = PathBuf::from(legacy);
        }

        config
    }

    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    pub fn with_lock_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.lock_path = path.into();
        self
    }

    pub fn with_legacy_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.legacy_config = path.into();
        self
    }
}

impl ConfigProvider for MigrateConfig {
    fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    fn legacy_config(&self) -> &Path {
        &self.legacy_config
    }

    fn force(&self) -> bool {
        self.force
    }

    fn lock_mode(&self) -> LockMode {
        self.lock_mode
    }
}

impl Validate for MigrateConfig {
    fn validate(&self) -> Result<()> {
        validate_directory("config_dir", &self.config_dir)?;
        validate_file_name("lock_path", &self.lock_path)?;
        validate_file_name("legacy_config", &self.legacy_config)?;
        Ok(())
    }
}
