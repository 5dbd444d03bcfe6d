use crate::adapters::python;
use crate::core::LegacySource;
use crate::domain::model::LegacySettings;
use crate::utils::error::SourceError;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    /// A Python settings module, e.g. `/var/www/securedrop/config.py`.
    Python,
    Toml,
    Json,
}

impl SettingsFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => SettingsFormat::Toml,
            Some("json") => SettingsFormat::Json,
            _ => SettingsFormat::Python,
        }
    }
}

/// Legacy settings stored in a file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    format: SettingsFormat,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = SettingsFormat::from_path(&path);
        Self { path, format }
    }

    fn parse_error(&self, message: impl ToString) -> SourceError {
        SourceError::Parse {
            path: self.path.clone(),
            message: message.to_string(),
        }
    }
}

impl LegacySource for FileSource {
    fn load(&self) -> Result<LegacySettings, SourceError> {
        let text = fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SourceError::NotFound(self.path.clone()),
            _ => SourceError::Read {
                path: self.path.clone(),
                source: e,
            },
        })?;

        tracing::debug!("Parsing {} as {:?} settings", self.path.display(), self.format);

        match self.format {
            SettingsFormat::Toml => toml::from_str(&text).map_err(|e| self.parse_error(e)),
            SettingsFormat::Json => serde_json::from_str(&text).map_err(|e| self.parse_error(e)),
            SettingsFormat::Python => {
                let module = python::parse_module(&text).map_err(|e| self.parse_error(e))?;
                serde_json::from_value(Value::Object(module)).map_err(|e| self.parse_error(e))
            }
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Settings that are already in memory always load.
impl LegacySource for LegacySettings {
    fn load(&self) -> Result<LegacySettings, SourceError> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        "in-memory settings".to_string()
    }
}
