use crate::domain::model::{ExtractedFields, LegacySettings, LockMode, OutputFile};
use crate::utils::error::SourceError;
use std::path::{Path, PathBuf};

/// Anything that can produce legacy settings. Only a missing source is
/// recoverable; the engine treats it as every field absent.
pub trait LegacySource {
    fn load(&self) -> Result<LegacySettings, SourceError>;

    fn describe(&self) -> String;
}

pub trait ConfigProvider {
    fn config_dir(&self) -> &Path;
    fn lock_path(&self) -> &Path;
    fn legacy_config(&self) -> &Path;
    fn force(&self) -> bool;
    fn lock_mode(&self) -> LockMode;
}

/// An output layout: which files make up a migrated install, and how the
/// extracted fields are spread over them.
pub trait Pipeline {
    fn name(&self) -> &'static str;

    /// Files whose presence means the migration already happened.
    fn destinations(&self) -> Vec<PathBuf>;

    fn transform(&self, fields: &ExtractedFields) -> Vec<OutputFile>;
}
