use crate::utils::error::{MigrateError, Result};
use std::path::Path;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &Path) -> Result<()> {
    let raw = path.as_os_str();

    if raw.is_empty() {
        return Err(MigrateError::ConfigValidationError {
            field: field_name.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if raw.to_string_lossy().contains('\0') {
        return Err(MigrateError::ConfigValidationError {
            field: field_name.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// The path may be missing, but if something exists there it has to be a directory.
pub fn validate_directory(field_name: &str, path: &Path) -> Result<()> {
    validate_path(field_name, path)?;

    if path.exists() && !path.is_dir() {
        return Err(MigrateError::ConfigValidationError {
            field: field_name.to_string(),
            reason: format!("{} is not a directory", path.display()),
        });
    }

    Ok(())
}

pub fn validate_file_name(field_name: &str, path: &Path) -> Result<()> {
    validate_path(field_name, path)?;

    if path.file_name().is_none() {
        return Err(MigrateError::ConfigValidationError {
            field: field_name.to_string(),
            reason: format!("{} does not name a file", path.display()),
        });
    }

    Ok(())
}
