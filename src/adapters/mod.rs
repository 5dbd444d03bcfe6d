// Adapters layer: concrete legacy settings sources.

pub mod file_source;
pub mod python;

pub use file_source::{FileSource, SettingsFormat};
