use crate::core::extract::extract;
use crate::core::lock::MigrationLock;
use crate::core::writer::write_atomic;
use crate::core::{ConfigProvider, LegacySource, Pipeline};
use crate::domain::model::{ExtractedFields, MigrationOutcome};
use crate::utils::error::{Result, SourceError};

/// Runs one migration: lock, load, check for earlier output, extract,
/// assemble, write. The lock is held until `run` returns.
pub struct MigrationEngine<P: Pipeline, S: LegacySource, C: ConfigProvider> {
    pipeline: P,
    source: S,
    config: C,
}

impl<P: Pipeline, S: LegacySource, C: ConfigProvider> MigrationEngine<P, S, C> {
    pub fn new(pipeline: P, source: S, config: C) -> Self {
        Self {
            pipeline,
            source,
            config,
        }
    }

    pub fn run(&self) -> Result<MigrationOutcome> {
        let _lock = MigrationLock::acquire(self.config.lock_path(), self.config.lock_mode())?;

        let settings = match self.source.load() {
            Ok(settings) => {
                tracing::info!("Legacy config imported from {}.", self.source.describe());
                Some(settings)
            }
            Err(e @ SourceError::NotFound(_)) => {
                tracing::info!("Legacy config unable to be imported: {}", e);
                None
            }
            Err(e) => {
                tracing::error!("Legacy config present but unusable: {}", e);
                return Err(e.into());
            }
        };

        let existing: Vec<_> = self
            .pipeline
            .destinations()
            .into_iter()
            .filter(|path| path.exists())
            .collect();

        if !existing.is_empty() {
            if self.config.force() {
                tracing::info!(
                    "JSON config already exists, but --force was specified. Overwriting config."
                );
            } else {
                tracing::info!("JSON config already exists. Exiting.");
                return Ok(MigrationOutcome::AlreadyMigrated { existing });
            }
        } else if settings.is_none() {
            tracing::info!("Legacy config file missing. Migrating empty values.");
        }

        let fields = extract(settings.as_ref());
        tracing::debug!("Extracted fields: {:?}", FieldPresence::from(&fields));

        let outputs = self.pipeline.transform(&fields);
        let mut written = Vec::with_capacity(outputs.len());

        for output in outputs {
            write_atomic(&output.document, &output.path)?;
            tracing::info!(
                "Wrote {} ({} keys, {} layout)",
                output.path.display(),
                output.document.len(),
                self.pipeline.name()
            );
            written.push(output.path);
        }

        Ok(MigrationOutcome::Migrated { written })
    }
}

/// Debug view of which fields were found, without their (secret) values.
#[derive(Debug)]
#[allow(dead_code)]
struct FieldPresence {
    id_pepper: bool,
    gpg_pepper: bool,
    i18n: bool,
    scrypt_params: bool,
    source_secret_key: bool,
    journalist_secret_key: bool,
    custom_header_image: bool,
}

impl From<&ExtractedFields> for FieldPresence {
    fn from(fields: &ExtractedFields) -> Self {
        Self {
            id_pepper: fields.id_pepper.is_some(),
            gpg_pepper: fields.gpg_pepper.is_some(),
            i18n: fields.i18n.is_some(),
            scrypt_params: fields.scrypt_params.is_some(),
            source_secret_key: fields.source_secret_key.is_some(),
            journalist_secret_key: fields.journalist_secret_key.is_some(),
            custom_header_image: fields.custom_header_image.is_some(),
        }
    }
}
