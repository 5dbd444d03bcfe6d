use crate::core::assemble::assemble;
use crate::core::Pipeline;
use crate::domain::model::{ExtractedFields, OutputFile};
use std::path::{Path, PathBuf};

pub const SOURCE_CONFIG_FILE: &str = "source-config.json";
pub const JOURNALIST_CONFIG_FILE: &str = "journalist-config.json";
pub const COMBINED_CONFIG_FILE: &str = "config.json";

/// One JSON file per interface: `source-config.json` and `journalist-config.json`.
#[derive(Debug, Clone)]
pub struct SplitPipeline {
    source_config: PathBuf,
    journalist_config: PathBuf,
}

impl SplitPipeline {
    pub fn new(config_dir: &Path) -> Self {
        Self {
            source_config: config_dir.join(SOURCE_CONFIG_FILE),
            journalist_config: config_dir.join(JOURNALIST_CONFIG_FILE),
        }
    }
}

impl Pipeline for SplitPipeline {
    fn name(&self) -> &'static str {
        "split"
    }

    fn destinations(&self) -> Vec<PathBuf> {
        vec![self.source_config.clone(), self.journalist_config.clone()]
    }

    fn transform(&self, fields: &ExtractedFields) -> Vec<OutputFile> {
        let docs = assemble(fields);
        vec![
            OutputFile {
                path: self.source_config.clone(),
                document: docs.source,
            },
            OutputFile {
                path: self.journalist_config.clone(),
                document: docs.journalist,
            },
        ]
    }
}

/// The older single `config.json` with `source_interface` and
/// `journalist_interface` sections.
#[derive(Debug, Clone)]
pub struct CombinedPipeline {
    config: PathBuf,
}

impl CombinedPipeline {
    pub fn new(config_dir: &Path) -> Self {
        Self {
            config: config_dir.join(COMBINED_CONFIG_FILE),
        }
    }
}

impl Pipeline for CombinedPipeline {
    fn name(&self) -> &'static str {
        "combined"
    }

    fn destinations(&self) -> Vec<PathBuf> {
        vec![self.config.clone()]
    }

    fn transform(&self, fields: &ExtractedFields) -> Vec<OutputFile> {
        vec![OutputFile {
            path: self.config.clone(),
            document: assemble(fields).combined(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_pipeline_outputs() {
        let pipeline = SplitPipeline::new(Path::new("/etc/securedrop"));
        let fields = ExtractedFields {
            id_pepper: Some(json!("abc")),
            journalist_secret_key: Some(json!("j")),
            ..Default::default()
        };

        let outputs = pipeline.transform(&fields);

        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].path, PathBuf::from("/etc/securedrop/source-config.json"));
        assert_eq!(outputs[0].document.clone().into_value(), json!({"scrypt_id_pepper": "abc"}));
        assert_eq!(outputs[1].path, PathBuf::from("/etc/securedrop/journalist-config.json"));
        assert_eq!(
            outputs[1].document.clone().into_value(),
            json!({"scrypt_id_pepper": "abc", "secret_key": "j"})
        );
        assert_eq!(
            pipeline.destinations(),
            vec![outputs[0].path.clone(), outputs[1].path.clone()]
        );
    }

    #[test]
    fn test_combined_pipeline_outputs() {
        let pipeline = CombinedPipeline::new(Path::new("/etc/securedrop"));

        let outputs = pipeline.transform(&ExtractedFields::default());

        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].path, PathBuf::from("/etc/securedrop/config.json"));
        assert_eq!(
            outputs[0].document.clone().into_value(),
            json!({"source_interface": {}, "journalist_interface": {}})
        );
    }
}
