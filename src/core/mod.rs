pub mod assemble;
pub mod etl;
pub mod extract;
pub mod lock;
pub mod pipeline;
pub mod writer;

pub use crate::domain::model::{ConfigDocument, ExtractedFields, LockMode, OutputFile};
pub use crate::domain::ports::{ConfigProvider, LegacySource, Pipeline};
pub use crate::utils::error::Result;
