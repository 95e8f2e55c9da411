pub mod csv_source;
pub mod pipeline;

pub use pipeline::{IngestionPipeline, IngestionReport, DEFAULT_BATCH_SIZE};
