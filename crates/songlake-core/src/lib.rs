pub mod config;
pub mod dataset;
pub mod error;
pub mod ingest;
pub mod logs;
pub mod pipeline;
pub mod schema;
pub mod session;
pub mod songs;
pub mod tables;
pub mod timestamps;

pub use config::{EtlConfig, StorageLocation};
pub use error::{EtlError, Result};
pub use pipeline::{run_pipeline, RunOptions, RunSummary};
pub use session::Session;
