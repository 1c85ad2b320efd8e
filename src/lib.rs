pub mod cli;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod orchestrator;
pub mod processors;
pub mod readers;
pub mod utils;
pub mod writers;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use orchestrator::Pipeline;
