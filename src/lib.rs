// Library exports for reuse by external shells and integration tests
pub mod cli;
pub mod config_file;
pub mod error;
pub mod image_processing;
pub mod json_output;
pub mod utils;

// Re-export commonly used types
pub use error::ProcessError;
pub use image_processing::batch::{BatchItem, BatchResult, ProgressTracker};
pub use image_processing::classify::ColorLimits;
pub use image_processing::{OutputImageSettings, PipelineConfig, ProcessingEngine};
pub use json_output::JsonMessage;
