pub mod config;
pub mod error;
pub mod ids;
pub mod llm;
pub mod ocr;
pub mod types;

pub use config::JarvisConfig;
pub use error::{JarvisError, Result};
pub use llm::LlmBackend;
pub use ocr::OcrBackend;
