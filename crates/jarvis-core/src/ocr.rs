//! Narrow OCR capability interface (§6: `extract(image_path) -> string`).
//! The concrete engine is a caller-supplied collaborator, out of scope for
//! this workspace — mirrors `jarvis-capture::backend`'s
//! screen-capture/idle/exclusion traits, each with a null default.

use async_trait::async_trait;

#[async_trait]
pub trait OcrBackend: Send + Sync {
    /// Extract text from the image at `image_path`. An empty string is a
    /// legal result (a blank or text-free screenshot); it simply produces
    /// no chunks downstream.
    async fn extract(&self, image_path: &str) -> anyhow::Result<String>;
}

/// Always returns empty text — the fallback when no OCR engine is configured.
pub struct NullOcr;

#[async_trait]
impl OcrBackend for NullOcr {
    async fn extract(&self, _image_path: &str) -> anyhow::Result<String> {
        Ok(String::new())
    }
}
