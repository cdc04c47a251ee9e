pub mod db;
pub mod error;
pub mod store;
pub mod worker;

pub use error::{QueueError, Result};
pub use store::{QueueItem, QueueStats, UploadQueue};
pub use worker::UploadWorker;
