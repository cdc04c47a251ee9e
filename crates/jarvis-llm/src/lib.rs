pub mod cache;
pub mod heuristic;
pub mod openai;

pub use cache::CachingBackend;
pub use heuristic::HeuristicBackend;
pub use openai::OpenAiBackend;
