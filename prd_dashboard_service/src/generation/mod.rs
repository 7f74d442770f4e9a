pub mod document;
pub mod observer;
pub mod openai;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
mod types;

pub use document::{Document, read_document};
pub use observer::{EventLog, GenerationEvent, GenerationObserver, TracingObserver};
pub use openai::{ApiKey, OpenAiClient};
pub use orchestrator::PrdGenerator;
pub use provider::CompletionProvider;
pub use types::{ChatMessage, GenerationRequest, GenerationResponse, GenerationResult, Role};
