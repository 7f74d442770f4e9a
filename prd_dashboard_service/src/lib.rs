pub mod config;
pub mod dashboard;
pub mod error;
pub mod generation;
pub mod server;

pub use config::{AppConfig, GeneratorSettings};
pub use error::{FailureKind, GenerationFailed, ServiceError};
pub use generation::{OpenAiClient, PrdGenerator};
pub use server::build_router;
