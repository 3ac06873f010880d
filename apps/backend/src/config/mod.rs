pub mod engine;
pub mod server;

pub use engine::EngineConfig;
pub use server::{CollaboratorEndpoints, ServerConfig};
