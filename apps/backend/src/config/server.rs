//! Process-level settings read once by the binary.

use std::env;

use crate::error::AppError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollaboratorEndpoints {
    pub narrator_url: Option<String>,
    pub image_url: Option<String>,
}

impl CollaboratorEndpoints {
    pub fn from_env() -> Self {
        let non_empty = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            narrator_url: non_empty("DUEL_NARRATOR_URL"),
            image_url: non_empty("DUEL_IMAGE_URL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let host = env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port_str = env::var("BACKEND_PORT").unwrap_or_else(|_| "3001".to_string());
        let port = port_str.parse::<u16>().map_err(|_| {
            AppError::config(format!(
                "BACKEND_PORT must be a valid port number, got '{port_str}'"
            ))
        })?;
        Ok(Self { host, port })
    }
}
