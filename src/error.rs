use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("{0}")]
    Initiation(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<config::ConfigError> for CheckoutError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CheckoutError>;
