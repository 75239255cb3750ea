use thiserror::Error;

#[derive(Error, Debug)]
pub enum PricewatchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Sheet error: {message}")]
    Sheet { message: String },

    #[error("Offers report error: {0}")]
    Report(String),

    #[error("Model response error: {0}")]
    ModelResponse(String),

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),
}

pub type Result<T> = std::result::Result<T, PricewatchError>;
