use thiserror::Error;

/// Errors from reading or writing a layout configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid layout config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize layout config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
