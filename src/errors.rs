use thiserror::Error;

/// Main error type for the tailwind-descriptor crate
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Glob error: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid safelist pattern '{pattern}': {message}")]
    Regex { pattern: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Descriptor failed validation:\n{}", .0.join("\n"))]
    Invalid(Vec<String>),

    #[error("Failed to scan file {path}: {message}")]
    ScanError { path: String, message: String },

    #[error("Failed to write output to {path}: {message}")]
    OutputError { path: String, message: String },

    #[error("Security violation: {0}")]
    SecurityError(String),
}

pub type Result<T> = std::result::Result<T, DescriptorError>;
