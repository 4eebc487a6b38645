use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepostError {
    #[error("URL supplied is not a valid URL: {url} ({reason})")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid target element '{identifier}': {reason}")]
    InvalidTarget { identifier: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Target,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RepostError {
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_target(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidUrl { .. } => ErrorCategory::Input,
            Self::InvalidTarget { .. } => ErrorCategory::Target,
            Self::TomlError(_)
            | Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Target => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Short message meant for terminal output, without internal detail.
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::InvalidUrl { url, .. } => format!("Frame source is not a valid URL: {}", url),
            Self::InvalidTarget { identifier, reason } => {
                format!("Frame '{}' cannot be re-posted: {}", identifier, reason)
            }
            Self::IoError(e) => format!("File access failed: {}", e),
            Self::SerializationError(e) => format!("Could not serialize output: {}", e),
            Self::TomlError(e) => format!("Configuration file is not valid TOML: {}", e),
            Self::ConfigError { message } => format!("Configuration problem: {}", message),
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration field '{}' is invalid: {}", field, reason)
            }
            Self::MissingConfigError { field } => {
                format!("Configuration field '{}' is required", field)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::InvalidUrl { .. } => {
                "Check the frame's src: it needs a host name or IPv4 address, or a base_url for relative sources"
            }
            Self::InvalidTarget { .. } => {
                "Give the iframe identical, non-empty id and name attributes"
            }
            Self::IoError(_) => "Make sure the file exists and is readable",
            Self::SerializationError(_) => "Re-run without --json to see the plain output",
            Self::TomlError(_) => "Fix the TOML syntax reported above",
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => "Review the [controller] and [[frames]] tables",
        }
    }
}

pub type Result<T> = std::result::Result<T, RepostError>;
