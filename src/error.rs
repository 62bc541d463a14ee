//! Unified error handling for the hatena-cli project
//!
//! Every failure in this tool is fatal for the running command. The types here
//! classify failures so the binary can print a short message naming the phase
//! that failed before exiting with a non-zero status.

use std::fmt;
use std::io;
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum HatenaError {
    /// Configuration errors (missing key, unreadable or malformed file)
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        key: Option<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// OAuth handshake errors
    #[error("Authentication error: {message}")]
    Auth {
        message: String,
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Unexpected response from the blog or image API
    #[error("Publish error ({phase}): {message}")]
    Publish {
        message: String,
        phase: PublishPhase,
        status: Option<u16>,
    },

    /// Transport level errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        url: Option<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Filesystem errors
    #[error("Filesystem error: {message} (path: {path})")]
    Filesystem {
        message: String,
        path: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// External process errors (document converter)
    #[error("Process error: {message}")]
    Process {
        message: String,
        command: String,
        exit_code: Option<i32>,
    },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        value: Option<String>,
    },

    /// Operation cancelled by the user at a prompt
    #[error("Aborted: {message}")]
    Aborted { message: String },

    /// Unknown errors
    #[error("Unknown error: {message}")]
    Unknown {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// The step of a publish/update/delete pipeline an API error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishPhase {
    UploadingImages,
    DeletingImages,
    DownloadingHtml,
    UploadingHtml,
    UpdatingHtml,
    DeletingHtml,
}

impl fmt::Display for PublishPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PublishPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishPhase::UploadingImages => "uploading_images",
            PublishPhase::DeletingImages => "deleting_images",
            PublishPhase::DownloadingHtml => "downloading_html",
            PublishPhase::UploadingHtml => "uploading_html",
            PublishPhase::UpdatingHtml => "updating_html",
            PublishPhase::DeletingHtml => "deleting_html",
        }
    }

    /// Short sentence shown to the user when this phase fails.
    pub fn failure_message(&self) -> &'static str {
        match self {
            PublishPhase::UploadingImages => "Error while uploading image.",
            PublishPhase::DeletingImages => "Error while deleting image.",
            PublishPhase::DownloadingHtml => "Error while downloading HTML.",
            PublishPhase::UploadingHtml => "Error while uploading HTML.",
            PublishPhase::UpdatingHtml => "Error while updating HTML.",
            PublishPhase::DeletingHtml => "Error while deleting HTML.",
        }
    }
}

/// Error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    Auth,
    Publish,
    Network,
    Filesystem,
    Process,
    Validation,
    Aborted,
    Unknown,
}

impl ErrorCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            ErrorCategory::Config => "Configuration",
            ErrorCategory::Auth => "Authentication",
            ErrorCategory::Publish => "Publish",
            ErrorCategory::Network => "Network",
            ErrorCategory::Filesystem => "Filesystem",
            ErrorCategory::Process => "Process",
            ErrorCategory::Validation => "Validation",
            ErrorCategory::Aborted => "Aborted",
            ErrorCategory::Unknown => "Unknown",
        }
    }
}

impl HatenaError {
    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            HatenaError::Config { .. } => ErrorCategory::Config,
            HatenaError::Auth { .. } => ErrorCategory::Auth,
            HatenaError::Publish { .. } => ErrorCategory::Publish,
            HatenaError::Network { .. } => ErrorCategory::Network,
            HatenaError::Filesystem { .. } => ErrorCategory::Filesystem,
            HatenaError::Process { .. } => ErrorCategory::Process,
            HatenaError::Validation { .. } => ErrorCategory::Validation,
            HatenaError::Aborted { .. } => ErrorCategory::Aborted,
            HatenaError::Unknown { .. } => ErrorCategory::Unknown,
        }
    }

    /// Returns the pipeline phase associated with the error, if any.
    pub fn publish_phase(&self) -> Option<PublishPhase> {
        if let HatenaError::Publish { phase, .. } = self {
            Some(*phase)
        } else {
            None
        }
    }

    /// HTTP status that triggered the error, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            HatenaError::Auth { status, .. } | HatenaError::Publish { status, .. } => *status,
            _ => None,
        }
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            HatenaError::Config { message, key, .. } => match key {
                Some(key) => format!("Config {} not found. {}", key, message),
                None => format!("Configuration problem: {}", message),
            },
            HatenaError::Auth { message, .. } => {
                format!("Authentication with Hatena failed: {}", message)
            }
            HatenaError::Publish {
                phase,
                message,
                status,
            } => match status {
                Some(code) => format!("{} (HTTP {}) {}", phase.failure_message(), code, message),
                None => format!("{} {}", phase.failure_message(), message),
            },
            HatenaError::Network { message, .. } => format!("Network issue: {}", message),
            HatenaError::Filesystem { message, path, .. } => {
                format!("File system problem: {} ({})", message, path)
            }
            HatenaError::Process { message, .. } => format!("Process problem: {}", message),
            HatenaError::Validation { message, .. } => {
                format!("Input validation failed: {}", message)
            }
            HatenaError::Aborted { message } => format!("Aborted. {}", message),
            HatenaError::Unknown { message, .. } => format!("Unexpected error: {}", message),
        }
    }
}

impl From<io::Error> for HatenaError {
    fn from(err: io::Error) -> Self {
        HatenaError::Filesystem {
            message: format!("I/O error: {err}"),
            path: "<io>".to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<reqwest::Error> for HatenaError {
    fn from(err: reqwest::Error) -> Self {
        HatenaError::Network {
            message: format!("Request failed: {err}"),
            url: err.url().map(|u| u.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<toml::de::Error> for HatenaError {
    fn from(err: toml::de::Error) -> Self {
        HatenaError::Config {
            message: format!("Invalid config file: {err}"),
            key: None,
            source: Some(Box::new(err)),
        }
    }
}

impl From<toml::ser::Error> for HatenaError {
    fn from(err: toml::ser::Error) -> Self {
        HatenaError::Config {
            message: format!("Failed to serialise config: {err}"),
            key: None,
            source: Some(Box::new(err)),
        }
    }
}

impl From<dialoguer::Error> for HatenaError {
    fn from(err: dialoguer::Error) -> Self {
        HatenaError::Unknown {
            message: format!("Prompt failed: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

/// Result type alias for convenience
pub type HatenaResult<T> = Result<T, HatenaError>;

/// Convenience functions for creating common errors
pub mod errors {
    use super::*;

    pub fn config_error(message: impl Into<String>) -> HatenaError {
        HatenaError::Config {
            message: message.into(),
            key: None,
            source: None,
        }
    }

    pub fn missing_key(key: impl Into<String>) -> HatenaError {
        HatenaError::Config {
            message: "Set it with `hatena config set`.".to_string(),
            key: Some(key.into()),
            source: None,
        }
    }

    /// 键存在但值为空
    pub fn empty_value(key: &str) -> HatenaError {
        config_error(format!(
            "{} is empty. Set it with `hatena config init` or `hatena config set`.",
            key
        ))
    }

    pub fn auth_error(message: impl Into<String>, status: Option<u16>) -> HatenaError {
        HatenaError::Auth {
            message: message.into(),
            status,
            source: None,
        }
    }

    pub fn publish_error(
        phase: PublishPhase,
        message: impl Into<String>,
        status: Option<u16>,
    ) -> HatenaError {
        HatenaError::Publish {
            message: message.into(),
            phase,
            status,
        }
    }

    pub fn filesystem_error(
        message: impl Into<String>,
        path: impl Into<String>,
        source: io::Error,
    ) -> HatenaError {
        HatenaError::Filesystem {
            message: message.into(),
            path: path.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn process_error(
        message: impl Into<String>,
        command: impl Into<String>,
        exit_code: Option<i32>,
    ) -> HatenaError {
        HatenaError::Process {
            message: message.into(),
            command: command.into(),
            exit_code,
        }
    }

    pub fn validation_error(
        message: impl Into<String>,
        field: Option<String>,
        value: Option<String>,
    ) -> HatenaError {
        HatenaError::Validation {
            message: message.into(),
            field,
            value,
        }
    }

    pub fn aborted(message: impl Into<String>) -> HatenaError {
        HatenaError::Aborted {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let config_err = errors::missing_key("auth:api_key");
        assert_eq!(config_err.category(), ErrorCategory::Config);
        assert!(config_err.user_message().contains("auth:api_key"));

        let empty_err = errors::empty_value("blog:domain");
        assert_eq!(empty_err.category(), ErrorCategory::Config);
        assert_eq!(
            empty_err.user_message(),
            "Configuration problem: blog:domain is empty. Set it with `hatena config init` or `hatena config set`."
        );

        let auth_err = errors::auth_error("bad verifier", Some(401));
        assert_eq!(auth_err.category(), ErrorCategory::Auth);
        assert_eq!(auth_err.status(), Some(401));
    }

    #[test]
    fn publish_errors_name_the_failing_phase() {
        let err = errors::publish_error(PublishPhase::UploadingImages, "", Some(500));
        assert_eq!(err.publish_phase(), Some(PublishPhase::UploadingImages));
        assert!(err.user_message().starts_with("Error while uploading image."));
        assert!(err.user_message().contains("500"));

        let err = errors::publish_error(PublishPhase::DeletingHtml, "gone", None);
        assert_eq!(err.user_message(), "Error while deleting HTML. gone");
    }

    #[test]
    fn io_errors_become_filesystem_errors() {
        let err: HatenaError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert_eq!(err.category(), ErrorCategory::Filesystem);
    }
}
