//! Error types for flatbake
//!
//! All modules use `FlatbakeResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for flatbake operations
pub type FlatbakeResult<T> = Result<T, FlatbakeError>;

/// All errors that can occur in flatbake
#[derive(Error, Debug)]
pub enum FlatbakeError {
    // Manifest errors
    #[error("Unsupported manifest format: {}. Supported extensions: .json, .yaml, .yml", .0.display())]
    UnsupportedManifestFormat(PathBuf),

    #[error("Invalid manifest {}: {reason}", .path.display())]
    ManifestInvalid { path: PathBuf, reason: String },

    #[error("Manifest {} has no app-id (or id) field", .0.display())]
    MissingAppId(PathBuf),

    #[error("Manifest {} has no modules; nothing to mark for test execution", .0.display())]
    EmptyModuleList(PathBuf),

    // Remote errors
    #[error("Failed to register flatpak remote {name}: {stderr}")]
    RemoteRegistration { name: String, stderr: String },

    // Builder errors
    #[error("flatpak-builder failed with exit code {code}:\n{tail}")]
    BuilderFailed { code: i32, tail: String },

    #[error("flatpak build-bundle failed with exit code {code}: {stderr}")]
    BundleFailed { code: i32, stderr: String },

    #[error("Required CLI not found: {name}. {hint}")]
    ToolNotFound { name: String, hint: String },

    // Cache errors (surfaced as non-fatal logs by the pipeline)
    #[error("Cache entry {key} unusable: {reason}")]
    CacheEntry { key: String, reason: String },

    // Artifact errors
    #[error("Failed to publish artifact {name}: {reason}")]
    ArtifactPublish { name: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {}: {reason}", .path.display())]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {}: {source}", .path.display())]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unrecognized switch value '{0}' (expected yes/no, true/false, enabled/disabled, on/off, 1/0)")]
    InvalidSwitch(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("{0}")]
    User(String),
}

impl FlatbakeError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Create a manifest invalid error
    pub fn manifest_invalid(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ManifestInvalid {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ToolNotFound { .. } => {
                Some("flatbake drives flatpak, flatpak-builder and xvfb-run; all three must be on PATH")
            }
            Self::UnsupportedManifestFormat(_) => {
                Some("Rename the manifest to .json, .yaml or .yml, or convert it to one of those formats")
            }
            Self::MissingAppId(_) => Some("Add an \"app-id\" key to the manifest"),
            _ => None,
        }
    }
}
