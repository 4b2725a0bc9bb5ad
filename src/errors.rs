//! Centralized error handling for metadata-inspector
//!
//! This module provides structured error types instead of the generic
//! `Box<dyn Error>`, enabling better error context and type safety.

use std::fmt;

/// Main error type for metadata-inspector operations
#[derive(Debug)]
pub enum InspectorError {
    /// NetCDF file operation errors
    NetCDFError(netcdf::Error),

    /// I/O operation errors
    IoError(std::io::Error),

    /// Malformed JSON in Keywords blobs, Zarr sidecar files or the session file
    JsonError(serde_json::Error),

    /// Archive (slk) service errors: failed subprocesses, unparsable output
    ArchiveError(String),

    /// Authentication against the archive failed
    AuthError(String),

    /// A data variable references a dimension the metadata never declared
    DimensionNotFound { var: String, dim: String },

    /// Two merged datasets disagree on a coordinate or variable definition
    MergeConflict { name: String, message: String },

    /// Unparsable time units or unsupported calendar
    CalendarError(String),

    /// Generic error for everything else
    Generic(String),
}

impl fmt::Display for InspectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InspectorError::NetCDFError(e) => write!(f, "NetCDF error: {}", e),
            InspectorError::IoError(e) => write!(f, "I/O error: {}", e),
            InspectorError::JsonError(e) => write!(f, "JSON error: {}", e),
            InspectorError::ArchiveError(msg) => write!(f, "Archive error: {}", msg),
            InspectorError::AuthError(msg) => write!(f, "Authentication error: {}", msg),
            InspectorError::DimensionNotFound { var, dim } => {
                write!(
                    f,
                    "Dimension '{}' referenced by variable '{}' not found",
                    dim, var
                )
            }
            InspectorError::MergeConflict { name, message } => {
                write!(f, "Merge conflict on '{}': {}", name, message)
            }
            InspectorError::CalendarError(msg) => write!(f, "Calendar error: {}", msg),
            InspectorError::Generic(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for InspectorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InspectorError::NetCDFError(e) => Some(e),
            InspectorError::IoError(e) => Some(e),
            InspectorError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<netcdf::Error> for InspectorError {
    fn from(error: netcdf::Error) -> Self {
        InspectorError::NetCDFError(error)
    }
}

impl From<std::io::Error> for InspectorError {
    fn from(error: std::io::Error) -> Self {
        InspectorError::IoError(error)
    }
}

impl From<serde_json::Error> for InspectorError {
    fn from(error: serde_json::Error) -> Self {
        InspectorError::JsonError(error)
    }
}

impl From<reqwest::Error> for InspectorError {
    fn from(error: reqwest::Error) -> Self {
        InspectorError::AuthError(error.to_string())
    }
}

impl From<String> for InspectorError {
    fn from(error: String) -> Self {
        InspectorError::Generic(error)
    }
}

impl From<&str> for InspectorError {
    fn from(error: &str) -> Self {
        InspectorError::Generic(error.to_string())
    }
}

/// Result type alias for metadata-inspector operations
pub type Result<T> = std::result::Result<T, InspectorError>;
