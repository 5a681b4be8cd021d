//! Error types for the converter design optimizer.
//!
//! This module provides a unified error type [`ConvoptError`] covering the
//! failures that can occur while loading component catalogs, reading design
//! requests and writing reports. Numeric input problems and infeasible design
//! spaces are deliberately *not* errors: the former are coerced to defaults and
//! the latter are reported through [`crate::optimizer::Outcome`].

use thiserror::Error;

/// Result type alias using [`ConvoptError`].
pub type Result<T> = std::result::Result<T, ConvoptError>;

/// Unified error type for all optimizer operations.
#[derive(Error, Debug)]
pub enum ConvoptError {
    // ============ Catalog Errors ============
    /// Error reading a catalog file
    #[error("Failed to read catalog file '{path}': {source}")]
    CatalogRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Catalog file is not valid JSON or has the wrong shape
    #[error("Failed to parse catalog file '{path}': {source}")]
    CatalogParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Catalog directory does not exist
    #[error("Catalog directory '{path}' does not exist")]
    CatalogDirMissing { path: String },

    // ============ Request Errors ============
    /// Error reading a request file
    #[error("Failed to read request file '{path}': {source}")]
    RequestRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Request is not a JSON object
    #[error("Invalid design request: {message}")]
    InvalidRequest { message: String },

    /// Unknown topology name
    #[error("Unknown topology '{name}' (expected 'llc' or 'pfc')")]
    UnknownTopology { name: String },

    // ============ Output Errors ============
    /// Report serialization failed
    #[error("Failed to serialize report: {source}")]
    ReportSerialize {
        #[source]
        source: serde_json::Error,
    },

    /// Writing the report failed
    #[error("Failed to write report: {source}")]
    ReportWrite {
        #[source]
        source: std::io::Error,
    },

    // ============ WASM Errors ============
    /// WASM-specific error
    #[cfg(feature = "wasm")]
    #[error("WASM error: {message}")]
    WasmError { message: String },
}

impl ConvoptError {
    /// Create an invalid request error
    pub fn request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a catalog parse error for a named source
    pub fn catalog_parse(path: impl Into<String>, source: serde_json::Error) -> Self {
        Self::CatalogParse {
            path: path.into(),
            source,
        }
    }

    /// Create a catalog read error for a named source
    pub fn catalog_read(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::CatalogRead {
            path: path.into(),
            source,
        }
    }
}
