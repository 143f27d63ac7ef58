//! Centralized error types for the InfoRecord application.
//!
//! This module provides a typed error hierarchy that:
//! - Enables precise error handling throughout the codebase
//! - Provides user-friendly messages suitable for inline display
//! - Preserves full error context for debugging/logging
//!
//! Nothing in here is fatal: the worst map outcome is a map without pins
//! until the provider loads.

use thiserror::Error;

/// Top-level application error type.
///
/// All errors in the InfoRecord application should be convertible to this type.
/// Use `user_message()` to get a UI-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Map error: {0}")]
    Map(#[from] MapError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AppError {
    /// Returns a user-friendly message suitable for display in the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Map(e) => e.user_message(),
            AppError::Storage(e) => e.user_message(),
        }
    }
}

/// Errors raised by the map surface and the marker workflow.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    /// The external map capability could not be loaded.
    #[error("Map provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// NaN or out-of-range coordinates.
    #[error("Invalid point ({lat}, {lng})")]
    InvalidPoint { lat: f64, lng: f64 },

    /// A render pass was requested before the surface was ready.
    /// The markers stay queued; callers do not need to act on this.
    #[error("Render pass skipped, {pending} marker(s) queued until the map is ready")]
    RenderPassSkipped { pending: usize },

    #[error("Map surface is not initialized yet")]
    NotReady,

    #[error("No draft marker is active")]
    NoDraft,

    #[error("Commit rejected: {0}")]
    CommitRejected(String),

    #[error("Unknown marker: {0}")]
    UnknownMarker(String),
}

impl MapError {
    pub fn user_message(&self) -> &'static str {
        match self {
            MapError::ProviderUnavailable(_) => {
                "The map could not be loaded. Check your connection and try again."
            }
            MapError::InvalidPoint { .. } => "That spot could not be read. Try tapping again.",
            MapError::RenderPassSkipped { .. } => "Pins will appear once the map finishes loading.",
            MapError::NotReady => "The map is still loading.",
            MapError::NoDraft => "Tap the map to place a pin first.",
            MapError::CommitRejected(_) => "This pin can't be saved from here.",
            MapError::UnknownMarker(_) => "That pin is no longer available.",
        }
    }

    /// True for errors the calling screen should answer with a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MapError::ProviderUnavailable(_))
    }
}

/// Local storage errors (key-value form file, pin database).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Data corruption detected: {0}")]
    Corruption(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl StorageError {
    pub fn user_message(&self) -> &'static str {
        match self {
            StorageError::Unavailable(_) => "Unable to access local data. Try restarting the app.",
            StorageError::QueryFailed(_) => "A data operation failed. Please try again.",
            StorageError::Corruption(_) => {
                "Local data may be corrupted. Consider resetting app data."
            }
            StorageError::Serialization(_) => "Saved data could not be read. Please try again.",
        }
    }
}

/// Configuration errors. Config loading returns them inside `anyhow::Error`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "Configuration not found. Using defaults.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}

/// Extension trait for converting rusqlite errors to our error types.
pub trait RusqliteErrorExt {
    fn into_storage_error(self) -> StorageError;
}

impl RusqliteErrorExt for rusqlite::Error {
    fn into_storage_error(self) -> StorageError {
        match &self {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("corrupt") => {
                StorageError::Corruption(self.to_string())
            }
            rusqlite::Error::SqliteFailure(_, _) => StorageError::Unavailable(self.to_string()),
            _ => StorageError::QueryFailed(self.to_string()),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Unavailable(e.to_string())
    }
}
