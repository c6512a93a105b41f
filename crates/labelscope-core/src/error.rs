//! Error types for labelscope.

use thiserror::Error;

use crate::annotation::{Box2dId, Box3dId};

/// The main error type for labelscope operations.
#[derive(Error, Debug)]
pub enum LabelscopeError {
    /// labelscope has not been initialized.
    #[error("labelscope not initialized - call labelscope::init() first")]
    NotInitialized,

    /// labelscope has already been initialized.
    #[error("labelscope already initialized")]
    AlreadyInitialized,

    /// A 3D box with the given id does not exist (never created or deleted).
    #[error("3D box '{0}' not found")]
    Box3dNotFound(Box3dId),

    /// A 2D box with the given id does not exist (never created or deleted).
    #[error("2D box '{0}' not found")]
    Box2dNotFound(Box2dId),

    /// An edit was requested while no 3D box is selected.
    #[error("no 3D box is selected")]
    NoSelection,

    /// An edit handle drag was continued without being started.
    #[error("no edit handle drag in progress")]
    NoActiveEdit,

    /// Box dimensions must be finite and strictly positive.
    #[error("invalid box dimensions: {0}")]
    InvalidDimensions(String),

    /// Scene data was rejected or could not be fetched.
    #[error("scene unavailable: {0}")]
    SceneUnavailable(String),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Rendering or camera error.
    #[error("render error: {0}")]
    Render(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for labelscope operations.
pub type Result<T> = std::result::Result<T, LabelscopeError>;
