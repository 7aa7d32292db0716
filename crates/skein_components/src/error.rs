//! Error types for component loading and presenter construction.

use skein_styles::StyleError;
use std::sync::Arc;

/// Errors returned by a [`ResourceReader`](crate::ResourceReader) or
/// [`ModuleLoader`](crate::ModuleLoader).
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// Nothing exists at the requested path.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// The underlying I/O operation failed.
    #[error("i/o error: {0}")]
    Io(Arc<std::io::Error>),

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Creates a [`NotFound`](Self::NotFound).
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Creates an [`Other`](Self::Other).
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

/// Errors from component registry bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No load has been started for the component.
    #[error("unknown component: {0}")]
    UnknownComponent(String),

    /// The component already has a presenter class.
    #[error("component '{0}' already has a presenter")]
    PresenterAlreadyRegistered(String),
}

/// A failed component load.
///
/// Every caller waiting on the same load receives a clone of the error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    /// Markup or style text could not be read.
    #[error("failed to read '{path}': {source}")]
    Read {
        /// Path that was read.
        path: String,
        /// Transport error.
        #[source]
        source: TransportError,
    },

    /// The presenter module could not be loaded.
    #[error("failed to load module '{path}': {source}")]
    Module {
        /// Module path.
        path: String,
        /// Transport error.
        #[source]
        source: TransportError,
    },

    /// The module does not export the declared presenter class.
    #[error("module '{module}' has no export named '{export}'")]
    MissingExport {
        /// Module path.
        module: String,
        /// Requested export name.
        export: String,
    },

    /// The component's styles could not be acquired.
    #[error(transparent)]
    Style(#[from] StyleError),
}

/// Why a presenter could not be constructed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PresenterError {
    /// The component has no presenter class.
    #[error("no presenter registered for component '{0}'")]
    Missing(String),

    /// The presenter class rejected construction.
    #[error("{0}")]
    Construction(String),

    /// The presenter class panicked during construction.
    #[error("presenter panicked: {0}")]
    Panicked(String),
}

impl PresenterError {
    /// Creates a [`Construction`](Self::Construction).
    pub fn construction(msg: impl Into<String>) -> Self {
        Self::Construction(msg.into())
    }
}
