//! # Skein Internal Library
//!
//! Re-exports the core Skein crates for convenience.

/// Layer 1: configuration and tracing.
pub use skein_core;

/// Layer 1: reference-counted style resources.
pub use skein_styles;

/// Layer 2: component loading and presenters.
pub use skein_components;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use skein_components::{
        ComponentCache, ComponentDescriptor, ComponentInstance, FailureReporter, Invalidate,
        LoadError, LoadState, LoadedComponent, Module, ModuleLoader, Presenter, PresenterClass,
        PresenterFactory, PresenterFailure, ResourceReader,
    };
    pub use skein_core::{ComponentPaths, SkeinConfig, TracingConfig};
    pub use skein_styles::{InjectionSink, StyleError, StyleRegistry, StyleRequest, StyleSheet};
}
