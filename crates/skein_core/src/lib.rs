//! Core infrastructure for Skein.
//!
//! - [`SkeinConfig`] - Host configuration (component root, tracing section)
//! - [`ComponentPaths`] - Resource path derivation for components
//! - [`TracingConfig`] - Logging and observability via the `tracing` crate
//!
//! # Architecture
//!
//! This crate is part of Layer 1 infrastructure:
//!
//! - **Layer 1** (`skein_core`, `skein_styles`): configuration, logging, style ownership
//! - **Layer 2** (`skein_components`): component loading and presenter construction

mod config;
mod tracing_setup;

pub use config::{
    ComponentPaths, ConfigError, DEFAULT_COMPONENTS_ROOT, SkeinConfig, TracingSection,
};
pub use tracing_setup::{TracingConfig, TracingFormat};
