//! Reference-counted style resources for Skein.
//!
//! Components share style sheets. The [`StyleRegistry`] counts how many
//! owners depend on each style key, injects a key's sheets through an
//! [`InjectionSink`] the first time it is acquired, and removes them when the
//! last owner releases it.
//!
//! # Overview
//!
//! - [`StyleRegistry`] - ownership counting and injection decisions
//! - [`InjectionSink`] - the surface that renders style sheets
//! - [`StyleHead`] - an in-memory sink modelling a document head
//!
//! # Example
//!
//! ```
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! use skein_styles::{StyleHead, StyleRegistry};
//! use std::sync::Arc;
//!
//! let head = Arc::new(StyleHead::new());
//! let registry = StyleRegistry::new(head.clone());
//!
//! let styles = vec!["a{}".to_string(), "b{}".to_string()];
//! let html = registry.acquire_batch("card", &styles).await.unwrap();
//! assert_eq!(
//!     html.as_deref(),
//!     Some("<style class=\"card\">a{}</style><style class=\"card\">b{}</style>")
//! );
//!
//! registry.release("card");
//! assert!(head.elements().is_empty());
//! # });
//! ```

pub mod error;
mod head;
mod registry;
mod sink;

pub use error::{InjectionError, StyleError};
pub use head::{StyleElement, StyleHead};
pub use registry::{StyleRegistry, StyleRequest};
pub use sink::{InjectionSink, StyleSheet};
