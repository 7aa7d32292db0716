//! Component loading and presenter construction for Skein.
//!
//! # Overview
//!
//! - [`ComponentCache`] loads component definitions (markup, styles,
//!   presenter class) once per name and shares in-flight loads between
//!   concurrent callers. Each successful load counts the caller as an owner
//!   of the component's styles in the shared
//!   [`StyleRegistry`](skein_styles::StyleRegistry).
//! - [`PresenterFactory`] builds presenters from the stored classes and turns
//!   construction failures into reported [`PresenterFailure`] values.
//! - [`ResourceReader`] and [`ModuleLoader`] are the transports the cache
//!   reads through.
//!
//! # Example
//!
//! ```
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! use skein_components::error::PresenterError;
//! use skein_components::{
//!     ComponentCache, ComponentDescriptor, ComponentInstance, Invalidate, MemoryReader,
//!     Module, ModuleTable, Presenter, PresenterFactory,
//! };
//! use skein_core::ComponentPaths;
//! use skein_styles::{StyleHead, StyleRegistry};
//! use std::sync::Arc;
//!
//! struct Counter;
//! impl Presenter for Counter {}
//!
//! let modules = ModuleTable::new().with_module(
//!     "./web-components/widgets/counter/counter.js",
//!     Module::new().with_export("Counter", |_: ComponentInstance, _: Invalidate| {
//!         Ok::<Box<dyn Presenter>, PresenterError>(Box::new(Counter))
//!     }),
//! );
//!
//! let cache = ComponentCache::new(
//!     Arc::new(StyleRegistry::new(Arc::new(StyleHead::new()))),
//!     Arc::new(MemoryReader::new()),
//!     Arc::new(modules),
//!     ComponentPaths::default(),
//! );
//!
//! let counter = ComponentDescriptor::new("counter", "widgets")
//!     .with_markup("<span></span>")
//!     .with_styles(["span{}"])
//!     .with_presenter("Counter");
//! cache.load(&counter).await.unwrap();
//!
//! let factory = PresenterFactory::with_tracing_reporter(cache.clone());
//! let presenter = factory.create("Counter", ComponentInstance::new("counter"), Invalidate::noop());
//! assert!(presenter.is_ok());
//! # });
//! ```

mod cache;
mod descriptor;
pub mod error;
mod presenter;
mod transport;

pub use cache::{ComponentCache, LoadState};
pub use descriptor::{ComponentDescriptor, LoadedComponent};
pub use error::{LoadError, PresenterError, RegistryError, TransportError};
pub use presenter::{
    ComponentInstance, FailureReporter, Invalidate, PRESENTER_STAGE, Presenter, PresenterClass,
    PresenterFactory, PresenterFailure, TracingReporter,
};
pub use transport::{FileReader, MemoryReader, Module, ModuleLoader, ModuleTable, ResourceReader};
