//! Presenter classes and the [`PresenterFactory`].
//!
//! A presenter is the behavior object bound to one rendered component
//! instance. Components declare a [`PresenterClass`] which the factory
//! invokes with the instance and an [`Invalidate`] hook.
//!
//! Construction failures never propagate: the factory reports them to a
//! [`FailureReporter`] and hands the caller a [`PresenterFailure`].

use crate::cache::ComponentCache;
use crate::error::PresenterError;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Stage name reported when a presenter cannot be constructed.
pub const PRESENTER_STAGE: &str = "presenter-creation";

/// A rendered component instance handed to its presenter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentInstance {
    /// Name of the component this instance renders.
    pub component_name: String,
    /// Attributes set on the instance.
    pub attributes: HashMap<String, String>,
}

impl ComponentInstance {
    /// Creates an instance of `component_name` without attributes.
    pub fn new(component_name: impl Into<String>) -> Self {
        Self {
            component_name: component_name.into(),
            attributes: HashMap::new(),
        }
    }

    /// Sets an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Returns an attribute value.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Hook a presenter calls to request a re-render of its instance.
#[derive(Clone)]
pub struct Invalidate(Arc<dyn Fn() + Send + Sync>);

impl core::fmt::Debug for Invalidate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Invalidate")
    }
}

impl Invalidate {
    /// Wraps a callback.
    pub fn new(callback: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(callback))
    }

    /// A hook that does nothing.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(|| {})
    }

    /// Requests a re-render.
    pub fn invalidate(&self) {
        (self.0)();
    }
}

/// Behavior object bound to a component instance.
pub trait Presenter: Send + Sync {
    /// Called before the instance renders.
    fn before_render(&mut self) {}

    /// Called after the instance renders.
    fn after_render(&mut self) {}
}

/// Constructs presenters for a component.
///
/// Closures with the matching signature implement this trait:
///
/// ```
/// use skein_components::{ComponentInstance, Invalidate, Presenter, PresenterClass};
/// use skein_components::error::PresenterError;
///
/// struct Card;
/// impl Presenter for Card {}
///
/// let class = |_: ComponentInstance, _: Invalidate| {
///     Ok::<Box<dyn Presenter>, PresenterError>(Box::new(Card))
/// };
/// let presenter = class.construct(ComponentInstance::new("card"), Invalidate::noop());
/// assert!(presenter.is_ok());
/// ```
pub trait PresenterClass: Send + Sync + 'static {
    /// Builds a presenter for `instance`.
    fn construct(
        &self,
        instance: ComponentInstance,
        invalidate: Invalidate,
    ) -> Result<Box<dyn Presenter>, PresenterError>;
}

impl<F> PresenterClass for F
where
    F: Fn(ComponentInstance, Invalidate) -> Result<Box<dyn Presenter>, PresenterError>
        + Send
        + Sync
        + 'static,
{
    fn construct(
        &self,
        instance: ComponentInstance,
        invalidate: Invalidate,
    ) -> Result<Box<dyn Presenter>, PresenterError> {
        self(instance, invalidate)
    }
}

/// Surface that shows application errors to the user or operator.
pub trait FailureReporter: Send + Sync + 'static {
    /// Reports a failure. Must not panic.
    fn report_failure(&self, stage: &str, context: &str, cause: &str);
}

/// Reports failures as `error!` tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl FailureReporter for TracingReporter {
    fn report_failure(&self, stage: &str, context: &str, cause: &str) {
        tracing::error!(stage, cause, "{context}");
    }
}

/// A presenter that could not be constructed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{stage}: {context}: {cause}")]
pub struct PresenterFailure {
    /// Stage that failed, always [`PRESENTER_STAGE`].
    pub stage: &'static str,
    /// Component whose presenter failed.
    pub component: String,
    /// Human-readable description of what was being constructed.
    pub context: String,
    /// Underlying cause.
    pub cause: PresenterError,
}

/// Builds presenters from the classes stored in a [`ComponentCache`].
pub struct PresenterFactory {
    cache: ComponentCache,
    reporter: Arc<dyn FailureReporter>,
}

impl core::fmt::Debug for PresenterFactory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PresenterFactory")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl PresenterFactory {
    /// Creates a factory reporting failures to `reporter`.
    #[must_use]
    pub fn new(cache: ComponentCache, reporter: Arc<dyn FailureReporter>) -> Self {
        Self { cache, reporter }
    }

    /// Creates a factory reporting failures through `tracing`.
    #[must_use]
    pub fn with_tracing_reporter(cache: ComponentCache) -> Self {
        Self::new(cache, Arc::new(TracingReporter))
    }

    /// Constructs the presenter for `instance`.
    ///
    /// The class is looked up by `instance.component_name`; `presenter_name`
    /// only labels the failure report.
    ///
    /// # Errors
    ///
    /// Returns [`PresenterFailure`] if the component has no presenter class or
    /// the class fails or panics. The failure has already been reported when
    /// this returns.
    pub fn create(
        &self,
        presenter_name: &str,
        instance: ComponentInstance,
        invalidate: Invalidate,
    ) -> Result<Box<dyn Presenter>, PresenterFailure> {
        let component = instance.component_name.clone();

        let outcome = match self.cache.presenter_class(&component) {
            Some(class) => catch_unwind(AssertUnwindSafe(|| class.construct(instance, invalidate)))
                .unwrap_or_else(|payload| Err(PresenterError::Panicked(panic_message(&*payload)))),
            None => Err(PresenterError::Missing(component.clone())),
        };

        outcome.map_err(|cause| {
            let failure = PresenterFailure {
                stage: PRESENTER_STAGE,
                context: format!(
                    "failed to initialize presenter {presenter_name} for component {component}"
                ),
                component,
                cause,
            };
            self.reporter.report_failure(
                failure.stage,
                &failure.context,
                &failure.cause.to_string(),
            );
            failure
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
