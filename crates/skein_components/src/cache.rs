//! Component definition cache.
//!
//! [`ComponentCache`] loads each component at most once at a time and shares
//! the result with every concurrent caller. Style ownership is counted
//! separately: every successful [`load`](ComponentCache::load) acquires the
//! component's styles once, whether it started the load, joined it while in
//! flight, or hit the cache afterwards.

use crate::descriptor::{ComponentDescriptor, LoadedComponent};
use crate::error::{LoadError, RegistryError};
use crate::presenter::PresenterClass;
use crate::transport::{ModuleLoader, ResourceReader};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use skein_core::ComponentPaths;
use skein_styles::StyleRegistry;
use std::collections::HashMap;
use std::sync::Arc;

type LoadResult = Result<Arc<LoadedComponent>, LoadError>;
type PendingLoad = Shared<BoxFuture<'static, LoadResult>>;

/// Load state of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// No load has started, or the last one failed.
    NotStarted,
    /// A load is in flight.
    Loading,
    /// The component is cached.
    Fulfilled,
}

enum Slot {
    Loading(PendingLoad),
    Fulfilled(Arc<LoadedComponent>),
}

struct Entry {
    slot: Slot,
    presenter: Option<Arc<dyn PresenterClass>>,
}

struct CacheInner {
    styles: Arc<StyleRegistry>,
    reader: Arc<dyn ResourceReader>,
    modules: Arc<dyn ModuleLoader>,
    paths: ComponentPaths,
    entries: Mutex<HashMap<String, Entry>>,
}

/// Outcome of the synchronous lookup at the start of a load.
enum Lookup {
    Started(PendingLoad),
    Joined(PendingLoad),
    Cached(Arc<LoadedComponent>),
}

/// Cache of component definitions with in-flight load deduplication.
///
/// Cloning the cache yields another handle to the same entries.
///
/// # Example
///
/// ```
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// use skein_components::{ComponentCache, ComponentDescriptor, MemoryReader, ModuleTable};
/// use skein_core::ComponentPaths;
/// use skein_styles::{StyleHead, StyleRegistry};
/// use std::sync::Arc;
///
/// let styles = Arc::new(StyleRegistry::new(Arc::new(StyleHead::new())));
/// let reader = Arc::new(
///     MemoryReader::new().with_file("./web-components/widgets/card/card.html", "<div></div>"),
/// );
/// let cache = ComponentCache::new(
///     styles.clone(),
///     reader.clone(),
///     Arc::new(ModuleTable::new()),
///     ComponentPaths::default(),
/// );
///
/// let card = ComponentDescriptor::new("card", "widgets").with_styles(["a{}"]);
/// let loaded = cache.load(&card).await.unwrap();
/// assert_eq!(loaded.markup, "<div></div>");
///
/// cache.load(&card).await.unwrap();
/// assert_eq!(reader.total_reads(), 1);
/// assert_eq!(styles.ref_count("card"), Some(2));
/// # });
/// ```
#[derive(Clone)]
pub struct ComponentCache {
    inner: Arc<CacheInner>,
}

impl core::fmt::Debug for ComponentCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let entries = self.inner.entries.lock();
        let states: HashMap<&str, LoadState> = entries
            .iter()
            .map(|(name, entry)| (name.as_str(), entry.state()))
            .collect();
        f.debug_struct("ComponentCache")
            .field("paths", &self.inner.paths)
            .field("entries", &states)
            .finish_non_exhaustive()
    }
}

impl Entry {
    fn state(&self) -> LoadState {
        match self.slot {
            Slot::Loading(_) => LoadState::Loading,
            Slot::Fulfilled(_) => LoadState::Fulfilled,
        }
    }
}

impl ComponentCache {
    /// Creates an empty cache.
    ///
    /// # Arguments
    ///
    /// * `styles` - Registry that counts style ownership
    /// * `reader` - Transport for markup and style text
    /// * `modules` - Loader for presenter modules
    /// * `paths` - Path derivation rules for component sources
    #[must_use]
    pub fn new(
        styles: Arc<StyleRegistry>,
        reader: Arc<dyn ResourceReader>,
        modules: Arc<dyn ModuleLoader>,
        paths: ComponentPaths,
    ) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                styles,
                reader,
                modules,
                paths,
                entries: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Loads a component and counts the caller as an owner of its styles.
    ///
    /// The first caller for a name starts the load; callers arriving while
    /// it is in flight await the same load; later callers get the cached
    /// definition without touching the transport.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if any step of the load fails. Every caller
    /// waiting on that load receives the error, and the component returns to
    /// [`LoadState::NotStarted`] so a later call starts over.
    pub async fn load(&self, descriptor: &ComponentDescriptor) -> LoadResult {
        let name = descriptor.name();

        let lookup = {
            let mut entries = self.inner.entries.lock();
            match entries.get(name) {
                Some(Entry {
                    slot: Slot::Fulfilled(loaded),
                    ..
                }) => Lookup::Cached(Arc::clone(loaded)),
                Some(Entry {
                    slot: Slot::Loading(pending),
                    ..
                }) => Lookup::Joined(pending.clone()),
                None => {
                    let pending = load_sequence(Arc::clone(&self.inner), descriptor.clone())
                        .boxed()
                        .shared();
                    entries.insert(
                        name.to_string(),
                        Entry {
                            slot: Slot::Loading(pending.clone()),
                            presenter: None,
                        },
                    );
                    Lookup::Started(pending)
                }
            }
        };

        match lookup {
            // The load sequence acquires styles for the caller that started it.
            Lookup::Started(pending) => pending.await,
            Lookup::Joined(pending) => {
                tracing::trace!(component = name, "joining in-flight load");
                let loaded = pending.await?;
                self.acquire_styles(name, &loaded).await?;
                Ok(loaded)
            }
            Lookup::Cached(loaded) => {
                self.acquire_styles(name, &loaded).await?;
                Ok(loaded)
            }
        }
    }

    /// Releases one owner of the component's styles.
    pub fn release(&self, name: &str) {
        self.inner.styles.release(name);
    }

    /// Attaches a presenter class to a component.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::UnknownComponent`] if no load was started for `name`.
    /// - [`RegistryError::PresenterAlreadyRegistered`] if a class is already set.
    ///
    /// A class registered while the component is loading takes precedence
    /// over the one its module exports. It is lost if that load fails.
    pub fn register_presenter(
        &self,
        name: &str,
        class: Arc<dyn PresenterClass>,
    ) -> Result<(), RegistryError> {
        register_presenter(&self.inner, name, class)
    }

    /// Returns the component's presenter class, if any.
    #[must_use]
    pub fn presenter_class(&self, name: &str) -> Option<Arc<dyn PresenterClass>> {
        self.inner
            .entries
            .lock()
            .get(name)
            .and_then(|entry| entry.presenter.clone())
    }

    /// Returns the component's load state.
    #[must_use]
    pub fn state(&self, name: &str) -> LoadState {
        self.inner
            .entries
            .lock()
            .get(name)
            .map_or(LoadState::NotStarted, Entry::state)
    }

    /// Returns the cached definition without counting an owner.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<LoadedComponent>> {
        match &self.inner.entries.lock().get(name)?.slot {
            Slot::Fulfilled(loaded) => Some(Arc::clone(loaded)),
            Slot::Loading(_) => None,
        }
    }

    /// Checks whether the component is loading or cached.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.entries.lock().contains_key(name)
    }

    /// Lists components that are loading or cached.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.inner.entries.lock().keys().cloned().collect()
    }

    /// The style registry shared with this cache.
    #[must_use]
    pub fn styles(&self) -> &Arc<StyleRegistry> {
        &self.inner.styles
    }

    /// The path derivation rules.
    #[must_use]
    pub fn paths(&self) -> &ComponentPaths {
        &self.inner.paths
    }

    async fn acquire_styles(&self, name: &str, loaded: &LoadedComponent) -> Result<(), LoadError> {
        self.inner.styles.acquire_batch(name, &loaded.styles).await?;
        Ok(())
    }
}

fn register_presenter(
    inner: &CacheInner,
    name: &str,
    class: Arc<dyn PresenterClass>,
) -> Result<(), RegistryError> {
    let mut entries = inner.entries.lock();
    let entry = entries
        .get_mut(name)
        .ok_or_else(|| RegistryError::UnknownComponent(name.to_string()))?;
    if entry.presenter.is_some() {
        return Err(RegistryError::PresenterAlreadyRegistered(name.to_string()));
    }
    entry.presenter = Some(class);
    Ok(())
}

/// Runs one load and records its outcome in the entry.
async fn load_sequence(inner: Arc<CacheInner>, descriptor: ComponentDescriptor) -> LoadResult {
    let name = descriptor.name();
    tracing::debug!(component = name, kind = descriptor.kind(), "loading component");

    let result = resolve(&inner, &descriptor).await;

    {
        let mut entries = inner.entries.lock();
        match &result {
            Ok(loaded) => {
                if let Some(entry) = entries.get_mut(name) {
                    entry.slot = Slot::Fulfilled(Arc::clone(loaded));
                }
                tracing::debug!(component = name, "component loaded");
            }
            Err(err) => {
                entries.remove(name);
                tracing::warn!(component = name, error = %err, "component load failed");
            }
        }
    }

    result
}

async fn resolve(inner: &CacheInner, descriptor: &ComponentDescriptor) -> LoadResult {
    let (name, kind) = (descriptor.name(), descriptor.kind());

    let markup = match descriptor.markup() {
        Some(markup) => markup.to_string(),
        None => read(inner, inner.paths.markup_path(kind, name)).await?,
    };

    let styles = match descriptor.styles() {
        Some(styles) => styles.to_vec(),
        None => vec![read(inner, inner.paths.style_path(kind, name)).await?],
    };

    inner.styles.acquire_batch(name, &styles).await?;

    if let Some(export) = descriptor.presenter()
        && let Err(err) = attach_presenter(inner, descriptor, export).await
    {
        // Nobody owns the styles of a failed load.
        inner.styles.release(name);
        return Err(err);
    }

    Ok(Arc::new(LoadedComponent { markup, styles }))
}

async fn read(inner: &CacheInner, path: String) -> Result<String, LoadError> {
    inner
        .reader
        .read(&path)
        .await
        .map_err(|source| LoadError::Read { path, source })
}

async fn attach_presenter(
    inner: &CacheInner,
    descriptor: &ComponentDescriptor,
    export: &str,
) -> Result<(), LoadError> {
    let path = inner
        .paths
        .module_path(descriptor.kind(), descriptor.name());

    let module = match inner.modules.load(&path).await {
        Ok(module) => module,
        Err(source) => return Err(LoadError::Module { path, source }),
    };

    let class = module
        .export(export)
        .ok_or_else(|| LoadError::MissingExport {
            module: path,
            export: export.to_string(),
        })?;

    let name = descriptor.name();
    let mut entries = inner.entries.lock();
    if let Some(entry) = entries.get_mut(name) {
        if entry.presenter.is_some() {
            // Registered by hand while the module was loading.
            tracing::debug!(component = name, export, "keeping registered presenter");
        } else {
            entry.presenter = Some(class);
        }
    }
    Ok(())
}
