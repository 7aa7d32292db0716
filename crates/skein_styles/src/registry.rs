//! Style resource registry.

use crate::error::{InjectionError, StyleError};
use crate::sink::{InjectionSink, StyleSheet};
use futures::future::{BoxFuture, FutureExt, Shared, try_join_all};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// A request to acquire a single style resource.
///
/// Exactly one of a URL or inline content must be given. Ownership is
/// counted under the identifier if one is set, otherwise under the URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleRequest {
    url: Option<String>,
    content: Option<String>,
    identifier: Option<String>,
}

impl StyleRequest {
    /// Requests a style sheet referenced by URL.
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Requests inline style text counted under `identifier`.
    pub fn inline(identifier: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            identifier: Some(identifier.into()),
            ..Self::default()
        }
    }

    /// Sets the identifier ownership is counted under.
    #[must_use]
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Sets the URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the inline content.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Validates the request and returns its key and sheet.
    fn resolve(&self) -> Result<(&str, StyleSheet<'_>), StyleError> {
        let url = self.url.as_deref().filter(|url| !url.is_empty());
        let content = self.content.as_deref().filter(|content| !content.is_empty());

        let sheet = match (url, content) {
            (Some(url), None) => StyleSheet::Linked(url),
            (None, Some(content)) => StyleSheet::Inline(content),
            (None, None) => {
                return Err(StyleError::invalid_argument(
                    "either a URL or style text must be provided",
                ));
            }
            (Some(_), Some(_)) => {
                return Err(StyleError::invalid_argument(
                    "a URL and style text cannot both be provided",
                ));
            }
        };

        let key = self
            .identifier
            .as_deref()
            .filter(|identifier| !identifier.is_empty())
            .or(url)
            .ok_or_else(|| StyleError::invalid_argument("inline style text needs an identifier"))?;

        Ok((key, sheet))
    }
}

type Injection = Result<String, InjectionError>;
type PendingInjection = Shared<BoxFuture<'static, Injection>>;

/// Ownership record of one key.
struct Entry {
    // Number of unreleased acquires. Never zero while the entry exists.
    count: usize,
    // First injection of the key. Cleared once it succeeds; a failed one
    // stays until every owner that awaited it has rolled back.
    pending: Option<PendingInjection>,
}

/// What an acquire has to do after its count is committed.
enum Claim {
    Inject(PendingInjection),
    Join(PendingInjection),
    Held,
}

/// Owned copy of a [`StyleSheet`] for injections that outlive the request.
enum OwnedSheet {
    Inline(String),
    Linked(String),
}

impl OwnedSheet {
    fn from_sheet(sheet: StyleSheet<'_>) -> Self {
        match sheet {
            StyleSheet::Inline(content) => Self::Inline(content.to_string()),
            StyleSheet::Linked(url) => Self::Linked(url.to_string()),
        }
    }

    fn as_sheet(&self) -> StyleSheet<'_> {
        match self {
            Self::Inline(content) => StyleSheet::Inline(content),
            Self::Linked(url) => StyleSheet::Linked(url),
        }
    }
}

/// Reference-counted registry of injected style resources.
///
/// The first acquire of a key injects through the [`InjectionSink`]; later
/// acquires only bump the count. The artifact is removed when the last owner
/// releases the key.
///
/// An acquire arriving while the first injection is still running waits for
/// it. If that injection fails, every acquire that waited on it fails too
/// and gives its count back, so a failed key never stays counted without an
/// artifact.
///
/// A repeat acquire returns `Ok(None)`: the caller does not receive the
/// representation produced by the first injection.
///
/// # Example
///
/// ```
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// use skein_styles::{StyleHead, StyleRegistry, StyleRequest};
/// use std::sync::Arc;
///
/// let head = Arc::new(StyleHead::new());
/// let registry = StyleRegistry::new(head.clone());
///
/// let request = StyleRequest::inline("theme", "body{color:red}");
/// assert!(registry.acquire(&request).await.unwrap().is_some());
/// assert!(registry.acquire(&request).await.unwrap().is_none());
///
/// registry.release("theme");
/// assert_eq!(registry.ref_count("theme"), Some(1));
/// assert_eq!(head.injections("theme"), 1);
/// # });
/// ```
pub struct StyleRegistry {
    sink: Arc<dyn InjectionSink>,
    entries: Mutex<HashMap<String, Entry>>,
}

impl core::fmt::Debug for StyleRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let entries = self.entries.lock();
        let counts: HashMap<&str, usize> = entries
            .iter()
            .map(|(key, entry)| (key.as_str(), entry.count))
            .collect();
        f.debug_struct("StyleRegistry")
            .field("counts", &counts)
            .finish_non_exhaustive()
    }
}

impl StyleRegistry {
    /// Creates an empty registry injecting through `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn InjectionSink>) -> Self {
        Self {
            sink,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Acquires one style resource.
    ///
    /// Returns the sink's representation on the first acquire of the key and
    /// `None` on every later one.
    ///
    /// # Errors
    ///
    /// - [`StyleError::InvalidArgument`] if the request is malformed; no
    ///   count is touched.
    /// - [`StyleError::Injection`] if the first injection of the key fails,
    ///   for the acquire that started it and every acquire that waited on
    ///   it. Each of them is rolled back so a retry injects again.
    pub async fn acquire(&self, request: &StyleRequest) -> Result<Option<String>, StyleError> {
        let (key, sheet) = request.resolve()?;

        self.acquire_with(key, || {
            let sink = Arc::clone(&self.sink);
            let sheet = OwnedSheet::from_sheet(sheet);
            let key = key.to_string();
            async move { sink.inject(sheet.as_sheet(), &key).await }.boxed()
        })
        .await
    }

    /// Acquires a group of style texts as one owner of `key`.
    ///
    /// The group counts once toward `key`. On the first acquire every text
    /// is injected concurrently and the representations are joined in input
    /// order; later acquires return `None`.
    ///
    /// # Errors
    ///
    /// - [`StyleError::InvalidArgument`] if `key` is empty.
    /// - [`StyleError::Injection`] if any injection fails. Texts already
    ///   injected under `key` are removed and every acquire that waited on
    ///   the group is rolled back.
    pub async fn acquire_batch(
        &self,
        key: &str,
        contents: &[String],
    ) -> Result<Option<String>, StyleError> {
        if key.is_empty() {
            return Err(StyleError::invalid_argument(
                "style group needs a non-empty key",
            ));
        }

        self.acquire_with(key, || {
            let sink = Arc::clone(&self.sink);
            let owned_key = key.to_string();
            let contents = contents.to_vec();
            async move {
                let injections = contents
                    .iter()
                    .map(|content| sink.inject(StyleSheet::Inline(content), &owned_key));
                let joined = try_join_all(injections).await;
                if joined.is_err() {
                    sink.remove(&owned_key);
                }
                joined.map(|parts| parts.concat())
            }
            .boxed()
        })
        .await
    }

    /// Releases one owner of `key`.
    ///
    /// When the last owner releases, the sink removes the key's artifacts
    /// and the entry is dropped. Untracked keys are ignored.
    pub fn release(&self, key: &str) {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get_mut(key) else {
            tracing::trace!(key, "release of untracked style ignored");
            return;
        };

        entry.count = entry.count.saturating_sub(1);
        if entry.count == 0 {
            entries.remove(key);
            // Removal stays under the lock so a concurrent first acquire
            // cannot inject before the old artifacts are gone.
            self.sink.remove(key);
            tracing::debug!(key, "style removed");
        }
    }

    /// Number of unreleased acquires for `key`, if tracked.
    #[must_use]
    pub fn ref_count(&self, key: &str) -> Option<usize> {
        self.entries.lock().get(key).map(|entry| entry.count)
    }

    /// Checks whether `key` is tracked.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    /// Lists tracked keys.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }

    /// Number of tracked keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if no key is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Counts one owner of `key`, then injects, waits, or returns at once.
    ///
    /// `inject` is only called for the first owner. The count is committed
    /// before any await.
    async fn acquire_with<F>(&self, key: &str, inject: F) -> Result<Option<String>, StyleError>
    where
        F: FnOnce() -> BoxFuture<'static, Injection>,
    {
        let claim = self.claim(key, inject);

        let (pending, first) = match claim {
            Claim::Held => {
                tracing::trace!(key, "style already injected");
                return Ok(None);
            }
            Claim::Join(pending) => {
                tracing::trace!(key, "waiting on in-flight style injection");
                (pending, false)
            }
            Claim::Inject(pending) => (pending, true),
        };

        match pending.await {
            Ok(html) => {
                if first {
                    self.settle(key);
                    tracing::debug!(key, "style injected");
                    Ok(Some(html))
                } else {
                    Ok(None)
                }
            }
            Err(source) => {
                self.rollback(key);
                if first {
                    tracing::warn!(key, error = %source, "style injection failed");
                }
                Err(StyleError::Injection {
                    key: key.to_string(),
                    source,
                })
            }
        }
    }

    fn claim<F>(&self, key: &str, inject: F) -> Claim
    where
        F: FnOnce() -> BoxFuture<'static, Injection>,
    {
        let mut entries = self.entries.lock();
        match entries.get_mut(key) {
            Some(entry) => {
                entry.count += 1;
                match &entry.pending {
                    Some(pending) => Claim::Join(pending.clone()),
                    None => Claim::Held,
                }
            }
            None => {
                let pending = inject().shared();
                entries.insert(
                    key.to_string(),
                    Entry {
                        count: 1,
                        pending: Some(pending.clone()),
                    },
                );
                Claim::Inject(pending)
            }
        }
    }

    /// Marks the first injection of `key` as done.
    fn settle(&self, key: &str) {
        if let Some(entry) = self.entries.lock().get_mut(key) {
            entry.pending = None;
        }
    }

    /// Gives back one count taken for an injection that failed.
    fn rollback(&self, key: &str) {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get_mut(key) {
            entry.count = entry.count.saturating_sub(1);
            if entry.count == 0 {
                entries.remove(key);
            }
        }
    }
}
