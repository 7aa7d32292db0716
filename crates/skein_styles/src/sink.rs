//! The [`InjectionSink`] trait for surfaces that render style sheets.

use crate::error::InjectionError;
use async_trait::async_trait;

/// A style sheet handed to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleSheet<'a> {
    /// Raw style text.
    Inline(&'a str),
    /// A style sheet referenced by URL.
    Linked(&'a str),
}

/// Surface that makes style sheets observably active.
///
/// Every artifact injected under a key is tagged with that key, so that
/// [`remove`](Self::remove) can take all of them down at once.
#[async_trait]
pub trait InjectionSink: Send + Sync + 'static {
    /// Injects a style sheet tagged with `key` and returns its representation.
    async fn inject(&self, sheet: StyleSheet<'_>, key: &str) -> Result<String, InjectionError>;

    /// Removes every artifact tagged with `key`.
    fn remove(&self, key: &str);
}
