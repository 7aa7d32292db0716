//! In-memory document head.

use crate::error::InjectionError;
use crate::sink::{InjectionSink, StyleSheet};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// A style element held by a [`StyleHead`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleElement {
    /// Key the element was injected under.
    pub class: String,
    /// Rendered markup of the element.
    pub html: String,
}

#[derive(Debug, Default)]
struct HeadState {
    elements: Vec<StyleElement>,
    injections: HashMap<String, usize>,
    removals: HashMap<String, usize>,
}

/// An [`InjectionSink`] that keeps style elements in memory.
///
/// Inline sheets render as `<style class="key">…</style>` and linked sheets
/// as `<link rel="stylesheet" href="…" class="key">`. The head also counts
/// injections and removals per key, which hosts can use for diagnostics.
#[derive(Debug, Default)]
pub struct StyleHead {
    state: Mutex<HeadState>,
}

impl StyleHead {
    /// Creates an empty head.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Elements currently in the head, in insertion order.
    #[must_use]
    pub fn elements(&self) -> Vec<StyleElement> {
        self.state.lock().elements.clone()
    }

    /// Concatenated markup of every element in the head.
    #[must_use]
    pub fn html(&self) -> String {
        self.state
            .lock()
            .elements
            .iter()
            .map(|element| element.html.as_str())
            .collect()
    }

    /// Number of elements currently tagged with `key`.
    #[must_use]
    pub fn count(&self, key: &str) -> usize {
        self.state
            .lock()
            .elements
            .iter()
            .filter(|element| element.class == key)
            .count()
    }

    /// Number of injections ever made under `key`.
    #[must_use]
    pub fn injections(&self, key: &str) -> usize {
        self.state.lock().injections.get(key).copied().unwrap_or(0)
    }

    /// Number of removals ever requested for `key`.
    #[must_use]
    pub fn removals(&self, key: &str) -> usize {
        self.state.lock().removals.get(key).copied().unwrap_or(0)
    }
}

#[async_trait]
impl InjectionSink for StyleHead {
    async fn inject(&self, sheet: StyleSheet<'_>, key: &str) -> Result<String, InjectionError> {
        let html = render(sheet, key);
        let mut state = self.state.lock();
        state.elements.push(StyleElement {
            class: key.to_string(),
            html: html.clone(),
        });
        *state.injections.entry(key.to_string()).or_default() += 1;
        Ok(html)
    }

    fn remove(&self, key: &str) {
        let mut state = self.state.lock();
        state.elements.retain(|element| element.class != key);
        *state.removals.entry(key.to_string()).or_default() += 1;
    }
}

fn render(sheet: StyleSheet<'_>, key: &str) -> String {
    let class = escape_attr(key);
    match sheet {
        StyleSheet::Inline(content) => format!("<style class=\"{class}\">{content}</style>"),
        StyleSheet::Linked(url) => format!(
            "<link rel=\"stylesheet\" href=\"{}\" class=\"{class}\">",
            escape_attr(url)
        ),
    }
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}
