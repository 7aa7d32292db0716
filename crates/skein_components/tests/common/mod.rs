//! Shared test utilities for `skein_components` integration tests.

#![allow(
    dead_code,
    missing_docs,
    reason = "shared test utilities, not all items used in every test binary"
)]

use async_trait::async_trait;
use core::sync::atomic::{AtomicUsize, Ordering};
use parking_lot::Mutex;
use skein_components::{
    ComponentCache, FailureReporter, MemoryReader, Module, ModuleLoader, ModuleTable,
    ResourceReader, TransportError,
};
use skein_core::ComponentPaths;
use skein_styles::{
    InjectionError, InjectionSink, StyleHead, StyleRegistry, StyleSheet,
};
use std::sync::Arc;

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSPORTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Reader that yields to the scheduler before every read, so concurrent
/// loads interleave the way real I/O would make them.
#[derive(Default)]
pub struct SlowReader {
    pub files: MemoryReader,
}

#[async_trait]
impl ResourceReader for SlowReader {
    async fn read(&self, path: &str) -> Result<String, TransportError> {
        tokio::task::yield_now().await;
        self.files.read(path).await
    }
}

/// Module loader that yields before every load.
#[derive(Default)]
pub struct SlowModules {
    pub table: ModuleTable,
}

#[async_trait]
impl ModuleLoader for SlowModules {
    async fn load(&self, path: &str) -> Result<Module, TransportError> {
        tokio::task::yield_now().await;
        self.table.load(path).await
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SINK
// ═══════════════════════════════════════════════════════════════════════════════

/// Head that fails its first `failures` injections, then delegates.
pub struct FlakyHead {
    pub head: Arc<StyleHead>,
    failures: AtomicUsize,
}

#[async_trait]
impl InjectionSink for FlakyHead {
    async fn inject(&self, sheet: StyleSheet<'_>, key: &str) -> Result<String, InjectionError> {
        tokio::task::yield_now().await;
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(InjectionError::new("head is detached"));
        }
        self.head.inject(sheet, key).await
    }

    fn remove(&self, key: &str) {
        self.head.remove(key);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REPORTER
// ═══════════════════════════════════════════════════════════════════════════════

/// A recorded failure report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub stage: String,
    pub context: String,
    pub cause: String,
}

/// Reporter that records every failure.
#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<Report>>,
}

impl RecordingReporter {
    pub fn reports(&self) -> Vec<Report> {
        self.reports.lock().clone()
    }
}

impl FailureReporter for RecordingReporter {
    fn report_failure(&self, stage: &str, context: &str, cause: &str) {
        self.reports.lock().push(Report {
            stage: stage.to_string(),
            context: context.to_string(),
            cause: cause.to_string(),
        });
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FIXTURE
// ═══════════════════════════════════════════════════════════════════════════════

pub const CARD_HTML: &str = "./web-components/widgets/card/card.html";
pub const CARD_CSS: &str = "./web-components/widgets/card/card.css";
pub const CARD_JS: &str = "./web-components/widgets/card/card.js";

/// A cache wired to slow in-memory transports and an in-memory head.
pub struct Fixture {
    pub head: Arc<StyleHead>,
    pub styles: Arc<StyleRegistry>,
    pub reader: Arc<SlowReader>,
    pub modules: Arc<SlowModules>,
    pub cache: ComponentCache,
}

impl Fixture {
    pub fn new() -> Self {
        let head = Arc::new(StyleHead::new());
        Self::with_sink(head.clone(), head)
    }

    /// A fixture whose first `failures` style injections fail.
    pub fn with_injection_failures(failures: usize) -> Self {
        let head = Arc::new(StyleHead::new());
        let sink = Arc::new(FlakyHead {
            head: head.clone(),
            failures: AtomicUsize::new(failures),
        });
        Self::with_sink(head, sink)
    }

    fn with_sink(head: Arc<StyleHead>, sink: Arc<dyn InjectionSink>) -> Self {
        let styles = Arc::new(StyleRegistry::new(sink));
        let reader = Arc::new(SlowReader::default());
        let modules = Arc::new(SlowModules::default());
        let cache = ComponentCache::new(
            styles.clone(),
            reader.clone(),
            modules.clone(),
            ComponentPaths::default(),
        );
        Self {
            head,
            styles,
            reader,
            modules,
            cache,
        }
    }

    /// Adds the card component's markup and style files.
    pub fn with_card_files(self) -> Self {
        self.reader.files.insert(CARD_HTML, "<div class=\"card\"></div>");
        self.reader.files.insert(CARD_CSS, ".card{}");
        self
    }
}
