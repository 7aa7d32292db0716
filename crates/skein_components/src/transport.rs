//! Transports for component sources.
//!
//! - [`ResourceReader`] reads markup and style text by path.
//! - [`ModuleLoader`] resolves a module path to its exported presenter classes.
//!
//! [`FileReader`] and [`MemoryReader`] implement the former,
//! [`ModuleTable`] the latter.

use crate::error::TransportError;
use crate::presenter::PresenterClass;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Reads resource text by path.
#[async_trait]
pub trait ResourceReader: Send + Sync + 'static {
    /// Reads the text stored at `path`.
    async fn read(&self, path: &str) -> Result<String, TransportError>;
}

/// Resolves module paths to their exports.
#[async_trait]
pub trait ModuleLoader: Send + Sync + 'static {
    /// Loads the module at `path`.
    async fn load(&self, path: &str) -> Result<Module, TransportError>;
}

/// Exports of a loaded module, keyed by export name.
#[derive(Clone, Default)]
pub struct Module {
    exports: HashMap<String, Arc<dyn PresenterClass>>,
}

impl core::fmt::Debug for Module {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Module")
            .field("exports", &self.export_names())
            .finish()
    }
}

impl Module {
    /// Creates a module with no exports.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an export.
    #[must_use]
    pub fn with_export(mut self, name: impl Into<String>, class: impl PresenterClass) -> Self {
        self.exports.insert(name.into(), Arc::new(class));
        self
    }

    /// Returns the export named `name`.
    #[must_use]
    pub fn export(&self, name: &str) -> Option<Arc<dyn PresenterClass>> {
        self.exports.get(name).cloned()
    }

    /// Lists export names.
    #[must_use]
    pub fn export_names(&self) -> Vec<&str> {
        self.exports.keys().map(String::as_str).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FileReader
// ─────────────────────────────────────────────────────────────────────────────

/// Reads resources from a directory on disk.
///
/// Paths are resolved against the base directory; a leading `./` is ignored.
#[derive(Debug, Clone)]
pub struct FileReader {
    base: PathBuf,
}

impl FileReader {
    /// Creates a reader rooted at `base`.
    #[must_use]
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// The base directory.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let relative = path.trim_start_matches("./").trim_start_matches('/');
        self.base.join(relative)
    }
}

#[async_trait]
impl ResourceReader for FileReader {
    async fn read(&self, path: &str) -> Result<String, TransportError> {
        let file = self.resolve(path);
        match tokio::fs::read_to_string(&file).await {
            Ok(text) => Ok(text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(TransportError::not_found(path))
            }
            Err(err) => Err(err.into()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryReader
// ─────────────────────────────────────────────────────────────────────────────

/// Serves resources from memory and counts reads per path.
#[derive(Debug, Default)]
pub struct MemoryReader {
    files: RwLock<HashMap<String, String>>,
    reads: RwLock<HashMap<String, usize>>,
}

impl MemoryReader {
    /// Creates an empty reader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file.
    #[must_use]
    pub fn with_file(self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    /// Adds or replaces a file.
    pub fn insert(&self, path: impl Into<String>, text: impl Into<String>) {
        self.files.write().insert(path.into(), text.into());
    }

    /// Number of reads of `path`, including failed ones.
    #[must_use]
    pub fn reads(&self, path: &str) -> usize {
        self.reads.read().get(path).copied().unwrap_or(0)
    }

    /// Number of reads across all paths.
    #[must_use]
    pub fn total_reads(&self) -> usize {
        self.reads.read().values().sum()
    }
}

#[async_trait]
impl ResourceReader for MemoryReader {
    async fn read(&self, path: &str) -> Result<String, TransportError> {
        *self.reads.write().entry(path.to_string()).or_default() += 1;
        self.files
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| TransportError::not_found(path))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ModuleTable
// ─────────────────────────────────────────────────────────────────────────────

/// A fixed table of modules keyed by path.
///
/// Stands in for dynamic code loading: presenter classes are compiled into
/// the host and published under the path their component would import.
#[derive(Debug, Default)]
pub struct ModuleTable {
    modules: RwLock<HashMap<String, Module>>,
    loads: RwLock<HashMap<String, usize>>,
}

impl ModuleTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a module.
    #[must_use]
    pub fn with_module(self, path: impl Into<String>, module: Module) -> Self {
        self.insert(path, module);
        self
    }

    /// Adds or replaces a module.
    pub fn insert(&self, path: impl Into<String>, module: Module) {
        self.modules.write().insert(path.into(), module);
    }

    /// Number of loads of `path`, including failed ones.
    #[must_use]
    pub fn loads(&self, path: &str) -> usize {
        self.loads.read().get(path).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ModuleLoader for ModuleTable {
    async fn load(&self, path: &str) -> Result<Module, TransportError> {
        *self.loads.write().entry(path.to_string()).or_default() += 1;
        self.modules
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| TransportError::not_found(path))
    }
}
