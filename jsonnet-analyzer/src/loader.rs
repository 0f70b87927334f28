//! Cross-document loading: a URI → [`Document`] cache over an abstract
//! source store, plus import path resolution.
//!
//! The filesystem is reached only through [`SourceStore`], so the whole
//! analysis stack runs unchanged over an in-memory map in tests and over
//! `walkdir` in production.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lsp_types::Url;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::ast::{Document, NodeKind};
use crate::errors::{Error, Result};
use crate::location::{path_from_uri, uri_from_path};
use crate::resolver::ScopeResolver;

/// Extensions the workspace walker recognises.
const JSONNET_SUFFIXES: &[&str] = &[".jsonnet", ".libsonnet", ".jsonnet.TEMPLATE"];

pub fn is_jsonnet_file(name: &str) -> bool {
    JSONNET_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Read access to source files, keyed by path. Implementations must be
/// shareable with the transport layer.
pub trait SourceStore: Send + Sync {
    fn read(&self, path: &Path) -> io::Result<String>;

    /// Whether `path` exists as a regular file (used by import resolution).
    fn contains(&self, path: &Path) -> bool;

    /// Every Jsonnet file under `root`, `.git` subtrees excluded.
    fn walk(&self, root: &Path) -> Vec<PathBuf>;
}

/// The real filesystem.
#[derive(Debug, Default)]
pub struct FsSourceStore;

impl SourceStore for FsSourceStore {
    fn read(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn contains(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn walk(&self, root: &Path) -> Vec<PathBuf> {
        let mut out = Vec::new();
        let walker = WalkDir::new(root)
            .into_iter()
            .filter_entry(|e| e.file_name() != ".git");
        for entry in walker.filter_map(|entry| entry.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if is_jsonnet_file(&name) {
                out.push(entry.path().to_path_buf());
            }
        }
        out.sort();
        out
    }
}

/// An in-memory store for tests and embedders.
#[derive(Debug, Default)]
pub struct MemorySourceStore {
    files: BTreeMap<PathBuf, String>,
}

impl MemorySourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, source: impl Into<String>) {
        self.files.insert(path.into(), source.into());
    }
}

impl SourceStore for MemorySourceStore {
    fn read(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn walk(&self, root: &Path) -> Vec<PathBuf> {
        self.files
            .keys()
            .filter(|p| p.starts_with(root))
            .filter(|p| !p.components().any(|c| c.as_os_str() == ".git"))
            .filter(|p| is_jsonnet_file(&p.to_string_lossy()))
            .cloned()
            .collect()
    }
}

/// Owns the URI → document cache and import resolution.
///
/// Documents are handed out as `Arc` snapshots: replacing a document on
/// change never mutates the previous value, so in-flight readers stay
/// consistent.
pub struct DocumentLoader {
    store: Box<dyn SourceStore>,
    workspace_root: PathBuf,
    /// Extra import search directories (after the importer's own directory,
    /// before the workspace root). Default: `<root>/vendor`.
    search_dirs: Vec<PathBuf>,
    documents: HashMap<Url, Arc<Document>>,
}

impl DocumentLoader {
    pub fn new(store: Box<dyn SourceStore>, workspace_root: PathBuf) -> Self {
        let search_dirs = vec![workspace_root.join("vendor")];
        Self {
            store,
            workspace_root,
            search_dirs,
            documents: HashMap::new(),
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn set_workspace_root(&mut self, root: PathBuf) {
        self.search_dirs = vec![root.join("vendor")];
        self.workspace_root = root;
    }

    /// Replace the search directories consulted between the importer's
    /// directory and the workspace root.
    pub fn set_search_dirs(&mut self, dirs: Vec<PathBuf>) {
        self.search_dirs = dirs;
    }

    /// Read the source behind a `file://` URI through the store.
    fn fetch_source(&self, uri: &Url) -> Result<String> {
        let path = path_from_uri(uri).ok_or_else(|| Error::InvalidUri(uri.to_string()))?;
        Ok(self.store.read(&path)?)
    }

    /// Parse, build, and scope-resolve a document, replacing any cached
    /// value wholesale. `None` when the source cannot be read or parsed.
    pub fn load(&mut self, uri: Url, source: Option<String>) -> Option<Arc<Document>> {
        let source = match source {
            Some(source) => source,
            None => match self.fetch_source(&uri) {
                Ok(source) => source,
                Err(err) => {
                    warn!(uri = %uri, %err, "failed to read source");
                    return None;
                }
            },
        };

        let mut doc = match Document::from_source(uri.clone(), source) {
            Ok(doc) => doc,
            Err(err) => {
                warn!(uri = %uri, %err, "failed to parse document");
                return None;
            }
        };
        ScopeResolver::resolve(&mut doc);

        let doc = Arc::new(doc);
        self.documents.insert(uri, Arc::clone(&doc));
        Some(doc)
    }

    /// Cached document, loading lazily on a miss. Failed loads are not
    /// cached negatively.
    pub fn get(&mut self, uri: &Url) -> Option<Arc<Document>> {
        if let Some(doc) = self.documents.get(uri) {
            return Some(Arc::clone(doc));
        }
        self.load(uri.clone(), None)
    }

    /// Resolve an import path against the deterministic search order:
    /// importer directory, configured search directories, workspace root.
    /// Absolute paths bypass the search. `None` when nothing matches.
    pub fn resolve_import(&self, importer: &Url, raw_path: &str) -> Option<PathBuf> {
        let candidate = Path::new(raw_path);
        if candidate.is_absolute() {
            return Some(candidate.to_path_buf());
        }

        let importer_dir = path_from_uri(importer).and_then(|p| p.parent().map(Path::to_path_buf));

        let search = importer_dir
            .into_iter()
            .chain(self.search_dirs.iter().cloned())
            .chain(std::iter::once(self.workspace_root.clone()));

        for dir in search {
            let joined = dir.join(candidate);
            if self.store.contains(&joined) {
                return Some(joined);
            }
        }

        debug!(importer = %importer, raw_path, "import did not resolve");
        None
    }

    /// Resolve and load the document behind an `import` expression node.
    pub fn importee(&mut self, importer: &Arc<Document>, import: crate::ast::NodeId) -> Option<Arc<Document>> {
        let NodeKind::Import { path, .. } = importer.kind(import) else {
            return None;
        };
        let NodeKind::Str { raw } = importer.kind(*path) else {
            return None;
        };
        self.importee_by_path(importer.uri(), raw)
    }

    /// Resolve and load an importee given its raw path string.
    pub fn importee_by_path(&mut self, importer: &Url, raw_path: &str) -> Option<Arc<Document>> {
        let path = self.resolve_import(importer, raw_path)?;
        let uri = uri_from_path(&path)?;
        self.get(&uri)
    }

    /// Every Jsonnet file in the workspace.
    pub fn walk_workspace(&self) -> Vec<PathBuf> {
        self.store.walk(&self.workspace_root)
    }

    /// Raw source of a file, bypassing the document cache (used by the
    /// textual pre-filter of the references search).
    pub fn read_source(&self, path: &Path) -> Option<String> {
        self.store.read(path).ok()
    }

    /// Load every document under the workspace root, returning the loaded
    /// set (used by the CLI indexer and exhaustive rescans).
    pub fn load_all(&mut self) -> Vec<Arc<Document>> {
        let mut out = Vec::new();
        for path in self.walk_workspace() {
            if let Some(uri) = uri_from_path(&path) {
                if let Some(doc) = self.get(&uri) {
                    out.push(doc);
                }
            }
        }
        out
    }
}
