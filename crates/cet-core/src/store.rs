//! Exchange metadata store.
//!
//! The tracker only needs three operations from its storage collaborator:
//! look a document up by exchange name, insert a new document, and apply a
//! set of `field.path -> value` assignments to an existing document. The
//! [`MetadataStore`] trait captures exactly that.
//!
//! Two implementations ship with the crate:
//!
//! - [`MemoryStore`] — documents held as JSON trees behind a tokio `RwLock`.
//! - [`FileStore`] — a `MemoryStore` mirrored to one JSON file on disk,
//!   rewritten atomically (temp file + rename) after every accepted write.
//!
//! # Partial updates
//!
//! ```text
//! FieldUpdate { "last_update": t,
//!               "coins.BTC.price.USD": 100.0,
//!               "coins.BTC.market_cap": null }
//!        │
//!        ▼  $set semantics: walk the dotted path, create missing objects,
//!           overwrite only the leaf. Untouched fields survive.
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::error::CetError;
use crate::types::ExchangeMetadataDocument;

// ---------------------------------------------------------------------------
// FieldUpdate
// ---------------------------------------------------------------------------

/// An ordered set of dotted field paths and the values to assign to them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldUpdate {
    sets: BTreeMap<String, Value>,
}

impl FieldUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `value` (serialized to JSON) at `path`.
    ///
    /// A value that does not serialize leaves the update unchanged.
    pub fn set(
        &mut self,
        path: impl Into<String>,
        value: impl Serialize,
    ) -> Result<&mut Self, CetError> {
        let path = path.into();
        let value = serde_json::to_value(value)
            .map_err(|e| CetError::Store(format!("cannot serialize value for {path}: {e}")))?;
        self.sets.insert(path, value);
        Ok(self)
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.sets.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.sets.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

/// Assign `value` at the dotted `path` inside `doc`, creating intermediate
/// objects as needed.
///
/// Fails if an intermediate segment exists but is not an object.
pub fn apply_set(doc: &mut Value, path: &str, value: Value) -> Result<(), CetError> {
    let mut segments = path.split('.').peekable();
    let mut cursor = doc;

    while let Some(segment) = segments.next() {
        if segment.is_empty() {
            return Err(CetError::Store(format!("empty segment in field path '{path}'")));
        }
        let obj = cursor.as_object_mut().ok_or_else(|| {
            CetError::Store(format!("cannot create field '{segment}' in non-object ('{path}')"))
        })?;

        if segments.peek().is_none() {
            obj.insert(segment.to_string(), value);
            return Ok(());
        }
        cursor = obj.entry(segment.to_string()).or_insert_with(|| Value::Object(Map::new()));
    }

    Err(CetError::Store("empty field path".into()))
}

// ---------------------------------------------------------------------------
// MetadataStore trait
// ---------------------------------------------------------------------------

/// Storage collaborator for exchange documents.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Fetch the document keyed by exchange name.
    async fn find(&self, key: &str) -> Result<Option<ExchangeMetadataDocument>, CetError>;

    /// Insert a new document. Fails if the key already exists.
    async fn insert(&self, doc: &ExchangeMetadataDocument) -> Result<(), CetError>;

    /// Apply `update` to the document keyed by `key`.
    ///
    /// Returns `false` when no such document exists (nothing is written).
    async fn update(&self, key: &str, update: &FieldUpdate) -> Result<bool, CetError>;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-process document store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_docs(docs: BTreeMap<String, Value>) -> Self {
        Self { docs: RwLock::new(docs) }
    }

    /// Raw JSON tree of one document.
    pub async fn raw(&self, key: &str) -> Option<Value> {
        self.docs.read().await.get(key).cloned()
    }

    /// Copy of every document.
    pub async fn snapshot(&self) -> BTreeMap<String, Value> {
        self.docs.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }
}

#[async_trait]
impl MetadataStore for MemoryStore {
    async fn find(&self, key: &str) -> Result<Option<ExchangeMetadataDocument>, CetError> {
        let docs = self.docs.read().await;
        docs.get(key)
            .map(|v| {
                serde_json::from_value(v.clone())
                    .map_err(|e| CetError::Store(format!("corrupt document '{key}': {e}")))
            })
            .transpose()
    }

    async fn insert(&self, doc: &ExchangeMetadataDocument) -> Result<(), CetError> {
        let value = serde_json::to_value(doc).map_err(|e| CetError::Store(e.to_string()))?;
        let mut docs = self.docs.write().await;
        if docs.contains_key(&doc.id) {
            return Err(CetError::Store(format!("duplicate key '{}'", doc.id)));
        }
        docs.insert(doc.id.clone(), value);
        Ok(())
    }

    async fn update(&self, key: &str, update: &FieldUpdate) -> Result<bool, CetError> {
        let mut docs = self.docs.write().await;
        let Some(doc) = docs.get_mut(key) else {
            return Ok(false);
        };

        // Apply to a copy so a bad path leaves the stored document untouched.
        let mut next = doc.clone();
        for (path, value) in update.iter() {
            apply_set(&mut next, path, value.clone())?;
        }
        *doc = next;
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// A [`MemoryStore`] persisted to a single JSON file.
#[derive(Debug)]
pub struct FileStore {
    inner: MemoryStore,
    path: PathBuf,
    flush_lock: Mutex<()>,
}

impl FileStore {
    /// Open `path`, loading existing documents if the file exists.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, CetError> {
        let path = path.as_ref().to_path_buf();
        let docs = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<BTreeMap<String, Value>>(&bytes)
                .map_err(|e| CetError::Store(format!("cannot parse {}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(CetError::Store(format!("cannot read {}: {e}", path.display()))),
        };
        info!("[store] opened {} ({} document(s))", path.display(), docs.len());

        Ok(Self { inner: MemoryStore::from_docs(docs), path, flush_lock: Mutex::new(()) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the current documents to disk via a temp file and rename.
    async fn flush(&self) -> Result<(), CetError> {
        let _guard = self.flush_lock.lock().await;
        let snapshot = self.inner.snapshot().await;
        let bytes =
            serde_json::to_vec_pretty(&snapshot).map_err(|e| CetError::Store(e.to_string()))?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| CetError::Store(format!("cannot create {}: {e}", dir.display())))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| CetError::Store(format!("cannot write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| CetError::Store(format!("cannot replace {}: {e}", self.path.display())))?;
        debug!("[store] flushed {} bytes to {}", bytes.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for FileStore {
    async fn find(&self, key: &str) -> Result<Option<ExchangeMetadataDocument>, CetError> {
        self.inner.find(key).await
    }

    async fn insert(&self, doc: &ExchangeMetadataDocument) -> Result<(), CetError> {
        self.inner.insert(doc).await?;
        self.flush().await
    }

    async fn update(&self, key: &str, update: &FieldUpdate) -> Result<bool, CetError> {
        let matched = self.inner.update(key, update).await?;
        if matched {
            self.flush().await?;
        }
        Ok(matched)
    }
}
