//! In-process document store.
//!
//! Behaves like the remote store as far as the sync layer can observe:
//! merge/replace writes, server timestamps, equality-filtered and ordered
//! collection queries, and live listeners. Used by tests and by the CLI, which
//! persists it to a JSON file between runs.

use std::cmp::Ordering;
use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex};

use super::{
    resolve_fields, CollectionQuery, Direction, Document, DocumentPath, Fields, RemoteStore,
    Snapshot, SnapshotStream, StoreError, StoreResult,
};
use crate::error::{Error, Result};

const STORE_FILE_VERSION: u32 = 1;

/// Thread-safe in-memory store. Clones share the same documents.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    documents: BTreeMap<DocumentPath, Fields>,
    listeners: Vec<Listener>,
    injected_failures: VecDeque<StoreError>,
    write_attempts: usize,
}

struct Listener {
    query: CollectionQuery,
    sender: mpsc::UnboundedSender<Snapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(default)]
    documents: BTreeMap<DocumentPath, Fields>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with documents.
    pub fn from_documents(documents: impl IntoIterator<Item = (DocumentPath, Fields)>) -> Self {
        let state = MemoryState {
            documents: documents.into_iter().collect(),
            ..MemoryState::default()
        };
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// Load a store file. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No store file at {}, starting empty", path.display());
            return Ok(Self::new());
        }

        let raw = std::fs::read_to_string(path)?;
        let file: StoreFile = serde_json::from_str(&raw)?;
        if file.version != STORE_FILE_VERSION {
            return Err(Error::InvalidInput(format!(
                "unsupported store file version {} (expected {})",
                file.version, STORE_FILE_VERSION
            )));
        }
        for document_path in file.documents.keys() {
            document_path.validate()?;
        }

        tracing::debug!(
            "Loaded {} documents from {}",
            file.documents.len(),
            path.display()
        );
        Ok(Self::from_documents(file.documents))
    }

    /// Write every document to `path`, creating parent directories.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = StoreFile {
            version: STORE_FILE_VERSION,
            documents: self.documents().await,
        };
        let serialized = serde_json::to_string_pretty(&file)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    /// Copy of every stored document.
    pub async fn documents(&self) -> BTreeMap<DocumentPath, Fields> {
        self.inner.lock().await.documents.clone()
    }

    /// Make the next write (set or delete) fail with `error` without applying it.
    pub async fn fail_next_write(&self, error: StoreError) {
        self.inner.lock().await.injected_failures.push_back(error);
    }

    /// Number of set/delete calls received, failed ones included.
    pub async fn write_attempts(&self) -> usize {
        self.inner.lock().await.write_attempts
    }

    /// Number of open listeners.
    pub async fn listener_count(&self) -> usize {
        let mut state = self.inner.lock().await;
        state.listeners.retain(|listener| !listener.sender.is_closed());
        state.listeners.len()
    }

    /// Deliver `error` to every open listener, as a failing watch stream would.
    pub async fn broadcast_error(&self, error: StoreError) {
        let state = self.inner.lock().await;
        for listener in &state.listeners {
            let _ = listener.sender.send(Err(error.clone()));
        }
    }
}

impl MemoryState {
    fn begin_write(&mut self, path: &DocumentPath) -> StoreResult<()> {
        self.write_attempts += 1;
        path.validate()?;
        match self.injected_failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn notify(&mut self, changed: &DocumentPath) {
        let collection = changed.parent();
        self.listeners.retain(|listener| !listener.sender.is_closed());
        for listener in &self.listeners {
            if listener.query.collection == collection {
                let snapshot = run_query(&self.documents, &listener.query);
                let _ = listener.sender.send(Ok(snapshot));
            }
        }
    }
}

fn run_query(documents: &BTreeMap<DocumentPath, Fields>, query: &CollectionQuery) -> Vec<Document> {
    let mut matches = documents
        .iter()
        .filter(|(path, fields)| query.matches(path, fields))
        .collect::<Vec<_>>();

    if let Some((field, direction)) = &query.order_by {
        matches.sort_by(|(_, left), (_, right)| {
            let ordering = match (left.get(field), right.get(field)) {
                (Some(left), Some(right)) => left.query_cmp(right),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            match direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            }
        });
    }

    matches
        .into_iter()
        .map(|(path, fields)| Document::new(path.id(), fields.clone()))
        .collect()
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn get_document(&self, path: &DocumentPath) -> StoreResult<Option<Fields>> {
        path.validate()?;
        Ok(self.inner.lock().await.documents.get(path).cloned())
    }

    async fn set_document(
        &self,
        path: &DocumentPath,
        fields: Fields,
        merge: bool,
    ) -> StoreResult<()> {
        let mut state = self.inner.lock().await;
        state.begin_write(path)?;

        let fields = resolve_fields(fields, chrono::Utc::now());
        if merge {
            state
                .documents
                .entry(path.clone())
                .or_default()
                .extend(fields);
        } else {
            state.documents.insert(path.clone(), fields);
        }

        tracing::debug!(document = %path, merge, "Document written");
        state.notify(path);
        Ok(())
    }

    async fn delete_document(&self, path: &DocumentPath) -> StoreResult<()> {
        let mut state = self.inner.lock().await;
        state.begin_write(path)?;

        if state.documents.remove(path).is_some() {
            tracing::debug!(document = %path, "Document deleted");
            state.notify(path);
        }
        Ok(())
    }

    async fn subscribe_collection(&self, query: CollectionQuery) -> StoreResult<SnapshotStream> {
        query.collection.validate()?;

        let mut state = self.inner.lock().await;
        let (sender, receiver) = mpsc::unbounded_channel();
        let _ = sender.send(Ok(run_query(&state.documents, &query)));
        state.listeners.push(Listener { query, sender });
        Ok(SnapshotStream::new(receiver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{server_timestamp, CollectionPath, FieldValue};
    use pretty_assertions::assert_eq;

    fn fields(entries: &[(&str, FieldValue)]) -> Fields {
        entries
            .iter()
            .map(|(key, value)| ((*key).to_string(), value.clone()))
            .collect()
    }

    fn ids(snapshot: Snapshot) -> Vec<String> {
        snapshot
            .unwrap()
            .into_iter()
            .map(|document| document.id)
            .collect()
    }

    #[tokio::test]
    async fn merge_keeps_existing_fields() {
        let store = MemoryStore::new();
        let path = CollectionPath::root("plans").doc("p1");

        store
            .set_document(&path, fields(&[("name", "Ella".into())]), false)
            .await
            .unwrap();
        store
            .set_document(&path, fields(&[("notes", "bring tea".into())]), true)
            .await
            .unwrap();

        let stored = store.get_document(&path).await.unwrap().unwrap();
        assert_eq!(
            stored,
            fields(&[("name", "Ella".into()), ("notes", "bring tea".into())])
        );
    }

    #[tokio::test]
    async fn replace_drops_missing_fields() {
        let store = MemoryStore::new();
        let path = CollectionPath::root("plans").doc("p1");

        store
            .set_document(&path, fields(&[("name", "Ella".into())]), false)
            .await
            .unwrap();
        store
            .set_document(&path, fields(&[("notes", "x".into())]), false)
            .await
            .unwrap();

        let stored = store.get_document(&path).await.unwrap().unwrap();
        assert!(!stored.contains_key("name"));
    }

    #[tokio::test]
    async fn server_timestamp_is_resolved_on_write() {
        let store = MemoryStore::new();
        let path = CollectionPath::root("plans").doc("p1");

        store
            .set_document(&path, fields(&[("dateCreated", server_timestamp())]), false)
            .await
            .unwrap();

        let stored = store.get_document(&path).await.unwrap().unwrap();
        assert!(matches!(
            stored.get("dateCreated"),
            Some(FieldValue::Timestamp(_))
        ));
    }

    #[tokio::test]
    async fn subscription_gets_initial_and_filtered_updates() {
        let store = MemoryStore::new();
        let plans = CollectionPath::root("plans");
        store
            .set_document(&plans.doc("a"), fields(&[("userId", "u1".into())]), false)
            .await
            .unwrap();

        let query = CollectionQuery::new(plans.clone()).where_eq("userId", "u1");
        let mut stream = store.subscribe_collection(query).await.unwrap();
        assert_eq!(ids(stream.next().await.unwrap()), vec!["a"]);

        store
            .set_document(&plans.doc("b"), fields(&[("userId", "u2".into())]), false)
            .await
            .unwrap();
        assert_eq!(ids(stream.next().await.unwrap()), vec!["a"]);

        store
            .set_document(&plans.doc("c"), fields(&[("userId", "u1".into())]), false)
            .await
            .unwrap();
        assert_eq!(ids(stream.next().await.unwrap()), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn ordered_query_sorts_by_field() {
        let chats = CollectionPath::root("plans").doc("p1").collection("chats");
        let store = MemoryStore::from_documents([
            (chats.doc("m1"), fields(&[("timestamp", FieldValue::Integer(30))])),
            (chats.doc("m2"), fields(&[("timestamp", FieldValue::Integer(10))])),
            (chats.doc("m3"), fields(&[])),
        ]);

        let query = CollectionQuery::new(chats).order_by("timestamp", Direction::Ascending);
        let mut stream = store.subscribe_collection(query).await.unwrap();
        assert_eq!(ids(stream.next().await.unwrap()), vec!["m2", "m1", "m3"]);
    }

    #[tokio::test]
    async fn injected_failure_applies_to_one_write() {
        let store = MemoryStore::new();
        let path = CollectionPath::root("plans").doc("p1");
        store
            .fail_next_write(StoreError::Unavailable("offline".to_string()))
            .await;

        let first = store.set_document(&path, Fields::new(), false).await;
        assert_eq!(
            first,
            Err(StoreError::Unavailable("offline".to_string()))
        );
        assert!(store.get_document(&path).await.unwrap().is_none());

        store.set_document(&path, Fields::new(), false).await.unwrap();
        assert!(store.get_document(&path).await.unwrap().is_some());
        assert_eq!(store.write_attempts().await, 2);
    }

    #[tokio::test]
    async fn dropped_stream_unsubscribes() {
        let store = MemoryStore::new();
        let plans = CollectionPath::root("plans");
        let stream = store
            .subscribe_collection(CollectionQuery::new(plans.clone()))
            .await
            .unwrap();
        assert_eq!(store.listener_count().await, 1);

        drop(stream);
        store
            .set_document(&plans.doc("a"), Fields::new(), false)
            .await
            .unwrap();
        assert_eq!(store.listener_count().await, 0);
    }

    #[tokio::test]
    async fn deleting_missing_document_is_silent() {
        let store = MemoryStore::new();
        let plans = CollectionPath::root("plans");
        let mut stream = store
            .subscribe_collection(CollectionQuery::new(plans.clone()))
            .await
            .unwrap();
        let _initial = stream.next().await;

        store.delete_document(&plans.doc("missing")).await.unwrap();
        assert!(stream.try_next().is_none());
    }

    #[tokio::test]
    async fn rejects_invalid_paths() {
        let store = MemoryStore::new();
        let bad = CollectionPath::root("plans").doc("a/b");
        assert!(matches!(
            store.set_document(&bad, Fields::new(), false).await,
            Err(StoreError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn save_and_load_round_trip_documents() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested").join("store.json");
        let path = CollectionPath::root("plans").doc("p1");

        let store = MemoryStore::new();
        store
            .set_document(&path, fields(&[("name", "Knuckles".into())]), false)
            .await
            .unwrap();
        store.save(&file).await.unwrap();

        let loaded = MemoryStore::load(&file).unwrap();
        assert_eq!(loaded.documents().await, store.documents().await);
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(store.inner.try_lock().unwrap().documents.len(), 0);
    }

    #[test]
    fn load_rejects_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("store.json");
        std::fs::write(&file, r#"{"version": 7, "documents": {}}"#).unwrap();

        assert!(matches!(
            MemoryStore::load(&file),
            Err(Error::InvalidInput(_))
        ));
    }
}
