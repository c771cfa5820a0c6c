//! In-process graph store.
//!
//! Used by tests and local tooling. Knobs let a test inject write failures,
//! add latency to every call, or hide existing documents from existence
//! checks to reproduce the check-then-create race between two writers.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::client::{split_handle, GraphError};
use crate::store::{
    CollectionKind, GraphDefinition, GraphStore, RowCursor, TraversalQuery, TraversalRow,
};

#[derive(Debug)]
struct Collection {
    kind: CollectionKind,
    documents: BTreeSet<String>,
    /// (from handle, to handle), in insertion order; duplicates allowed.
    edges: Vec<(String, String)>,
}

impl Collection {
    fn new(kind: CollectionKind) -> Self {
        Self {
            kind,
            documents: BTreeSet::new(),
            edges: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    collections: HashMap<String, Collection>,
    graphs: BTreeMap<String, GraphDefinition>,
    writes: usize,
    open_cursors: usize,
    fail_creates_after: Option<usize>,
    latency: Option<Duration>,
    hide_existing: bool,
}

impl State {
    /// Count a document or edge write, failing once the injected budget is spent.
    fn charge_write(&mut self, what: &str) -> Result<(), GraphError> {
        if let Some(limit) = self.fail_creates_after {
            if self.writes >= limit {
                return Err(GraphError::Injected(format!("write {what} refused")));
            }
        }
        self.writes += 1;
        Ok(())
    }

    fn collection(&self, name: &str) -> Result<&Collection, GraphError> {
        self.collections
            .get(name)
            .ok_or_else(|| GraphError::CollectionNotFound(name.to_string()))
    }

    fn collection_of(&self, name: &str, kind: CollectionKind) -> Result<&Collection, GraphError> {
        let collection = self.collection(name)?;
        if collection.kind != kind {
            return Err(GraphError::CollectionNotFound(format!("{kind:?} collection {name}")));
        }
        Ok(collection)
    }

    fn collection_mut(&mut self, name: &str) -> Result<&mut Collection, GraphError> {
        self.collections
            .get_mut(name)
            .ok_or_else(|| GraphError::CollectionNotFound(name.to_string()))
    }

    fn vertex_exists(&self, handle: &str) -> Result<bool, GraphError> {
        let (collection, key) = split_handle(handle)?;
        Ok(self
            .collections
            .get(collection)
            .is_some_and(|c| c.documents.contains(key)))
    }
}

/// Shared in-memory store. Clone is cheap (inner Arc); knobs apply to every clone.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `n` more document/edge writes, then fail every further one.
    pub fn fail_creates_after(self, n: usize) -> Self {
        {
            let mut state = self.state.lock();
            state.fail_creates_after = Some(state.writes + n);
        }
        self
    }

    /// Delay every call by `latency` before it touches the state.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.state.lock().latency = Some(latency);
        self
    }

    /// Make existence checks always answer false.
    pub fn hide_existing(self) -> Self {
        self.state.lock().hide_existing = true;
        self
    }

    /// Clear every injected fault and delay.
    pub fn without_faults(self) -> Self {
        {
            let mut state = self.state.lock();
            state.fail_creates_after = None;
            state.latency = None;
            state.hide_existing = false;
        }
        self
    }

    /// Number of documents in a collection (0 if it does not exist).
    pub fn document_count(&self, collection: &str) -> usize {
        self.state
            .lock()
            .collections
            .get(collection)
            .map_or(0, |c| c.documents.len())
    }

    /// Number of edges in an edge collection, duplicates included.
    pub fn edge_count(&self, collection: &str) -> usize {
        self.state
            .lock()
            .collections
            .get(collection)
            .map_or(0, |c| c.edges.len())
    }

    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().collections.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn graph(&self, name: &str) -> Option<GraphDefinition> {
        self.state.lock().graphs.get(name).cloned()
    }

    /// Successful document and edge writes so far.
    pub fn write_count(&self) -> usize {
        self.state.lock().writes
    }

    pub fn open_cursors(&self) -> usize {
        self.state.lock().open_cursors
    }

    async fn pause(&self) {
        let latency = self.state.lock().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn collection_exists(&self, name: &str) -> Result<bool, GraphError> {
        self.pause().await;
        let state = self.state.lock();
        Ok(!state.hide_existing && state.collections.contains_key(name))
    }

    async fn create_collection(&self, name: &str, kind: CollectionKind) -> Result<(), GraphError> {
        self.pause().await;
        let mut state = self.state.lock();
        if state.collections.contains_key(name) {
            return Err(GraphError::Duplicate {
                collection: name.to_string(),
                key: String::new(),
            });
        }
        state
            .collections
            .insert(name.to_string(), Collection::new(kind));
        Ok(())
    }

    async fn graph_exists(&self, name: &str) -> Result<bool, GraphError> {
        self.pause().await;
        let state = self.state.lock();
        Ok(!state.hide_existing && state.graphs.contains_key(name))
    }

    async fn create_graph(&self, graph: &GraphDefinition) -> Result<(), GraphError> {
        self.pause().await;
        let mut state = self.state.lock();
        if state.graphs.contains_key(&graph.name) {
            return Err(GraphError::Duplicate {
                collection: "graphs".to_string(),
                key: graph.name.clone(),
            });
        }
        state
            .collections
            .entry(graph.edge_collection.clone())
            .or_insert_with(|| Collection::new(CollectionKind::Edge));
        state.graphs.insert(graph.name.clone(), graph.clone());
        Ok(())
    }

    async fn document_exists(&self, collection: &str, key: &str) -> Result<bool, GraphError> {
        self.pause().await;
        let state = self.state.lock();
        let exists = state.collection(collection)?.documents.contains(key);
        Ok(exists && !state.hide_existing)
    }

    async fn create_document(&self, collection: &str, key: &str) -> Result<(), GraphError> {
        self.pause().await;
        let mut state = self.state.lock();
        if state
            .collection_of(collection, CollectionKind::Vertex)?
            .documents
            .contains(key)
        {
            return Err(GraphError::Duplicate {
                collection: collection.to_string(),
                key: key.to_string(),
            });
        }
        state.charge_write(&format!("{collection}/{key}"))?;
        state.collection_mut(collection)?.documents.insert(key.to_string());
        Ok(())
    }

    async fn edge_exists(
        &self,
        collection: &str,
        from: &str,
        to: &str,
    ) -> Result<bool, GraphError> {
        self.pause().await;
        let state = self.state.lock();
        let exists = state
            .collection(collection)?
            .edges
            .iter()
            .any(|(f, t)| f == from && t == to);
        Ok(exists && !state.hide_existing)
    }

    async fn create_edge(&self, collection: &str, from: &str, to: &str) -> Result<(), GraphError> {
        self.pause().await;
        let mut state = self.state.lock();
        state.collection_of(collection, CollectionKind::Edge)?;
        for handle in [from, to] {
            if !state.vertex_exists(handle)? {
                let (c, k) = split_handle(handle)?;
                return Err(GraphError::NotFound {
                    collection: c.to_string(),
                    key: k.to_string(),
                });
            }
        }
        state.charge_write(&format!("{collection} {from} -> {to}"))?;
        state
            .collection_mut(collection)?
            .edges
            .push((from.to_string(), to.to_string()));
        Ok(())
    }

    async fn traverse(&self, query: &TraversalQuery) -> Result<Box<dyn RowCursor>, GraphError> {
        self.pause().await;
        let mut state = self.state.lock();

        let roles = state.collection(&query.start_collection)?;
        let edges = state
            .collections
            .get(&query.edge_collection)
            .map(|c| c.edges.as_slice())
            .unwrap_or_default();

        let mut rows = VecDeque::with_capacity(roles.documents.len());
        for key in &roles.documents {
            let from = format!("{}/{key}", query.start_collection);
            let permissions: BTreeSet<String> = edges
                .iter()
                .filter(|(f, _)| *f == from)
                .filter_map(|(_, t)| split_handle(t).ok())
                .filter(|(c, _)| *c == query.target_collection)
                .map(|(_, k)| k.to_string())
                .collect();
            rows.push_back(TraversalRow {
                role: key.clone(),
                permissions: permissions.into_iter().collect(),
            });
        }

        state.open_cursors += 1;
        Ok(Box::new(MemoryCursor {
            store: self.clone(),
            rows,
            open: true,
        }))
    }
}

/// Cursor over a snapshot of traversal rows. Released on close or drop.
struct MemoryCursor {
    store: MemoryStore,
    rows: VecDeque<TraversalRow>,
    open: bool,
}

impl MemoryCursor {
    fn release(&mut self) {
        if self.open {
            self.open = false;
            self.store.state.lock().open_cursors -= 1;
        }
    }
}

#[async_trait]
impl RowCursor for MemoryCursor {
    async fn next_row(&mut self) -> Result<Option<TraversalRow>, GraphError> {
        self.store.pause().await;
        Ok(self.rows.pop_front())
    }

    async fn close(self: Box<Self>) {
        let mut cursor = self;
        cursor.release();
    }
}

impl Drop for MemoryCursor {
    fn drop(&mut self) {
        self.release();
    }
}
