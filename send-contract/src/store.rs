//! State access contract
//!
//! The host state machine exposes batched reads and writes. Each call has
//! two error channels which callers check independently:
//!
//! - `Err(StoreError::Request)` - transport or backend fault
//! - `response.error` - rejection by the state machine itself
//!
//! `into_result` folds both into [`crate::Error::Store`]. A single
//! `state_write` commits all of its sets and deletes atomically.

use crate::error::{Result, StoreError};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Key to read, tagged with a caller chosen id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRead {
    /// Correlation id, unique within one request
    pub query_id: u64,
    /// State key
    pub key: Vec<u8>,
}

/// Batched read
#[derive(Debug, Clone, Default)]
pub struct ReadRequest {
    /// Keys to read
    pub keys: Vec<KeyRead>,
}

/// Result of one [`KeyRead`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadResult {
    /// Correlation id of the originating read
    pub query_id: u64,
    /// Stored value, `None` on a miss
    pub value: Option<Vec<u8>>,
}

/// Response to a [`ReadRequest`]
#[derive(Debug, Clone, Default)]
pub struct ReadResponse {
    /// One result per key read
    pub results: Vec<ReadResult>,
    /// Semantic error
    pub error: Option<FsmError>,
}

impl ReadResponse {
    /// Fail on a semantic error, otherwise hand back the results
    pub fn into_result(self) -> Result<Vec<ReadResult>> {
        match self.error {
            Some(err) => Err(StoreError::Rejected(err).into()),
            None => Ok(self.results),
        }
    }
}

/// Value read for `query_id`; a missing result counts as a miss
pub fn value_for(results: &[ReadResult], query_id: u64) -> Option<&[u8]> {
    results
        .iter()
        .find(|r| r.query_id == query_id)
        .and_then(|r| r.value.as_deref())
}

/// Upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetOp {
    /// State key
    pub key: Vec<u8>,
    /// New value
    pub value: Vec<u8>,
}

/// Delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOp {
    /// State key
    pub key: Vec<u8>,
}

/// Atomic batched write
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteRequest {
    /// Keys to set
    pub sets: Vec<SetOp>,
    /// Keys to delete
    pub deletes: Vec<DeleteOp>,
}

/// Response to a [`WriteRequest`]
#[derive(Debug, Clone, Default)]
pub struct WriteResponse {
    /// Semantic error
    pub error: Option<FsmError>,
}

impl WriteResponse {
    /// Fail on a semantic error
    pub fn into_result(self) -> Result<()> {
        match self.error {
            Some(err) => Err(StoreError::Rejected(err).into()),
            None => Ok(()),
        }
    }
}

/// Rejection reported by the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsmError {
    /// Module-specific code
    pub code: u32,
    /// Reporting module
    pub module: String,
    /// Human readable message
    pub message: String,
}

impl FsmError {
    /// Create a new FSM error
    pub fn new(code: u32, module: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            module: module.into(),
            message: message.into(),
        }
    }

    /// Duplicate query id within one read
    pub fn duplicate_query_id(query_id: u64) -> Self {
        Self::new(1, "store", format!("duplicate query id {}", query_id))
    }

    /// Key both set and deleted within one write
    pub fn conflicting_write() -> Self {
        Self::new(2, "store", "key both set and deleted in one batch")
    }

    /// Write against a read-only view
    pub fn read_only() -> Self {
        Self::new(3, "store", "state is read-only")
    }
}

impl fmt::Display for FsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}: {}", self.module, self.code, self.message)
    }
}

impl std::error::Error for FsmError {}

/// Keyed state store
pub trait StateStore: Send + Sync {
    /// Batched read
    fn state_read(&self, request: &ReadRequest) -> std::result::Result<ReadResponse, StoreError>;

    /// Atomic batched write
    fn state_write(&self, request: &WriteRequest)
        -> std::result::Result<WriteResponse, StoreError>;
}

impl<S: StateStore + ?Sized> StateStore for &S {
    fn state_read(&self, request: &ReadRequest) -> std::result::Result<ReadResponse, StoreError> {
        (**self).state_read(request)
    }

    fn state_write(
        &self,
        request: &WriteRequest,
    ) -> std::result::Result<WriteResponse, StoreError> {
        (**self).state_write(request)
    }
}

/// Semantic checks shared by the bundled stores
pub(crate) fn check_read(request: &ReadRequest) -> Option<FsmError> {
    let mut seen = HashSet::with_capacity(request.keys.len());
    request
        .keys
        .iter()
        .find(|k| !seen.insert(k.query_id))
        .map(|k| FsmError::duplicate_query_id(k.query_id))
}

pub(crate) fn check_write(request: &WriteRequest) -> Option<FsmError> {
    let deleted: HashSet<&[u8]> = request.deletes.iter().map(|d| d.key.as_slice()).collect();
    request
        .sets
        .iter()
        .any(|s| deleted.contains(s.key.as_slice()))
        .then(FsmError::conflicting_write)
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value directly
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.state.read().get(key).cloned()
    }

    /// Set a value directly, bypassing the batch contract
    pub fn insert(&self, key: Vec<u8>, value: Vec<u8>) {
        self.state.write().insert(key, value);
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.state.read().len()
    }

    /// True if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.state.read().is_empty()
    }

    /// Copy of the whole state
    pub fn snapshot(&self) -> BTreeMap<Vec<u8>, Vec<u8>> {
        self.state.read().clone()
    }
}

impl StateStore for MemoryStore {
    fn state_read(&self, request: &ReadRequest) -> std::result::Result<ReadResponse, StoreError> {
        if let Some(error) = check_read(request) {
            return Ok(ReadResponse {
                results: vec![],
                error: Some(error),
            });
        }

        let state = self.state.read();
        let results = request
            .keys
            .iter()
            .map(|k| ReadResult {
                query_id: k.query_id,
                value: state.get(&k.key).cloned(),
            })
            .collect();

        Ok(ReadResponse {
            results,
            error: None,
        })
    }

    fn state_write(
        &self,
        request: &WriteRequest,
    ) -> std::result::Result<WriteResponse, StoreError> {
        if let Some(error) = check_write(request) {
            return Ok(WriteResponse { error: Some(error) });
        }

        // Single lock for the whole batch
        let mut state = self.state.write();
        for set in &request.sets {
            state.insert(set.key.clone(), set.value.clone());
        }
        for delete in &request.deletes {
            state.remove(&delete.key);
        }

        tracing::debug!(
            sets = request.sets.len(),
            deletes = request.deletes.len(),
            "Batch committed"
        );

        Ok(WriteResponse { error: None })
    }
}

/// Read-only view over another store
#[derive(Debug)]
pub struct ReadOnly<S> {
    inner: S,
}

impl<S: StateStore> ReadOnly<S> {
    /// Wrap `inner`
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: StateStore> StateStore for ReadOnly<S> {
    fn state_read(&self, request: &ReadRequest) -> std::result::Result<ReadResponse, StoreError> {
        self.inner.state_read(request)
    }

    fn state_write(
        &self,
        _request: &WriteRequest,
    ) -> std::result::Result<WriteResponse, StoreError> {
        Ok(WriteResponse {
            error: Some(FsmError::read_only()),
        })
    }
}
