//! History store trait, backend selection, and in-memory implementation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use kcommon::{BoxFuture, ThreadId, UserId};

use crate::backends::sqlite::default_history_path;
use crate::error::HistoryError;
use crate::types::{ConversationTurn, append_pair};

pub use crate::backends::sqlite::SqliteHistoryStore;

/// Bounded, ordered conversation turns keyed by `(thread, user)`.
///
/// `add` is a read-modify-write that must be atomic per key: two concurrent
/// adds on the same key both land.
pub trait HistoryStore: Send + Sync {
    fn add<'a>(
        &'a self,
        user_id: &'a UserId,
        thread_id: &'a ThreadId,
        user_message: &'a str,
        model_message: &'a str,
    ) -> BoxFuture<'a, Result<(), HistoryError>>;

    /// Chronological turns. An unknown key yields an empty list.
    fn get<'a>(
        &'a self,
        user_id: &'a UserId,
        thread_id: &'a ThreadId,
    ) -> BoxFuture<'a, Result<Vec<ConversationTurn>, HistoryError>>;

    fn clear<'a>(
        &'a self,
        user_id: &'a UserId,
        thread_id: &'a ThreadId,
    ) -> BoxFuture<'a, Result<(), HistoryError>>;

    fn clear_all_by_thread_id<'a>(
        &'a self,
        thread_id: &'a ThreadId,
    ) -> BoxFuture<'a, Result<(), HistoryError>>;

    /// Releases resources. Later calls on the store fail with `Closed`;
    /// closing twice is not an error.
    fn close<'a>(&'a self) -> BoxFuture<'a, Result<(), HistoryError>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryBackendConfig {
    Sqlite { path: PathBuf },
    InMemory,
}

impl Default for HistoryBackendConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: default_history_path(),
        }
    }
}

pub fn create_history_store(
    config: HistoryBackendConfig,
    max_pairs: usize,
) -> Result<Arc<dyn HistoryStore>, HistoryError> {
    match config {
        HistoryBackendConfig::Sqlite { path } => {
            Ok(Arc::new(SqliteHistoryStore::new(path, max_pairs)?))
        }
        HistoryBackendConfig::InMemory => Ok(Arc::new(InMemoryHistoryStore::new(max_pairs)?)),
    }
}

pub(crate) fn validate_max_pairs(max_pairs: usize) -> Result<usize, HistoryError> {
    if max_pairs == 0 {
        return Err(HistoryError::invalid_request(
            "max_pairs must be greater than zero",
        ));
    }
    Ok(max_pairs)
}

type HistoryKey = (ThreadId, UserId);

#[derive(Debug)]
pub struct InMemoryHistoryStore {
    histories: Mutex<HashMap<HistoryKey, Vec<ConversationTurn>>>,
    max_pairs: usize,
    closed: AtomicBool,
}

impl InMemoryHistoryStore {
    pub fn new(max_pairs: usize) -> Result<Self, HistoryError> {
        Ok(Self {
            histories: Mutex::new(HashMap::new()),
            max_pairs: validate_max_pairs(max_pairs)?,
            closed: AtomicBool::new(false),
        })
    }

    pub fn max_pairs(&self) -> usize {
        self.max_pairs
    }

    fn histories(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<HistoryKey, Vec<ConversationTurn>>>, HistoryError>
    {
        if self.closed.load(Ordering::Acquire) {
            return Err(HistoryError::closed());
        }

        self.histories
            .lock()
            .map_err(|_| HistoryError::storage("history store lock poisoned"))
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn add<'a>(
        &'a self,
        user_id: &'a UserId,
        thread_id: &'a ThreadId,
        user_message: &'a str,
        model_message: &'a str,
    ) -> BoxFuture<'a, Result<(), HistoryError>> {
        Box::pin(async move {
            let mut histories = self.histories()?;
            let turns = histories
                .entry((thread_id.clone(), user_id.clone()))
                .or_default();
            append_pair(turns, user_message, model_message, self.max_pairs);
            Ok(())
        })
    }

    fn get<'a>(
        &'a self,
        user_id: &'a UserId,
        thread_id: &'a ThreadId,
    ) -> BoxFuture<'a, Result<Vec<ConversationTurn>, HistoryError>> {
        Box::pin(async move {
            let histories = self.histories()?;
            Ok(histories
                .get(&(thread_id.clone(), user_id.clone()))
                .cloned()
                .unwrap_or_default())
        })
    }

    fn clear<'a>(
        &'a self,
        user_id: &'a UserId,
        thread_id: &'a ThreadId,
    ) -> BoxFuture<'a, Result<(), HistoryError>> {
        Box::pin(async move {
            let mut histories = self.histories()?;
            histories.remove(&(thread_id.clone(), user_id.clone()));
            Ok(())
        })
    }

    fn clear_all_by_thread_id<'a>(
        &'a self,
        thread_id: &'a ThreadId,
    ) -> BoxFuture<'a, Result<(), HistoryError>> {
        Box::pin(async move {
            let mut histories = self.histories()?;
            histories.retain(|(thread, _), _| thread != thread_id);
            Ok(())
        })
    }

    fn close<'a>(&'a self) -> BoxFuture<'a, Result<(), HistoryError>> {
        Box::pin(async move {
            if self.closed.swap(true, Ordering::AcqRel) {
                return Ok(());
            }

            let mut histories = self
                .histories
                .lock()
                .map_err(|_| HistoryError::storage("history store lock poisoned"))?;
            histories.clear();
            Ok(())
        })
    }
}
