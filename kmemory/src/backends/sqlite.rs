use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use kcommon::{BoxFuture, ThreadId, UserId};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};

use crate::backend::{HistoryStore, validate_max_pairs};
use crate::error::HistoryError;
use crate::types::{ConversationTurn, append_pair, decode_turns, encode_turns};

pub const HISTORY_FILE_NAME: &str = "history.db";

#[derive(Debug)]
pub struct SqliteHistoryStore {
    connection: Mutex<Option<Connection>>,
    max_pairs: usize,
}

impl SqliteHistoryStore {
    pub fn new(path: impl AsRef<Path>, max_pairs: usize) -> Result<Self, HistoryError> {
        let max_pairs = validate_max_pairs(max_pairs)?;
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|error| {
                HistoryError::storage(format!(
                    "failed to create sqlite parent directory: {error}"
                ))
            })?;
        }

        let connection = Connection::open(path).map_err(|error| {
            HistoryError::storage(format!("failed to open sqlite database: {error}"))
        })?;
        Self::from_connection(connection, max_pairs)
    }

    pub fn new_in_memory(max_pairs: usize) -> Result<Self, HistoryError> {
        let max_pairs = validate_max_pairs(max_pairs)?;
        let connection = Connection::open_in_memory().map_err(|error| {
            HistoryError::storage(format!("failed to open in-memory sqlite database: {error}"))
        })?;
        Self::from_connection(connection, max_pairs)
    }

    pub fn max_pairs(&self) -> usize {
        self.max_pairs
    }

    fn from_connection(connection: Connection, max_pairs: usize) -> Result<Self, HistoryError> {
        connection
            .busy_timeout(Duration::from_secs(5))
            .map_err(|error| {
                HistoryError::storage(format!("failed to configure sqlite busy timeout: {error}"))
            })?;
        initialize_schema(&connection)?;

        Ok(Self {
            connection: Mutex::new(Some(connection)),
            max_pairs,
        })
    }

    fn with_connection<T>(
        &self,
        operation: impl FnOnce(&mut Connection) -> Result<T, HistoryError>,
    ) -> Result<T, HistoryError> {
        let mut guard = self
            .connection
            .lock()
            .map_err(|_| HistoryError::storage("sqlite history lock poisoned"))?;
        let connection = guard.as_mut().ok_or_else(HistoryError::closed)?;
        operation(connection)
    }
}

fn initialize_schema(conn: &Connection) -> Result<(), HistoryError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;

        CREATE TABLE IF NOT EXISTS thread_histories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            thread_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            history_json TEXT NOT NULL,
            last_updated_at INTEGER NOT NULL,
            UNIQUE(thread_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_thread_histories_thread
        ON thread_histories(thread_id);
        ",
    )
    .map_err(|error| HistoryError::storage(format!("failed to initialize sqlite schema: {error}")))
}

fn load_history_json(
    conn: &Connection,
    thread_id: &ThreadId,
    user_id: &UserId,
) -> Result<Option<String>, HistoryError> {
    conn.query_row(
        "
        SELECT history_json
        FROM thread_histories
        WHERE thread_id = ?1 AND user_id = ?2
        ",
        params![thread_id.as_str(), user_id.as_str()],
        |row| row.get::<_, String>(0),
    )
    .optional()
    .map_err(|error| HistoryError::storage(format!("failed to read thread history: {error}")))
}

impl HistoryStore for SqliteHistoryStore {
    fn add<'a>(
        &'a self,
        user_id: &'a UserId,
        thread_id: &'a ThreadId,
        user_message: &'a str,
        model_message: &'a str,
    ) -> BoxFuture<'a, Result<(), HistoryError>> {
        Box::pin(async move {
            self.with_connection(|conn| {
                let tx = conn
                    .transaction_with_behavior(TransactionBehavior::Immediate)
                    .map_err(|error| {
                        HistoryError::storage(format!("failed to begin history transaction: {error}"))
                    })?;

                let mut turns = match load_history_json(&tx, thread_id, user_id)? {
                    Some(json) => decode_turns(&json)?,
                    None => Vec::new(),
                };
                append_pair(&mut turns, user_message, model_message, self.max_pairs);
                let history_json = encode_turns(&turns)?;

                tx.execute(
                    "
                    INSERT INTO thread_histories (thread_id, user_id, history_json, last_updated_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(thread_id, user_id) DO UPDATE SET
                        history_json = excluded.history_json,
                        last_updated_at = excluded.last_updated_at
                    ",
                    params![
                        thread_id.as_str(),
                        user_id.as_str(),
                        history_json,
                        now_millis()?
                    ],
                )
                .map_err(|error| {
                    HistoryError::storage(format!("failed to upsert thread history: {error}"))
                })?;

                tx.commit().map_err(|error| {
                    HistoryError::storage(format!("failed to commit thread history: {error}"))
                })
            })
        })
    }

    fn get<'a>(
        &'a self,
        user_id: &'a UserId,
        thread_id: &'a ThreadId,
    ) -> BoxFuture<'a, Result<Vec<ConversationTurn>, HistoryError>> {
        Box::pin(async move {
            self.with_connection(|conn| match load_history_json(conn, thread_id, user_id)? {
                Some(json) => decode_turns(&json),
                None => Ok(Vec::new()),
            })
        })
    }

    fn clear<'a>(
        &'a self,
        user_id: &'a UserId,
        thread_id: &'a ThreadId,
    ) -> BoxFuture<'a, Result<(), HistoryError>> {
        Box::pin(async move {
            self.with_connection(|conn| {
                conn.execute(
                    "DELETE FROM thread_histories WHERE thread_id = ?1 AND user_id = ?2",
                    params![thread_id.as_str(), user_id.as_str()],
                )
                .map_err(|error| {
                    HistoryError::storage(format!("failed to clear thread history: {error}"))
                })?;
                Ok(())
            })
        })
    }

    fn clear_all_by_thread_id<'a>(
        &'a self,
        thread_id: &'a ThreadId,
    ) -> BoxFuture<'a, Result<(), HistoryError>> {
        Box::pin(async move {
            self.with_connection(|conn| {
                conn.execute(
                    "DELETE FROM thread_histories WHERE thread_id = ?1",
                    params![thread_id.as_str()],
                )
                .map_err(|error| {
                    HistoryError::storage(format!("failed to clear thread histories: {error}"))
                })?;
                Ok(())
            })
        })
    }

    fn close<'a>(&'a self) -> BoxFuture<'a, Result<(), HistoryError>> {
        Box::pin(async move {
            let mut guard = self
                .connection
                .lock()
                .map_err(|_| HistoryError::storage("sqlite history lock poisoned"))?;

            match guard.take() {
                Some(connection) => connection.close().map_err(|(_, error)| {
                    HistoryError::storage(format!("failed to close sqlite database: {error}"))
                }),
                None => Ok(()),
            }
        })
    }
}

fn now_millis() -> Result<i64, HistoryError> {
    let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).map_err(|error| {
        HistoryError::storage(format!("system clock predates unix epoch: {error}"))
    })?;
    Ok(elapsed.as_millis() as i64)
}

/// `KAZAMIDORI_HISTORY_PATH`, else `history.db` under `KAZAMIDORI_DATA_DIR`,
/// else under `~/.kazamidori`.
pub(crate) fn default_history_path() -> PathBuf {
    if let Some(explicit) = std::env::var_os("KAZAMIDORI_HISTORY_PATH") {
        return PathBuf::from(explicit);
    }

    if let Some(data_dir) = std::env::var_os("KAZAMIDORI_DATA_DIR") {
        return PathBuf::from(data_dir).join(HISTORY_FILE_NAME);
    }

    if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        return PathBuf::from(home)
            .join(".kazamidori")
            .join(HISTORY_FILE_NAME);
    }

    PathBuf::from(HISTORY_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use kcommon::{ThreadId, UserId};
    use rusqlite::params;

    use super::{SqliteHistoryStore, load_history_json};
    use crate::backend::HistoryStore;
    use crate::error::HistoryErrorKind;

    #[tokio::test]
    async fn add_reports_unreadable_row_and_leaves_it_untouched() {
        let store = SqliteHistoryStore::new_in_memory(5).expect("sqlite store");
        let user = UserId::from("user-1");
        let thread = ThreadId::from("thread-1");

        store
            .with_connection(|conn| {
                conn.execute(
                    "
                    INSERT INTO thread_histories (thread_id, user_id, history_json, last_updated_at)
                    VALUES (?1, ?2, ?3, 0)
                    ",
                    params![thread.as_str(), user.as_str(), "{not json"],
                )
                .expect("corrupt row should insert");
                Ok(())
            })
            .expect("connection should be open");

        let error = store
            .add(&user, &thread, "How is the weather?", "Sunny.")
            .await
            .expect_err("add over an unreadable row should fail");
        assert_eq!(error.kind, HistoryErrorKind::Serialization);

        let stored = store
            .with_connection(|conn| load_history_json(conn, &thread, &user))
            .expect("row should be readable as text");
        assert_eq!(stored.as_deref(), Some("{not json"));

        let error = store
            .get(&user, &thread)
            .await
            .expect_err("get should still report the unreadable row");
        assert_eq!(error.kind, HistoryErrorKind::Serialization);
    }
}
