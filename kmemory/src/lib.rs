//! Bounded per-thread conversation history with SQLite and in-memory backends.
//!
//! ```rust
//! use kmemory::{HistoryErrorKind, InMemoryHistoryStore};
//!
//! let store = InMemoryHistoryStore::new(3).expect("store should build");
//! assert_eq!(store.max_pairs(), 3);
//!
//! let error = InMemoryHistoryStore::new(0).expect_err("zero pairs is rejected");
//! assert_eq!(error.kind, HistoryErrorKind::InvalidRequest);
//! ```

mod backend;
mod backends;
mod error;
mod types;

pub mod prelude {
    pub use crate::{
        ConversationTurn, HistoryBackendConfig, HistoryError, HistoryErrorKind, HistoryStore,
        InMemoryHistoryStore, SqliteHistoryStore, TurnRole, create_history_store,
    };
}

pub use backend::{
    HistoryBackendConfig, HistoryStore, InMemoryHistoryStore, SqliteHistoryStore,
    create_history_store,
};
pub use backends::sqlite::HISTORY_FILE_NAME;
pub use error::{HistoryError, HistoryErrorKind};
pub use types::{ConversationTurn, TurnRole};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use kcommon::{ThreadId, UserId};

    use crate::{
        ConversationTurn, HistoryBackendConfig, HistoryErrorKind, HistoryStore,
        InMemoryHistoryStore, SqliteHistoryStore, create_history_store,
    };

    fn temp_dir(prefix: &str) -> std::path::PathBuf {
        let unique = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("kmemory-{prefix}-{unique}"))
    }

    fn stores(max_pairs: usize) -> Vec<(&'static str, Arc<dyn HistoryStore>)> {
        vec![
            (
                "memory",
                Arc::new(InMemoryHistoryStore::new(max_pairs).expect("memory store")),
            ),
            (
                "sqlite",
                Arc::new(SqliteHistoryStore::new_in_memory(max_pairs).expect("sqlite store")),
            ),
        ]
    }

    #[tokio::test]
    async fn add_then_get_returns_pair_in_order() {
        let user = UserId::from("user-1");
        let thread = ThreadId::from("thread-1");

        for (name, store) in stores(5) {
            store
                .add(&user, &thread, "How is the weather?", "Sunny.")
                .await
                .expect("add should succeed");

            let turns = store.get(&user, &thread).await.expect("get should succeed");
            assert_eq!(
                turns,
                vec![
                    ConversationTurn::user("How is the weather?"),
                    ConversationTurn::model("Sunny."),
                ],
                "backend {name}"
            );
        }
    }

    #[tokio::test]
    async fn unknown_key_yields_empty_history() {
        for (name, store) in stores(5) {
            let turns = store
                .get(&UserId::from("nobody"), &ThreadId::from("nowhere"))
                .await
                .expect("get should succeed");
            assert!(turns.is_empty(), "backend {name}");
        }
    }

    #[tokio::test]
    async fn oldest_pairs_are_evicted_past_the_limit() {
        let user = UserId::from("user-1");
        let thread = ThreadId::from("thread-1");

        for (name, store) in stores(3) {
            for index in 1..=4 {
                store
                    .add(&user, &thread, &format!("q{index}"), &format!("a{index}"))
                    .await
                    .expect("add should succeed");
            }

            let turns = store.get(&user, &thread).await.expect("get should succeed");
            let contents = turns
                .iter()
                .map(|turn| turn.content.as_str())
                .collect::<Vec<_>>();
            assert_eq!(
                contents,
                vec!["q2", "a2", "q3", "a3", "q4", "a4"],
                "backend {name}"
            );
        }
    }

    #[tokio::test]
    async fn clear_only_touches_one_key() {
        let alice = UserId::from("alice");
        let bob = UserId::from("bob");
        let thread = ThreadId::from("thread-1");

        for (name, store) in stores(5) {
            store.add(&alice, &thread, "a", "b").await.expect("add alice");
            store.add(&bob, &thread, "c", "d").await.expect("add bob");

            store.clear(&alice, &thread).await.expect("clear should succeed");

            assert!(
                store.get(&alice, &thread).await.expect("get alice").is_empty(),
                "backend {name}"
            );
            assert_eq!(
                store.get(&bob, &thread).await.expect("get bob").len(),
                2,
                "backend {name}"
            );
        }
    }

    #[tokio::test]
    async fn clear_all_by_thread_spares_other_threads() {
        let alice = UserId::from("alice");
        let bob = UserId::from("bob");
        let shared = ThreadId::from("shared");
        let other = ThreadId::from("other");

        for (name, store) in stores(5) {
            store.add(&alice, &shared, "a", "b").await.expect("add");
            store.add(&bob, &shared, "c", "d").await.expect("add");
            store.add(&alice, &other, "e", "f").await.expect("add");

            store
                .clear_all_by_thread_id(&shared)
                .await
                .expect("clear all should succeed");

            assert!(store.get(&alice, &shared).await.expect("get").is_empty());
            assert!(store.get(&bob, &shared).await.expect("get").is_empty());
            assert_eq!(
                store.get(&alice, &other).await.expect("get").len(),
                2,
                "backend {name}"
            );
        }
    }

    #[tokio::test]
    async fn closed_store_rejects_operations_and_close_is_idempotent() {
        let user = UserId::from("user-1");
        let thread = ThreadId::from("thread-1");

        for (name, store) in stores(5) {
            store.close().await.expect("first close should succeed");
            store.close().await.expect("second close should succeed");

            let error = store
                .add(&user, &thread, "a", "b")
                .await
                .expect_err("add after close should fail");
            assert_eq!(error.kind, HistoryErrorKind::Closed, "backend {name}");

            let error = store
                .get(&user, &thread)
                .await
                .expect_err("get after close should fail");
            assert_eq!(error.kind, HistoryErrorKind::Closed, "backend {name}");
        }
    }

    #[test]
    fn zero_max_pairs_is_rejected() {
        let error = InMemoryHistoryStore::new(0).expect_err("zero should be rejected");
        assert_eq!(error.kind, HistoryErrorKind::InvalidRequest);

        let error = SqliteHistoryStore::new_in_memory(0).expect_err("zero should be rejected");
        assert_eq!(error.kind, HistoryErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn sqlite_history_survives_reopen() {
        let path = temp_dir("reopen").join("history.db");
        let user = UserId::from("user-1");
        let thread = ThreadId::from("thread-1");

        {
            let store = create_history_store(
                HistoryBackendConfig::Sqlite { path: path.clone() },
                5,
            )
            .expect("sqlite store should open");
            store.add(&user, &thread, "hello", "hi").await.expect("add");
            store.close().await.expect("close");
        }

        let reopened = SqliteHistoryStore::new(&path, 5).expect("sqlite store should reopen");
        let turns = reopened.get(&user, &thread).await.expect("get");
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1], ConversationTurn::model("hi"));

        reopened.close().await.expect("close");
        let _ = std::fs::remove_dir_all(path.parent().expect("temp parent"));
    }
}
