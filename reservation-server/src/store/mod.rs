//! Storage layer
//!
//! Every store is a trait so the admission path never knows which backend it
//! talks to.
//!
//! | Trait | PostgreSQL ([`PgStore`]) | Embedded ([`EmbeddedStore`]) |
//! |-------|--------------------------|------------------------------|
//! | [`SlotCounter`] | conditional `UPDATE … RETURNING` | get/check/insert in one redb write txn |
//! | [`ReservationLedger`] | `UNIQUE (phone, date, time)` | exists/insert in one redb write txn |
//! | [`SettingsStore`] | singleton row | singleton key |
//! | [`IdentityDirectory`] | `line_users` table | `line_users` table |
//!
//! Handoff tokens live in a [`TokenStore`]: Redis when configured, otherwise
//! an in-process map with per-entry deadlines.

pub mod embedded;
pub mod postgres;
pub mod tokens;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use shared::models::{CapacitySettings, LineIdentity, ReservationRecord};
use thiserror::Error;

pub use embedded::EmbeddedStore;
pub use postgres::PgStore;
pub use tokens::{MemoryTokenStore, RedisTokenStore};

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Reservation id {0} already in use")]
    IdConflict(i64),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Ledger insert failure
#[derive(Debug, Error)]
pub enum InsertError {
    /// `(phone, date, time)` already present
    #[error("reservation already exists")]
    Duplicate,

    /// Another reservation already holds this record id
    #[error("reservation id {0} already taken")]
    IdTaken(i64),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Per-(date, slot) admission counters
#[async_trait]
pub trait SlotCounter: Send + Sync {
    /// Atomically: if the cell's count is below `capacity`, increment it and
    /// return `true`; otherwise leave it unchanged and return `false`.
    ///
    /// A missing cell counts as zero and is created on first touch.
    async fn try_admit(&self, date: &str, slot_id: &str, capacity: i32) -> StoreResult<bool>;

    /// Current counts for every touched slot on `date`
    async fn counts(&self, date: &str) -> StoreResult<HashMap<String, i32>>;

    /// Delete cells for dates strictly before `date`; returns cells removed
    async fn purge_before(&self, date: &str) -> StoreResult<u64>;
}

/// Durable record of confirmed reservations
#[async_trait]
pub trait ReservationLedger: Send + Sync {
    async fn find_by_identity(
        &self,
        phone: &str,
        date: &str,
        time: &str,
    ) -> StoreResult<Option<ReservationRecord>>;

    /// Insert a record; [`InsertError::Duplicate`] when its identity exists,
    /// [`InsertError::IdTaken`] when another record already holds its id
    async fn insert(&self, record: &ReservationRecord) -> Result<(), InsertError>;

    /// Records for `date`, ordered by time then creation
    async fn list_by_date(&self, date: &str) -> StoreResult<Vec<ReservationRecord>>;
}

/// Capacity settings singleton
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Stored settings, or the defaults when none were saved
    async fn load_settings(&self) -> StoreResult<CapacitySettings>;

    async fn save_settings(&self, settings: &CapacitySettings) -> StoreResult<()>;
}

/// Phone → LINE identity bindings
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn find_by_phone(&self, phone: &str) -> StoreResult<Option<LineIdentity>>;

    /// Insert or replace the binding for `identity.phone`
    async fn upsert_identity(&self, identity: &LineIdentity) -> StoreResult<()>;
}

/// Ephemeral key/value store with native TTL
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()>;

    /// Value if present and not expired
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Read and delete in one operation
    async fn take(&self, key: &str) -> StoreResult<Option<String>>;

    /// Drop expired entries; backends with native expiry return 0
    async fn sweep(&self) -> usize {
        0
    }

    fn backend_name(&self) -> &'static str;
}

/// The durable stores used by the service, all on one backend
#[derive(Clone)]
pub struct Stores {
    pub slots: Arc<dyn SlotCounter>,
    pub ledger: Arc<dyn ReservationLedger>,
    pub settings: Arc<dyn SettingsStore>,
    pub identities: Arc<dyn IdentityDirectory>,
    pub backend: &'static str,
}

impl Stores {
    pub fn embedded(store: EmbeddedStore) -> Self {
        let store = Arc::new(store);
        Self {
            slots: store.clone(),
            ledger: store.clone(),
            settings: store.clone(),
            identities: store,
            backend: "redb",
        }
    }

    pub fn postgres(store: PgStore) -> Self {
        let store = Arc::new(store);
        Self {
            slots: store.clone(),
            ledger: store.clone(),
            settings: store.clone(),
            identities: store,
            backend: "postgres",
        }
    }
}
