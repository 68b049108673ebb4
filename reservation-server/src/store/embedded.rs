//! redb-based embedded backend (single node, development, tests)
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `slot_counts` | `(date, slot_id)` | `u32` | Admission counters |
//! | `reservations` | `(phone, date, time)` | `ReservationRecord` | Ledger |
//! | `settings` | `"capacity"` | `CapacitySettings` | Singleton |
//! | `line_users` | `phone` | `LineIdentity` | Messaging bindings |
//!
//! redb allows one write transaction at a time, so a read-check-write inside
//! a single write transaction is atomic with respect to every other writer.
//! All calls run on the blocking pool.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use shared::models::{CapacitySettings, LineIdentity, ReservationRecord};

use super::{
    IdentityDirectory, InsertError, ReservationLedger, SettingsStore, SlotCounter, StoreResult,
};

/// Admission counters: key = (date, slot_id), value = admitted count
const SLOT_COUNTS_TABLE: TableDefinition<(&str, &str), u32> = TableDefinition::new("slot_counts");

/// Ledger: key = (phone, date, time), value = JSON-serialized ReservationRecord
const RESERVATIONS_TABLE: TableDefinition<(&str, &str, &str), &[u8]> =
    TableDefinition::new("reservations");

/// Settings singleton: key = SETTINGS_KEY, value = JSON-serialized CapacitySettings
const SETTINGS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("settings");

/// LINE bindings: key = phone, value = JSON-serialized LineIdentity
const LINE_USERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("line_users");

const SETTINGS_KEY: &str = "capacity";

/// Embedded store backed by redb
#[derive(Clone)]
pub struct EmbeddedStore {
    db: Arc<Database>,
}

impl EmbeddedStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests, throwaway runs)
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StoreResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(SLOT_COUNTS_TABLE)?;
            let _ = write_txn.open_table(RESERVATIONS_TABLE)?;
            let _ = write_txn.open_table(SETTINGS_TABLE)?;
            let _ = write_txn.open_table(LINE_USERS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Run a blocking closure against this store on the blocking pool
    async fn blocking<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&EmbeddedStore) -> StoreResult<T> + Send + 'static,
    {
        let this = self.clone();
        tokio::task::spawn_blocking(move || f(&this)).await?
    }

    // ========== Slot counters ==========

    fn try_admit_sync(&self, date: &str, slot_id: &str, capacity: i32) -> StoreResult<bool> {
        let txn = self.db.begin_write()?;
        let admitted = {
            let mut table = txn.open_table(SLOT_COUNTS_TABLE)?;
            let current = table
                .get((date, slot_id))?
                .map(|guard| guard.value())
                .unwrap_or(0);
            if i64::from(current) < i64::from(capacity) {
                table.insert((date, slot_id), current + 1)?;
                true
            } else {
                false
            }
        };
        if admitted {
            txn.commit()?;
        } else {
            txn.abort()?;
        }
        Ok(admitted)
    }

    fn counts_sync(&self, date: &str) -> StoreResult<HashMap<String, i32>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SLOT_COUNTS_TABLE)?;

        let mut counts = HashMap::new();
        for result in table.range((date, "")..)? {
            let (key, value) = result?;
            let (cell_date, slot_id) = key.value();
            if cell_date != date {
                break;
            }
            counts.insert(slot_id.to_string(), value.value() as i32);
        }
        Ok(counts)
    }

    fn purge_before_sync(&self, date: &str) -> StoreResult<u64> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(SLOT_COUNTS_TABLE)?;

            // Collect first, then remove
            let mut keys_to_remove: Vec<(String, String)> = Vec::new();
            for result in table.range(("", "")..(date, ""))? {
                let (key, _value) = result?;
                let (cell_date, slot_id) = key.value();
                keys_to_remove.push((cell_date.to_string(), slot_id.to_string()));
            }

            for (cell_date, slot_id) in &keys_to_remove {
                table.remove((cell_date.as_str(), slot_id.as_str()))?;
            }
            keys_to_remove.len() as u64
        };
        txn.commit()?;
        Ok(removed)
    }

    // ========== Ledger ==========

    fn find_sync(
        &self,
        phone: &str,
        date: &str,
        time: &str,
    ) -> StoreResult<Option<ReservationRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RESERVATIONS_TABLE)?;
        match table.get((phone, date, time))? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Returns `false` when the identity already exists
    fn insert_sync(&self, record: &ReservationRecord) -> StoreResult<bool> {
        let key = (
            record.phone.as_str(),
            record.date.as_str(),
            record.time.as_str(),
        );
        let value = serde_json::to_vec(record)?;

        let txn = self.db.begin_write()?;
        let inserted = {
            let mut table = txn.open_table(RESERVATIONS_TABLE)?;
            if table.get(key)?.is_some() {
                false
            } else {
                table.insert(key, value.as_slice())?;
                true
            }
        };
        if inserted {
            txn.commit()?;
        } else {
            txn.abort()?;
        }
        Ok(inserted)
    }

    fn list_by_date_sync(&self, date: &str) -> StoreResult<Vec<ReservationRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RESERVATIONS_TABLE)?;

        let mut records = Vec::new();
        for result in table.iter()? {
            let (key, value) = result?;
            let (_phone, record_date, _time) = key.value();
            if record_date == date {
                let record: ReservationRecord = serde_json::from_slice(value.value())?;
                records.push(record);
            }
        }

        records.sort_by(|a, b| a.time.cmp(&b.time).then(a.created_at.cmp(&b.created_at)));
        Ok(records)
    }

    // ========== Settings ==========

    fn load_settings_sync(&self) -> StoreResult<CapacitySettings> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SETTINGS_TABLE)?;
        match table.get(SETTINGS_KEY)? {
            Some(guard) => Ok(serde_json::from_slice(guard.value())?),
            None => Ok(CapacitySettings::default()),
        }
    }

    fn save_settings_sync(&self, settings: &CapacitySettings) -> StoreResult<()> {
        let value = serde_json::to_vec(settings)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(SETTINGS_TABLE)?;
            table.insert(SETTINGS_KEY, value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    // ========== LINE identities ==========

    fn find_identity_sync(&self, phone: &str) -> StoreResult<Option<LineIdentity>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LINE_USERS_TABLE)?;
        match table.get(phone)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    fn upsert_identity_sync(&self, identity: &LineIdentity) -> StoreResult<()> {
        let value = serde_json::to_vec(identity)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(LINE_USERS_TABLE)?;
            table.insert(identity.phone.as_str(), value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }
}

#[async_trait]
impl SlotCounter for EmbeddedStore {
    async fn try_admit(&self, date: &str, slot_id: &str, capacity: i32) -> StoreResult<bool> {
        let (date, slot_id) = (date.to_owned(), slot_id.to_owned());
        self.blocking(move |s| s.try_admit_sync(&date, &slot_id, capacity))
            .await
    }

    async fn counts(&self, date: &str) -> StoreResult<HashMap<String, i32>> {
        let date = date.to_owned();
        self.blocking(move |s| s.counts_sync(&date)).await
    }

    async fn purge_before(&self, date: &str) -> StoreResult<u64> {
        let date = date.to_owned();
        self.blocking(move |s| s.purge_before_sync(&date)).await
    }
}

#[async_trait]
impl ReservationLedger for EmbeddedStore {
    async fn find_by_identity(
        &self,
        phone: &str,
        date: &str,
        time: &str,
    ) -> StoreResult<Option<ReservationRecord>> {
        let (phone, date, time) = (phone.to_owned(), date.to_owned(), time.to_owned());
        self.blocking(move |s| s.find_sync(&phone, &date, &time))
            .await
    }

    async fn insert(&self, record: &ReservationRecord) -> Result<(), InsertError> {
        let record = record.clone();
        if self.blocking(move |s| s.insert_sync(&record)).await? {
            Ok(())
        } else {
            Err(InsertError::Duplicate)
        }
    }

    async fn list_by_date(&self, date: &str) -> StoreResult<Vec<ReservationRecord>> {
        let date = date.to_owned();
        self.blocking(move |s| s.list_by_date_sync(&date)).await
    }
}

#[async_trait]
impl SettingsStore for EmbeddedStore {
    async fn load_settings(&self) -> StoreResult<CapacitySettings> {
        self.blocking(|s| s.load_settings_sync()).await
    }

    async fn save_settings(&self, settings: &CapacitySettings) -> StoreResult<()> {
        let settings = settings.clone();
        self.blocking(move |s| s.save_settings_sync(&settings))
            .await
    }
}

#[async_trait]
impl IdentityDirectory for EmbeddedStore {
    async fn find_by_phone(&self, phone: &str) -> StoreResult<Option<LineIdentity>> {
        let phone = phone.to_owned();
        self.blocking(move |s| s.find_identity_sync(&phone)).await
    }

    async fn upsert_identity(&self, identity: &LineIdentity) -> StoreResult<()> {
        let identity = identity.clone();
        self.blocking(move |s| s.upsert_identity_sync(&identity))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{CapacityClass, NONE_SENTINEL};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record(phone: &str, date: &str, time: &str, created_at: i64) -> ReservationRecord {
        ReservationRecord {
            id: created_at,
            name: "Guest".into(),
            phone: phone.into(),
            email: "guest@example.com".into(),
            date: date.into(),
            time: time.into(),
            adults: 2,
            children: 0,
            high_chairs: 0,
            dietary: NONE_SENTINEL.into(),
            special_needs: NONE_SENTINEL.into(),
            notes: NONE_SENTINEL.into(),
            slot_id: "wm1".into(),
            capacity_class: CapacityClass::WeekdayMorning,
            created_at,
        }
    }

    #[tokio::test]
    async fn test_try_admit_respects_capacity() {
        let store = EmbeddedStore::open_in_memory().unwrap();
        assert!(store.try_admit("2099-01-06", "wm1", 2).await.unwrap());
        assert!(store.try_admit("2099-01-06", "wm1", 2).await.unwrap());
        assert!(!store.try_admit("2099-01-06", "wm1", 2).await.unwrap());

        // Other cells are independent
        assert!(store.try_admit("2099-01-06", "wm2", 2).await.unwrap());
        assert!(store.try_admit("2099-01-07", "wm1", 2).await.unwrap());

        let counts = store.counts("2099-01-06").await.unwrap();
        assert_eq!(counts.get("wm1"), Some(&2));
        assert_eq!(counts.get("wm2"), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[tokio::test]
    async fn test_zero_capacity_admits_nothing() {
        let store = EmbeddedStore::open_in_memory().unwrap();
        assert!(!store.try_admit("2099-01-06", "wa1", 0).await.unwrap());
        assert!(store.counts("2099-01-06").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lowered_capacity_applies_to_next_admit_only() {
        let store = EmbeddedStore::open_in_memory().unwrap();
        for _ in 0..3 {
            assert!(store.try_admit("2099-01-03", "hm1", 3).await.unwrap());
        }
        // Capacity dropped below the current count: no new admits, nothing revoked
        assert!(!store.try_admit("2099-01-03", "hm1", 2).await.unwrap());
        assert_eq!(
            store.counts("2099-01-03").await.unwrap().get("hm1"),
            Some(&3)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_admits_never_exceed_capacity() {
        let store = EmbeddedStore::open_in_memory().unwrap();
        let admitted = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            let admitted = admitted.clone();
            handles.push(tokio::spawn(async move {
                if store.try_admit("2099-01-06", "wa3", 7).await.unwrap() {
                    admitted.fetch_add(1, Ordering::SeqCst);
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(admitted.load(Ordering::SeqCst), 7);
        assert_eq!(
            store.counts("2099-01-06").await.unwrap().get("wa3"),
            Some(&7)
        );
    }

    #[tokio::test]
    async fn test_purge_before() {
        let store = EmbeddedStore::open_in_memory().unwrap();
        store.try_admit("2099-01-04", "hm1", 3).await.unwrap();
        store.try_admit("2099-01-05", "wm1", 3).await.unwrap();
        store.try_admit("2099-01-05", "wm2", 3).await.unwrap();
        store.try_admit("2099-01-06", "wm1", 3).await.unwrap();

        assert_eq!(store.purge_before("2099-01-06").await.unwrap(), 3);
        assert!(store.counts("2099-01-05").await.unwrap().is_empty());
        assert_eq!(store.counts("2099-01-06").await.unwrap().len(), 1);
        assert_eq!(store.purge_before("2099-01-06").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ledger_insert_and_duplicate() {
        let store = EmbeddedStore::open_in_memory().unwrap();
        let r = record("0912345678", "2099-01-06", "11:00", 1);
        store.insert(&r).await.unwrap();

        let found = store
            .find_by_identity("0912345678", "2099-01-06", "11:00")
            .await
            .unwrap();
        assert_eq!(found, Some(r.clone()));

        let again = record("0912345678", "2099-01-06", "11:00", 2);
        assert!(matches!(
            store.insert(&again).await,
            Err(InsertError::Duplicate)
        ));

        // Same phone, different time is a different identity
        store
            .insert(&record("0912345678", "2099-01-06", "12:00", 3))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_by_date_ordering() {
        let store = EmbeddedStore::open_in_memory().unwrap();
        store
            .insert(&record("0911111111", "2099-01-06", "12:00", 10))
            .await
            .unwrap();
        store
            .insert(&record("0922222222", "2099-01-06", "11:00", 30))
            .await
            .unwrap();
        store
            .insert(&record("0933333333", "2099-01-06", "11:00", 20))
            .await
            .unwrap();
        store
            .insert(&record("0944444444", "2099-01-07", "11:00", 5))
            .await
            .unwrap();

        let list = store.list_by_date("2099-01-06").await.unwrap();
        let phones: Vec<&str> = list.iter().map(|r| r.phone.as_str()).collect();
        assert_eq!(phones, vec!["0933333333", "0922222222", "0911111111"]);
    }

    #[tokio::test]
    async fn test_settings_default_and_save() {
        let store = EmbeddedStore::open_in_memory().unwrap();
        assert_eq!(
            store.load_settings().await.unwrap(),
            CapacitySettings::default()
        );

        let updated = CapacitySettings {
            weekday_morning: 5,
            updated_at: 99,
            updated_by: Some("admin".into()),
            ..CapacitySettings::default()
        };
        store.save_settings(&updated).await.unwrap();
        assert_eq!(store.load_settings().await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_identity_upsert_replaces() {
        let store = EmbeddedStore::open_in_memory().unwrap();
        assert!(store.find_by_phone("0912345678").await.unwrap().is_none());

        let mut identity = LineIdentity {
            line_user_id: "U1".into(),
            line_name: "Lin".into(),
            phone: "0912345678".into(),
            created_at: 1,
        };
        store.upsert_identity(&identity).await.unwrap();
        identity.line_user_id = "U2".into();
        store.upsert_identity(&identity).await.unwrap();

        let found = store.find_by_phone("0912345678").await.unwrap().unwrap();
        assert_eq!(found.line_user_id, "U2");
    }

    #[tokio::test]
    async fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reservations.redb");
        {
            let store = EmbeddedStore::open(&path).unwrap();
            store.try_admit("2099-01-06", "wm1", 2).await.unwrap();
        }
        let store = EmbeddedStore::open(&path).unwrap();
        assert_eq!(
            store.counts("2099-01-06").await.unwrap().get("wm1"),
            Some(&1)
        );
    }
}
