use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;

use roster_api::{StoreFuture, StudentRecord, StudentStore};

// ═══════════════════════════════════════════════════════════════
//  MemoryStore
// ═══════════════════════════════════════════════════════════════

/// In-process student table. Nothing survives a restart; meant for
/// local runs and as the store behind the HTTP tests.
#[derive(Default)]
pub struct MemoryStore {
    rows: RwLock<BTreeMap<String, StudentRecord>>,
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `upsert` calls that reached this store, successful or not.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

impl StudentStore for MemoryStore {
    fn upsert(&self, record: &StudentRecord) -> StoreFuture<'_, ()> {
        let record = record.clone();
        Box::pin(async move {
            self.writes.fetch_add(1, Ordering::Relaxed);
            // Whole-row replace under the write lock keeps the upsert atomic.
            self.rows.write().await.insert(record.name.clone(), record);
            Ok(())
        })
    }

    fn get(&self, name: &str) -> StoreFuture<'_, Option<StudentRecord>> {
        let name = name.to_owned();
        Box::pin(async move { Ok(self.rows.read().await.get(&name).cloned()) })
    }

    fn count(&self) -> StoreFuture<'_, u64> {
        Box::pin(async move { Ok(self.rows.read().await.len() as u64) })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(name: &str, place: &str) -> StudentRecord {
        StudentRecord {
            name: name.into(),
            age: 10,
            class_name: "5A".into(),
            roll: 3,
            place: place.into(),
        }
    }

    #[tokio::test]
    async fn upsert_inserts_then_overwrites() {
        let store = MemoryStore::new();

        store.upsert(&student("Ana", "NYC")).await.unwrap();
        assert_eq!(store.get("Ana").await.unwrap(), Some(student("Ana", "NYC")));

        store.upsert(&student("Ana", "LA")).await.unwrap();
        assert_eq!(store.get("Ana").await.unwrap().unwrap().place, "LA");
        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.writes(), 2);
    }

    #[tokio::test]
    async fn distinct_names_are_distinct_rows() {
        let store = MemoryStore::new();
        store.upsert(&student("Ana", "NYC")).await.unwrap();
        store.upsert(&student("Ben", "NYC")).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(store.get("Cid").await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_saves_for_one_name_leave_one_row() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.upsert(&student("Ana", &format!("place-{i}"))).await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.get("Ana").await.unwrap().unwrap().place.starts_with("place-"));
    }
}
