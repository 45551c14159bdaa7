use std::future::Future;
use std::pin::Pin;

use crate::error::PersistenceError;
use crate::record::StudentRecord;

/// Boxed future returned by `StudentStore` methods, so the trait stays
/// object-safe and can sit behind `Arc<dyn StudentStore>`.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, PersistenceError>> + Send + 'a>>;

/// Persistent home of student rows, keyed by `name`.
///
/// The save path knows nothing about concrete backends; it only ever
/// calls `upsert`. Implementations must make each `upsert` atomic: two
/// concurrent saves for the same name leave exactly one row holding one
/// of the two payloads.
pub trait StudentStore: Send + Sync {
    /// Insert the row, or overwrite every non-key column if `name` exists.
    fn upsert(&self, record: &StudentRecord) -> StoreFuture<'_, ()>;

    /// Point lookup by name.
    fn get(&self, name: &str) -> StoreFuture<'_, Option<StudentRecord>>;

    /// Number of stored rows.
    fn count(&self) -> StoreFuture<'_, u64>;

    /// Round trip to the backend. Called once at startup.
    fn ping(&self) -> StoreFuture<'_, ()>;

    /// Release connections. Called once at shutdown.
    fn close(&self) -> StoreFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }
}
