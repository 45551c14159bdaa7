use std::sync::Arc;

use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use crate::config::{ServeArgs, ServerConfig, StorageKind};
use crate::error::ServerError;
use roster_api::StudentStore;
use roster_api_server::ApiServerError;
use roster_storage_memory::MemoryStore;
use roster_storage_postgres::PostgresStore;

pub async fn run(args: ServeArgs) -> Result<(), ServerError> {
    tracing::info!("roster-server starting");

    // --- Load config ---
    let config = ServerConfig::resolve(&args)?;
    tracing::info!(
        config = args.config.as_deref().unwrap_or("<defaults>"),
        listen = %config.listen,
        storage = ?config.storage,
        "loaded config"
    );

    // --- Open store ---
    let store = open_store(&config)?;
    store.ping().await?;
    tracing::info!(storage = ?config.storage, "store ready");

    // --- CancellationToken for graceful shutdown ---
    let token = CancellationToken::new();

    // --- API server ---
    let api_store = store.clone();
    let api_token = token.clone();
    let listen = config.listen.clone();
    let body_limit = config.body_limit;
    let mut api_handle = tokio::spawn(async move {
        roster_api_server::run(&listen, api_store, body_limit, api_token).await
    });

    tracing::info!("server ready");

    // --- Wait for Ctrl+C, or for the server to die on its own ---
    tokio::select! {
        result = &mut api_handle => {
            return finish(store.as_ref(), result).await;
        }
        signal = tokio::signal::ctrl_c() => signal?,
    }
    tracing::info!("shutting down...");

    // axum stops accepting and drains in-flight requests
    token.cancel();
    let result = api_handle.await;

    finish(store.as_ref(), result).await?;
    tracing::info!("shutdown complete");
    Ok(())
}

fn open_store(config: &ServerConfig) -> Result<Arc<dyn StudentStore>, ServerError> {
    let store: Arc<dyn StudentStore> = match config.storage {
        StorageKind::Postgres => Arc::new(PostgresStore::connect(&config.postgres)?),
        StorageKind::Memory => {
            tracing::warn!("memory storage selected, records are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(store)
}

/// Close the store, then report the server's own outcome first: a close
/// failure only surfaces when the server itself exited cleanly.
async fn finish(
    store: &dyn StudentStore,
    result: Result<Result<(), ApiServerError>, JoinError>,
) -> Result<(), ServerError> {
    let served = join_result(result);
    let closed = store.close().await;
    if let (Err(_), Err(e)) = (&served, &closed) {
        tracing::error!(error = %e, "store close failed");
    }
    served?;
    closed?;
    Ok(())
}

fn join_result(result: Result<Result<(), ApiServerError>, JoinError>) -> Result<(), ServerError> {
    result.map_err(|e| ServerError::Task(e.to_string()))??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use roster_api::{PersistenceError, StoreFuture, StudentRecord};

    use super::*;

    /// Store that works until it is asked to close.
    struct StuckOnClose;

    impl StudentStore for StuckOnClose {
        fn upsert(&self, _record: &StudentRecord) -> StoreFuture<'_, ()> {
            Box::pin(async { Ok(()) })
        }

        fn get(&self, _name: &str) -> StoreFuture<'_, Option<StudentRecord>> {
            Box::pin(async { Ok(None) })
        }

        fn count(&self) -> StoreFuture<'_, u64> {
            Box::pin(async { Ok(0) })
        }

        fn ping(&self) -> StoreFuture<'_, ()> {
            Box::pin(async { Ok(()) })
        }

        fn close(&self) -> StoreFuture<'_, ()> {
            Box::pin(async { Err(PersistenceError::connection("pool already gone")) })
        }
    }

    fn bind_error() -> ApiServerError {
        ApiServerError::Bind {
            addr: "0.0.0.0:3000".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use"),
        }
    }

    #[tokio::test]
    async fn server_failure_wins_over_close_failure() {
        let err = finish(&StuckOnClose, Ok(Err(bind_error()))).await.unwrap_err();
        assert!(matches!(err, ServerError::Api(ApiServerError::Bind { .. })));
    }

    #[tokio::test]
    async fn close_failure_reported_after_clean_exit() {
        let err = finish(&StuckOnClose, Ok(Ok(()))).await.unwrap_err();
        assert!(matches!(err, ServerError::Store(_)));
    }

    #[tokio::test]
    async fn clean_exit_and_close_is_ok() {
        let store = MemoryStore::new();
        assert!(finish(&store, Ok(Ok(()))).await.is_ok());
    }

    #[tokio::test]
    async fn memory_store_opens_without_database() {
        let config = ServerConfig { storage: StorageKind::Memory, ..ServerConfig::default() };
        let store = open_store(&config).unwrap();
        store.ping().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn bind_failure_surfaces_as_api_error() {
        let config = ServerConfig {
            storage: StorageKind::Memory,
            listen: "not-an-address".to_string(),
            ..ServerConfig::default()
        };
        let store = open_store(&config).unwrap();

        let result = roster_api_server::run(&config.listen, store, config.body_limit, CancellationToken::new()).await;
        let err: ServerError = result.unwrap_err().into();
        assert!(matches!(err, ServerError::Api(ApiServerError::Bind { .. })));
    }
}
