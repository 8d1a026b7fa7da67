use async_trait::async_trait;
use ns_core::{Error, Result, Settings, Storage, StorageKind};
use std::sync::Arc;
use tracing::info;

pub mod backends;
pub mod upsert;

pub use backends::*;

#[async_trait]
pub trait StorageBackend: Storage {
    fn get_error_message() -> &'static str;
    async fn open(settings: &Settings) -> Result<Self> where Self: Sized;
}

async fn open_backend<T: StorageBackend + 'static>(settings: &Settings) -> Result<Arc<dyn Storage>> {
    let storage = T::open(settings).await.map_err(|e| {
        Error::Config(format!("{} ({})", e, T::get_error_message()))
    })?;
    Ok(Arc::new(storage))
}

/// Open the backend selected in `settings`.
pub async fn create_storage(settings: &Settings) -> Result<Arc<dyn Storage>> {
    let storage = match settings.storage {
        StorageKind::Memory => open_backend::<InMemoryStorage>(settings).await?,
        #[cfg(feature = "sqlite")]
        StorageKind::Sqlite => open_backend::<SQLiteStorage>(settings).await?,
        #[cfg(not(feature = "sqlite"))]
        StorageKind::Sqlite => {
            return Err(Error::Config(
                "SQLite storage requires the `sqlite` feature".to_string(),
            ))
        }
    };
    info!(backend = ?settings.storage, "Storage backend initialized");
    Ok(storage)
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, StorageBackend};
}

#[cfg(test)]
mod tests {
    use super::*;
    use ns_core::SourceStore;

    #[tokio::test]
    async fn test_create_memory_storage() {
        let settings = Settings {
            storage: StorageKind::Memory,
            ..Default::default()
        };
        let storage = create_storage(&settings).await.unwrap();
        assert_eq!(storage.list_enabled_sources().await.unwrap().len(), 3);
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_create_sqlite_storage() {
        let temp_dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            storage: StorageKind::Sqlite,
            database_path: temp_dir.path().join("data").join("news.db"),
            ..Default::default()
        };
        let storage = create_storage(&settings).await.unwrap();
        assert!(storage.find_source_by_name("infobae").await.unwrap().is_some());
        assert!(settings.database_path.exists());
    }
}
