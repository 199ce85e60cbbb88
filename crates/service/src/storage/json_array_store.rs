use std::{
    io::ErrorKind,
    marker::PhantomData,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};
use tokio::{fs, io::AsyncWriteExt, sync::Mutex};
use tracing::{debug, error, warn};

use crate::errors::ServiceError;

/// Generic JSON file-backed collection store.
///
/// The whole collection lives in one file as a JSON array and is loaded on
/// every call; nothing is cached between operations. Writes go to a sibling
/// temp file that is then renamed over the data file, so readers only ever see
/// a complete document. Every load-mutate-persist sequence runs under one
/// async mutex, which makes concurrent writers safe within a process.
pub struct JsonArrayStore<T> {
    file_path: PathBuf,
    write_lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

/// Result of a mutation closure passed to [`JsonArrayStore::update`].
pub struct Outcome<R> {
    value: R,
    persist: bool,
}

impl<R> Outcome<R> {
    /// Write the mutated collection back, then return `value`.
    pub fn persist(value: R) -> Self { Self { value, persist: true } }

    /// Leave the file untouched and return `value`.
    pub fn skip(value: R) -> Self { Self { value, persist: false } }
}

impl<T> JsonArrayStore<T>
where
    T: Serialize + DeserializeOwned + Send,
{
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { file_path: path.into(), write_lock: Mutex::new(()), _marker: PhantomData }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Create the parent directory and an empty `[]` document if the file is missing.
    /// Safe to call on every start; an existing file is never touched.
    pub async fn initialize(&self) -> Result<(), ServiceError> {
        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(ServiceError::storage)?;
        }
        match fs::metadata(&self.file_path).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.file_path.display(), "creating empty collection file");
                self.write_file(&[]).await
            }
            Err(e) => Err(ServiceError::storage(e)),
        }
    }

    /// Read the whole collection.
    ///
    /// Unreadable or malformed files are logged and treated as an empty
    /// collection; this method never fails.
    pub async fn load_all(&self) -> Vec<T> {
        self.read_items().await.0
    }

    /// Soft-fail read. The flag is set when a file exists but could not be
    /// used, so its bytes must be kept before anything is written over it.
    async fn read_items(&self) -> (Vec<T>, bool) {
        let bytes = match fs::read(&self.file_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(path = %self.file_path.display(), error = %e, "failed to read collection file");
                return (Vec::new(), e.kind() != ErrorKind::NotFound);
            }
        };
        match serde_json::from_slice::<Vec<T>>(&bytes) {
            Ok(items) => (items, false),
            Err(e) => {
                error!(path = %self.file_path.display(), error = %e, "failed to parse collection file");
                (Vec::new(), true)
            }
        }
    }

    /// Overwrite the whole collection.
    pub async fn replace_all(&self, items: &[T]) -> Result<(), ServiceError> {
        let _guard = self.write_lock.lock().await;
        self.write_file(items).await
    }

    /// Load, mutate and (optionally) persist under the write lock.
    pub async fn update<F, R>(&self, f: F) -> Result<R, ServiceError>
    where
        F: FnOnce(&mut Vec<T>) -> Result<Outcome<R>, ServiceError>,
    {
        let _guard = self.write_lock.lock().await;
        let (mut items, unusable) = self.read_items().await;
        let outcome = f(&mut items)?;
        if outcome.persist {
            if unusable {
                self.preserve_unusable().await?;
            }
            self.write_file(&items).await?;
        }
        Ok(outcome.value)
    }

    /// Copy an unusable data file to `<name>.corrupt` before it gets replaced.
    /// If the copy fails the write is refused.
    async fn preserve_unusable(&self) -> Result<(), ServiceError> {
        let backup = self.sibling_path(".corrupt");
        fs::copy(&self.file_path, &backup).await.map_err(ServiceError::storage)?;
        warn!(
            path = %self.file_path.display(),
            backup = %backup.display(),
            "unusable collection file copied aside before overwrite"
        );
        Ok(())
    }

    async fn write_file(&self, items: &[T]) -> Result<(), ServiceError> {
        let data = serde_json::to_vec_pretty(items).map_err(ServiceError::storage)?;
        let tmp = self.temp_path();
        if let Err(e) = write_synced(&tmp, &data).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(ServiceError::storage(e));
        }
        if let Err(e) = fs::rename(&tmp, &self.file_path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(ServiceError::storage(e));
        }
        debug!(path = %self.file_path.display(), count = items.len(), bytes = data.len(), "collection persisted");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        self.sibling_path(".tmp")
    }

    fn sibling_path(&self, suffix: &str) -> PathBuf {
        let mut name = self.file_path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(suffix);
        self.file_path.with_file_name(name)
    }
}

async fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    Ok(())
}
