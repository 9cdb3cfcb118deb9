use std::{
    collections::HashMap,
    ffi::OsString,
    fs::{File, OpenOptions},
    hash::Hash,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use fs2::FileExt;
use tokio::{fs, sync::Mutex};
use uuid::Uuid;

use crate::errors::ServiceError;

/// Generic JSON file-backed key-value map store.
///
/// Persists a `HashMap<K, V>` to a JSON file and provides simple CRUD helpers.
/// The file is the source of truth and may be shared by several processes:
/// reads load it fresh, and every mutation takes an exclusive lock on a
/// sidecar `<file>.lock`, reloads the map under that lock, applies the change
/// and swaps the new file in through a uniquely named temp file. A missing
/// file reads as an empty map and is created on the first write.
pub struct JsonMapStore<K, V> {
    file_path: PathBuf,
    lock_path: PathBuf,
    // writers in this process queue here instead of parking blocking threads on the OS lock
    writer: Mutex<()>,
    _marker: std::marker::PhantomData<fn() -> (K, V)>,
}

impl<K, V> JsonMapStore<K, V>
where
    K: Eq + Hash + serde::Serialize + serde::de::DeserializeOwned + Clone,
    V: serde::Serialize + serde::de::DeserializeOwned + Clone,
{
    /// Initialize the store from a path, checking that an existing file parses.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(ServiceError::storage)?;
        }
        read_map::<K, V>(&file_path).await?;

        let lock_path = sibling(&file_path, ".lock");
        Ok(Arc::new(Self { file_path, lock_path, writer: Mutex::new(()), _marker: std::marker::PhantomData }))
    }

    /// List all entries as `(key, value)` pairs.
    pub async fn list(&self) -> Result<Vec<(K, V)>, ServiceError> {
        Ok(read_map::<K, V>(&self.file_path).await?.into_iter().collect())
    }

    /// Get value by key.
    pub async fn get(&self, key: &K) -> Result<Option<V>, ServiceError> {
        Ok(read_map::<K, V>(&self.file_path).await?.remove(key))
    }

    /// Insert or update a value by key and persist.
    pub async fn insert(&self, key: K, value: V) -> Result<(), ServiceError> {
        self.update_map(|m| {
            m.insert(key, value);
            Ok(())
        })
        .await
    }

    /// Remove a key and persist; returns the removed value, if any.
    pub async fn remove(&self, key: &K) -> Result<Option<V>, ServiceError> {
        self.update_map(|m| Ok(m.remove(key))).await
    }

    /// Apply a mutation to the current on-disk map and persist it as one step.
    ///
    /// No other writer, in this process or another, can commit between the
    /// reload `f` sees and the write of its result. If `f` fails nothing is
    /// written.
    pub async fn update_map<F, T>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut HashMap<K, V>) -> Result<T, ServiceError>,
    {
        let _writer = self.writer.lock().await;
        let _lock = lock_exclusive(self.lock_path.clone()).await?;

        let mut map = read_map::<K, V>(&self.file_path).await?;
        let out = f(&mut map)?;
        write_atomically(&self.file_path, &map).await?;
        Ok(out)
        // OS lock released when `_lock` closes
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

async fn read_map<K, V>(path: &Path) -> Result<HashMap<K, V>, ServiceError>
where
    K: Eq + Hash + serde::de::DeserializeOwned,
    V: serde::de::DeserializeOwned,
{
    match fs::read(path).await {
        Ok(bytes) if bytes.is_empty() => Ok(HashMap::new()),
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map_err(|e| ServiceError::Storage(format!("corrupt store file {}: {e}", path.display()))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
        Err(e) => Err(ServiceError::storage(e)),
    }
}

/// Block (off the async workers) until the exclusive lock on `lock_path` is held.
async fn lock_exclusive(lock_path: PathBuf) -> Result<File, ServiceError> {
    tokio::task::spawn_blocking(move || {
        let file = OpenOptions::new().create(true).read(true).write(true).open(&lock_path)?;
        file.lock_exclusive()?;
        Ok::<_, std::io::Error>(file)
    })
    .await
    .map_err(ServiceError::storage)?
    .map_err(|e| ServiceError::Storage(format!("cannot lock store: {e}")))
}

/// Write to a uniquely named sibling temp file, then rename over the target.
async fn write_atomically<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), ServiceError> {
    let data = serde_json::to_vec(value).map_err(ServiceError::storage)?;
    let tmp = sibling(path, &format!(".{}.tmp", Uuid::new_v4()));
    if let Err(e) = fs::write(&tmp, data).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(ServiceError::storage(e));
    }
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(ServiceError::storage(e));
    }
    Ok(())
}
