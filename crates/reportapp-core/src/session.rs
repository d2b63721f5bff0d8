//! Session token storage and retrieval.
//!
//! The session is a single opaque bearer token. `SessionStore` is the only
//! writer; everything else reads through it. Tokens are never logged.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::paths;
use crate::error::{ClientError, ClientResult};

/// Durable backing for the session token.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Reads the persisted token. `Ok(None)` means definitely logged out.
    async fn load(&self) -> ClientResult<Option<String>>;
    /// Persists `token`, replacing any previous one.
    async fn save(&self, token: &str) -> ClientResult<()>;
    /// Removes the persisted token. Removing an absent token succeeds.
    async fn remove(&self) -> ClientResult<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    token: String,
}

/// Stores the token in `<home>/session.json` with restricted permissions (0600).
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default session path under REPORTAPP_HOME.
    pub fn at_default_path() -> Self {
        Self::new(paths::session_path())
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn storage_error(&self, action: &str, e: &dyn std::fmt::Display) -> ClientError {
        ClientError::Storage(format!(
            "Failed to {action} {}: {e}",
            self.path.display()
        ))
    }
}

impl FileTokenStore {
    fn load_sync(&self) -> ClientResult<Option<String>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.storage_error("read", &e)),
        };

        let file: SessionFile =
            serde_json::from_str(&contents).map_err(|e| self.storage_error("parse", &e))?;
        if file.token.is_empty() {
            Ok(None)
        } else {
            Ok(Some(file.token))
        }
    }

    fn save_sync(&self, token: &str) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ClientError::Storage(format!(
                    "Failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let contents = serde_json::to_string_pretty(&SessionFile {
            token: token.to_string(),
        })
        .map_err(|e| self.storage_error("serialize", &e))?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options
            .open(&self.path)
            .map_err(|e| self.storage_error("open", &e))?;
        file.write_all(contents.as_bytes())
            .map_err(|e| self.storage_error("write", &e))?;
        Ok(())
    }

    fn remove_sync(&self) -> ClientResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.storage_error("remove", &e)),
        }
    }

    /// Runs a synchronous file operation on the blocking pool.
    async fn blocking<T: Send + 'static>(
        &self,
        op: impl FnOnce(&Self) -> ClientResult<T> + Send + 'static,
    ) -> ClientResult<T> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .unwrap_or_else(|e| Err(self.storage_error("access", &e)))
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> ClientResult<Option<String>> {
        self.blocking(Self::load_sync).await
    }

    async fn save(&self, token: &str) -> ClientResult<()> {
        let token = token.to_string();
        self.blocking(move |store| store.save_sync(&token)).await
    }

    async fn remove(&self) -> ClientResult<()> {
        self.blocking(Self::remove_sync).await
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    token: Option<String>,
    fail_reads: bool,
    fail_writes: bool,
}

/// In-process token store. Can be told to fail, to exercise storage errors.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        let store = Self::default();
        store.lock().token = Some(token.to_string());
        store
    }

    pub fn fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned lock only means a panicking test thread; the data is still usable.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> ClientResult<Option<String>> {
        let state = self.lock();
        if state.fail_reads {
            return Err(ClientError::Storage("memory store read failure".to_string()));
        }
        Ok(state.token.clone())
    }

    async fn save(&self, token: &str) -> ClientResult<()> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(ClientError::Storage("memory store write failure".to_string()));
        }
        state.token = Some(token.to_string());
        Ok(())
    }

    async fn remove(&self) -> ClientResult<()> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(ClientError::Storage("memory store write failure".to_string()));
        }
        state.token = None;
        Ok(())
    }
}

/// Shared handle to the current session. Cheap to clone.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn TokenStore>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

impl SessionStore {
    pub fn new(store: impl TokenStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Current token, or `None` when logged out.
    ///
    /// # Errors
    /// Returns `ClientError::Storage` when the state cannot be determined.
    pub async fn get(&self) -> ClientResult<Option<String>> {
        self.store.load().await
    }

    /// Current token, or `Unauthenticated` when logged out.
    ///
    /// # Errors
    /// Returns `Unauthenticated` or `Storage`.
    pub async fn require(&self) -> ClientResult<String> {
        self.get().await?.ok_or(ClientError::Unauthenticated)
    }

    /// Persists a new token, replacing any previous one.
    ///
    /// # Errors
    /// Returns `ClientError::Storage` if the write fails.
    pub async fn set(&self, token: &str) -> ClientResult<()> {
        self.store.save(token).await?;
        tracing::info!("session token stored");
        Ok(())
    }

    /// Forgets the current token.
    ///
    /// # Errors
    /// Returns `ClientError::Storage` if the removal fails.
    pub async fn clear(&self) -> ClientResult<()> {
        self.store.remove().await?;
        tracing::info!("session token cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn file_store_missing_file_is_logged_out() {
        let dir = tempdir().unwrap();
        let session = SessionStore::new(FileTokenStore::new(dir.path().join("session.json")));

        assert_eq!(session.get().await.unwrap(), None);
        assert_eq!(session.require().await, Err(ClientError::Unauthenticated));
    }

    #[tokio::test]
    async fn file_store_survives_new_handle() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        SessionStore::new(FileTokenStore::new(&path))
            .set("tok-1")
            .await
            .unwrap();

        let reopened = SessionStore::new(FileTokenStore::new(&path));
        assert_eq!(reopened.get().await.unwrap().as_deref(), Some("tok-1"));

        reopened.set("tok-2").await.unwrap();
        assert_eq!(reopened.require().await.unwrap(), "tok-2");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_store_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        FileTokenStore::new(&path).save("secret").await.unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn file_store_clear_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let session = SessionStore::new(FileTokenStore::new(&path));

        session.set("tok").await.unwrap();
        session.clear().await.unwrap();
        assert!(!path.exists());
        session.clear().await.unwrap();
        assert_eq!(session.get().await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_store_corrupt_file_is_storage_error_not_logged_out() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        let err = SessionStore::new(FileTokenStore::new(&path))
            .get()
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Storage(_)));
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "current_thread")]
    async fn slow_session_read_does_not_stall_other_tasks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let made_fifo = std::process::Command::new("mkfifo")
            .arg(&path)
            .status()
            .is_ok_and(|status| status.success());
        if !made_fifo {
            eprintln!("Skipping: mkfifo is not available in this environment.");
            return;
        }

        // The read blocks until a writer opens the pipe.
        let writer_path = path.clone();
        let writer = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(400));
            fs::write(&writer_path, r#"{"token": "tok"}"#).unwrap();
        });

        let started = std::time::Instant::now();
        let ticker = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            started.elapsed()
        });

        let session = SessionStore::new(FileTokenStore::new(&path));
        let token = session.get().await.unwrap();
        let ticked_after = ticker.await.unwrap();
        writer.join().unwrap();

        assert_eq!(token.as_deref(), Some("tok"));
        assert!(
            ticked_after < std::time::Duration::from_millis(300),
            "runtime stalled for {ticked_after:?} during the session read"
        );
    }

    #[tokio::test]
    async fn memory_store_failures_surface_as_storage_errors() {
        let store = MemoryTokenStore::with_token("tok");
        let session = SessionStore::new(store.clone());

        store.fail_reads(true);
        assert!(matches!(session.get().await, Err(ClientError::Storage(_))));
        assert!(matches!(session.require().await, Err(ClientError::Storage(_))));

        store.fail_reads(false);
        store.fail_writes(true);
        assert!(matches!(session.clear().await, Err(ClientError::Storage(_))));
        assert_eq!(session.get().await.unwrap().as_deref(), Some("tok"));
    }
}
