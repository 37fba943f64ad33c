//! Registrants kept in a JSON file on disk.
//!
//! The file holds a JSON array of registrant documents. Documents may carry
//! fields the kiosk doesn't know about; a presence update rewrites only
//! `inout` and leaves the rest of the document as it was.
//!
//! Writes go to a temp file in the same directory which is then renamed over
//! the original, so an interrupted write leaves the previous contents intact.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

use kiosk_engine::ports::StoreFut;
use kiosk_engine::{Registrant, RegistrantId, RegistrantStore, StoreError};

pub struct JsonFileRegistrantStore {
    path: PathBuf,
    /// Held for the whole read-modify-write of a presence update.
    write_lock: Mutex<()>,
}

impl JsonFileRegistrantStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<String, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(StoreError::Unavailable(
                format!("{} does not exist", self.path.display()),
            )),
            Err(err) => Err(err.into()),
        }
    }

    async fn load(&self) -> Result<Vec<Registrant>, StoreError> {
        let content = self.read().await?;
        serde_json::from_str(&content).map_err(|err| self.malformed(&err))
    }

    async fn load_documents(&self) -> Result<Vec<Value>, StoreError> {
        let content = self.read().await?;
        serde_json::from_str(&content).map_err(|err| self.malformed(&err))
    }

    async fn save(&self, documents: Vec<Value>) -> Result<(), StoreError> {
        let mut bytes = serde_json::to_vec_pretty(&documents)
            .map_err(|err| StoreError::Backend(err.to_string()))?;
        bytes.push(b'\n');
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || atomic_write(&path, &bytes))
            .await
            .map_err(|err| StoreError::Backend(format!("write task failed: {err}")))??;
        Ok(())
    }

    fn malformed(&self, err: &serde_json::Error) -> StoreError {
        StoreError::Backend(format!("{}: {err}", self.path.display()))
    }
}

impl RegistrantStore for JsonFileRegistrantStore {
    fn find_by_identification<'a>(
        &'a self,
        identification: &'a str,
    ) -> StoreFut<'a, Vec<Registrant>> {
        Box::pin(async move {
            let registrants = self.load().await?;
            Ok(registrants
                .into_iter()
                .filter(|r| r.identification == identification)
                .collect())
        })
    }

    fn merge_inout<'a>(&'a self, id: &'a RegistrantId, inout: bool) -> StoreFut<'a, ()> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let mut documents = self.load_documents().await?;
            let document = documents
                .iter_mut()
                .find(|doc| doc.get("id").and_then(Value::as_str) == Some(id.as_str()))
                .ok_or_else(|| StoreError::NotFound { id: id.clone() })?;
            let Some(fields) = document.as_object_mut() else {
                return Err(StoreError::Backend(format!("document {id} is not an object")));
            };
            fields.insert("inout".to_string(), Value::Bool(inout));
            self.save(documents).await?;
            tracing::debug!(%id, inout, path = %self.path.display(), "Presence written");
            Ok(())
        })
    }

    fn get<'a>(&'a self, id: &'a RegistrantId) -> StoreFut<'a, Option<Registrant>> {
        Box::pin(async move {
            let registrants = self.load().await?;
            Ok(registrants.into_iter().find(|r| &r.id == id))
        })
    }
}

fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}
