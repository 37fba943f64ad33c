//! File-backed evidence adapters.
//!
//! [`FileCaptureDevice`] stands in for the camera by serving a fixed image
//! from disk. [`DirectoryEvidenceStore`] lays photos out under a local root
//! the same way the remote bucket does: `{prefix}/{owner}/{unique}.{ext}`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use kiosk_engine::ports::{CaptureFut, EvidenceFut};
use kiosk_engine::{CaptureDevice, CaptureError, CapturedImage, EvidenceStore};
use kiosk_types::{CaptureOptions, EvidencePath};

pub struct FileCaptureDevice {
    source: PathBuf,
    ready: AtomicBool,
}

impl FileCaptureDevice {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            ready: AtomicBool::new(false),
        }
    }
}

impl CaptureDevice for FileCaptureDevice {
    fn resume(&self) -> CaptureFut<'_, ()> {
        Box::pin(async move {
            if !tokio::fs::try_exists(&self.source).await? {
                return Err(CaptureError::Unavailable);
            }
            self.ready.store(true, Ordering::SeqCst);
            Ok(())
        })
    }

    fn capture_still(&self, options: CaptureOptions) -> CaptureFut<'_, CapturedImage> {
        Box::pin(async move {
            if !self.ready.swap(false, Ordering::SeqCst) {
                return Err(CaptureError::Paused);
            }
            let bytes = tokio::fs::read(&self.source).await?;
            Ok(CapturedImage::new(bytes, options.encoding))
        })
    }
}

pub struct DirectoryEvidenceStore {
    root: PathBuf,
}

impl DirectoryEvidenceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_for(&self, path: &EvidencePath, image: &CapturedImage) -> PathBuf {
        self.root.join(path.owner_dir()).join(format!(
            "{}.{}",
            path.unique(),
            image.encoding.extension()
        ))
    }
}

impl EvidenceStore for DirectoryEvidenceStore {
    fn upload<'a>(&'a self, path: &'a EvidencePath, image: CapturedImage) -> EvidenceFut<'a> {
        Box::pin(async move {
            let file = self.file_for(path, &image);
            if let Some(dir) = file.parent() {
                tokio::fs::create_dir_all(dir).await?;
            }
            tokio::fs::write(&file, &image.bytes).await?;
            tracing::debug!(file = %file.display(), bytes = image.bytes.len(), "Evidence stored");
            Ok(())
        })
    }
}
