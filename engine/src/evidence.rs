//! Evidence capture pipeline: resume the camera, take a still, upload it under
//! a fresh unique name.

use std::sync::Arc;

use uuid::Uuid;

use kiosk_types::{CaptureOptions, DEFAULT_EVIDENCE_PREFIX, EvidencePath};

use crate::WorkflowError;
use crate::ports::{CaptureDevice, CaptureError, CapturedImage, EvidenceError, EvidenceStore};

pub struct EvidencePipeline {
    device: Option<Arc<dyn CaptureDevice>>,
    store: Arc<dyn EvidenceStore>,
    options: CaptureOptions,
    prefix: String,
}

impl EvidencePipeline {
    /// `device: None` models a kiosk without a camera; every capture then
    /// fails with [`CaptureError::Unavailable`].
    #[must_use]
    pub fn new(device: Option<Arc<dyn CaptureDevice>>, store: Arc<dyn EvidenceStore>) -> Self {
        Self {
            device,
            store,
            options: CaptureOptions::default(),
            prefix: DEFAULT_EVIDENCE_PREFIX.to_string(),
        }
    }

    pub fn with_options(mut self, options: CaptureOptions) -> Self {
        self.options = options.normalized();
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Resume the device and take one still.
    pub async fn capture(&self) -> Result<CapturedImage, CaptureError> {
        let device = self.device.as_ref().ok_or(CaptureError::Unavailable)?;
        device.resume().await?;
        device.capture_still(self.options).await
    }

    /// Upload under `{prefix}/{owner}/{uuid}`.
    pub async fn upload(
        &self,
        image: CapturedImage,
        owner: &str,
    ) -> Result<EvidencePath, (EvidencePath, EvidenceError)> {
        let path = EvidencePath::new(&self.prefix, owner, Uuid::new_v4().to_string());
        match self.store.upload(&path, image).await {
            Ok(()) => Ok(path),
            Err(err) => Err((path, err)),
        }
    }

    /// Capture then upload, tagging the photo with `owner`.
    pub async fn record(&self, owner: &str) -> Result<EvidencePath, WorkflowError> {
        let image = self.capture().await.map_err(WorkflowError::Capture)?;
        tracing::debug!(bytes = image.bytes.len(), "Captured evidence image");
        self.upload(image, owner)
            .await
            .map_err(|(path, source)| WorkflowError::Upload { path, source })
    }
}
