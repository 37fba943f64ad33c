//! Collaborator ports: the registrant store, the evidence store, the capture
//! device and the announcer.
//!
//! Every remote call returns a boxed `Send` future so implementations can be
//! used as trait objects behind `Arc<dyn ...>`. The engine awaits each one in
//! sequence; nothing here is polled concurrently within an attempt.

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use thiserror::Error;

use kiosk_types::{CaptureOptions, EvidencePath, ImageEncoding, Registrant, RegistrantId};

pub type StoreFut<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;
pub type CaptureFut<'a, T> = Pin<Box<dyn Future<Output = Result<T, CaptureError>> + Send + 'a>>;
pub type EvidenceFut<'a> = Pin<Box<dyn Future<Output = Result<(), EvidenceError>> + Send + 'a>>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("registrant store unavailable: {0}")]
    Unavailable(String),
    #[error("registrant {id} not found")]
    NotFound { id: RegistrantId },
    #[error("registrant store backend error: {0}")]
    Backend(String),
    #[error("registrant store IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Remote document store holding pre-provisioned registrants.
pub trait RegistrantStore: Send + Sync {
    /// Exact-match query on the identification business key.
    fn find_by_identification<'a>(&'a self, identification: &'a str)
    -> StoreFut<'a, Vec<Registrant>>;

    /// Merge `{inout}` into the document `id`, leaving every other field untouched.
    fn merge_inout<'a>(&'a self, id: &'a RegistrantId, inout: bool) -> StoreFut<'a, ()>;

    fn get<'a>(&'a self, id: &'a RegistrantId) -> StoreFut<'a, Option<Registrant>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub bytes: Vec<u8>,
    pub encoding: ImageEncoding,
    pub captured_at: DateTime<Utc>,
}

impl CapturedImage {
    #[must_use]
    pub fn new(bytes: Vec<u8>, encoding: ImageEncoding) -> Self {
        Self {
            bytes,
            encoding,
            captured_at: Utc::now(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no capture device available")]
    Unavailable,
    #[error("capture device is paused")]
    Paused,
    #[error("capture device error: {0}")]
    Device(String),
    #[error("capture IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Singleton still camera. A capture leaves the device paused until the next
/// [`CaptureDevice::resume`].
pub trait CaptureDevice: Send + Sync {
    fn resume(&self) -> CaptureFut<'_, ()>;

    fn capture_still(&self, options: CaptureOptions) -> CaptureFut<'_, CapturedImage>;
}

#[derive(Debug, Error)]
pub enum EvidenceError {
    #[error("evidence store unavailable: {0}")]
    Unavailable(String),
    #[error("evidence IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Remote blob store for evidence photos.
pub trait EvidenceStore: Send + Sync {
    fn upload<'a>(&'a self, path: &'a EvidencePath, image: CapturedImage) -> EvidenceFut<'a>;
}

/// Text-to-speech output. Fire-and-forget: no completion is reported back.
pub trait Announcer: Send + Sync {
    fn speak(&self, text: &str);
}
