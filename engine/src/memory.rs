//! In-memory collaborators.
//!
//! Simple implementations for testing and development, each with failure
//! injection and call counters.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use kiosk_types::{CaptureOptions, EvidencePath, Registrant, RegistrantId};

use crate::ports::{
    Announcer, CaptureDevice, CaptureError, CaptureFut, CapturedImage, EvidenceError,
    EvidenceFut, EvidenceStore, RegistrantStore, StoreError, StoreFut,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// How [`MemoryRegistrantStore::merge_inout`] misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteFault {
    #[default]
    None,
    /// The write is refused and nothing changes.
    Rejected,
    /// The write lands but the caller sees an error.
    LostAcknowledgment,
}

#[derive(Default)]
pub struct MemoryRegistrantStore {
    registrants: Mutex<Vec<Registrant>>,
    write_fault: Mutex<WriteFault>,
    fail_lookups: AtomicBool,
    fail_reads: AtomicBool,
    lookups: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryRegistrantStore {
    #[must_use]
    pub fn new(registrants: Vec<Registrant>) -> Self {
        Self {
            registrants: Mutex::new(registrants),
            ..Self::default()
        }
    }

    pub fn set_fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_write_fault(&self, fault: WriteFault) {
        *lock(&self.write_fault) = fault;
    }

    #[must_use]
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn snapshot(&self, id: &RegistrantId) -> Option<Registrant> {
        lock(&self.registrants).iter().find(|r| &r.id == id).cloned()
    }

    fn apply_inout(&self, id: &RegistrantId, inout: bool) -> Result<(), StoreError> {
        let mut registrants = lock(&self.registrants);
        let registrant = registrants
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| StoreError::NotFound { id: id.clone() })?;
        registrant.inout = inout;
        Ok(())
    }
}

impl RegistrantStore for MemoryRegistrantStore {
    fn find_by_identification<'a>(
        &'a self,
        identification: &'a str,
    ) -> StoreFut<'a, Vec<Registrant>> {
        Box::pin(async move {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if self.fail_lookups.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("injected lookup failure".into()));
            }
            Ok(lock(&self.registrants)
                .iter()
                .filter(|r| r.identification == identification)
                .cloned()
                .collect())
        })
    }

    fn merge_inout<'a>(&'a self, id: &'a RegistrantId, inout: bool) -> StoreFut<'a, ()> {
        Box::pin(async move {
            self.writes.fetch_add(1, Ordering::SeqCst);
            let fault = *lock(&self.write_fault);
            match fault {
                WriteFault::None => self.apply_inout(id, inout),
                WriteFault::Rejected => {
                    Err(StoreError::Backend("injected write rejection".into()))
                }
                WriteFault::LostAcknowledgment => {
                    self.apply_inout(id, inout)?;
                    Err(StoreError::Unavailable("acknowledgment lost".into()))
                }
            }
        })
    }

    fn get<'a>(&'a self, id: &'a RegistrantId) -> StoreFut<'a, Option<Registrant>> {
        Box::pin(async move {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("injected read failure".into()));
            }
            Ok(self.snapshot(id))
        })
    }
}

#[derive(Default)]
pub struct MemoryEvidenceStore {
    uploads: Mutex<Vec<(EvidencePath, CapturedImage)>>,
    failing: AtomicBool,
    attempts: AtomicUsize,
}

impl MemoryEvidenceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    #[must_use]
    pub fn uploads(&self) -> Vec<(EvidencePath, CapturedImage)> {
        lock(&self.uploads).clone()
    }

    /// Uploads attempted, including failed ones.
    #[must_use]
    pub fn attempt_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl EvidenceStore for MemoryEvidenceStore {
    fn upload<'a>(&'a self, path: &'a EvidencePath, image: CapturedImage) -> EvidenceFut<'a> {
        Box::pin(async move {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(EvidenceError::Unavailable("injected upload failure".into()));
            }
            lock(&self.uploads).push((path.clone(), image));
            Ok(())
        })
    }
}

/// Camera returning a fixed image. Starts paused, and pauses again after
/// every capture.
pub struct StillCaptureDevice {
    image: Vec<u8>,
    ready: AtomicBool,
    failing: AtomicBool,
    captures: AtomicUsize,
    resumes: AtomicUsize,
}

impl StillCaptureDevice {
    #[must_use]
    pub fn new(image: Vec<u8>) -> Self {
        Self {
            image,
            ready: AtomicBool::new(false),
            failing: AtomicBool::new(false),
            captures: AtomicUsize::new(0),
            resumes: AtomicUsize::new(0),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    #[must_use]
    pub fn capture_count(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn resume_count(&self) -> usize {
        self.resumes.load(Ordering::SeqCst)
    }
}

impl CaptureDevice for StillCaptureDevice {
    fn resume(&self) -> CaptureFut<'_, ()> {
        Box::pin(async move {
            self.resumes.fetch_add(1, Ordering::SeqCst);
            self.ready.store(true, Ordering::SeqCst);
            Ok(())
        })
    }

    fn capture_still(&self, options: CaptureOptions) -> CaptureFut<'_, CapturedImage> {
        Box::pin(async move {
            if !self.ready.swap(false, Ordering::SeqCst) {
                return Err(CaptureError::Paused);
            }
            if self.failing.load(Ordering::SeqCst) {
                return Err(CaptureError::Device("injected capture failure".into()));
            }
            self.captures.fetch_add(1, Ordering::SeqCst);
            Ok(CapturedImage::new(self.image.clone(), options.encoding))
        })
    }
}

/// Announcer that remembers what it was asked to say.
#[derive(Default)]
pub struct RecordingAnnouncer {
    spoken: Mutex<Vec<String>>,
}

impl RecordingAnnouncer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn spoken(&self) -> Vec<String> {
        lock(&self.spoken).clone()
    }
}

impl Announcer for RecordingAnnouncer {
    fn speak(&self, text: &str) {
        lock(&self.spoken).push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ana() -> Registrant {
        Registrant::new("doc-ana", "123456789", "Ana", false)
    }

    #[tokio::test]
    async fn lookup_is_exact_match() {
        let store = MemoryRegistrantStore::new(vec![ana()]);
        assert_eq!(store.find_by_identification("123456789").await.unwrap().len(), 1);
        assert!(store.find_by_identification("12345678").await.unwrap().is_empty());
        assert_eq!(store.lookup_count(), 2);
    }

    #[tokio::test]
    async fn merge_only_touches_inout() {
        let store = MemoryRegistrantStore::new(vec![ana()]);
        let id = RegistrantId::new("doc-ana");
        store.merge_inout(&id, true).await.unwrap();
        let stored = store.snapshot(&id).unwrap();
        assert!(stored.inout);
        assert_eq!(stored.name, "Ana");
        assert_eq!(stored.identification, "123456789");
    }

    #[tokio::test]
    async fn lost_acknowledgment_still_applies() {
        let store = MemoryRegistrantStore::new(vec![ana()]);
        store.set_write_fault(WriteFault::LostAcknowledgment);
        let id = RegistrantId::new("doc-ana");
        assert!(store.merge_inout(&id, true).await.is_err());
        assert!(store.get(&id).await.unwrap().unwrap().inout);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = MemoryRegistrantStore::new(vec![]);
        let err = store
            .merge_inout(&RegistrantId::new("missing"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn capture_requires_resume() {
        let device = StillCaptureDevice::new(vec![9]);
        let options = CaptureOptions::default();
        assert!(matches!(
            device.capture_still(options).await,
            Err(CaptureError::Paused)
        ));

        device.resume().await.unwrap();
        let image = device.capture_still(options).await.unwrap();
        assert_eq!(image.bytes, vec![9]);

        // A capture leaves the device paused again.
        assert!(matches!(
            device.capture_still(options).await,
            Err(CaptureError::Paused)
        ));
        assert_eq!(device.capture_count(), 1);
    }
}
