//! Shared test utilities and fixtures
//!
//! A kiosk wired to in-memory collaborators, plus a registrant store whose
//! lookups can be held open to exercise in-flight behavior.

#![allow(dead_code)]

use std::sync::Arc;

use tokio::sync::{Notify, Semaphore};

use kiosk_engine::memory::{
    MemoryEvidenceStore, MemoryRegistrantStore, RecordingAnnouncer, StillCaptureDevice,
};
use kiosk_engine::ports::StoreFut;
use kiosk_engine::{
    CaptureDevice, CheckInEngine, EngineSettings, EvidencePipeline, Registrant, RegistrantId,
    RegistrantStore,
};

pub const ANA_ID: &str = "123456789";

pub fn ana(inout: bool) -> Registrant {
    Registrant::new("doc-ana", ANA_ID, "Ana", inout)
}

pub struct Kiosk {
    pub engine: Arc<CheckInEngine>,
    pub store: Arc<MemoryRegistrantStore>,
    pub evidence: Arc<MemoryEvidenceStore>,
    pub camera: Arc<StillCaptureDevice>,
    pub announcer: Arc<RecordingAnnouncer>,
}

impl Kiosk {
    pub fn new(registrants: Vec<Registrant>) -> Self {
        Self::build(registrants, EngineSettings::default(), true)
    }

    pub fn with_settings(registrants: Vec<Registrant>, settings: EngineSettings) -> Self {
        Self::build(registrants, settings, true)
    }

    /// A kiosk whose evidence pipeline has no capture device.
    pub fn without_camera(registrants: Vec<Registrant>) -> Self {
        Self::build(registrants, EngineSettings::default(), false)
    }

    fn build(
        registrants: Vec<Registrant>,
        settings: EngineSettings,
        camera_attached: bool,
    ) -> Self {
        let store = Arc::new(MemoryRegistrantStore::new(registrants));
        let evidence = Arc::new(MemoryEvidenceStore::new());
        let camera = Arc::new(StillCaptureDevice::new(vec![0xff, 0xd8, 0xff, 0xe0]));
        let announcer = Arc::new(RecordingAnnouncer::new());

        let device = camera_attached.then(|| Arc::clone(&camera) as Arc<dyn CaptureDevice>);
        let engine = CheckInEngine::new(settings, store.clone(), announcer.clone())
            .with_evidence(EvidencePipeline::new(device, evidence.clone()));

        Self {
            engine: Arc::new(engine),
            store,
            evidence,
            camera,
            announcer,
        }
    }

    pub fn stored_inout(&self) -> bool {
        self.store
            .snapshot(&RegistrantId::new("doc-ana"))
            .is_some_and(|r| r.inout)
    }
}

/// Registrant store whose lookups wait until [`GatedStore::release`].
pub struct GatedStore {
    pub inner: MemoryRegistrantStore,
    entered: Notify,
    gate: Semaphore,
}

impl GatedStore {
    pub fn new(registrants: Vec<Registrant>) -> Self {
        Self {
            inner: MemoryRegistrantStore::new(registrants),
            entered: Notify::new(),
            gate: Semaphore::new(0),
        }
    }

    /// Resolves once a lookup is waiting at the gate.
    pub async fn wait_for_lookup(&self) {
        self.entered.notified().await;
    }

    /// Let one waiting lookup through.
    pub fn release(&self) {
        self.gate.add_permits(1);
    }
}

impl RegistrantStore for GatedStore {
    fn find_by_identification<'a>(
        &'a self,
        identification: &'a str,
    ) -> StoreFut<'a, Vec<Registrant>> {
        Box::pin(async move {
            self.entered.notify_one();
            if let Ok(permit) = self.gate.acquire().await {
                permit.forget();
            }
            self.inner.find_by_identification(identification).await
        })
    }

    fn merge_inout<'a>(&'a self, id: &'a RegistrantId, inout: bool) -> StoreFut<'a, ()> {
        self.inner.merge_inout(id, inout)
    }

    fn get<'a>(&'a self, id: &'a RegistrantId) -> StoreFut<'a, Option<Registrant>> {
        self.inner.get(id)
    }
}
