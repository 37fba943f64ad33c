//! One attempt at a time.

use std::sync::Arc;

use kiosk_engine::memory::{MemoryEvidenceStore, RecordingAnnouncer, StillCaptureDevice};
use kiosk_engine::{
    CaptureDevice, CheckInEngine, EngineSettings, EvidencePipeline, Phase, SubmitRejected,
};

use crate::common::{ANA_ID, GatedStore, ana};

#[tokio::test]
async fn submit_during_attempt_is_rejected_without_side_effects() {
    let store = Arc::new(GatedStore::new(vec![ana(false)]));
    let announcer = Arc::new(RecordingAnnouncer::new());
    let evidence = Arc::new(MemoryEvidenceStore::new());
    let camera = Arc::new(StillCaptureDevice::new(vec![0xff, 0xd8]));
    let device = Arc::clone(&camera) as Arc<dyn CaptureDevice>;
    let engine = Arc::new(
        CheckInEngine::new(EngineSettings::default(), store.clone(), announcer.clone())
            .with_evidence(EvidencePipeline::new(Some(device), evidence.clone())),
    );

    let first = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.submit(Some(ANA_ID)).await }
    });
    store.wait_for_lookup().await;

    assert!(engine.is_busy());
    assert_eq!(engine.phase(), Phase::LookingUp);
    let rejected = engine.submit(Some(ANA_ID)).await.unwrap_err();
    assert_eq!(
        rejected,
        SubmitRejected::Busy {
            phase: Phase::LookingUp
        }
    );

    store.release();
    let report = first.await.unwrap().unwrap();
    assert!(report.is_success());

    // The rejected submit never reached a collaborator.
    assert_eq!(store.inner.lookup_count(), 1);
    assert_eq!(store.inner.write_count(), 1);
    assert_eq!(camera.resume_count(), 1);
    assert_eq!(camera.capture_count(), 1);
    assert_eq!(evidence.attempt_count(), 1);
    assert_eq!(evidence.uploads().len(), 1);
    assert_eq!(announcer.spoken(), vec!["Hola Ana"]);
    assert!(!engine.is_busy());
}

#[tokio::test]
async fn engine_accepts_the_next_attempt_once_idle() {
    let store = Arc::new(GatedStore::new(vec![ana(false)]));
    let announcer = Arc::new(RecordingAnnouncer::new());
    let engine = CheckInEngine::new(EngineSettings::default(), store.clone(), announcer.clone());
    let mut phases = engine.subscribe();

    store.release();
    engine.submit(Some(ANA_ID)).await.unwrap();
    store.release();
    engine.submit(Some(ANA_ID)).await.unwrap();

    assert_eq!(*phases.borrow_and_update(), Phase::Idle);
    assert_eq!(announcer.spoken(), vec!["Hola Ana", "Hasta pronto Ana"]);
    assert_eq!(store.inner.lookup_count(), 2);
}
