//! End-to-end attempts against in-memory collaborators.

use kiosk_engine::memory::WriteFault;
use kiosk_engine::{EngineSettings, InputDisposition, KioskConfig, Phase, Registrant};
use kiosk_types::{ErrorKind, IdentificationScheme};

use crate::common::{ANA_ID, Kiosk, ana};

#[tokio::test]
async fn unregistered_identification_is_reported_and_cleared() {
    let kiosk = Kiosk::new(vec![ana(false)]);

    let report = kiosk.engine.submit(Some("999999999")).await.unwrap();

    assert_eq!(report.error_kind(), Some(ErrorKind::NotRegistered));
    assert_eq!(report.input(), InputDisposition::Cleared);
    assert!(report.toggle.is_none());
    assert_eq!(kiosk.store.write_count(), 0);
    assert_eq!(kiosk.camera.capture_count(), 0);
    assert!(kiosk.announcer.spoken().is_empty());
    assert_eq!(kiosk.engine.phase(), Phase::Idle);

    let feedback = kiosk.engine.feedback();
    let feedback = feedback.lock().unwrap();
    let messages: Vec<_> = feedback.notices().map(|n| n.message.clone()).collect();
    assert_eq!(messages, vec!["El usuario no está registrado"]);
    assert!(!feedback.is_field_flagged());
}

#[tokio::test]
async fn check_in_persists_uploads_and_greets() {
    let kiosk = Kiosk::new(vec![ana(false)]);

    let report = kiosk.engine.submit(Some(ANA_ID)).await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.error_kind(), None);
    assert!(kiosk.stored_inout());
    assert_eq!(kiosk.announcer.spoken(), vec!["Hola Ana"]);
    assert_eq!(report.input(), InputDisposition::Cleared);

    let uploads = kiosk.evidence.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].0.owner_dir(), "photos/Ana/");
    assert_eq!(report.evidence.as_ref(), Some(&uploads[0].0));

    let toggle = report.toggle.unwrap();
    assert!(!toggle.previous_inout);
    assert!(toggle.inout);
}

#[tokio::test]
async fn failed_upload_still_announces() {
    let kiosk = Kiosk::new(vec![ana(false)]);
    kiosk.evidence.set_failing(true);

    let report = kiosk.engine.submit(Some(ANA_ID)).await.unwrap();

    assert!(kiosk.stored_inout());
    assert_eq!(kiosk.announcer.spoken(), vec!["Hola Ana"]);
    assert_eq!(report.error_kind(), Some(ErrorKind::EvidenceUploadFailed));
    assert!(report.evidence.is_none());
    assert_eq!(kiosk.evidence.attempt_count(), 1);
    assert_eq!(kiosk.engine.phase(), Phase::Idle);

    let feedback = kiosk.engine.feedback();
    let feedback = feedback.lock().unwrap();
    assert!(
        feedback
            .notices()
            .any(|n| n.message == "No se pudo guardar la foto")
    );
    assert_eq!(feedback.banner_text(), Some("Hola Ana"));
}

#[tokio::test]
async fn rejected_write_aborts_before_evidence() {
    let kiosk = Kiosk::new(vec![ana(false)]);
    kiosk.store.set_write_fault(WriteFault::Rejected);

    let report = kiosk.engine.submit(Some(ANA_ID)).await.unwrap();

    assert_eq!(report.error_kind(), Some(ErrorKind::PersistFailed));
    assert_eq!(report.input(), InputDisposition::Cleared);
    assert!(!kiosk.stored_inout());
    assert!(kiosk.announcer.spoken().is_empty());
    assert_eq!(kiosk.camera.capture_count(), 0);
    assert_eq!(kiosk.evidence.attempt_count(), 0);
    assert!(!kiosk.engine.is_busy());
    assert_eq!(kiosk.engine.phase(), Phase::Idle);
}

#[tokio::test]
async fn consecutive_attempts_alternate_presence() {
    let kiosk = Kiosk::new(vec![ana(false)]);

    for expected in [true, false, true] {
        let report = kiosk.engine.submit(Some(ANA_ID)).await.unwrap();
        assert!(report.is_success());
        assert_eq!(kiosk.stored_inout(), expected);
    }

    assert_eq!(
        kiosk.announcer.spoken(),
        vec!["Hola Ana", "Hasta pronto Ana", "Hola Ana"]
    );
    assert_eq!(kiosk.evidence.uploads().len(), 3);
    assert_eq!(kiosk.camera.resume_count(), 3);
}

#[tokio::test]
async fn lookup_failure_writes_nothing() {
    let kiosk = Kiosk::new(vec![ana(false)]);
    kiosk.store.set_fail_lookups(true);

    let report = kiosk.engine.submit(Some(ANA_ID)).await.unwrap();

    assert_eq!(report.error_kind(), Some(ErrorKind::LookupFailed));
    assert_eq!(report.input(), InputDisposition::Cleared);
    assert_eq!(kiosk.store.write_count(), 0);
    assert!(kiosk.announcer.spoken().is_empty());
}

#[tokio::test]
async fn empty_input_never_reaches_the_store() {
    let kiosk = Kiosk::new(vec![ana(false)]);

    for input in [None, Some(""), Some("   ")] {
        let report = kiosk.engine.submit(input).await.unwrap();
        assert_eq!(report.error_kind(), Some(ErrorKind::EmptyInput));
    }

    assert_eq!(kiosk.store.lookup_count(), 0);
    assert!(kiosk.engine.feedback().lock().unwrap().is_field_flagged());
}

#[tokio::test]
async fn kiosk_without_camera_keeps_working() {
    let kiosk = Kiosk::without_camera(vec![ana(true)]);

    let report = kiosk.engine.submit(Some(ANA_ID)).await.unwrap();

    assert!(!kiosk.stored_inout());
    assert_eq!(kiosk.announcer.spoken(), vec!["Hasta pronto Ana"]);
    assert_eq!(report.error_kind(), Some(ErrorKind::EvidenceUploadFailed));
    assert_eq!(kiosk.evidence.attempt_count(), 0);
}

#[tokio::test]
async fn cedula_scheme_checks_the_verifier_digit() {
    let cedula = Registrant::new("doc-rosa", "1710034065", "Rosa", false);
    let settings = EngineSettings {
        scheme: IdentificationScheme::EcuadorCedula,
        ..EngineSettings::default()
    };
    let kiosk = Kiosk::with_settings(vec![cedula], settings);

    let report = kiosk.engine.submit(Some("1710034066")).await.unwrap();
    assert_eq!(report.error_kind(), Some(ErrorKind::InvalidFormat));
    assert_eq!(report.input(), InputDisposition::Flagged("1710034066".into()));
    assert_eq!(kiosk.store.lookup_count(), 0);

    let report = kiosk.engine.submit(Some("1710034065")).await.unwrap();
    assert!(report.is_success());
    assert_eq!(kiosk.announcer.spoken(), vec!["Hola Rosa"]);
}

#[tokio::test]
async fn configured_messages_drive_the_greeting() {
    let config = KioskConfig::parse(
        r#"
[messages]
welcome = "Bienvenida {name}"
farewell = "Chao {name}"
"#,
    )
    .unwrap();
    let kiosk = Kiosk::with_settings(vec![ana(false)], EngineSettings::from_config(&config));

    kiosk.engine.submit(Some(ANA_ID)).await.unwrap();
    kiosk.engine.submit(Some(ANA_ID)).await.unwrap();

    assert_eq!(kiosk.announcer.spoken(), vec!["Bienvenida Ana", "Chao Ana"]);
}
