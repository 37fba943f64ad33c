//! Greeting banner and notices as seen by the presentation layer.

use std::time::Duration;

use kiosk_types::{FadeStage, NoticeKind};

use crate::common::{ANA_ID, Kiosk, ana};

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

#[tokio::test]
async fn greeting_fades_in_holds_and_fades_out() {
    let kiosk = Kiosk::new(vec![ana(false)]);
    kiosk.engine.submit(Some(ANA_ID)).await.unwrap();

    let feedback = kiosk.engine.feedback();
    let mut feedback = feedback.lock().unwrap();
    assert_eq!(feedback.banner_text(), Some("Hola Ana"));
    assert_eq!(feedback.banner_stage(), FadeStage::FadingIn);

    feedback.advance(ms(1000));
    assert_eq!(feedback.banner_stage(), FadeStage::Holding);
    assert!((feedback.opacity() - 1.0).abs() < f32::EPSILON);

    feedback.advance(ms(1000));
    assert_eq!(feedback.banner_stage(), FadeStage::FadingOut);

    feedback.advance(ms(1000));
    assert_eq!(feedback.banner_stage(), FadeStage::Hidden);
    assert!(feedback.opacity().abs() < f32::EPSILON);
}

#[tokio::test]
async fn new_greeting_restarts_the_banner() {
    let kiosk = Kiosk::new(vec![ana(false)]);
    kiosk.engine.submit(Some(ANA_ID)).await.unwrap();
    kiosk.engine.feedback().lock().unwrap().advance(ms(1500));

    kiosk.engine.submit(Some(ANA_ID)).await.unwrap();

    let feedback = kiosk.engine.feedback();
    let feedback = feedback.lock().unwrap();
    assert_eq!(feedback.banner_text(), Some("Hasta pronto Ana"));
    assert_eq!(feedback.banner_stage(), FadeStage::FadingIn);
}

#[tokio::test]
async fn repeated_errors_collapse_into_one_notice() {
    let kiosk = Kiosk::new(vec![ana(false)]);

    kiosk.engine.submit(Some("999999999")).await.unwrap();
    kiosk.engine.submit(Some("999999999")).await.unwrap();

    let feedback = kiosk.engine.feedback();
    let mut feedback = feedback.lock().unwrap();
    assert_eq!(feedback.notices().count(), 1);

    feedback.advance(ms(4000));
    assert_eq!(feedback.notices().count(), 0);
}

#[tokio::test]
async fn greeting_is_reported_as_success_notice() {
    let kiosk = Kiosk::new(vec![ana(false)]);
    kiosk.engine.submit(Some(ANA_ID)).await.unwrap();

    let feedback = kiosk.engine.feedback();
    let feedback = feedback.lock().unwrap();
    let notices: Vec<_> = feedback
        .notices()
        .map(|n| (n.kind, n.message.clone()))
        .collect();
    assert_eq!(notices, vec![(NoticeKind::Success, "Hola Ana".to_string())]);
    assert!(!feedback.is_field_flagged());
}
