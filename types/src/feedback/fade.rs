//! Timed fade-in / hold / fade-out for the greeting banner.

use std::time::Duration;

use super::animation::{EffectTimer, normalized_progress};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeTimings {
    /// Duration of each ramp (in and out).
    pub fade: Duration,
    pub hold: Duration,
}

impl Default for FadeTimings {
    fn default() -> Self {
        Self {
            fade: Duration::from_millis(1000),
            hold: Duration::from_millis(1000),
        }
    }
}

impl FadeTimings {
    #[must_use]
    pub fn total(self) -> Duration {
        self.fade
            .saturating_add(self.hold)
            .saturating_add(self.fade)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeStage {
    FadingIn,
    Holding,
    FadingOut,
    Hidden,
}

#[derive(Debug, Clone)]
pub struct FadeSequence {
    text: String,
    timings: FadeTimings,
    timer: EffectTimer,
}

impl FadeSequence {
    #[must_use]
    pub fn new(text: impl Into<String>, timings: FadeTimings) -> Self {
        Self {
            text: text.into(),
            timings,
            timer: EffectTimer::new(timings.total()),
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn advance(&mut self, delta: Duration) {
        self.timer.advance(delta);
    }

    /// Replace the text and start over from zero opacity.
    pub fn restart(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.timer.restart();
    }

    #[must_use]
    pub fn stage(&self) -> FadeStage {
        if self.timer.is_finished() {
            return FadeStage::Hidden;
        }
        let elapsed = self.timer.elapsed();
        let fade_in_end = self.timings.fade;
        let hold_end = fade_in_end.saturating_add(self.timings.hold);
        if elapsed < fade_in_end {
            FadeStage::FadingIn
        } else if elapsed < hold_end {
            FadeStage::Holding
        } else {
            FadeStage::FadingOut
        }
    }

    #[must_use]
    pub fn opacity(&self) -> f32 {
        let elapsed = self.timer.elapsed();
        match self.stage() {
            FadeStage::FadingIn => normalized_progress(elapsed, self.timings.fade),
            FadeStage::Holding => 1.0,
            FadeStage::FadingOut => {
                let out_start = self.timings.fade.saturating_add(self.timings.hold);
                1.0 - normalized_progress(elapsed.saturating_sub(out_start), self.timings.fade)
            }
            FadeStage::Hidden => 0.0,
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.timer.is_finished()
    }
}
