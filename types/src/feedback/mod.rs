//! Operator feedback: transient notices plus the fading greeting banner.
//!
//! Pure state, advanced by explicit frame deltas. The presentation layer
//! renders [`FeedbackChannel::notices`], [`FeedbackChannel::banner_text`] and
//! [`FeedbackChannel::opacity`]; the workflow engine only writes to it.

mod animation;
mod fade;

use std::collections::VecDeque;
use std::time::Duration;

pub use fade::{FadeSequence, FadeStage, FadeTimings};

use crate::ErrorKind;

const MAX_NOTICES: usize = 8;
const DEDUPE_WINDOW: Duration = Duration::from_millis(500);
const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoticeId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error(ErrorKind),
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub id: NoticeId,
    pub kind: NoticeKind,
    pub message: String,
    age: Duration,
    ttl: Duration,
}

impl Notice {
    fn is_expired(&self) -> bool {
        self.age >= self.ttl
    }
}

#[derive(Debug, Clone)]
pub struct FeedbackChannel {
    notices: VecDeque<Notice>,
    next_id: u64,
    notice_ttl: Duration,
    timings: FadeTimings,
    banner: Option<FadeSequence>,
    field_flagged: bool,
}

impl Default for FeedbackChannel {
    fn default() -> Self {
        Self::new(FadeTimings::default(), DEFAULT_NOTICE_TTL)
    }
}

impl FeedbackChannel {
    #[must_use]
    pub fn new(timings: FadeTimings, notice_ttl: Duration) -> Self {
        Self {
            notices: VecDeque::new(),
            next_id: 1,
            notice_ttl,
            timings,
            banner: None,
            field_flagged: false,
        }
    }

    /// Surface a dismissible notice.
    ///
    /// `flag_field` marks the identification field as erroneous until the
    /// next report or [`FeedbackChannel::clear_field_flag`]. An identical
    /// notice reported within the dedupe window refreshes the existing one.
    pub fn report(
        &mut self,
        kind: NoticeKind,
        message: impl Into<String>,
        flag_field: bool,
    ) -> NoticeId {
        let message = message.into();
        self.field_flagged = flag_field;

        if let Some(existing) = self
            .notices
            .iter_mut()
            .find(|n| n.kind == kind && n.message == message && n.age <= DEDUPE_WINDOW)
        {
            existing.age = Duration::ZERO;
            return existing.id;
        }

        let id = NoticeId(self.next_id);
        self.next_id += 1;
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(Notice {
            id,
            kind,
            message,
            age: Duration::ZERO,
            ttl: self.notice_ttl,
        });
        id
    }

    /// Start the banner sequence for `text`, restarting any sequence in flight.
    pub fn show(&mut self, text: impl Into<String>) {
        match &mut self.banner {
            Some(banner) => banner.restart(text),
            None => self.banner = Some(FadeSequence::new(text, self.timings)),
        }
    }

    pub fn advance(&mut self, delta: Duration) {
        if let Some(banner) = &mut self.banner {
            banner.advance(delta);
        }
        for notice in &mut self.notices {
            notice.age = notice.age.saturating_add(delta);
        }
        self.notices.retain(|n| !n.is_expired());
    }

    pub fn dismiss(&mut self, id: NoticeId) -> bool {
        let before = self.notices.len();
        self.notices.retain(|n| n.id != id);
        self.notices.len() != before
    }

    pub fn clear_field_flag(&mut self) {
        self.field_flagged = false;
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    #[must_use]
    pub fn banner_text(&self) -> Option<&str> {
        self.banner.as_ref().map(FadeSequence::text)
    }

    #[must_use]
    pub fn banner_stage(&self) -> FadeStage {
        self.banner
            .as_ref()
            .map_or(FadeStage::Hidden, FadeSequence::stage)
    }

    #[must_use]
    pub fn opacity(&self) -> f32 {
        self.banner.as_ref().map_or(0.0, FadeSequence::opacity)
    }

    #[must_use]
    pub fn is_field_flagged(&self) -> bool {
        self.field_flagged
    }

    #[must_use]
    pub fn timings(&self) -> FadeTimings {
        self.timings
    }
}
