//! Line-oriented presentation of attempts and feedback.

use std::io::{self, Write};

use kiosk_engine::{AttemptReport, FeedbackChannel, InputDisposition, SubmitRejected};
use kiosk_types::{NoticeId, NoticeKind};

pub struct Console<W: Write> {
    out: W,
    json: bool,
    last_notice: Option<NoticeId>,
}

impl<W: Write> Console<W> {
    pub fn new(out: W, json: bool) -> Self {
        Self {
            out,
            json,
            last_notice: None,
        }
    }

    /// Print notices reported since the last call, greetings included.
    /// Nothing in JSON mode; the report already carries the outcome.
    pub fn render_feedback(&mut self, feedback: &FeedbackChannel) -> io::Result<()> {
        if self.json {
            return Ok(());
        }
        for notice in feedback.notices() {
            if self.last_notice.is_some_and(|last| notice.id <= last) {
                continue;
            }
            let marker = match notice.kind {
                NoticeKind::Success => '»',
                NoticeKind::Error(_) => '!',
            };
            writeln!(self.out, "{marker} {}", notice.message)?;
            self.last_notice = Some(notice.id);
        }
        self.out.flush()
    }

    pub fn report(&mut self, result: &Result<AttemptReport, SubmitRejected>) -> io::Result<()> {
        match result {
            Ok(report) if self.json => {
                serde_json::to_writer(&mut self.out, report)?;
                writeln!(self.out)?;
            }
            Ok(report) => {
                if let InputDisposition::Flagged(text) = report.input() {
                    writeln!(self.out, "? {text}")?;
                }
            }
            Err(rejected) if self.json => {
                let line = serde_json::json!({ "rejected": rejected.to_string() });
                writeln!(self.out, "{line}")?;
            }
            Err(rejected) => writeln!(self.out, "… {rejected}")?,
        }
        self.out.flush()
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}
