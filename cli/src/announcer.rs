//! Speech output through an external text-to-speech program.

use std::process::Stdio;

use tokio::process::Command;

use kiosk_config::AnnouncerConfig;
use kiosk_engine::Announcer;

/// Runs `command [args..] <text>` per announcement without waiting for it.
/// With no command configured, announcements are only logged.
pub struct CommandAnnouncer {
    command: Option<String>,
    args: Vec<String>,
}

impl CommandAnnouncer {
    pub fn from_config(config: &AnnouncerConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
        }
    }

    pub fn is_silent(&self) -> bool {
        self.command.is_none()
    }
}

impl Announcer for CommandAnnouncer {
    fn speak(&self, text: &str) {
        let Some(program) = &self.command else {
            tracing::info!(text, "Announcement (no speech command configured)");
            return;
        };

        let spawned = Command::new(program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(child) => tracing::debug!(program, pid = child.id(), "Speech command started"),
            Err(err) => tracing::warn!(program, error = %err, "Failed to start speech command"),
        }
    }
}
