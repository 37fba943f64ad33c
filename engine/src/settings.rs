use kiosk_config::{DuplicatePolicy, KioskConfig, MessagesConfig};
use kiosk_types::{ErrorKind, IdentificationScheme};

/// Engine policy resolved from [`KioskConfig`].
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub scheme: IdentificationScheme,
    pub duplicate_policy: DuplicatePolicy,
    pub confirm_ambiguous_writes: bool,
    pub messages: MessagesConfig,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&KioskConfig::default())
    }
}

impl EngineSettings {
    #[must_use]
    pub fn from_config(config: &KioskConfig) -> Self {
        let store = config.store();
        Self {
            scheme: config.identification_scheme(),
            duplicate_policy: store.duplicate_policy,
            confirm_ambiguous_writes: store.confirm_ambiguous_writes,
            messages: config.messages(),
        }
    }

    /// Operator-facing text for an error kind.
    #[must_use]
    pub fn message_for(&self, kind: ErrorKind) -> &str {
        let messages = &self.messages;
        match kind {
            ErrorKind::EmptyInput => &messages.empty_input,
            ErrorKind::InvalidFormat => &messages.invalid_format,
            ErrorKind::NotRegistered => &messages.not_registered,
            ErrorKind::AmbiguousMatch => &messages.ambiguous_match,
            ErrorKind::LookupFailed => &messages.lookup_failed,
            ErrorKind::PersistFailed => &messages.persist_failed,
            ErrorKind::EvidenceUploadFailed => &messages.evidence_failed,
        }
    }
}
