use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque document handle assigned by the registrant store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrantId(String);

impl RegistrantId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegistrantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A pre-provisioned person record.
///
/// `inout == true` means the registrant is currently checked in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registrant {
    pub id: RegistrantId,
    pub identification: String,
    pub name: String,
    #[serde(default)]
    pub inout: bool,
}

impl Registrant {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        identification: impl Into<String>,
        name: impl Into<String>,
        inout: bool,
    ) -> Self {
        Self {
            id: RegistrantId::new(id),
            identification: identification.into(),
            name: name.into(),
            inout,
        }
    }

    /// The presence flag a successful attempt writes back.
    #[must_use]
    pub fn toggled_inout(&self) -> bool {
        !self.inout
    }
}

/// Mask all but the last four characters, for logs.
#[must_use]
pub fn redact_identification(value: &str) -> String {
    let count = value.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = value.chars().skip(count - 4).collect();
    format!("***{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggled_inout_flips() {
        let checked_out = Registrant::new("doc-1", "123456789", "Ana", false);
        assert!(checked_out.toggled_inout());
        let checked_in = Registrant {
            inout: true,
            ..checked_out
        };
        assert!(!checked_in.toggled_inout());
    }

    #[test]
    fn missing_inout_defaults_to_checked_out() {
        let raw = r#"{"id":"doc-1","identification":"123456789","name":"Ana"}"#;
        let registrant: Registrant = serde_json::from_str(raw).unwrap();
        assert!(!registrant.inout);
        assert_eq!(registrant.id.as_str(), "doc-1");
    }

    #[test]
    fn redaction_keeps_last_four() {
        assert_eq!(redact_identification("123456789"), "***6789");
        assert_eq!(redact_identification("1234"), "****");
        assert_eq!(redact_identification(""), "");
    }
}
