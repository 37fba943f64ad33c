//! Configuration loading for the attendance kiosk.
//!
//! ```toml
//! [identification]
//! scheme = "numeric"
//! min_length = 6
//! max_length = 13
//!
//! [store]
//! registrants_file = "registrants.json"
//! duplicate_policy = "first_wins"
//!
//! [feedback]
//! fade_ms = 1000
//! hold_ms = 1000
//!
//! [messages]
//! welcome = "Hola {name}"
//! farewell = "Hasta pronto {name}"
//! ```
//!
//! Every section and every field is optional. Relative paths resolve against
//! the directory holding the config file, and `${VAR}` references in paths are
//! expanded from the environment.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use serde::Deserialize;
use thiserror::Error;

use kiosk_types::{
    CaptureOptions, DEFAULT_CAPTURE_QUALITY, DEFAULT_EVIDENCE_PREFIX, DEFAULT_MAX_LENGTH,
    DEFAULT_MIN_LENGTH, FadeTimings, IdentificationScheme, ImageEncoding,
};

pub const CONFIG_ENV_VAR: &str = "KIOSK_CONFIG";
pub const NAME_PLACEHOLDER: &str = "{name}";

// Default value function for serde (bool::default() is false, so only true needs a fn)
const fn default_true() -> bool {
    true
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid [{section}] config: {message}")]
    Invalid {
        section: &'static str,
        message: String,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KioskConfig {
    pub identification: Option<IdentificationConfig>,
    pub store: Option<StoreConfig>,
    pub evidence: Option<EvidenceConfig>,
    pub capture: Option<CaptureConfig>,
    pub announcer: Option<AnnouncerConfig>,
    pub feedback: Option<FeedbackConfig>,
    pub messages: Option<MessagesConfig>,
    /// Directory containing the config file, used to resolve relative paths.
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SchemeName {
    #[default]
    Numeric,
    Luhn,
    EcuadorCedula,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentificationConfig {
    pub scheme: SchemeName,
    /// Only used by the `numeric` scheme.
    pub min_length: usize,
    /// Only used by the `numeric` scheme.
    pub max_length: usize,
}

impl Default for IdentificationConfig {
    fn default() -> Self {
        Self {
            scheme: SchemeName::default(),
            min_length: DEFAULT_MIN_LENGTH,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

/// What to do when more than one registrant shares an identification.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The first result returned by the store is authoritative.
    #[default]
    FirstWins,
    /// Abort the attempt with `AmbiguousMatch`.
    Reject,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub registrants_file: PathBuf,
    pub duplicate_policy: DuplicatePolicy,
    /// Read the registrant back when a presence write fails, to detect writes
    /// that landed but whose acknowledgment was lost.
    #[serde(default = "default_true")]
    pub confirm_ambiguous_writes: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            registrants_file: PathBuf::from("registrants.json"),
            duplicate_policy: DuplicatePolicy::default(),
            confirm_ambiguous_writes: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvidenceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub prefix: String,
    pub directory: PathBuf,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: DEFAULT_EVIDENCE_PREFIX.to_string(),
            directory: PathBuf::from("evidence"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureConfig {
    pub quality: f32,
    pub encoding: ImageEncoding,
    /// Image file served by the file-backed capture device. No file means no camera.
    pub source_image: Option<PathBuf>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            quality: DEFAULT_CAPTURE_QUALITY,
            encoding: ImageEncoding::default(),
            source_image: None,
        }
    }
}

/// External text-to-speech program.
///
/// ```toml
/// [announcer]
/// command = "espeak"
/// args = ["-v", "es"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnnouncerConfig {
    pub command: Option<String>,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedbackConfig {
    pub fade_ms: u64,
    pub hold_ms: u64,
    pub notice_ttl_ms: u64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            fade_ms: 1000,
            hold_ms: 1000,
            notice_ttl_ms: 4000,
        }
    }
}

/// Operator-facing texts. `welcome` and `farewell` interpolate `{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MessagesConfig {
    pub welcome: String,
    pub farewell: String,
    pub empty_input: String,
    pub invalid_format: String,
    pub not_registered: String,
    pub ambiguous_match: String,
    pub lookup_failed: String,
    pub persist_failed: String,
    pub evidence_failed: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            welcome: "Hola {name}".to_string(),
            farewell: "Hasta pronto {name}".to_string(),
            empty_input: "Ingrese su identificación".to_string(),
            invalid_format: "La identificación no es válida".to_string(),
            not_registered: "El usuario no está registrado".to_string(),
            ambiguous_match: "La identificación está registrada más de una vez".to_string(),
            lookup_failed: "Problema al verificar el usuario, intentelo nuevamente".to_string(),
            persist_failed: "Error al actualizar el usuario, intentelo nuevamente".to_string(),
            evidence_failed: "No se pudo guardar la foto".to_string(),
        }
    }
}

impl MessagesConfig {
    /// Greeting for a registrant whose presence flag is now `inout`.
    #[must_use]
    pub fn greeting(&self, inout: bool, name: &str) -> String {
        let template = if inout { &self.welcome } else { &self.farewell };
        template.replace(NAME_PLACEHOLDER, name)
    }
}

/// Replace `${VAR}` references with the variable's value, or nothing when it
/// is unset. An unterminated `${` is kept as written.
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(open) = rest.find("${") {
        out.push_str(&rest[..open]);
        let reference = &rest[open + 2..];
        let Some(close) = reference.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let name = &reference[..close];
        if !name.is_empty()
            && let Ok(resolved) = env::var(name)
        {
            out.push_str(&resolved);
        }
        rest = &reference[close + 1..];
    }

    out.push_str(rest);
    out
}

impl KioskConfig {
    /// Load from [`KioskConfig::path`]. A missing file yields `Ok(None)`.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = Self::path() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        let mut config = match Self::parse(&content) {
            Ok(config) => config,
            Err(ConfigError::Parse { source, .. }) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, source);
                return Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                });
            }
            Err(err) => return Err(err),
        };
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Parse and check a config document. Relative paths stay relative to the
    /// working directory.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.check()?;
        Ok(config)
    }

    /// `$KIOSK_CONFIG`, else `~/.kiosk/config.toml`.
    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path_from(env::var_os(CONFIG_ENV_VAR))
    }

    fn check(&self) -> Result<(), ConfigError> {
        if let Some(ident) = &self.identification
            && ident.scheme == SchemeName::Numeric
            && (ident.min_length == 0 || ident.min_length > ident.max_length)
        {
            return Err(ConfigError::Invalid {
                section: "identification",
                message: format!(
                    "min_length ({}) must be at least 1 and at most max_length ({})",
                    ident.min_length, ident.max_length
                ),
            });
        }
        if let Some(capture) = &self.capture
            && !(0.0..=1.0).contains(&capture.quality)
        {
            return Err(ConfigError::Invalid {
                section: "capture",
                message: format!("quality {} is outside 0.0..=1.0", capture.quality),
            });
        }
        if let Some(announcer) = &self.announcer
            && announcer
                .command
                .as_deref()
                .is_some_and(|cmd| cmd.trim().is_empty())
        {
            return Err(ConfigError::Invalid {
                section: "announcer",
                message: "command must not be blank".to_string(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn identification_scheme(&self) -> IdentificationScheme {
        let ident = self.identification.clone().unwrap_or_default();
        match ident.scheme {
            SchemeName::Numeric => IdentificationScheme::Numeric {
                min_length: ident.min_length,
                max_length: ident.max_length,
            },
            SchemeName::Luhn => IdentificationScheme::Luhn,
            SchemeName::EcuadorCedula => IdentificationScheme::EcuadorCedula,
        }
    }

    #[must_use]
    pub fn store(&self) -> StoreConfig {
        self.store.clone().unwrap_or_default()
    }

    #[must_use]
    pub fn evidence(&self) -> EvidenceConfig {
        self.evidence.clone().unwrap_or_default()
    }

    #[must_use]
    pub fn announcer(&self) -> AnnouncerConfig {
        self.announcer.clone().unwrap_or_default()
    }

    #[must_use]
    pub fn messages(&self) -> MessagesConfig {
        self.messages.clone().unwrap_or_default()
    }

    #[must_use]
    pub fn capture_options(&self) -> CaptureOptions {
        let capture = self.capture.clone().unwrap_or_default();
        CaptureOptions {
            quality: capture.quality,
            encoding: capture.encoding,
        }
        .normalized()
    }

    #[must_use]
    pub fn capture_source(&self) -> Option<PathBuf> {
        self.capture
            .as_ref()
            .and_then(|c| c.source_image.as_deref())
            .map(|p| self.resolve_path(p))
    }

    #[must_use]
    pub fn fade_timings(&self) -> FadeTimings {
        let feedback = self.feedback.clone().unwrap_or_default();
        FadeTimings {
            fade: Duration::from_millis(feedback.fade_ms),
            hold: Duration::from_millis(feedback.hold_ms),
        }
    }

    #[must_use]
    pub fn notice_ttl(&self) -> Duration {
        let feedback = self.feedback.clone().unwrap_or_default();
        Duration::from_millis(feedback.notice_ttl_ms)
    }

    #[must_use]
    pub fn registrants_file(&self) -> PathBuf {
        self.resolve_path(&self.store().registrants_file)
    }

    #[must_use]
    pub fn evidence_dir(&self) -> PathBuf {
        self.resolve_path(&self.evidence().directory)
    }

    /// Expand `${VAR}` references and anchor relative paths at the config directory.
    #[must_use]
    pub fn resolve_path(&self, raw: &Path) -> PathBuf {
        let expanded = PathBuf::from(expand_env_vars(&raw.to_string_lossy()));
        match &self.base_dir {
            Some(base) if expanded.is_relative() => base.join(expanded),
            _ => expanded,
        }
    }
}

fn config_path_from(env_value: Option<OsString>) -> Option<PathBuf> {
    if let Some(value) = env_value.filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(value));
    }
    dirs::home_dir().map(|home| home.join(".kiosk").join("config.toml"))
}
