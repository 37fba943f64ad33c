//! Evidence naming and capture options.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_EVIDENCE_PREFIX: &str = "photos";
pub const DEFAULT_CAPTURE_QUALITY: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageEncoding {
    #[default]
    Jpeg,
    Png,
}

impl ImageEncoding {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureOptions {
    /// Compression quality in `0.0..=1.0`.
    pub quality: f32,
    pub encoding: ImageEncoding,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_CAPTURE_QUALITY,
            encoding: ImageEncoding::default(),
        }
    }
}

impl CaptureOptions {
    /// Clamp quality into range; NaN falls back to the default.
    #[must_use]
    pub fn normalized(self) -> Self {
        let quality = if self.quality.is_nan() {
            DEFAULT_CAPTURE_QUALITY
        } else {
            self.quality.clamp(0.0, 1.0)
        };
        Self { quality, ..self }
    }
}

/// Location of one uploaded photo: `{prefix}/{owner}/{unique}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EvidencePath {
    prefix: String,
    owner: String,
    unique: String,
}

impl EvidencePath {
    /// `owner` is reduced to a single path segment.
    #[must_use]
    pub fn new(prefix: &str, owner: &str, unique: impl Into<String>) -> Self {
        Self {
            prefix: prefix.trim_matches('/').to_string(),
            owner: owner_segment(owner),
            unique: unique.into(),
        }
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn unique(&self) -> &str {
        &self.unique
    }

    /// The owner directory, e.g. `photos/Ana/`.
    #[must_use]
    pub fn owner_dir(&self) -> String {
        if self.prefix.is_empty() {
            format!("{}/", self.owner)
        } else {
            format!("{}/{}/", self.prefix, self.owner)
        }
    }
}

impl fmt::Display for EvidencePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.owner_dir(), self.unique)
    }
}

fn owner_segment(owner: &str) -> String {
    let replaced: String = owner
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\') || c.is_control() { '_' } else { c })
        .collect();
    let stripped = replaced.trim_start_matches('.');
    if stripped.is_empty() {
        "_".to_string()
    } else {
        stripped.to_string()
    }
}
