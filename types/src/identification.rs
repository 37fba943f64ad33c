//! Identification validation.
//!
//! An identification is the business key a registrant types at the kiosk.
//! [`validate`] is the only way to obtain an [`Identification`], so holding
//! one proves the value is non-blank and satisfies the configured scheme.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_MIN_LENGTH: usize = 6;
pub const DEFAULT_MAX_LENGTH: usize = 13;

const CEDULA_LENGTH: usize = 10;
const CEDULA_MAX_PROVINCE: u32 = 24;
const CEDULA_FOREIGN_PROVINCE: u32 = 30;
const CEDULA_MAX_THIRD_DIGIT: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("identification is empty")]
    EmptyInput,
    #[error("identification is malformed: {reason}")]
    InvalidFormat { reason: &'static str },
}

/// Format rule applied to non-blank identifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentificationScheme {
    /// ASCII digits only, length within `min_length..=max_length`.
    Numeric {
        min_length: usize,
        max_length: usize,
    },
    /// Digits with a trailing Luhn mod-10 check digit.
    Luhn,
    /// Ten-digit Ecuadorian national id (province, type digit, mod-10 check digit).
    EcuadorCedula,
}

impl Default for IdentificationScheme {
    fn default() -> Self {
        Self::Numeric {
            min_length: DEFAULT_MIN_LENGTH,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

impl IdentificationScheme {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Numeric { .. } => "numeric",
            Self::Luhn => "luhn",
            Self::EcuadorCedula => "ecuador_cedula",
        }
    }

    fn check(self, value: &str) -> Result<(), ValidationError> {
        let digits = ascii_digits(value).ok_or(ValidationError::InvalidFormat {
            reason: "only digits are allowed",
        })?;

        match self {
            Self::Numeric {
                min_length,
                max_length,
            } => {
                if digits.len() < min_length || digits.len() > max_length {
                    return Err(ValidationError::InvalidFormat {
                        reason: "length out of range",
                    });
                }
                Ok(())
            }
            Self::Luhn => {
                if digits.len() < 2 {
                    return Err(ValidationError::InvalidFormat {
                        reason: "too short for a check digit",
                    });
                }
                if luhn_sum(&digits) % 10 != 0 {
                    return Err(ValidationError::InvalidFormat {
                        reason: "check digit mismatch",
                    });
                }
                Ok(())
            }
            Self::EcuadorCedula => check_cedula(&digits),
        }
    }
}

fn ascii_digits(value: &str) -> Option<Vec<u32>> {
    value.chars().map(|c| c.to_digit(10)).collect()
}

fn luhn_sum(digits: &[u32]) -> u32 {
    digits
        .iter()
        .rev()
        .enumerate()
        .map(|(idx, &d)| {
            if idx % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum()
}

fn check_cedula(digits: &[u32]) -> Result<(), ValidationError> {
    if digits.len() != CEDULA_LENGTH {
        return Err(ValidationError::InvalidFormat {
            reason: "a cedula has exactly ten digits",
        });
    }

    let province = digits[0] * 10 + digits[1];
    if !(1..=CEDULA_MAX_PROVINCE).contains(&province) && province != CEDULA_FOREIGN_PROVINCE {
        return Err(ValidationError::InvalidFormat {
            reason: "unknown province code",
        });
    }
    if digits[2] > CEDULA_MAX_THIRD_DIGIT {
        return Err(ValidationError::InvalidFormat {
            reason: "not a natural-person cedula",
        });
    }

    // Coefficients alternate 2,1,2,1,... over the first nine digits.
    let sum: u32 = digits[..9]
        .iter()
        .enumerate()
        .map(|(idx, &d)| {
            let product = if idx % 2 == 0 { d * 2 } else { d };
            if product > 9 { product - 9 } else { product }
        })
        .sum();
    let expected = (10 - sum % 10) % 10;
    if expected != digits[9] {
        return Err(ValidationError::InvalidFormat {
            reason: "check digit mismatch",
        });
    }
    Ok(())
}

/// A trimmed identification that passed [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Identification(String);

impl Identification {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Identification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identification {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Check an operator-entered identification against `scheme`.
///
/// Absent or blank input yields [`ValidationError::EmptyInput`]; anything else
/// that fails the scheme yields [`ValidationError::InvalidFormat`].
pub fn validate(
    input: Option<&str>,
    scheme: IdentificationScheme,
) -> Result<Identification, ValidationError> {
    let trimmed = input.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyInput);
    }
    scheme.check(trimmed)?;
    Ok(Identification(trimmed.to_string()))
}
