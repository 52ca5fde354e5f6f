//! Lenient numeric fields.
//!
//! Upstream schemas carry counts either as JSON numbers or as text such as
//! `"1234"`. [`NumericText`] accepts both (plus `null`) and keeps the raw text
//! so that coercion to `f64` happens per record, where a failure can skip the
//! record instead of rejecting the whole payload.

use serde::{Deserialize, Deserializer};

use crate::error::CoercionError;

/// A numeric value as it appeared upstream, kept as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumericText(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumeric {
    Text(String),
    Number(serde_json::Number),
}

impl NumericText {
    /// Wraps raw text.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the upstream value was absent, `null` or empty text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Parses the text as a 64-bit float.
    ///
    /// # Errors
    ///
    /// Returns a [`CoercionError`] naming `field` if the text is empty or not a number.
    ///
    /// # Examples
    ///
    /// ```
    /// use shared::numeric::NumericText;
    ///
    /// assert_eq!(NumericText::new("1234").to_f64("confirmed").unwrap(), 1234.0);
    /// assert!(NumericText::new("n/a").to_f64("confirmed").is_err());
    /// ```
    pub fn to_f64(&self, field: &'static str) -> Result<f64, CoercionError> {
        self.0.trim().parse::<f64>().map_err(|_| CoercionError {
            field,
            raw: self.0.clone(),
        })
    }

    /// Like [`to_f64`](Self::to_f64), but an empty value counts as zero.
    ///
    /// # Errors
    ///
    /// Returns a [`CoercionError`] if the value is present but not a number.
    pub fn to_f64_or_zero(&self, field: &'static str) -> Result<f64, CoercionError> {
        if self.is_empty() {
            Ok(0.0)
        } else {
            self.to_f64(field)
        }
    }
}

impl<'de> Deserialize<'de> for NumericText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<RawNumeric>::deserialize(deserializer)?;
        Ok(match raw {
            Some(RawNumeric::Text(text)) => Self(text),
            Some(RawNumeric::Number(number)) => Self(number.to_string()),
            None => Self::default(),
        })
    }
}

impl From<&str> for NumericText {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}
