//! Locales and bilingual (Arabic / English) text.
//!
//! Every user-facing string in the dashboard is stored in both languages.
//! [`Localized`] keeps the pair together so the two translations can never
//! drift apart by index.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The two locales the dashboard supports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Ar,
    #[default]
    En,
}

impl Locale {
    /// Value sent in the `Accept-Language` header.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ar => "ar",
            Self::En => "en",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ar" => Ok(Self::Ar),
            "en" => Ok(Self::En),
            other => Err(CoreError::Validation(format!(
                "Unsupported locale '{other}'. Must be one of: ar, en"
            ))),
        }
    }
}

/// A string available in both Arabic and English.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Localized {
    pub ar: String,
    pub en: String,
}

impl Localized {
    pub fn new(ar: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            ar: ar.into(),
            en: en.into(),
        }
    }

    /// The text for the given locale.
    pub fn get(&self, locale: Locale) -> &str {
        match locale {
            Locale::Ar => &self.ar,
            Locale::En => &self.en,
        }
    }

    /// Both translations are blank.
    pub fn is_blank(&self) -> bool {
        self.ar.trim().is_empty() && self.en.trim().is_empty()
    }

    /// Name of the first blank translation (`"ar"` before `"en"`), if any.
    pub fn first_missing(&self) -> Option<Locale> {
        if self.ar.trim().is_empty() {
            Some(Locale::Ar)
        } else if self.en.trim().is_empty() {
            Some(Locale::En)
        } else {
            None
        }
    }

    /// Require both translations, naming the field in the error.
    pub fn require(&self, field: &str) -> Result<(), CoreError> {
        match self.first_missing() {
            Some(locale) => Err(CoreError::Validation(format!(
                "{field} ({locale}) is required"
            ))),
            None => Ok(()),
        }
    }

    /// Multipart/form field names for this value, e.g. `name[ar]`.
    pub fn form_fields(&self, field: &str) -> [(String, String); 2] {
        [
            (format!("{field}[ar]"), self.ar.clone()),
            (format!("{field}[en]"), self.en.clone()),
        ]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_parses_case_insensitively() {
        assert_eq!("AR".parse::<Locale>().unwrap(), Locale::Ar);
        assert_eq!(" en ".parse::<Locale>().unwrap(), Locale::En);
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn localized_get_picks_locale() {
        let name = Localized::new("تويوتا", "Toyota");
        assert_eq!(name.get(Locale::En), "Toyota");
        assert_eq!(name.get(Locale::Ar), "تويوتا");
    }

    #[test]
    fn require_reports_arabic_first() {
        let err = Localized::new("", "").require("Name").unwrap_err();
        assert_eq!(err, CoreError::Validation("Name (ar) is required".into()));

        let err = Localized::new("x", " ").require("Name").unwrap_err();
        assert_eq!(err, CoreError::Validation("Name (en) is required".into()));
    }

    #[test]
    fn form_fields_use_bracket_notation() {
        let fields = Localized::new("أ", "a").form_fields("name");
        assert_eq!(fields[0], ("name[ar]".to_string(), "أ".to_string()));
        assert_eq!(fields[1], ("name[en]".to_string(), "a".to_string()));
    }
}
