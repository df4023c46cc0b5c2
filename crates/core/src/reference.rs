//! Reference data (brands, models, model types, locations) and content
//! (news, notifications) managed from the dashboard.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::forms::{localized_bounded, validate_in_order, StepForm};
use crate::locale::{Locale, Localized};
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Brands, models, model types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    pub id: DbId,
    pub name: Localized,
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelType {
    pub id: DbId,
    pub name: Localized,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarModel {
    pub id: DbId,
    pub name: Localized,
    pub brand_id: DbId,
    #[serde(default)]
    pub model_type_id: Option<DbId>,
    pub year: i32,
}

/// One entry of a select dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: DbId,
    pub label: String,
}

/// Model dropdown entries for `brand_id`, labelled `"{name} - ({year})"`.
pub fn model_options(models: &[CarModel], brand_id: DbId, locale: Locale) -> Vec<SelectOption> {
    let mut options: Vec<SelectOption> = models
        .iter()
        .filter(|m| m.brand_id == brand_id)
        .map(|m| SelectOption {
            value: m.id,
            label: format!("{} - ({})", m.name.get(locale), m.year),
        })
        .collect();
    options.sort_by(|a, b| a.label.cmp(&b.label));
    options
}

/// Brand dropdown entries.
pub fn brand_options(brands: &[Brand], locale: Locale) -> Vec<SelectOption> {
    let mut options: Vec<SelectOption> = brands
        .iter()
        .map(|b| SelectOption {
            value: b.id,
            label: b.name.get(locale).to_string(),
        })
        .collect();
    options.sort_by(|a, b| a.label.cmp(&b.label));
    options
}

fn short_name(value: &Localized) -> Result<(), validator::ValidationError> {
    localized_bounded(value, 80)
}

/// Payload for brands and model types: a localized name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NamedForm {
    #[validate(custom(function = "short_name"))]
    pub name: Localized,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

impl StepForm for NamedForm {
    fn check(&self) -> Result<(), CoreError> {
        validate_in_order(self, &["name"])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ModelForm {
    #[validate(custom(function = "short_name"))]
    pub name: Localized,
    #[validate(range(min = 1, message = "Brand is required"))]
    pub brand_id: DbId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_type_id: Option<DbId>,
    #[validate(range(
        min = 1950,
        max = 2100,
        message = "Year must be between 1950 and 2100"
    ))]
    pub year: i32,
}

impl StepForm for ModelForm {
    fn check(&self) -> Result<(), CoreError> {
        validate_in_order(self, &["name", "brand_id", "year"])
    }
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    Country,
    City,
    Area,
}

impl LocationKind {
    /// Path segment under `/location`.
    pub fn segment(self) -> &'static str {
        match self {
            Self::Country => "countries",
            Self::City => "cities",
            Self::Area => "areas",
        }
    }

    /// The kind a location of this kind must belong to.
    pub fn parent(self) -> Option<Self> {
        match self {
            Self::Country => None,
            Self::City => Some(Self::Country),
            Self::Area => Some(Self::City),
        }
    }
}

impl std::str::FromStr for LocationKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "country" | "countries" => Ok(Self::Country),
            "city" | "cities" => Ok(Self::City),
            "area" | "areas" => Ok(Self::Area),
            other => Err(CoreError::Validation(format!(
                "Unknown location kind '{other}'. Must be one of: country, city, area"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: DbId,
    pub name: Localized,
    #[serde(default)]
    pub parent_id: Option<DbId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LocationForm {
    #[validate(custom(function = "short_name"))]
    pub name: Localized,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<DbId>,
}

impl LocationForm {
    /// Cities need a country and areas need a city; countries have no parent.
    pub fn check_for(&self, kind: LocationKind) -> Result<(), CoreError> {
        self.check()?;
        match (kind.parent(), self.parent_id) {
            (Some(parent), None) => Err(CoreError::Validation(format!(
                "A {} location needs a parent from {}",
                kind.segment(),
                parent.segment()
            ))),
            (None, Some(_)) => Err(CoreError::Validation(
                "A country cannot have a parent location".into(),
            )),
            _ => Ok(()),
        }
    }
}

impl StepForm for LocationForm {
    fn check(&self) -> Result<(), CoreError> {
        validate_in_order(self, &["name"])
    }
}

// ---------------------------------------------------------------------------
// News and notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct News {
    pub id: DbId,
    pub title: Localized,
    pub body: Localized,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

fn news_title(value: &Localized) -> Result<(), validator::ValidationError> {
    localized_bounded(value, 150)
}

fn long_text(value: &Localized) -> Result<(), validator::ValidationError> {
    localized_bounded(value, 10_000)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewsForm {
    #[validate(custom(function = "news_title"))]
    pub title: Localized,
    #[validate(custom(function = "long_text"))]
    pub body: Localized,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub published: bool,
}

impl StepForm for NewsForm {
    fn check(&self) -> Result<(), CoreError> {
        validate_in_order(self, &["title", "body"])
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    #[default]
    All,
    Users,
    Dealers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: DbId,
    pub title: Localized,
    pub body: Localized,
    #[serde(default)]
    pub audience: Audience,
    #[serde(default)]
    pub sent_at: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NotificationForm {
    #[validate(custom(function = "news_title"))]
    pub title: Localized,
    #[validate(custom(function = "long_text"))]
    pub body: Localized,
    #[serde(default)]
    pub audience: Audience,
}

impl StepForm for NotificationForm {
    fn check(&self) -> Result<(), CoreError> {
        validate_in_order(self, &["title", "body"])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
