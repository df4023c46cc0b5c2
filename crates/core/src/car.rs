//! Draft cars and the three wizard step forms.
//!
//! A draft car is owned by the server. Each step form is built either from
//! user input or from the server draft ([`MainInfoForm::from_draft`] and
//! friends) and produces the partial payload its endpoint expects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::forms::{localized_bounded, validate_in_order, StepForm};
use crate::locale::Localized;
use crate::types::{DbId, Timestamp};
use crate::variant::VariantTree;
use crate::wizard::{DraftProgress, SubmitFlags};

/// Maximum SEO meta title length, per locale.
pub const MAX_META_TITLE_LEN: usize = 70;

/// Maximum SEO meta description length, per locale.
pub const MAX_META_DESCRIPTION_LEN: usize = 160;

/// Maximum number of SEO keywords.
pub const MAX_KEYWORDS: usize = 20;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// An image already stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedImage {
    pub id: DbId,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MainInfo {
    pub brand_id: DbId,
    pub model_id: DbId,
    pub price: f64,
    #[serde(default)]
    pub has_offer: bool,
    #[serde(default)]
    pub offer: Option<f64>,
    #[serde(default)]
    pub images: Vec<PersistedImage>,
    #[serde(default)]
    pub video: Option<String>,
}

/// One selected specification value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecValue {
    pub spec_id: DbId,
    pub value: Localized,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoInfo {
    pub meta_title: Localized,
    pub meta_description: Localized,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Full draft record as returned by `GET /cars/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftCar {
    pub id: DbId,
    #[serde(default)]
    pub name: Localized,
    #[serde(default)]
    pub progress: DraftProgress,
    #[serde(default)]
    pub main_info: Option<MainInfo>,
    #[serde(default)]
    pub specs: Vec<SpecValue>,
    #[serde(default)]
    pub seo: Option<SeoInfo>,
    #[serde(default = "default_true")]
    pub draft: bool,
    #[serde(default)]
    pub show_car: bool,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

fn default_true() -> bool {
    true
}

/// Row of the cars / drafts list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarSummary {
    pub id: DbId,
    pub name: Localized,
    #[serde(default)]
    pub brand: Option<Localized>,
    #[serde(default)]
    pub model: Option<Localized>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub show_car: bool,
    #[serde(default)]
    pub progress: DraftProgress,
}

/// Response of the main-info endpoints: `{ "carId": ... }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarIdResponse {
    pub car_id: DbId,
}

// ---------------------------------------------------------------------------
// Step 1: main info
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MainInfoForm {
    #[validate(custom(function = "car_name"))]
    pub name: Localized,
    #[validate(required(message = "Brand is required"))]
    pub brand_id: Option<DbId>,
    #[validate(required(message = "Model is required"))]
    pub model_id: Option<DbId>,
    #[validate(
        required(message = "Price is required"),
        range(exclusive_min = 0.0, message = "Price must be greater than zero")
    )]
    pub price: Option<f64>,
    #[serde(default)]
    pub has_offer: bool,
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0, message = "Offer must be greater than zero"))]
    pub offer: Option<f64>,
}

fn car_name(value: &Localized) -> Result<(), validator::ValidationError> {
    localized_bounded(value, 120)
}

const MAIN_INFO_FIELDS: &[&str] = &["name", "brand_id", "model_id", "price", "offer"];

impl MainInfoForm {
    /// Rebuild the form from a server draft.
    pub fn from_draft(draft: &DraftCar) -> Self {
        match &draft.main_info {
            Some(info) => Self {
                name: draft.name.clone(),
                brand_id: Some(info.brand_id),
                model_id: Some(info.model_id),
                price: Some(info.price),
                has_offer: info.has_offer,
                offer: info.offer,
            },
            None => Self {
                name: draft.name.clone(),
                ..Self::default()
            },
        }
    }

    /// Text fields of the multipart body, in submission order.
    pub fn form_fields(&self) -> Result<Vec<(String, String)>, CoreError> {
        self.check()?;
        let mut fields: Vec<(String, String)> = self.name.form_fields("name").into();
        // check() guarantees the required fields are present.
        let missing = || CoreError::Internal("validated main info lost a field".into());
        fields.push(("brandId".into(), self.brand_id.ok_or_else(missing)?.to_string()));
        fields.push(("modelId".into(), self.model_id.ok_or_else(missing)?.to_string()));
        fields.push(("price".into(), self.price.ok_or_else(missing)?.to_string()));
        fields.push(("hasOffer".into(), self.has_offer.to_string()));
        if self.has_offer {
            if let Some(offer) = self.offer {
                fields.push(("offer".into(), offer.to_string()));
            }
        }
        Ok(fields)
    }
}

impl StepForm for MainInfoForm {
    fn check(&self) -> Result<(), CoreError> {
        validate_in_order(self, MAIN_INFO_FIELDS)?;
        if self.has_offer {
            match (self.offer, self.price) {
                (None, _) => {
                    return Err(CoreError::Validation(
                        "Offer price is required when the car has an offer".into(),
                    ))
                }
                (Some(offer), Some(price)) if offer >= price => {
                    return Err(CoreError::Validation(
                        "Offer price must be lower than the price".into(),
                    ))
                }
                _ => {}
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Step 2: specifications
// ---------------------------------------------------------------------------

/// Selected value per specification (variant) id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecsForm {
    pub selections: BTreeMap<DbId, Localized>,
}

/// Body of `POST /cars/{id}/car-specs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecsPayload {
    /// JSON-encoded array of `{specId, value}`.
    pub specs: String,
    #[serde(flatten)]
    pub flags: SubmitFlags,
}

impl SpecsForm {
    pub fn from_draft(draft: &DraftCar) -> Self {
        Self {
            selections: draft
                .specs
                .iter()
                .map(|s| (s.spec_id, s.value.clone()))
                .collect(),
        }
    }

    /// Build the form from raw form state shaped as
    /// `{ "<specId>": { "ar": ..., "en": ... } }`.
    ///
    /// Arrays where a single value object is expected are rejected here,
    /// before any request is made.
    pub fn from_raw(raw: &serde_json::Value) -> Result<Self, CoreError> {
        let object = match raw {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Array(_) => {
                return Err(CoreError::DataShape(
                    "Specifications must be an object keyed by specification id, not a list"
                        .into(),
                ))
            }
            other => {
                return Err(CoreError::DataShape(format!(
                    "Specifications must be an object, got {}",
                    json_kind(other)
                )))
            }
        };

        let mut selections = BTreeMap::new();
        for (key, value) in object {
            let spec_id: DbId = key.parse().map_err(|_| {
                CoreError::DataShape(format!("Specification id '{key}' is not a number"))
            })?;
            match value {
                serde_json::Value::Object(_) => {
                    let pair: Localized = serde_json::from_value(value.clone()).map_err(|e| {
                        CoreError::DataShape(format!(
                            "Specification {spec_id} value must have 'ar' and 'en' text: {e}"
                        ))
                    })?;
                    selections.insert(spec_id, pair);
                }
                serde_json::Value::Null => {}
                serde_json::Value::Array(_) => {
                    return Err(CoreError::DataShape(format!(
                        "Specification {spec_id} must have a single value, got a list"
                    )))
                }
                other => {
                    return Err(CoreError::DataShape(format!(
                        "Specification {spec_id} value must be an object, got {}",
                        json_kind(other)
                    )))
                }
            }
        }
        Ok(Self { selections })
    }

    /// Selections in submission order.
    pub fn values(&self) -> Vec<SpecValue> {
        self.selections
            .iter()
            .map(|(spec_id, value)| SpecValue {
                spec_id: *spec_id,
                value: value.clone(),
            })
            .collect()
    }

    /// Every selection must name a known variant and one of its values.
    pub fn check_against(&self, tree: &VariantTree) -> Result<(), CoreError> {
        for (spec_id, value) in &self.selections {
            let variant = tree.variant(*spec_id).ok_or_else(|| {
                CoreError::Validation(format!("Specification {spec_id} does not exist"))
            })?;
            if !variant.has_value(value) {
                return Err(CoreError::Validation(format!(
                    "'{}' is not a valid value for {}",
                    value.en, variant.name.en
                )));
            }
        }
        Ok(())
    }

    pub fn to_payload(&self, flags: SubmitFlags) -> Result<SpecsPayload, CoreError> {
        self.check()?;
        let specs = serde_json::to_string(&self.values())
            .map_err(|e| CoreError::Internal(format!("Failed to encode specifications: {e}")))?;
        Ok(SpecsPayload { specs, flags })
    }
}

impl StepForm for SpecsForm {
    fn check(&self) -> Result<(), CoreError> {
        if self.selections.is_empty() {
            return Err(CoreError::Validation(
                "Select at least one specification".into(),
            ));
        }
        for (spec_id, value) in &self.selections {
            value.require(&format!("Specification {spec_id}"))?;
        }
        Ok(())
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a list",
        serde_json::Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Step 3: SEO
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SeoForm {
    #[validate(custom(function = "meta_title"))]
    pub meta_title: Localized,
    #[validate(custom(function = "meta_description"))]
    pub meta_description: Localized,
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 20,
        message = "Provide between 1 and 20 keywords"
    ))]
    pub keywords: Vec<String>,
}

fn meta_title(value: &Localized) -> Result<(), validator::ValidationError> {
    localized_bounded(value, MAX_META_TITLE_LEN)
}

fn meta_description(value: &Localized) -> Result<(), validator::ValidationError> {
    localized_bounded(value, MAX_META_DESCRIPTION_LEN)
}

/// Body of `POST /cars/{id}/seo-info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoPayload {
    pub meta_title: Localized,
    pub meta_description: Localized,
    pub keywords: Vec<String>,
    #[serde(flatten)]
    pub flags: SubmitFlags,
}

impl SeoForm {
    pub fn from_draft(draft: &DraftCar) -> Self {
        draft
            .seo
            .as_ref()
            .map(|seo| Self {
                meta_title: seo.meta_title.clone(),
                meta_description: seo.meta_description.clone(),
                keywords: seo.keywords.clone(),
            })
            .unwrap_or_default()
    }

    /// Keywords trimmed, blank entries dropped, duplicates removed
    /// (case-insensitive, first occurrence wins).
    pub fn normalized_keywords(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .filter(|k| seen.insert(k.to_lowercase()))
            .map(str::to_string)
            .collect()
    }

    pub fn to_payload(&self, flags: SubmitFlags) -> Result<SeoPayload, CoreError> {
        self.check()?;
        Ok(SeoPayload {
            meta_title: self.meta_title.clone(),
            meta_description: self.meta_description.clone(),
            keywords: self.normalized_keywords(),
            flags,
        })
    }
}

impl StepForm for SeoForm {
    fn check(&self) -> Result<(), CoreError> {
        validate_in_order(self, &["meta_title", "meta_description", "keywords"])?;
        let keywords = self.normalized_keywords();
        if keywords.is_empty() {
            return Err(CoreError::Validation(
                "Provide between 1 and 20 keywords".into(),
            ));
        }
        if keywords.len() > MAX_KEYWORDS {
            return Err(CoreError::Validation(format!(
                "Provide between 1 and {MAX_KEYWORDS} keywords"
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::variant::{Variant, VariantCategory};

    fn sample_draft() -> DraftCar {
        serde_json::from_value(json!({
            "id": 5,
            "name": {"ar": "كامري", "en": "Camry"},
            "progress": {"mainInfo": true, "carSpecs": true, "seoInfo": false},
            "mainInfo": {
                "brandId": 1, "modelId": 2, "price": 30000.0,
                "hasOffer": true, "offer": 28000.0,
                "images": [{"id": 9, "url": "https://cdn/9.jpg"}]
            },
            "specs": [{"specId": 10, "value": {"ar": "٤", "en": "4"}}],
            "draft": true
        }))
        .unwrap()
    }

    // -- main info --

    #[test]
    fn main_info_form_round_trips_through_draft() {
        let form = MainInfoForm::from_draft(&sample_draft());
        assert_eq!(form.brand_id, Some(1));
        assert_eq!(form.offer, Some(28000.0));
        assert!(form.check().is_ok());
    }

    #[test]
    fn main_info_reports_first_field_in_order() {
        let form = MainInfoForm {
            name: Localized::new("x", "x"),
            ..MainInfoForm::default()
        };
        assert_eq!(
            form.check().unwrap_err(),
            CoreError::Validation("Brand is required".into())
        );
    }

    #[test]
    fn offer_must_be_below_price() {
        let mut form = MainInfoForm::from_draft(&sample_draft());
        form.offer = Some(31000.0);
        assert!(form.check().unwrap_err().user_message().contains("lower"));
        form.offer = None;
        assert!(form.check().unwrap_err().user_message().contains("required"));
    }

    #[test]
    fn form_fields_omit_offer_without_has_offer() {
        let mut form = MainInfoForm::from_draft(&sample_draft());
        form.has_offer = false;
        let fields = form.form_fields().unwrap();
        assert!(fields.iter().any(|(k, v)| k == "name[en]" && v == "Camry"));
        assert!(fields.iter().any(|(k, v)| k == "hasOffer" && v == "false"));
        assert!(!fields.iter().any(|(k, _)| k == "offer"));
    }

    // -- specs --

    #[test]
    fn specs_from_raw_accepts_objects() {
        let form = SpecsForm::from_raw(&json!({
            "10": {"ar": "٤", "en": "4"},
            "11": null
        }))
        .unwrap();
        assert_eq!(form.selections.len(), 1);
        assert_eq!(form.values()[0].spec_id, 10);
    }

    #[test]
    fn specs_with_array_value_are_rejected_before_submission() {
        let err = SpecsForm::from_raw(&json!({
            "10": [{"ar": "٤", "en": "4"}, {"ar": "٦", "en": "6"}]
        }))
        .unwrap_err();
        assert!(matches!(err, CoreError::DataShape(_)));

        let err = SpecsForm::from_raw(&json!([{"specId": 10}])).unwrap_err();
        assert!(matches!(err, CoreError::DataShape(_)));
    }

    #[test]
    fn specs_payload_is_json_encoded_array() {
        let form = SpecsForm::from_draft(&sample_draft());
        let payload = form
            .to_payload(SubmitFlags {
                draft: true,
                show_car: false,
            })
            .unwrap();
        let decoded: Vec<SpecValue> = serde_json::from_str(&payload.specs).unwrap();
        assert_eq!(decoded, sample_draft().specs);

        let wire = serde_json::to_value(&payload).unwrap();
        assert_eq!(wire["draft"], true);
        assert_eq!(wire["showCar"], false);
    }

    #[test]
    fn specs_checked_against_tree() {
        let tree = VariantTree::fold(
            vec![VariantCategory {
                id: 1,
                name: Localized::new("محرك", "Engine"),
                description: Localized::default(),
                image: None,
            }],
            vec![Variant {
                id: 10,
                category_id: 1,
                name: Localized::new("اسطوانات", "Cylinders"),
                description: Localized::default(),
                image: None,
                values: vec![Localized::new("٤", "4")],
            }],
        );
        let form = SpecsForm::from_draft(&sample_draft());
        assert!(form.check_against(&tree).is_ok());

        let mut bad = form.clone();
        bad.selections.insert(10, Localized::new("٨", "8"));
        assert!(bad.check_against(&tree).is_err());
        bad.selections.clear();
        bad.selections.insert(99, Localized::new("x", "x"));
        assert!(bad.check_against(&tree).is_err());
    }

    // -- seo --

    #[test]
    fn seo_keywords_are_normalized() {
        let form = SeoForm {
            meta_title: Localized::new("عنوان", "Title"),
            meta_description: Localized::new("وصف", "Description"),
            keywords: vec![" camry ".into(), "".into(), "Camry".into(), "sedan".into()],
        };
        assert_eq!(form.normalized_keywords(), vec!["camry", "sedan"]);
        let payload = form
            .to_payload(SubmitFlags {
                draft: false,
                show_car: true,
            })
            .unwrap();
        assert_eq!(payload.keywords.len(), 2);
    }

    #[test]
    fn seo_title_too_long_is_rejected() {
        let form = SeoForm {
            meta_title: Localized::new("a", "x".repeat(MAX_META_TITLE_LEN + 1)),
            meta_description: Localized::new("b", "b"),
            keywords: vec!["k".into()],
        };
        assert!(form.check().unwrap_err().user_message().contains("at most"));
    }

    #[test]
    fn blank_keywords_only_fail_validation() {
        let form = SeoForm {
            meta_title: Localized::new("a", "a"),
            meta_description: Localized::new("b", "b"),
            keywords: vec!["  ".into()],
        };
        assert!(form.check().is_err());
    }
}
