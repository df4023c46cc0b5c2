//! Specification categories, variants and their localized values.
//!
//! The backend stores variant values as two parallel arrays
//! (`values.ar[i]` / `values.en[i]`). On the Rust side they are always
//! [`Localized`] pairs; [`parallel_values`] converts at the serde boundary
//! and rejects arrays of different lengths.
//!
//! Categories and variants are fetched as two flat lists and folded into a
//! [`VariantTree`] by category id.

use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::forms::{localized_bounded, localized_required, validate_in_order, StepForm};
use crate::locale::{Locale, Localized};
use crate::types::DbId;

/// Shown for a category that owns no variants.
pub const EMPTY_CATEGORY_MESSAGE: &str = "No variants in this category yet";

/// Maximum length of a category or variant name, per locale.
pub const MAX_NAME_LEN: usize = 80;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantCategory {
    pub id: DbId,
    pub name: Localized,
    #[serde(default)]
    pub description: Localized,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: DbId,
    pub category_id: DbId,
    pub name: Localized,
    #[serde(default)]
    pub description: Localized,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, with = "parallel_values")]
    pub values: Vec<Localized>,
}

/// Pair two parallel translation arrays.
pub fn pair_values(ar: Vec<String>, en: Vec<String>) -> Result<Vec<Localized>, CoreError> {
    if ar.len() != en.len() {
        return Err(CoreError::DataShape(format!(
            "Variant values are misaligned: {} Arabic vs {} English entries",
            ar.len(),
            en.len()
        )));
    }
    Ok(ar
        .into_iter()
        .zip(en)
        .map(|(ar, en)| Localized { ar, en })
        .collect())
}

/// Serde adapter between `Vec<Localized>` and `{ "ar": [...], "en": [...] }`.
pub mod parallel_values {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::locale::Localized;

    #[derive(Serialize, Deserialize, Default)]
    struct Parallel {
        #[serde(default)]
        ar: Vec<String>,
        #[serde(default)]
        en: Vec<String>,
    }

    pub fn serialize<S: Serializer>(values: &[Localized], serializer: S) -> Result<S::Ok, S::Error> {
        let parallel = Parallel {
            ar: values.iter().map(|v| v.ar.clone()).collect(),
            en: values.iter().map(|v| v.en.clone()).collect(),
        };
        parallel.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Localized>, D::Error> {
        let parallel = Parallel::deserialize(deserializer)?;
        super::pair_values(parallel.ar, parallel.en).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Value editing
// ---------------------------------------------------------------------------

impl Variant {
    pub fn has_value(&self, value: &Localized) -> bool {
        self.values.iter().any(|v| v == value)
    }

    /// Append a value pair. Both translations are required and the English
    /// text must be unique within the variant.
    pub fn add_value(&mut self, value: Localized) -> Result<(), CoreError> {
        value.require("Value")?;
        self.ensure_unique(&value, None)?;
        self.values.push(value);
        Ok(())
    }

    /// Replace the value at `index`, under the same rules as
    /// [`add_value`](Self::add_value).
    pub fn update_value(&mut self, index: usize, value: Localized) -> Result<(), CoreError> {
        value.require("Value")?;
        let len = self.values.len();
        if index >= len {
            return Err(out_of_range(index, len));
        }
        self.ensure_unique(&value, Some(index))?;
        self.values[index] = value;
        Ok(())
    }

    pub fn remove_value(&mut self, index: usize) -> Result<Localized, CoreError> {
        if index >= self.values.len() {
            return Err(out_of_range(index, self.values.len()));
        }
        Ok(self.values.remove(index))
    }

    /// Move the value at `from` so it ends up at `to`.
    pub fn move_value(&mut self, from: usize, to: usize) -> Result<(), CoreError> {
        let len = self.values.len();
        if from >= len {
            return Err(out_of_range(from, len));
        }
        if to >= len {
            return Err(out_of_range(to, len));
        }
        let value = self.values.remove(from);
        self.values.insert(to, value);
        Ok(())
    }

    fn ensure_unique(&self, value: &Localized, skip: Option<usize>) -> Result<(), CoreError> {
        let taken = self
            .values
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != skip)
            .any(|(_, v)| v.en.eq_ignore_ascii_case(&value.en));
        if taken {
            return Err(CoreError::Conflict(format!(
                "Value '{}' already exists on this variant",
                value.en
            )));
        }
        Ok(())
    }
}

fn out_of_range(index: usize, len: usize) -> CoreError {
    CoreError::Validation(format!(
        "Value index {index} is out of range (variant has {len} values)"
    ))
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryNode {
    pub category: VariantCategory,
    pub variants: Vec<Variant>,
}

impl CategoryNode {
    /// Empty-state message when the category has no variants.
    pub fn empty_state(&self) -> Option<&'static str> {
        self.variants.is_empty().then_some(EMPTY_CATEGORY_MESSAGE)
    }
}

/// Categories with their variants, in category order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantTree {
    pub categories: Vec<CategoryNode>,
    /// Variants referencing a category that was not returned.
    pub orphans: Vec<Variant>,
}

impl VariantTree {
    /// Fold a flat variant list into its categories.
    pub fn fold(categories: Vec<VariantCategory>, variants: Vec<Variant>) -> Self {
        let mut by_category: BTreeMap<DbId, Vec<Variant>> = BTreeMap::new();
        for variant in variants {
            by_category.entry(variant.category_id).or_default().push(variant);
        }

        let categories: Vec<CategoryNode> = categories
            .into_iter()
            .map(|category| CategoryNode {
                variants: by_category.remove(&category.id).unwrap_or_default(),
                category,
            })
            .collect();

        let orphans = by_category.into_values().flatten().collect();

        Self {
            categories,
            orphans,
        }
    }

    pub fn category(&self, id: DbId) -> Option<&CategoryNode> {
        self.categories.iter().find(|node| node.category.id == id)
    }

    pub fn variant(&self, id: DbId) -> Option<&Variant> {
        self.categories
            .iter()
            .flat_map(|node| node.variants.iter())
            .find(|v| v.id == id)
    }

    pub fn variant_count(&self) -> usize {
        self.categories.iter().map(|n| n.variants.len()).sum()
    }

    /// Indented text view of the tree in `locale`.
    pub fn render(&self, locale: Locale) -> String {
        let mut out = String::new();
        if self.categories.is_empty() {
            out.push_str("No specification categories yet\n");
        }
        for node in &self.categories {
            let _ = writeln!(
                out,
                "{} [#{}] ({})",
                node.category.name.get(locale),
                node.category.id,
                node.variants.len()
            );
            if let Some(message) = node.empty_state() {
                let _ = writeln!(out, "    {message}");
                continue;
            }
            for variant in &node.variants {
                let values: Vec<&str> = variant.values.iter().map(|v| v.get(locale)).collect();
                let _ = writeln!(
                    out,
                    "  - {} [#{}]: {}",
                    variant.name.get(locale),
                    variant.id,
                    if values.is_empty() {
                        "-".to_string()
                    } else {
                        values.join(", ")
                    }
                );
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Forms
// ---------------------------------------------------------------------------

/// Create/update payload for a specification category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CategoryForm {
    #[validate(custom(function = "category_name"))]
    pub name: Localized,
    #[serde(default)]
    pub description: Localized,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

fn category_name(value: &Localized) -> Result<(), validator::ValidationError> {
    localized_bounded(value, MAX_NAME_LEN)
}

impl CategoryForm {
    pub fn from_category(category: &VariantCategory) -> Self {
        Self {
            name: category.name.clone(),
            description: category.description.clone(),
            image: category.image.clone(),
        }
    }
}

impl StepForm for CategoryForm {
    fn check(&self) -> Result<(), CoreError> {
        validate_in_order(self, &["name"])
    }
}

/// Create/update payload for a variant with its values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VariantForm {
    #[validate(range(min = 1, message = "Category is required"))]
    pub category_id: DbId,
    #[validate(custom(function = "variant_name"))]
    pub name: Localized,
    #[serde(default)]
    pub description: Localized,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[validate(length(min = 1, message = "At least one value is required"))]
    #[serde(default, with = "parallel_values")]
    pub values: Vec<Localized>,
}

fn variant_name(value: &Localized) -> Result<(), validator::ValidationError> {
    localized_bounded(value, MAX_NAME_LEN)
}

impl VariantForm {
    pub fn from_variant(variant: &Variant) -> Self {
        Self {
            category_id: variant.category_id,
            name: variant.name.clone(),
            description: variant.description.clone(),
            image: variant.image.clone(),
            values: variant.values.clone(),
        }
    }
}

impl StepForm for VariantForm {
    fn check(&self) -> Result<(), CoreError> {
        validate_in_order(self, &["category_id", "name", "values"])?;
        let mut seen = HashSet::new();
        for (i, value) in self.values.iter().enumerate() {
            if localized_required(value).is_err() {
                return Err(CoreError::Validation(format!(
                    "Value #{} needs both Arabic and English text",
                    i + 1
                )));
            }
            if !seen.insert(value.en.to_lowercase()) {
                return Err(CoreError::Validation(format!(
                    "Value '{}' is listed more than once",
                    value.en
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
