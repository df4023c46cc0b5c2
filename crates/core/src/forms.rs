//! Form validation helpers shared by every dashboard form.
//!
//! Forms derive [`validator::Validate`]. Because `validator` reports errors
//! in a hash map, each form declares its field order so the dashboard can
//! surface the first failing field deterministically.

use std::borrow::Cow;

use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::CoreError;
use crate::locale::Localized;

/// A dashboard form that can be checked before submission.
pub trait StepForm {
    /// Run every check and return the first failure as a
    /// [`CoreError::Validation`] carrying a user-facing message.
    fn check(&self) -> Result<(), CoreError>;
}

/// Validate `form` and convert the first failing field (in `field_order`)
/// into a [`CoreError::Validation`].
pub fn validate_in_order<T: Validate>(form: &T, field_order: &[&str]) -> Result<(), CoreError> {
    match form.validate() {
        Ok(()) => Ok(()),
        Err(errors) => Err(CoreError::Validation(first_error_message(
            &errors,
            field_order,
        ))),
    }
}

/// Message of the first failing field. Fields not listed in `field_order`
/// are considered after the listed ones, alphabetically.
pub fn first_error_message(errors: &ValidationErrors, field_order: &[&str]) -> String {
    let field_errors = errors.field_errors();

    let ordered = field_order
        .iter()
        .find_map(|field| field_errors.get(*field).map(|errs| (*field, *errs)));

    let (field, errs) = match ordered {
        Some(found) => found,
        None => {
            let mut rest: Vec<(&str, &Vec<ValidationError>)> =
                field_errors.iter().map(|(k, v)| (&**k, *v)).collect();
            rest.sort_by(|a, b| a.0.cmp(b.0));
            match rest.first() {
                Some(first) => *first,
                None => return "Form is invalid".to_string(),
            }
        }
    };

    errs.first()
        .and_then(|e| e.message.as_ref())
        .map(|m| m.to_string())
        .unwrap_or_else(|| format!("{field} is invalid"))
}

fn error_with(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Owned(message));
    err
}

/// Both translations must be present.
pub fn localized_required(value: &Localized) -> Result<(), ValidationError> {
    match value.first_missing() {
        Some(locale) => Err(error_with(
            "localized_required",
            format!("Value ({locale}) is required"),
        )),
        None => Ok(()),
    }
}

/// Both translations present and at most `max` characters.
pub fn localized_bounded(value: &Localized, max: usize) -> Result<(), ValidationError> {
    localized_required(value)?;
    for (locale, text) in [("ar", &value.ar), ("en", &value.en)] {
        if text.chars().count() > max {
            return Err(error_with(
                "localized_length",
                format!("Value ({locale}) must be at most {max} characters"),
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
