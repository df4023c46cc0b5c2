//! Reconciling locally held wizard forms with the server draft on reload.
//!
//! Rules:
//! - completion flags always come from the server;
//! - a form the operator edited but did not submit (dirty) is kept;
//! - any other form is rebuilt from the server draft;
//! - the requested step is honored only if the wizard may enter it,
//!   otherwise the draft's resume step is used.

use serde::{Deserialize, Serialize};

use crate::car::{DraftCar, MainInfoForm, SeoForm, SpecsForm};
use crate::error::CoreError;
use crate::types::DbId;
use crate::wizard::{WizardState, WizardStep};

/// A form value plus whether it holds unsaved edits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormSlot<T> {
    pub value: T,
    pub dirty: bool,
}

impl<T> FormSlot<T> {
    /// Value loaded from the server.
    pub fn clean(value: T) -> Self {
        Self {
            value,
            dirty: false,
        }
    }

    /// Value edited locally and not yet submitted.
    pub fn edited(value: T) -> Self {
        Self { value, dirty: true }
    }

    pub fn mark_submitted(&mut self) {
        self.dirty = false;
    }
}

/// Wizard state held on the client between sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalDraftState {
    pub draft_id: Option<DbId>,
    pub requested_step: Option<WizardStep>,
    pub main_info: Option<FormSlot<MainInfoForm>>,
    pub specs: Option<FormSlot<SpecsForm>>,
    pub seo: Option<FormSlot<SeoForm>>,
}

/// Outcome of [`reconcile`].
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub wizard: WizardState,
    pub main_info: FormSlot<MainInfoForm>,
    pub specs: FormSlot<SpecsForm>,
    pub seo: FormSlot<SeoForm>,
    /// Step that was requested but could not be entered.
    pub redirected_from: Option<WizardStep>,
    /// Steps whose unsaved local edits were kept over server values.
    pub kept_local: Vec<WizardStep>,
}

impl Reconciled {
    pub fn has_unsaved_edits(&self) -> bool {
        !self.kept_local.is_empty()
    }

    /// Local state to persist after reconciliation.
    pub fn to_local(&self) -> LocalDraftState {
        LocalDraftState {
            draft_id: self.wizard.draft_id(),
            requested_step: Some(self.wizard.step()),
            main_info: Some(self.main_info.clone()),
            specs: Some(self.specs.clone()),
            seo: Some(self.seo.clone()),
        }
    }
}

fn pick<T>(
    local: Option<FormSlot<T>>,
    step: WizardStep,
    kept: &mut Vec<WizardStep>,
    from_server: impl FnOnce() -> T,
) -> FormSlot<T> {
    match local {
        Some(slot) if slot.dirty => {
            kept.push(step);
            slot
        }
        _ => FormSlot::clean(from_server()),
    }
}

/// Merge `local` with the authoritative `server` draft.
pub fn reconcile(local: LocalDraftState, server: &DraftCar) -> Result<Reconciled, CoreError> {
    if let Some(local_id) = local.draft_id {
        if local_id != server.id {
            return Err(CoreError::Conflict(format!(
                "Local wizard state belongs to draft {local_id}, not {}",
                server.id
            )));
        }
    }

    let mut kept_local = Vec::new();
    let main_info = pick(local.main_info, WizardStep::MainInfo, &mut kept_local, || {
        MainInfoForm::from_draft(server)
    });
    let specs = pick(local.specs, WizardStep::Specs, &mut kept_local, || {
        SpecsForm::from_draft(server)
    });
    let seo = pick(local.seo, WizardStep::Seo, &mut kept_local, || {
        SeoForm::from_draft(server)
    });

    let mut wizard = WizardState::for_draft(server.id, server.progress, server.draft);
    let mut redirected_from = None;
    if let Some(requested) = local.requested_step {
        if wizard.go_to(requested).is_err() {
            redirected_from = Some(requested);
        }
    }

    Ok(Reconciled {
        wizard,
        main_info,
        specs,
        seo,
        redirected_from,
        kept_local,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
