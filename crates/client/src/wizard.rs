//! Drives the add-car wizard against the backend.
//!
//! The driver owns the [`WizardState`]. Each `submit_*` call checks the
//! transition and validates the step form, sends the partial update under a
//! toast, and only then advances the wizard.

use std::sync::Arc;

use dealerdash_core::car::{MainInfoForm, SeoForm, SpecsForm};
use dealerdash_core::error::CoreError;
use dealerdash_core::reconcile::{reconcile, LocalDraftState, Reconciled};
use dealerdash_core::staging::MediaSubmission;
use dealerdash_core::types::DbId;
use dealerdash_core::wizard::{Route, SubmitIntent, WizardState, WizardStep};

use crate::api::DashboardApi;
use crate::error::ClientResult;
use crate::toaster::{handle_req_with_toaster, Notifier, ToastMessages};

pub struct WizardDriver {
    api: DashboardApi,
    notifier: Arc<dyn Notifier>,
    state: WizardState,
}

impl WizardDriver {
    /// A wizard for a brand-new car.
    pub fn new(api: DashboardApi, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            state: WizardState::new(),
        }
    }

    /// Resume an existing draft, reconciling `local` form state against it.
    pub async fn open(
        api: DashboardApi,
        notifier: Arc<dyn Notifier>,
        draft_id: DbId,
        local: LocalDraftState,
    ) -> ClientResult<(Self, Reconciled)> {
        let draft = api.get_draft(draft_id).await?;
        let reconciled = reconcile(local, &draft)?;
        if let Some(requested) = reconciled.redirected_from {
            tracing::info!(
                draft_id,
                %requested,
                resumed = %reconciled.wizard.step(),
                "Requested step not reachable; resuming draft"
            );
        }
        let driver = Self {
            api,
            notifier,
            state: reconciled.wizard.clone(),
        };
        Ok((driver, reconciled))
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn go_to(&mut self, step: WizardStep) -> ClientResult<Route> {
        Ok(self.state.go_to(step)?)
    }

    pub fn go_back(&mut self) -> Option<Route> {
        self.state.go_back()
    }

    /// Pull fresh completion flags from the server.
    pub async fn refresh(&mut self) -> ClientResult<()> {
        let Some(id) = self.state.draft_id() else {
            return Ok(());
        };
        let draft = self.api.get_draft(id).await?;
        self.state.sync_progress(draft.progress, draft.draft);
        Ok(())
    }

    // ---- submissions ----

    pub async fn submit_main_info(
        &mut self,
        form: &MainInfoForm,
        media: MediaSubmission,
        intent: SubmitIntent,
    ) -> ClientResult<Route> {
        let step = WizardStep::MainInfo;
        let state = &self.state;
        let api = &self.api;
        let id = handle_req_with_toaster(
            self.notifier.as_ref(),
            ToastMessages::new("Saving main info...", "Main info saved"),
            async {
                let flags = state.check_submit(step, intent)?;
                api.save_main_info(state.draft_id(), form, media, flags)
                    .await
            },
        )
        .await?;
        Ok(self.state.after_submit(step, intent, id)?)
    }

    pub async fn submit_specs(&mut self, form: &SpecsForm, intent: SubmitIntent) -> ClientResult<Route> {
        let step = WizardStep::Specs;
        let state = &self.state;
        let api = &self.api;
        let id = handle_req_with_toaster(
            self.notifier.as_ref(),
            ToastMessages::new("Saving specifications...", "Specifications saved"),
            async {
                let flags = state.check_submit(step, intent)?;
                let id = require_draft(state.draft_id())?;
                api.save_specs(id, form, flags).await?;
                Ok(id)
            },
        )
        .await?;
        Ok(self.state.after_submit(step, intent, id)?)
    }

    /// Submit raw specification form state. Arrays where a single value is
    /// expected fail here, with an error toast and no request.
    pub async fn submit_specs_raw(
        &mut self,
        raw: &serde_json::Value,
        intent: SubmitIntent,
    ) -> ClientResult<Route> {
        let step = WizardStep::Specs;
        let state = &self.state;
        let api = &self.api;
        let id = handle_req_with_toaster(
            self.notifier.as_ref(),
            ToastMessages::new("Saving specifications...", "Specifications saved"),
            async {
                let flags = state.check_submit(step, intent)?;
                let id = require_draft(state.draft_id())?;
                api.save_specs_raw(id, raw, flags).await?;
                Ok(id)
            },
        )
        .await?;
        Ok(self.state.after_submit(step, intent, id)?)
    }

    pub async fn submit_seo(&mut self, form: &SeoForm, intent: SubmitIntent) -> ClientResult<Route> {
        let step = WizardStep::Seo;
        let state = &self.state;
        let api = &self.api;
        let success = match intent {
            SubmitIntent::Proceed => "Car published",
            SubmitIntent::SaveDraft => "SEO info saved",
        };
        let id = handle_req_with_toaster(
            self.notifier.as_ref(),
            ToastMessages::new("Saving SEO info...", success),
            async {
                let flags = state.check_submit(step, intent)?;
                let id = require_draft(state.draft_id())?;
                api.save_seo(id, form, flags).await?;
                Ok(id)
            },
        )
        .await?;
        Ok(self.state.after_submit(step, intent, id)?)
    }
}

fn require_draft(draft_id: Option<DbId>) -> Result<DbId, CoreError> {
    draft_id.ok_or_else(|| {
        CoreError::InvalidTransition("Submit Main Info first to create the draft".into())
    })
}
