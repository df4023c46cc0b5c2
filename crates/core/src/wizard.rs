//! Add-car wizard steps, transitions and submit intents.
//!
//! The wizard has three editable steps (main info, specifications, SEO)
//! followed by the terminal `Published` state. Completion of each step is
//! owned by the server (the [`DraftProgress`] flags on the draft car); this
//! module only decides which moves are legal given those flags.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Draft progress
// ---------------------------------------------------------------------------

/// Per-draft completion flags, as reported by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftProgress {
    #[serde(default)]
    pub main_info: bool,
    #[serde(default)]
    pub car_specs: bool,
    #[serde(default)]
    pub seo_info: bool,
}

impl DraftProgress {
    /// Whether the phase backing `step` is complete. `Published` counts as
    /// complete only when all three phases are.
    pub fn is_complete(&self, step: WizardStep) -> bool {
        match step {
            WizardStep::MainInfo => self.main_info,
            WizardStep::Specs => self.car_specs,
            WizardStep::Seo => self.seo_info,
            WizardStep::Published => self.all_complete(),
        }
    }

    pub fn all_complete(&self) -> bool {
        self.main_info && self.car_specs && self.seo_info
    }

    /// Mark the phase for `step` complete. Idempotent.
    pub fn mark_complete(&mut self, step: WizardStep) {
        match step {
            WizardStep::MainInfo => self.main_info = true,
            WizardStep::Specs => self.car_specs = true,
            WizardStep::Seo => self.seo_info = true,
            WizardStep::Published => {}
        }
    }

    /// Number of completed phases (0..=3).
    pub fn completed_count(&self) -> u8 {
        u8::from(self.main_info) + u8::from(self.car_specs) + u8::from(self.seo_info)
    }
}

// ---------------------------------------------------------------------------
// Wizard steps
// ---------------------------------------------------------------------------

/// The wizard states, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    MainInfo,
    Specs,
    Seo,
    Published,
}

/// Number of editable steps.
pub const EDITABLE_STEPS: u8 = 3;

impl WizardStep {
    /// Editable steps in order.
    pub const EDITABLE: [WizardStep; 3] = [Self::MainInfo, Self::Specs, Self::Seo];

    /// Convert a 1-based step number to a step.
    pub fn from_number(n: u8) -> Result<Self, CoreError> {
        match n {
            1 => Ok(Self::MainInfo),
            2 => Ok(Self::Specs),
            3 => Ok(Self::Seo),
            4 => Ok(Self::Published),
            _ => Err(CoreError::Validation(format!(
                "Invalid step number {n}. Must be between 1 and 4"
            ))),
        }
    }

    /// 1-based step number.
    pub fn number(self) -> u8 {
        match self {
            Self::MainInfo => 1,
            Self::Specs => 2,
            Self::Seo => 3,
            Self::Published => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::MainInfo => "Main Info",
            Self::Specs => "Specifications",
            Self::Seo => "SEO",
            Self::Published => "Published",
        }
    }

    /// Route segment for an editable step.
    pub fn segment(self) -> Option<&'static str> {
        match self {
            Self::MainInfo => Some("main-info"),
            Self::Specs => Some("specs"),
            Self::Seo => Some("seo"),
            Self::Published => None,
        }
    }

    pub fn from_segment(segment: &str) -> Result<Self, CoreError> {
        match segment {
            "main-info" => Ok(Self::MainInfo),
            "specs" => Ok(Self::Specs),
            "seo" => Ok(Self::Seo),
            other => Err(CoreError::Validation(format!(
                "Unknown wizard step '{other}'. Must be one of: main-info, specs, seo"
            ))),
        }
    }

    pub fn next(self) -> Option<Self> {
        match self {
            Self::MainInfo => Some(Self::Specs),
            Self::Specs => Some(Self::Seo),
            Self::Seo => Some(Self::Published),
            Self::Published => None,
        }
    }

    pub fn previous(self) -> Option<Self> {
        match self {
            Self::MainInfo => None,
            Self::Specs => Some(Self::MainInfo),
            Self::Seo => Some(Self::Specs),
            Self::Published => Some(Self::Seo),
        }
    }

    /// Whether the step offers a "save as draft" action besides proceeding.
    pub fn offers_save_draft(self) -> bool {
        matches!(self, Self::Specs | Self::Seo)
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The step to resume a draft at: the first incomplete phase, `Seo` when
/// every phase is complete but the car is still a draft, else `Published`.
pub fn resume_step(progress: &DraftProgress, is_draft: bool) -> WizardStep {
    WizardStep::EDITABLE
        .into_iter()
        .find(|step| !progress.is_complete(*step))
        .unwrap_or(if is_draft {
            WizardStep::Seo
        } else {
            WizardStep::Published
        })
}

// ---------------------------------------------------------------------------
// Submit intents and routes
// ---------------------------------------------------------------------------

/// What the user asked for when submitting a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitIntent {
    /// Persist the step and return to the drafts list.
    SaveDraft,
    /// Persist the step and continue (publishes on the last step).
    Proceed,
}

/// Visibility flags sent with a step submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFlags {
    pub draft: bool,
    pub show_car: bool,
}

impl SubmitIntent {
    /// Flags for submitting `step` of a car whose current draft flag is
    /// `is_draft`. Proceeding from the SEO step publishes a draft; proceeding
    /// on an already published car keeps it published. Saving as a draft
    /// always hides the car.
    pub fn flags(self, step: WizardStep, is_draft: bool) -> SubmitFlags {
        let publish = match self {
            Self::SaveDraft => false,
            Self::Proceed => step == WizardStep::Seo || !is_draft,
        };
        SubmitFlags {
            draft: !publish,
            show_car: publish,
        }
    }
}

/// Where the dashboard goes after a successful submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Route {
    Step { step: WizardStep, draft_id: Option<DbId> },
    DraftsList,
    CarsList,
}

impl Route {
    /// Dashboard path for the route.
    pub fn path(&self) -> String {
        match self {
            Self::Step { step, draft_id } => {
                let segment = step.segment().unwrap_or("seo");
                match draft_id {
                    Some(id) => format!("/cars/add/{segment}/{id}"),
                    None => format!("/cars/add/{segment}"),
                }
            }
            Self::DraftsList => "/cars/drafts".to_string(),
            Self::CarsList => "/cars".to_string(),
        }
    }

    /// Parse a dashboard path produced by [`Route::path`].
    pub fn parse(path: &str) -> Result<Self, CoreError> {
        let parts: Vec<&str> = path.trim_matches('/').split('/').collect();
        match parts.as_slice() {
            ["cars"] => Ok(Self::CarsList),
            ["cars", "drafts"] => Ok(Self::DraftsList),
            ["cars", "add", segment] => Ok(Self::Step {
                step: WizardStep::from_segment(segment)?,
                draft_id: None,
            }),
            ["cars", "add", segment, id] => {
                let draft_id = id.parse::<DbId>().map_err(|_| {
                    CoreError::Validation(format!("Invalid draft id '{id}' in path"))
                })?;
                Ok(Self::Step {
                    step: WizardStep::from_segment(segment)?,
                    draft_id: Some(draft_id),
                })
            }
            _ => Err(CoreError::Validation(format!("Unknown dashboard path '{path}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Wizard state
// ---------------------------------------------------------------------------

/// Explicit wizard state: the current step plus what the server told us
/// about the draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardState {
    draft_id: Option<DbId>,
    step: WizardStep,
    progress: DraftProgress,
    is_draft: bool,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardState {
    /// A fresh wizard with no draft yet.
    pub fn new() -> Self {
        Self {
            draft_id: None,
            step: WizardStep::MainInfo,
            progress: DraftProgress::default(),
            is_draft: true,
        }
    }

    /// Wizard positioned at the resume step of an existing draft.
    pub fn for_draft(draft_id: DbId, progress: DraftProgress, is_draft: bool) -> Self {
        Self {
            draft_id: Some(draft_id),
            step: resume_step(&progress, is_draft),
            progress,
            is_draft,
        }
    }

    pub fn draft_id(&self) -> Option<DbId> {
        self.draft_id
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn progress(&self) -> DraftProgress {
        self.progress
    }

    pub fn is_draft(&self) -> bool {
        self.is_draft
    }

    /// Replace the local progress mirror with fresh server flags.
    pub fn sync_progress(&mut self, progress: DraftProgress, is_draft: bool) {
        self.progress = progress;
        self.is_draft = is_draft;
    }

    /// Check whether `target` may be entered from the current state.
    ///
    /// Moving forward is limited to steps whose predecessors are all
    /// complete, i.e. the resume step or a step already passed.
    pub fn can_enter(&self, target: WizardStep) -> Result<(), CoreError> {
        if target <= self.step {
            return Ok(());
        }
        match target {
            WizardStep::MainInfo => Ok(()),
            WizardStep::Specs | WizardStep::Seo => {
                if self.draft_id.is_none() {
                    return Err(CoreError::InvalidTransition(format!(
                        "{target} requires a saved draft; submit Main Info first"
                    )));
                }
                let missing = WizardStep::EDITABLE
                    .into_iter()
                    .take_while(|step| *step < target)
                    .find(|step| !self.progress.is_complete(*step));
                match missing {
                    Some(step) => Err(CoreError::InvalidTransition(format!(
                        "{target} requires {step} to be complete"
                    ))),
                    None => Ok(()),
                }
            }
            WizardStep::Published => {
                if self.draft_id.is_some() && self.progress.all_complete() {
                    Ok(())
                } else {
                    Err(CoreError::InvalidTransition(
                        "Cannot publish until Main Info, Specifications and SEO are complete"
                            .to_string(),
                    ))
                }
            }
        }
    }

    /// Check that `submitted` may be sent with `intent` and return the flags
    /// to send. Runs before any request goes out.
    pub fn check_submit(
        &self,
        submitted: WizardStep,
        intent: SubmitIntent,
    ) -> Result<SubmitFlags, CoreError> {
        if submitted == WizardStep::Published {
            return Err(CoreError::InvalidTransition(
                "A published car has no step to submit".to_string(),
            ));
        }
        if submitted != self.step {
            return Err(CoreError::InvalidTransition(format!(
                "The wizard is on {}, not {submitted}",
                self.step
            )));
        }
        if intent == SubmitIntent::SaveDraft && !submitted.offers_save_draft() {
            return Err(CoreError::InvalidTransition(format!(
                "{submitted} cannot be saved as a draft"
            )));
        }

        let flags = intent.flags(submitted, self.is_draft);
        if flags.show_car {
            let mut after = self.progress;
            after.mark_complete(submitted);
            if !(after.main_info && after.car_specs) {
                return Err(CoreError::InvalidTransition(
                    "Cannot publish until Main Info and Specifications are complete".to_string(),
                ));
            }
        }
        Ok(flags)
    }

    /// Navigate to `target`. Backward moves always succeed; forward moves
    /// are guarded by [`can_enter`](Self::can_enter).
    pub fn go_to(&mut self, target: WizardStep) -> Result<Route, CoreError> {
        self.can_enter(target)?;
        self.step = target;
        Ok(self.current_route())
    }

    /// Step back one step. Returns `None` on the first step.
    pub fn go_back(&mut self) -> Option<Route> {
        let previous = self.step.previous()?;
        self.step = previous;
        Some(self.current_route())
    }

    pub fn current_route(&self) -> Route {
        match self.step {
            WizardStep::Published => Route::CarsList,
            step => Route::Step {
                step,
                draft_id: self.draft_id,
            },
        }
    }

    /// Record a successful submission of the current step and return the
    /// route to navigate to.
    ///
    /// `draft_id` is the id returned by the server; it is required after the
    /// first main-info submission and must match an existing draft id.
    pub fn after_submit(
        &mut self,
        submitted: WizardStep,
        intent: SubmitIntent,
        draft_id: DbId,
    ) -> Result<Route, CoreError> {
        let flags = self.check_submit(submitted, intent)?;
        if let Some(existing) = self.draft_id {
            if existing != draft_id {
                return Err(CoreError::Conflict(format!(
                    "Server returned draft {draft_id} for wizard on draft {existing}"
                )));
            }
        }

        self.draft_id = Some(draft_id);
        self.progress.mark_complete(submitted);
        self.is_draft = flags.draft;

        if intent == SubmitIntent::Proceed {
            match submitted.next() {
                Some(next) if self.can_enter(next).is_ok() => self.step = next,
                _ => {}
            }
        }

        let route = match intent {
            SubmitIntent::SaveDraft => Route::DraftsList,
            SubmitIntent::Proceed => self.current_route(),
        };
        Ok(route)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
