//! Cars, drafts and the three wizard step endpoints.

use reqwest::multipart::{Form, Part};
use reqwest::Method;

use dealerdash_core::car::{
    CarIdResponse, CarSummary, DraftCar, MainInfoForm, SeoForm, SpecsForm,
};
use dealerdash_core::error::CoreError;
use dealerdash_core::pagination::{ListQuery, Paginated};
use dealerdash_core::permissions::{Action, Module};
use dealerdash_core::staging::{MediaSubmission, StagedFile, VideoChange};
use dealerdash_core::types::DbId;
use dealerdash_core::wizard::SubmitFlags;

use crate::api::DashboardApi;
use crate::error::ClientResult;
use crate::response::DataResponse;

/// Cache tag shared by every car query.
pub const CARS_TAG: &str = "/cars";

impl DashboardApi {
    /// `GET /cars?page&search`, or the drafts list when `drafts` is set.
    pub async fn list_cars(
        &self,
        query: &ListQuery,
        drafts: bool,
    ) -> ClientResult<Paginated<CarSummary>> {
        self.authorize(Module::Cars, Action::Read).await?;
        let mut pairs = query.to_pairs();
        if drafts {
            pairs.push(("draft", "true".to_string()));
        }
        self.get_cached("/cars", &pairs, CARS_TAG).await
    }

    /// `GET /cars/{id}`.
    pub async fn get_draft(&self, id: DbId) -> ClientResult<DraftCar> {
        self.authorize(Module::Cars, Action::Read).await?;
        let response: DataResponse<DraftCar> =
            self.get_cached(&format!("/cars/{id}"), &[], CARS_TAG).await?;
        Ok(response.data)
    }

    pub async fn delete_car(&self, id: DbId) -> ClientResult<()> {
        self.authorize(Module::Cars, Action::Delete).await?;
        let builder = self.request(Method::DELETE, &format!("/cars/{id}")).await;
        self.fetch_empty(builder).await?;
        self.cache().invalidate(CARS_TAG).await;
        tracing::info!(car_id = id, "Car deleted");
        Ok(())
    }

    // ---- wizard steps ----

    /// Create (`draft_id = None`) or update the main info of a draft.
    ///
    /// The form is validated before anything is sent. Returns the draft id
    /// assigned or confirmed by the server.
    pub async fn save_main_info(
        &self,
        draft_id: Option<DbId>,
        form: &MainInfoForm,
        media: MediaSubmission,
        flags: SubmitFlags,
    ) -> ClientResult<DbId> {
        let action = if draft_id.is_some() {
            Action::Update
        } else {
            Action::Create
        };
        self.authorize(Module::Cars, action).await?;
        let fields = form.form_fields()?;
        let new_images = media.new_images.len();
        let deleted_images = media.deleted_ids.len();
        let multipart = main_info_multipart(fields, media, flags)?;

        let builder = match draft_id {
            Some(id) => self.request(Method::PUT, &format!("/cars/{id}/main-info")).await,
            None => self.request(Method::POST, "/cars/main-info").await,
        };
        let CarIdResponse { car_id } = self.fetch_data(builder.multipart(multipart)).await?;

        if let Some(existing) = draft_id {
            if existing != car_id {
                tracing::warn!(existing, car_id, "Server returned a different draft id");
            }
        }
        self.cache().invalidate(CARS_TAG).await;
        tracing::info!(car_id, new_images, deleted_images, "Main info saved");
        Ok(car_id)
    }

    /// `POST /cars/{id}/car-specs`.
    pub async fn save_specs(
        &self,
        draft_id: DbId,
        form: &SpecsForm,
        flags: SubmitFlags,
    ) -> ClientResult<()> {
        self.authorize(Module::Cars, Action::Update).await?;
        let payload = form.to_payload(flags)?;
        let builder = self
            .request(Method::POST, &format!("/cars/{draft_id}/car-specs"))
            .await
            .json(&payload);
        self.fetch_empty(builder).await?;
        self.cache().invalidate(CARS_TAG).await;
        tracing::info!(car_id = draft_id, specs = form.selections.len(), "Specifications saved");
        Ok(())
    }

    /// Same as [`save_specs`](Self::save_specs) for raw form state shaped as
    /// `{ "<specId>": { "ar", "en" } }`. Malformed state is rejected before
    /// any request.
    pub async fn save_specs_raw(
        &self,
        draft_id: DbId,
        raw: &serde_json::Value,
        flags: SubmitFlags,
    ) -> ClientResult<SpecsForm> {
        let form = SpecsForm::from_raw(raw)?;
        self.save_specs(draft_id, &form, flags).await?;
        Ok(form)
    }

    /// `POST /cars/{id}/seo-info`.
    pub async fn save_seo(
        &self,
        draft_id: DbId,
        form: &SeoForm,
        flags: SubmitFlags,
    ) -> ClientResult<()> {
        self.authorize(Module::Cars, Action::Update).await?;
        let payload = form.to_payload(flags)?;
        let builder = self
            .request(Method::POST, &format!("/cars/{draft_id}/seo-info"))
            .await
            .json(&payload);
        self.fetch_empty(builder).await?;
        self.cache().invalidate(CARS_TAG).await;
        tracing::info!(
            car_id = draft_id,
            published = flags.show_car,
            "SEO info saved"
        );
        Ok(())
    }
}

fn file_part(file: StagedFile) -> ClientResult<Part> {
    Ok(Part::bytes(file.bytes)
        .file_name(file.file_name)
        .mime_str(&file.mime_type)?)
}

/// Multipart body of the main-info endpoints.
fn main_info_multipart(
    fields: Vec<(String, String)>,
    media: MediaSubmission,
    flags: SubmitFlags,
) -> ClientResult<Form> {
    let mut form = Form::new();
    for (name, value) in fields {
        form = form.text(name, value);
    }
    form = form
        .text("draft", flags.draft.to_string())
        .text("showCar", flags.show_car.to_string());

    for image in media.new_images {
        form = form.part("images", file_part(image)?);
    }

    let deleted = serde_json::to_string(&media.deleted_ids)
        .map_err(|e| CoreError::Internal(format!("Failed to encode deleted images: {e}")))?;
    form = form.text("deletedImages", deleted);

    let delete_video = match media.video {
        VideoChange::Keep => false,
        VideoChange::Remove => true,
        VideoChange::Replace(file) => {
            form = form.part("video", file_part(file)?);
            false
        }
    };
    Ok(form.text("deleteVideo", delete_video.to_string()))
}
