//! Generic CRUD over the dashboard's reference and content resources.
//!
//! Each resource names its collection path, permission module and wire
//! types. Reads are cached under the collection path; every mutation
//! invalidates it (and any dependent tags), so the next read refetches.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use dealerdash_core::error::CoreError;
use dealerdash_core::forms::StepForm;
use dealerdash_core::locale::Locale;
use dealerdash_core::pagination::{ListQuery, Paginated};
use dealerdash_core::permissions::{Action, Module};
use dealerdash_core::reference::{
    model_options, Brand, CarModel, Location, LocationForm, LocationKind, ModelForm, ModelType,
    NamedForm, News, NewsForm, Notification, NotificationForm, SelectOption,
};
use dealerdash_core::types::DbId;
use dealerdash_core::variant::{CategoryForm, Variant, VariantCategory, VariantForm, VariantTree};

use crate::api::DashboardApi;
use crate::error::ClientResult;
use crate::response::DataResponse;

/// A CRUD collection on the backend.
pub trait Resource {
    /// Permission area guarding the collection.
    const MODULE: Module;
    /// Human-readable name for logs and errors.
    const ENTITY: &'static str;

    type Item: DeserializeOwned;
    type Form: Serialize + StepForm;

    /// Collection path, e.g. `/brand`.
    fn path(&self) -> String;

    /// Validate a create/update payload.
    fn check(&self, form: &Self::Form) -> Result<(), CoreError> {
        form.check()
    }

    /// Whether existing records can be edited.
    fn updatable(&self) -> bool {
        true
    }

    /// Cache tags to drop after a mutation.
    fn invalidates(&self) -> Vec<String> {
        vec![self.path()]
    }
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

pub struct Brands;
pub struct Models;
pub struct ModelTypes;
pub struct Locations(pub LocationKind);
pub struct NewsFeed;
pub struct Notifications;
pub struct SpecCategories;
pub struct Specs;

impl Resource for Brands {
    const MODULE: Module = Module::Brands;
    const ENTITY: &'static str = "Brand";
    type Item = Brand;
    type Form = NamedForm;

    fn path(&self) -> String {
        "/brand".into()
    }

    fn invalidates(&self) -> Vec<String> {
        // Model rows embed brand names.
        vec![self.path(), Models.path()]
    }
}

impl Resource for Models {
    const MODULE: Module = Module::Models;
    const ENTITY: &'static str = "Model";
    type Item = CarModel;
    type Form = ModelForm;

    fn path(&self) -> String {
        "/models".into()
    }
}

impl Resource for ModelTypes {
    const MODULE: Module = Module::ModelTypes;
    const ENTITY: &'static str = "Model type";
    type Item = ModelType;
    type Form = NamedForm;

    fn path(&self) -> String {
        "/model-types".into()
    }
}

impl Resource for Locations {
    const MODULE: Module = Module::Locations;
    const ENTITY: &'static str = "Location";
    type Item = Location;
    type Form = LocationForm;

    fn path(&self) -> String {
        format!("/location/{}", self.0.segment())
    }

    fn check(&self, form: &LocationForm) -> Result<(), CoreError> {
        form.check_for(self.0)
    }
}

impl Resource for NewsFeed {
    const MODULE: Module = Module::News;
    const ENTITY: &'static str = "News";
    type Item = News;
    type Form = NewsForm;

    fn path(&self) -> String {
        "/news".into()
    }
}

impl Resource for Notifications {
    const MODULE: Module = Module::Notifications;
    const ENTITY: &'static str = "Notification";
    type Item = Notification;
    type Form = NotificationForm;

    fn path(&self) -> String {
        "/notifications".into()
    }

    /// Notifications are sent, never edited.
    fn updatable(&self) -> bool {
        false
    }
}

impl Resource for SpecCategories {
    const MODULE: Module = Module::Specs;
    const ENTITY: &'static str = "Specification category";
    type Item = VariantCategory;
    type Form = CategoryForm;

    fn path(&self) -> String {
        "/spec-categories".into()
    }

    fn invalidates(&self) -> Vec<String> {
        // Deleting a category removes its variants server-side.
        vec![self.path(), Specs.path()]
    }
}

impl Resource for Specs {
    const MODULE: Module = Module::Specs;
    const ENTITY: &'static str = "Specification";
    type Item = Variant;
    type Form = VariantForm;

    fn path(&self) -> String {
        "/specs".into()
    }
}

// ---------------------------------------------------------------------------
// Generic operations
// ---------------------------------------------------------------------------

impl DashboardApi {
    /// One page of `resource`.
    pub async fn list<R: Resource>(
        &self,
        resource: &R,
        query: &ListQuery,
    ) -> ClientResult<Paginated<R::Item>> {
        self.authorize(R::MODULE, Action::Read).await?;
        let path = resource.path();
        self.get_cached(&path, &query.to_pairs(), &path).await
    }

    /// Every row of `resource`, for dropdowns and trees.
    pub async fn list_all<R: Resource>(&self, resource: &R) -> ClientResult<Vec<R::Item>> {
        self.authorize(R::MODULE, Action::Read).await?;
        let path = resource.path();
        let page: Paginated<R::Item> = self.get_cached(&path, &[], &path).await?;
        Ok(page.data)
    }

    pub async fn get<R: Resource>(&self, resource: &R, id: DbId) -> ClientResult<R::Item> {
        self.authorize(R::MODULE, Action::Read).await?;
        let path = resource.path();
        let response: DataResponse<R::Item> = self
            .get_cached(&format!("{path}/{id}"), &[], &path)
            .await?;
        Ok(response.data)
    }

    pub async fn create<R: Resource>(&self, resource: &R, form: &R::Form) -> ClientResult<R::Item> {
        self.authorize(R::MODULE, Action::Create).await?;
        resource.check(form)?;
        let builder = self
            .request(Method::POST, &resource.path())
            .await
            .json(form);
        let item = self.fetch_data(builder).await?;
        self.invalidate_after(resource).await;
        tracing::info!(entity = R::ENTITY, path = %resource.path(), "Created");
        Ok(item)
    }

    pub async fn update<R: Resource>(
        &self,
        resource: &R,
        id: DbId,
        form: &R::Form,
    ) -> ClientResult<R::Item> {
        if !resource.updatable() {
            return Err(CoreError::Validation(format!("{} records cannot be edited", R::ENTITY)).into());
        }
        self.authorize(R::MODULE, Action::Update).await?;
        resource.check(form)?;
        let builder = self
            .request(Method::PATCH, &format!("{}/{id}", resource.path()))
            .await
            .json(form);
        let item = self.fetch_data(builder).await?;
        self.invalidate_after(resource).await;
        tracing::info!(entity = R::ENTITY, id, "Updated");
        Ok(item)
    }

    pub async fn delete<R: Resource>(&self, resource: &R, id: DbId) -> ClientResult<()> {
        self.authorize(R::MODULE, Action::Delete).await?;
        let builder = self
            .request(Method::DELETE, &format!("{}/{id}", resource.path()))
            .await;
        self.fetch_empty(builder).await?;
        self.invalidate_after(resource).await;
        tracing::info!(entity = R::ENTITY, id, "Deleted");
        Ok(())
    }

    async fn invalidate_after<R: Resource>(&self, resource: &R) {
        for tag in resource.invalidates() {
            self.cache().invalidate(&tag).await;
        }
    }

    // ---- resource-specific reads ----

    /// Models of one brand (`GET /models?brandId=`).
    pub async fn models_for_brand(&self, brand_id: DbId) -> ClientResult<Vec<CarModel>> {
        self.authorize(Module::Models, Action::Read).await?;
        let path = Models.path();
        let page: Paginated<CarModel> = self
            .get_cached(&path, &[("brandId", brand_id.to_string())], &path)
            .await?;
        Ok(page.data)
    }

    /// Model dropdown for `brand_id`. Filters client-side as well, so a
    /// backend ignoring `brandId` cannot leak other brands' models.
    pub async fn model_dropdown(
        &self,
        brand_id: DbId,
        locale: Locale,
    ) -> ClientResult<Vec<SelectOption>> {
        let models = self.models_for_brand(brand_id).await?;
        Ok(model_options(&models, brand_id, locale))
    }

    /// Category → variant tree built from the two flat lists.
    pub async fn variant_tree(&self) -> ClientResult<VariantTree> {
        let categories = self.list_all(&SpecCategories).await?;
        let variants = self.list_all(&Specs).await?;
        let tree = VariantTree::fold(categories, variants);
        if !tree.orphans.is_empty() {
            tracing::warn!(
                orphans = tree.orphans.len(),
                "Specifications reference unknown categories"
            );
        }
        Ok(tree)
    }
}
