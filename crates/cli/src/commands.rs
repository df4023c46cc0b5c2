//! Command dispatch. Every command runs against one [`App`], which owns the
//! API client, the on-disk session store and the console toaster.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use dealerdash_client::media360::Media360Api;
use dealerdash_client::resources::{
    Brands, Locations, ModelTypes, Models, NewsFeed, Notifications, Resource, SpecCategories,
    Specs,
};
use dealerdash_client::toaster::{handle_req_with_toaster, ToastMessages};
use dealerdash_client::wizard::WizardDriver;
use dealerdash_client::{session_context, ClientError, DashboardApi};
use dealerdash_core::car::{CarSummary, MainInfoForm, SeoForm, SpecsForm};
use dealerdash_core::error::CoreError;
use dealerdash_core::locale::Locale;
use dealerdash_core::pagination::ListQuery;
use dealerdash_core::reconcile::{FormSlot, LocalDraftState, Reconciled};
use dealerdash_core::reference::{
    Audience, Brand, CarModel, Location, LocationForm, ModelForm, ModelType, NamedForm, News,
    NewsForm, Notification, NotificationForm,
};
use dealerdash_core::session::Session;
use dealerdash_core::staging::{stage_image_file, stage_video_file, ImageKey, MediaStaging};
use dealerdash_core::table::{Column, DataTable};
use dealerdash_core::types::DbId;
use dealerdash_core::variant::{CategoryForm, Variant, VariantForm};
use dealerdash_core::wizard::{SubmitIntent, WizardStep};

use crate::cli::{
    CarsCommand, Cli, Command, LocationsCommand, MainInfoArgs, Media360Command, ModelsCommand,
    NamedCommand, NewsCommand, NotificationsCommand, SeoArgs, SpecsCommand, WizardCommand,
};
use crate::config::DashboardConfig;
use crate::notifier::ConsoleNotifier;
use crate::store::SessionStore;

pub struct App {
    config: DashboardConfig,
    store: SessionStore,
    api: DashboardApi,
    notifier: Arc<ConsoleNotifier>,
}

impl App {
    pub fn new(config: DashboardConfig, session: Session) -> anyhow::Result<Self> {
        let api = DashboardApi::new(
            &config.api_base_url,
            session_context(session),
            config.request_timeout(),
        )?;
        Ok(Self {
            store: SessionStore::new(&config.session_file),
            config,
            api,
            notifier: Arc::new(ConsoleNotifier::new()),
        })
    }

    pub fn notifier(&self) -> &ConsoleNotifier {
        &self.notifier
    }

    pub async fn run(&self, cli: Cli) -> anyhow::Result<()> {
        let query = ListQuery::new(Some(cli.page), cli.search.as_deref());
        let result = self.dispatch(cli.command, &query).await;
        if let Err(err) = &result {
            if err
                .downcast_ref::<ClientError>()
                .is_some_and(ClientError::is_unauthorized)
            {
                tracing::warn!("Session rejected by the server; clearing stored session");
                self.store.clear()?;
            }
        }
        result
    }

    async fn dispatch(&self, command: Command, query: &ListQuery) -> anyhow::Result<()> {
        match command {
            Command::Login { email, password } => self.login(&email, &password).await,
            Command::Logout => {
                self.api.logout().await;
                self.store.clear()?;
                println!("Signed out");
                Ok(())
            }
            Command::Whoami => self.whoami().await,
            Command::Locale { locale } => {
                let locale = Locale::from(locale);
                self.api.session().write().await.set_locale(locale);
                self.save_session().await?;
                println!("Locale set to {locale}");
                Ok(())
            }
            Command::Cars(cmd) => self.cars(cmd, query).await,
            Command::Wizard(cmd) => self.wizard(cmd).await,
            Command::Specs(cmd) => self.specs(cmd).await,
            Command::Brands(cmd) => {
                let columns = |locale: Locale| {
                    vec![
                        Column::new("ID", |b: &Brand| b.id.to_string()),
                        Column::new("Name", move |b: &Brand| b.name.get(locale).to_string()),
                    ]
                };
                self.named(&Brands, cmd, query, columns).await
            }
            Command::ModelTypes(cmd) => {
                let columns = |locale: Locale| {
                    vec![
                        Column::new("ID", |t: &ModelType| t.id.to_string()),
                        Column::new("Name", move |t: &ModelType| t.name.get(locale).to_string()),
                    ]
                };
                self.named(&ModelTypes, cmd, query, columns).await
            }
            Command::Models(cmd) => self.models(cmd, query).await,
            Command::Locations(cmd) => self.locations(cmd, query).await,
            Command::News(cmd) => self.news(cmd, query).await,
            Command::Notifications(cmd) => self.notifications(cmd, query).await,
            Command::Media360(cmd) => self.media360(cmd).await,
        }
    }

    // ---- helpers ----

    async fn locale(&self) -> Locale {
        self.api.session().read().await.locale()
    }

    async fn save_session(&self) -> anyhow::Result<()> {
        let session = self.api.session().read().await.clone();
        self.store.save(&session)
    }

    /// Run a mutation under a toast.
    async fn toasted<T>(
        &self,
        loading: &str,
        success: &str,
        request: impl std::future::Future<Output = Result<T, ClientError>>,
    ) -> anyhow::Result<T> {
        let value = handle_req_with_toaster(
            self.notifier.as_ref(),
            ToastMessages::new(loading, success),
            request,
        )
        .await?;
        Ok(value)
    }

    async fn print_page<R: Resource>(
        &self,
        resource: &R,
        query: &ListQuery,
        columns: Vec<Column<R::Item>>,
    ) -> anyhow::Result<()> {
        let page = self.api.list(resource, query).await?;
        let info = page.page_info(query.page, self.config.page_size);
        println!("{}", DataTable::new(columns, &page.data).with_page(info).render());
        Ok(())
    }

    async fn create<R: Resource>(&self, resource: &R, form: &R::Form) -> anyhow::Result<()> {
        let loading = format!("Creating {}...", R::ENTITY.to_lowercase());
        let success = format!("{} created", R::ENTITY);
        self.toasted(&loading, &success, self.api.create(resource, form))
            .await?;
        Ok(())
    }

    async fn update<R: Resource>(
        &self,
        resource: &R,
        id: DbId,
        form: &R::Form,
    ) -> anyhow::Result<()> {
        let loading = format!("Updating {}...", R::ENTITY.to_lowercase());
        let success = format!("{} updated", R::ENTITY);
        self.toasted(&loading, &success, self.api.update(resource, id, form))
            .await?;
        Ok(())
    }

    async fn delete<R: Resource>(&self, resource: &R, id: DbId) -> anyhow::Result<()> {
        let loading = format!("Deleting {}...", R::ENTITY.to_lowercase());
        let success = format!("{} deleted", R::ENTITY);
        self.toasted(&loading, &success, self.api.delete(resource, id))
            .await
    }

    // ---- session ----

    async fn login(&self, email: &str, password: &str) -> anyhow::Result<()> {
        let admin = self
            .toasted("Signing in...", "Signed in", self.api.login(email, password))
            .await?;
        self.save_session().await?;
        tracing::info!(admin_id = admin.id, "Session stored");
        println!("Welcome, {}", admin.name);
        Ok(())
    }

    async fn whoami(&self) -> anyhow::Result<()> {
        let admin = self.api.me().await?;
        self.save_session().await?;
        let modules: Vec<String> = admin
            .permissions
            .readable_modules()
            .into_iter()
            .map(|m| m.to_string())
            .collect();
        println!("{} <{}>", admin.name, admin.email);
        println!("Role:    {}", admin.role);
        println!("Access:  {}", modules.join(", "));
        println!("Locale:  {}", self.locale().await);
        Ok(())
    }

    // ---- cars ----

    async fn cars(&self, cmd: CarsCommand, query: &ListQuery) -> anyhow::Result<()> {
        match cmd {
            CarsCommand::List { drafts } => {
                let locale = self.locale().await;
                let page = self.api.list_cars(query, drafts).await?;
                let info = page.page_info(query.page, self.config.page_size);
                let columns = vec![
                    Column::new("ID", |c: &CarSummary| c.id.to_string()),
                    Column::new("Name", move |c: &CarSummary| c.name.get(locale).to_string()),
                    Column::new("Brand", move |c: &CarSummary| {
                        c.brand
                            .as_ref()
                            .map(|b| b.get(locale).to_string())
                            .unwrap_or_default()
                    }),
                    Column::new("Price", |c: &CarSummary| {
                        c.price.map(|p| format!("{p:.0}")).unwrap_or_default()
                    }),
                    Column::new("Status", |c: &CarSummary| status_label(c.draft).to_string()),
                    Column::new("Progress", |c: &CarSummary| {
                        format!("{}/3", c.progress.completed_count())
                    }),
                ];
                let empty = if drafts { "No drafts" } else { "No cars" };
                println!(
                    "{}",
                    DataTable::new(columns, &page.data)
                        .with_page(info)
                        .with_empty_message(empty)
                        .render()
                );
                Ok(())
            }
            CarsCommand::Show { id } => {
                let locale = self.locale().await;
                let car = self.api.get_draft(id).await?;
                println!("#{} {}", car.id, car.name.get(locale));
                println!("Status:   {}", status_label(car.draft));
                for step in WizardStep::EDITABLE {
                    let mark = if car.progress.is_complete(step) { "x" } else { " " };
                    println!("  [{mark}] {}", step.label());
                }
                if let Some(main) = &car.main_info {
                    println!("Price:    {:.0}", main.price);
                    if let Some(offer) = main.offer.filter(|_| main.has_offer) {
                        println!("Offer:    {offer:.0}");
                    }
                    println!("Images:   {}", main.images.len());
                    println!("Video:    {}", main.video.as_deref().unwrap_or("-"));
                }
                println!("Specs:    {}", car.specs.len());
                Ok(())
            }
            CarsCommand::Delete { id } => {
                self.toasted("Deleting car...", "Car deleted", self.api.delete_car(id))
                    .await?;
                self.store.forget_wizard(id)
            }
        }
    }

    // ---- wizard ----

    /// Open the wizard on `step`, resuming `draft_id` when given. The
    /// reconciled forms carry any unsaved edits kept for the draft.
    async fn open_wizard(
        &self,
        draft_id: Option<DbId>,
        step: WizardStep,
    ) -> anyhow::Result<(WizardDriver, Option<Reconciled>)> {
        let notifier = self.notifier.clone();
        let Some(id) = draft_id else {
            return Ok((WizardDriver::new(self.api.clone(), notifier), None));
        };
        let mut local = self.store.load_wizard(id)?;
        local.requested_step = Some(step);
        let (mut driver, reconciled) =
            WizardDriver::open(self.api.clone(), notifier, id, local).await?;
        if driver.state().step() != step {
            driver.go_to(step)?;
        }
        if reconciled.has_unsaved_edits() {
            tracing::info!(draft_id = id, kept = ?reconciled.kept_local, "Resuming unsaved edits");
        }
        Ok((driver, Some(reconciled)))
    }

    /// Keep `slot` for `draft_id` so the next run picks the edits up again.
    fn keep_edits(
        &self,
        draft_id: Option<DbId>,
        update: impl FnOnce(&mut LocalDraftState),
    ) -> anyhow::Result<()> {
        let Some(id) = draft_id else {
            return Ok(());
        };
        let mut local = self.store.load_wizard(id)?;
        update(&mut local);
        self.store.save_wizard(id, &local)
    }

    async fn wizard(&self, cmd: WizardCommand) -> anyhow::Result<()> {
        match cmd {
            WizardCommand::MainInfo(args) => self.wizard_main_info(args).await,
            WizardCommand::Specs {
                draft,
                file,
                save_draft,
            } => {
                let raw = read_json(&file).await?;
                let (mut driver, _) = self.open_wizard(Some(draft), WizardStep::Specs).await?;
                match driver.submit_specs_raw(&raw, intent(save_draft)).await {
                    Ok(route) => {
                        self.store.forget_wizard(draft)?;
                        println!("Next: {}", route.path());
                        Ok(())
                    }
                    Err(err) => {
                        if let Ok(form) = SpecsForm::from_raw(&raw) {
                            self.keep_edits(Some(draft), |local| {
                                local.specs = Some(FormSlot::edited(form))
                            })?;
                        }
                        Err(err.into())
                    }
                }
            }
            WizardCommand::Seo(args) => self.wizard_seo(args).await,
            WizardCommand::Status { draft, step } => {
                let mut local = self.store.load_wizard(draft)?;
                if let Some(segment) = step {
                    local.requested_step = Some(WizardStep::from_segment(&segment)?);
                }
                let (driver, reconciled) =
                    WizardDriver::open(self.api.clone(), self.notifier.clone(), draft, local)
                        .await?;
                let state = driver.state();
                println!("Draft:    #{draft}");
                println!("Step:     {}", state.step().label());
                println!("Progress: {}/3", state.progress().completed_count());
                if let Some(requested) = reconciled.redirected_from {
                    println!("Note:     {} is not reachable yet", requested.label());
                }
                if reconciled.has_unsaved_edits() {
                    let steps: Vec<&str> =
                        reconciled.kept_local.iter().map(|s| s.label()).collect();
                    println!("Unsaved:  {}", steps.join(", "));
                    self.store.save_wizard(draft, &reconciled.to_local())?;
                }
                println!("Open:     {}", state.current_route().path());
                Ok(())
            }
        }
    }

    async fn wizard_main_info(&self, args: MainInfoArgs) -> anyhow::Result<()> {
        let (mut driver, reconciled) = self.open_wizard(args.draft, WizardStep::MainInfo).await?;

        let (mut form, mut staging) = match args.draft {
            Some(id) => {
                let draft = self.api.get_draft(id).await?;
                let staging = match &draft.main_info {
                    Some(main) => MediaStaging::from_persisted(&main.images, main.video.as_deref()),
                    None => MediaStaging::new(),
                };
                let form = match reconciled {
                    Some(reconciled) => reconciled.main_info.value,
                    None => MainInfoForm::from_draft(&draft),
                };
                (form, staging)
            }
            None => (MainInfoForm::default(), MediaStaging::new()),
        };
        apply_main_info_args(&mut form, &args);

        for id in &args.remove_images {
            staging.remove_image(ImageKey::Persisted(*id))?;
        }
        for path in &args.images {
            let (name, bytes) = read_file(path).await?;
            staging.add_image(stage_image_file(&name, bytes)?)?;
        }
        if let Some(path) = &args.video {
            let (name, bytes) = read_file(path).await?;
            staging.set_video(stage_video_file(&name, bytes)?);
        } else if args.remove_video {
            staging.remove_video();
        }

        let media = staging.into_submission();
        let submitted = driver
            .submit_main_info(&form, media, SubmitIntent::Proceed)
            .await;
        match submitted {
            Ok(route) => {
                if let Some(id) = driver.state().draft_id() {
                    self.store.forget_wizard(id)?;
                    println!("Draft:    #{id}");
                }
                println!("Next:     {}", route.path());
                Ok(())
            }
            Err(err) => {
                self.keep_edits(args.draft, |local| {
                    local.main_info = Some(FormSlot::edited(form))
                })?;
                Err(err.into())
            }
        }
    }

    async fn wizard_seo(&self, args: SeoArgs) -> anyhow::Result<()> {
        let (mut driver, reconciled) = self.open_wizard(Some(args.draft), WizardStep::Seo).await?;
        let draft = args.draft;
        let intent = intent(args.save_draft);
        let mut form = reconciled.map(|r| r.seo.value).unwrap_or_default();
        apply_seo_args(&mut form, args);
        let submitted = driver.submit_seo(&form, intent).await;
        match submitted {
            Ok(route) => {
                self.store.forget_wizard(draft)?;
                println!("Next: {}", route.path());
                Ok(())
            }
            Err(err) => {
                self.keep_edits(Some(draft), |local| {
                    local.seo = Some(FormSlot::edited(form))
                })?;
                Err(err.into())
            }
        }
    }

    // ---- specifications ----

    async fn specs(&self, cmd: SpecsCommand) -> anyhow::Result<()> {
        match cmd {
            SpecsCommand::Tree => {
                let tree = self.api.variant_tree().await?;
                print!("{}", tree.render(self.locale().await));
                if !tree.orphans.is_empty() {
                    println!(
                        "({} specifications belong to unknown categories)",
                        tree.orphans.len()
                    );
                }
                Ok(())
            }
            SpecsCommand::CategoryCreate { name } => {
                let form = CategoryForm {
                    name: name.localized(),
                    ..CategoryForm::default()
                };
                self.create(&SpecCategories, &form).await
            }
            SpecsCommand::CategoryUpdate { id, name } => {
                let category = self.api.get(&SpecCategories, id).await?;
                let mut form = CategoryForm::from_category(&category);
                form.name = name.localized();
                self.update(&SpecCategories, id, &form).await
            }
            SpecsCommand::CategoryDelete { id } => self.delete(&SpecCategories, id).await,
            SpecsCommand::VariantCreate {
                category,
                name,
                values,
            } => {
                let form = VariantForm {
                    category_id: category,
                    name: name.localized(),
                    values,
                    ..VariantForm::default()
                };
                self.create(&Specs, &form).await
            }
            SpecsCommand::VariantUpdate { id, name, category } => {
                let variant = self.api.get(&Specs, id).await?;
                let mut form = VariantForm::from_variant(&variant);
                form.name = name.localized();
                if let Some(category) = category {
                    form.category_id = category;
                }
                self.update(&Specs, id, &form).await
            }
            SpecsCommand::VariantDelete { id } => self.delete(&Specs, id).await,
            SpecsCommand::ValueAdd { variant, value } => {
                self.edit_values(variant, |v| v.add_value(value)).await
            }
            SpecsCommand::ValueUpdate {
                variant,
                index,
                value,
            } => {
                self.edit_values(variant, |v| v.update_value(index, value))
                    .await
            }
            SpecsCommand::ValueRemove { variant, index } => {
                self.edit_values(variant, |v| v.remove_value(index).map(|_| ()))
                    .await
            }
            SpecsCommand::ValueMove { variant, from, to } => {
                self.edit_values(variant, |v| v.move_value(from, to)).await
            }
        }
    }

    /// Apply `edit` to the stored variant and send the whole variant back.
    async fn edit_values(
        &self,
        id: DbId,
        edit: impl FnOnce(&mut Variant) -> Result<(), CoreError>,
    ) -> anyhow::Result<()> {
        let mut variant = self.api.get(&Specs, id).await?;
        edit(&mut variant)?;
        self.update(&Specs, id, &VariantForm::from_variant(&variant))
            .await
    }

    // ---- reference data ----

    async fn named<R, F>(
        &self,
        resource: &R,
        cmd: NamedCommand,
        query: &ListQuery,
        columns: F,
    ) -> anyhow::Result<()>
    where
        R: Resource<Form = NamedForm>,
        F: FnOnce(Locale) -> Vec<Column<R::Item>>,
    {
        match cmd {
            NamedCommand::List => {
                let columns = columns(self.locale().await);
                self.print_page(resource, query, columns).await
            }
            NamedCommand::Create { name } => {
                let form = NamedForm {
                    name: name.localized(),
                    logo: None,
                };
                self.create(resource, &form).await
            }
            NamedCommand::Update { id, name } => {
                let form = NamedForm {
                    name: name.localized(),
                    logo: None,
                };
                self.update(resource, id, &form).await
            }
            NamedCommand::Delete { id } => self.delete(resource, id).await,
        }
    }

    async fn models(&self, cmd: ModelsCommand, query: &ListQuery) -> anyhow::Result<()> {
        match cmd {
            ModelsCommand::List => {
                let locale = self.locale().await;
                let columns = vec![
                    Column::new("ID", |m: &CarModel| m.id.to_string()),
                    Column::new("Name", move |m: &CarModel| m.name.get(locale).to_string()),
                    Column::new("Brand", |m: &CarModel| m.brand_id.to_string()),
                    Column::new("Year", |m: &CarModel| m.year.to_string()),
                ];
                self.print_page(&Models, query, columns).await
            }
            ModelsCommand::Options { brand } => {
                let options = self.api.model_dropdown(brand, self.locale().await).await?;
                if options.is_empty() {
                    println!("No models for this brand");
                }
                for option in options {
                    println!("{}\t{}", option.value, option.label);
                }
                Ok(())
            }
            ModelsCommand::Create {
                name,
                brand,
                model_type,
                year,
            } => {
                let form = ModelForm {
                    name: name.localized(),
                    brand_id: brand,
                    model_type_id: model_type,
                    year,
                };
                self.create(&Models, &form).await
            }
            ModelsCommand::Delete { id } => self.delete(&Models, id).await,
        }
    }

    async fn locations(&self, cmd: LocationsCommand, query: &ListQuery) -> anyhow::Result<()> {
        match cmd {
            LocationsCommand::List { kind } => {
                let locale = self.locale().await;
                let columns = vec![
                    Column::new("ID", |l: &Location| l.id.to_string()),
                    Column::new("Name", move |l: &Location| l.name.get(locale).to_string()),
                    Column::new("Parent", |l: &Location| {
                        l.parent_id.map(|p| p.to_string()).unwrap_or_default()
                    }),
                ];
                self.print_page(&Locations(kind.into()), query, columns)
                    .await
            }
            LocationsCommand::Create { kind, name, parent } => {
                let form = LocationForm {
                    name: name.localized(),
                    parent_id: parent,
                };
                self.create(&Locations(kind.into()), &form).await
            }
            LocationsCommand::Delete { kind, id } => {
                self.delete(&Locations(kind.into()), id).await
            }
        }
    }

    // ---- content ----

    async fn news(&self, cmd: NewsCommand, query: &ListQuery) -> anyhow::Result<()> {
        match cmd {
            NewsCommand::List => {
                let locale = self.locale().await;
                let columns = vec![
                    Column::new("ID", |n: &News| n.id.to_string()),
                    Column::new("Title", move |n: &News| n.title.get(locale).to_string()),
                    Column::new("Published", |n: &News| {
                        String::from(if n.published { "yes" } else { "no" })
                    }),
                ];
                self.print_page(&NewsFeed, query, columns).await
            }
            NewsCommand::Create { text, publish } => {
                let form = NewsForm {
                    title: text.title(),
                    body: text.body(),
                    image: None,
                    published: publish,
                };
                self.create(&NewsFeed, &form).await
            }
            NewsCommand::Delete { id } => self.delete(&NewsFeed, id).await,
        }
    }

    async fn notifications(
        &self,
        cmd: NotificationsCommand,
        query: &ListQuery,
    ) -> anyhow::Result<()> {
        match cmd {
            NotificationsCommand::List => {
                let locale = self.locale().await;
                let columns = vec![
                    Column::new("ID", |n: &Notification| n.id.to_string()),
                    Column::new("Title", move |n: &Notification| {
                        n.title.get(locale).to_string()
                    }),
                    Column::new("Audience", |n: &Notification| {
                        audience_label(n.audience).to_string()
                    }),
                ];
                self.print_page(&Notifications, query, columns).await
            }
            NotificationsCommand::Send { text, audience } => {
                let form = NotificationForm {
                    title: text.title(),
                    body: text.body(),
                    audience: audience.into(),
                };
                self.toasted(
                    "Sending notification...",
                    "Notification sent",
                    self.api.create(&Notifications, &form),
                )
                .await?;
                Ok(())
            }
            NotificationsCommand::Delete { id } => self.delete(&Notifications, id).await,
        }
    }

    async fn media360(&self, cmd: Media360Command) -> anyhow::Result<()> {
        let Some(settings) = &self.config.media360 else {
            anyhow::bail!("360° processing is not configured; set MEDIA360_URL and MEDIA360_TOKEN");
        };
        match cmd {
            Media360Command::Process { file } => {
                let api = Media360Api::new(
                    &settings.url,
                    &settings.token,
                    self.config.request_timeout(),
                )?;
                let (name, bytes) = read_file(&file).await?;
                let staged = stage_video_file(&name, bytes)?;
                let model = self
                    .toasted(
                        "Processing 360° video...",
                        "360° model generated",
                        api.process(staged),
                    )
                    .await?;
                println!("{}", model.model_url);
                Ok(())
            }
        }
    }
}

fn intent(save_draft: bool) -> SubmitIntent {
    if save_draft {
        SubmitIntent::SaveDraft
    } else {
        SubmitIntent::Proceed
    }
}

/// Lay the fields given on the command line over `form`.
fn apply_main_info_args(form: &mut MainInfoForm, args: &MainInfoArgs) {
    if let Some(ar) = &args.name_ar {
        form.name.ar = ar.clone();
    }
    if let Some(en) = &args.name_en {
        form.name.en = en.clone();
    }
    if args.brand.is_some() {
        form.brand_id = args.brand;
    }
    if args.model.is_some() {
        form.model_id = args.model;
    }
    if args.price.is_some() {
        form.price = args.price;
    }
    if let Some(offer) = args.offer {
        form.has_offer = true;
        form.offer = Some(offer);
    }
}

fn apply_seo_args(form: &mut SeoForm, args: SeoArgs) {
    if let Some(ar) = args.title_ar {
        form.meta_title.ar = ar;
    }
    if let Some(en) = args.title_en {
        form.meta_title.en = en;
    }
    if let Some(ar) = args.description_ar {
        form.meta_description.ar = ar;
    }
    if let Some(en) = args.description_en {
        form.meta_description.en = en;
    }
    if !args.keywords.is_empty() {
        form.keywords = args.keywords;
    }
}

fn status_label(draft: bool) -> &'static str {
    if draft {
        "Draft"
    } else {
        "Published"
    }
}

fn audience_label(audience: Audience) -> &'static str {
    match audience {
        Audience::All => "all",
        Audience::Users => "users",
        Audience::Dealers => "dealers",
    }
}

async fn read_file(path: &Path) -> anyhow::Result<(String, Vec<u8>)> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok((name, bytes))
}

async fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))
}

/// Message to show for a failed command.
pub fn describe(err: &anyhow::Error) -> String {
    if let Some(err) = err.downcast_ref::<ClientError>() {
        return err.toast_message();
    }
    if let Some(err) = err.downcast_ref::<CoreError>() {
        return err.user_message();
    }
    format!("{err:#}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealerdash_core::car::DraftCar;
    use dealerdash_core::locale::Localized;
    use dealerdash_core::reconcile::reconcile;
    use serde_json::json;

    fn saved_draft() -> DraftCar {
        serde_json::from_value(json!({
            "id": 8,
            "name": {"ar": "سوناتا", "en": "Sonata"},
            "progress": {"mainInfo": true, "carSpecs": true, "seoInfo": true},
            "mainInfo": {"brandId": 3, "modelId": 4, "price": 21000.0},
            "seo": {
                "metaTitle": {"ar": "سوناتا", "en": "Sonata"},
                "metaDescription": {"ar": "وصف", "en": "Description"},
                "keywords": ["sedan"]
            },
            "draft": true
        }))
        .unwrap()
    }

    #[test]
    fn describe_prefers_user_messages() {
        let err = anyhow::Error::new(ClientError::Api {
            status: 409,
            message: "Brand has models".into(),
        });
        assert_eq!(describe(&err), "Brand has models");

        let err = anyhow::Error::new(CoreError::Validation("Price is required".into()));
        assert_eq!(describe(&err), "Price is required");

        let err = anyhow::anyhow!("disk full").context("Failed to write session");
        assert_eq!(describe(&err), "Failed to write session: disk full");
    }

    #[test]
    fn save_draft_flag_selects_intent() {
        assert_eq!(intent(true), SubmitIntent::SaveDraft);
        assert_eq!(intent(false), SubmitIntent::Proceed);
    }

    #[tokio::test]
    async fn read_file_keeps_the_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("front.png");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();
        let (name, bytes) = read_file(&path).await.unwrap();
        assert_eq!(name, "front.png");
        assert_eq!(bytes, vec![1, 2, 3]);
        assert!(read_file(&dir.path().join("missing.png")).await.is_err());
    }

    // -- resuming stored edits --

    #[test]
    fn stored_main_info_edits_feed_the_next_submission() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        let draft = saved_draft();

        let mut edited = MainInfoForm::from_draft(&draft);
        edited.price = Some(19_999.0);
        edited.name.en = "Sonata Hybrid".into();
        store
            .save_wizard(
                8,
                &LocalDraftState {
                    draft_id: Some(8),
                    main_info: Some(FormSlot::edited(edited)),
                    ..LocalDraftState::default()
                },
            )
            .unwrap();

        let reconciled = reconcile(store.load_wizard(8).unwrap(), &draft).unwrap();
        let mut form = reconciled.main_info.value;
        apply_main_info_args(
            &mut form,
            &MainInfoArgs {
                draft: Some(8),
                brand: Some(5),
                ..MainInfoArgs::default()
            },
        );

        assert_eq!(form.price, Some(19_999.0));
        assert_eq!(form.name, Localized::new("سوناتا", "Sonata Hybrid"));
        assert_eq!(form.brand_id, Some(5));
        assert_eq!(form.model_id, Some(4));
    }

    #[test]
    fn seo_fields_left_out_come_from_the_reconciled_form() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        let draft = saved_draft();

        let mut edited = SeoForm::from_draft(&draft);
        edited.keywords = vec!["hybrid".into()];
        store
            .save_wizard(
                8,
                &LocalDraftState {
                    seo: Some(FormSlot::edited(edited)),
                    ..LocalDraftState::default()
                },
            )
            .unwrap();

        let reconciled = reconcile(store.load_wizard(8).unwrap(), &draft).unwrap();
        assert!(reconciled.seo.dirty);
        let mut form = reconciled.seo.value;
        apply_seo_args(
            &mut form,
            SeoArgs {
                draft: 8,
                title_en: Some("Sonata for sale".into()),
                ..SeoArgs::default()
            },
        );

        assert_eq!(form.meta_title, Localized::new("سوناتا", "Sonata for sale"));
        assert_eq!(form.meta_description, Localized::new("وصف", "Description"));
        assert_eq!(form.keywords, vec!["hybrid".to_string()]);
    }
}
