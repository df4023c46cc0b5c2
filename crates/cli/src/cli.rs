//! Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use dealerdash_core::locale::{Locale, Localized};
use dealerdash_core::reference::{Audience, LocationKind};
use dealerdash_core::types::DbId;

#[derive(Parser, Debug)]
#[command(name = "dealerdash")]
#[command(about = "Admin dashboard for the dealership platform")]
pub struct Cli {
    /// Page to show for list commands.
    #[arg(long, global = true, default_value_t = 1)]
    pub page: u32,
    /// Search term for list commands.
    #[arg(long, global = true)]
    pub search: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and remember the session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session.
    Logout,
    /// Show the signed-in admin and what they may access.
    Whoami,
    /// Switch the dashboard language.
    Locale {
        #[arg(value_enum)]
        locale: LocaleArg,
    },
    #[command(subcommand)]
    Cars(CarsCommand),
    #[command(subcommand)]
    Wizard(WizardCommand),
    #[command(subcommand)]
    Specs(SpecsCommand),
    #[command(subcommand)]
    Brands(NamedCommand),
    #[command(subcommand)]
    ModelTypes(NamedCommand),
    #[command(subcommand)]
    Models(ModelsCommand),
    #[command(subcommand)]
    Locations(LocationsCommand),
    #[command(subcommand)]
    News(NewsCommand),
    #[command(subcommand)]
    Notifications(NotificationsCommand),
    #[command(subcommand)]
    Media360(Media360Command),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum LocaleArg {
    Ar,
    En,
}

impl From<LocaleArg> for Locale {
    fn from(arg: LocaleArg) -> Self {
        match arg {
            LocaleArg::Ar => Locale::Ar,
            LocaleArg::En => Locale::En,
        }
    }
}

// ---------------------------------------------------------------------------
// Shared argument groups
// ---------------------------------------------------------------------------

#[derive(Args, Debug, Clone)]
pub struct NameArgs {
    #[arg(long)]
    pub name_ar: String,
    #[arg(long)]
    pub name_en: String,
}

impl NameArgs {
    pub fn localized(&self) -> Localized {
        Localized::new(&self.name_ar, &self.name_en)
    }
}

#[derive(Args, Debug, Clone)]
pub struct TextArgs {
    #[arg(long)]
    pub title_ar: String,
    #[arg(long)]
    pub title_en: String,
    #[arg(long)]
    pub body_ar: String,
    #[arg(long)]
    pub body_en: String,
}

impl TextArgs {
    pub fn title(&self) -> Localized {
        Localized::new(&self.title_ar, &self.title_en)
    }

    pub fn body(&self) -> Localized {
        Localized::new(&self.body_ar, &self.body_en)
    }
}

/// Parse `"arabic|english"` into a value pair.
pub fn parse_pair(raw: &str) -> Result<Localized, String> {
    match raw.split_once('|') {
        Some((ar, en)) => Ok(Localized::new(ar.trim(), en.trim())),
        None => Err(format!("expected 'arabic|english', got '{raw}'")),
    }
}

// ---------------------------------------------------------------------------
// Cars and the wizard
// ---------------------------------------------------------------------------

#[derive(Subcommand, Debug)]
pub enum CarsCommand {
    /// Published and draft cars.
    List {
        /// Only drafts.
        #[arg(long)]
        drafts: bool,
    },
    /// One car with its wizard progress.
    Show { id: DbId },
    Delete { id: DbId },
}

#[derive(Subcommand, Debug)]
pub enum WizardCommand {
    /// Step 1: create a draft, or update one with `--draft`.
    MainInfo(MainInfoArgs),
    /// Step 2: specifications from a JSON file shaped as
    /// `{"<specId>": {"ar": "...", "en": "..."}}`.
    Specs {
        #[arg(long)]
        draft: DbId,
        #[arg(long)]
        file: PathBuf,
        /// Save and go back to the drafts list instead of continuing.
        #[arg(long)]
        save_draft: bool,
    },
    /// Step 3: SEO. Without `--save-draft` this publishes the car.
    Seo(SeoArgs),
    /// Where a draft stands and where the wizard would resume.
    Status {
        #[arg(long)]
        draft: DbId,
        /// Step the operator asked for (`main-info`, `specs`, `seo`).
        #[arg(long)]
        step: Option<String>,
    },
}

/// Fields left out keep the unsaved edits stored for the draft, or else the
/// draft's saved values.
#[derive(Args, Debug, Default)]
pub struct MainInfoArgs {
    #[arg(long)]
    pub draft: Option<DbId>,
    #[arg(long)]
    pub name_ar: Option<String>,
    #[arg(long)]
    pub name_en: Option<String>,
    #[arg(long)]
    pub brand: Option<DbId>,
    #[arg(long)]
    pub model: Option<DbId>,
    #[arg(long)]
    pub price: Option<f64>,
    /// Offer price; marks the car as on offer.
    #[arg(long)]
    pub offer: Option<f64>,
    /// Image files to upload (repeatable).
    #[arg(long = "image")]
    pub images: Vec<PathBuf>,
    /// Ids of stored images to delete (repeatable).
    #[arg(long = "remove-image")]
    pub remove_images: Vec<DbId>,
    #[arg(long, conflicts_with = "remove_video")]
    pub video: Option<PathBuf>,
    #[arg(long)]
    pub remove_video: bool,
}

/// Like [`MainInfoArgs`], omitted fields fall back to stored edits or the
/// draft's saved SEO info.
#[derive(Args, Debug, Default)]
pub struct SeoArgs {
    #[arg(long)]
    pub draft: DbId,
    #[arg(long)]
    pub title_ar: Option<String>,
    #[arg(long)]
    pub title_en: Option<String>,
    #[arg(long)]
    pub description_ar: Option<String>,
    #[arg(long)]
    pub description_en: Option<String>,
    /// Keyword (repeatable); replaces the stored keywords when given.
    #[arg(long = "keyword")]
    pub keywords: Vec<String>,
    #[arg(long)]
    pub save_draft: bool,
}

// ---------------------------------------------------------------------------
// Specifications
// ---------------------------------------------------------------------------

#[derive(Subcommand, Debug)]
pub enum SpecsCommand {
    /// Categories with their variants and values.
    Tree,
    CategoryCreate {
        #[command(flatten)]
        name: NameArgs,
    },
    CategoryUpdate {
        id: DbId,
        #[command(flatten)]
        name: NameArgs,
    },
    CategoryDelete { id: DbId },
    VariantCreate {
        #[arg(long)]
        category: DbId,
        #[command(flatten)]
        name: NameArgs,
        /// Value as `arabic|english` (repeatable).
        #[arg(long = "value", value_parser = parse_pair)]
        values: Vec<Localized>,
    },
    /// Rename a variant, or move it to another category.
    VariantUpdate {
        id: DbId,
        #[command(flatten)]
        name: NameArgs,
        #[arg(long)]
        category: Option<DbId>,
    },
    VariantDelete { id: DbId },
    /// Append a value to a variant.
    ValueAdd {
        variant: DbId,
        #[arg(value_parser = parse_pair)]
        value: Localized,
    },
    /// Replace the value at `index` (0-based).
    ValueUpdate {
        variant: DbId,
        index: usize,
        #[arg(value_parser = parse_pair)]
        value: Localized,
    },
    ValueRemove { variant: DbId, index: usize },
    ValueMove {
        variant: DbId,
        from: usize,
        to: usize,
    },
}

// ---------------------------------------------------------------------------
// Reference data and content
// ---------------------------------------------------------------------------

#[derive(Subcommand, Debug)]
pub enum NamedCommand {
    List,
    Create {
        #[command(flatten)]
        name: NameArgs,
    },
    Update {
        id: DbId,
        #[command(flatten)]
        name: NameArgs,
    },
    Delete { id: DbId },
}

#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    List,
    /// Model dropdown for one brand.
    Options {
        #[arg(long)]
        brand: DbId,
    },
    Create {
        #[command(flatten)]
        name: NameArgs,
        #[arg(long)]
        brand: DbId,
        #[arg(long)]
        model_type: Option<DbId>,
        #[arg(long)]
        year: i32,
    },
    Delete { id: DbId },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum LocationKindArg {
    Country,
    City,
    Area,
}

impl From<LocationKindArg> for LocationKind {
    fn from(arg: LocationKindArg) -> Self {
        match arg {
            LocationKindArg::Country => LocationKind::Country,
            LocationKindArg::City => LocationKind::City,
            LocationKindArg::Area => LocationKind::Area,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum LocationsCommand {
    List {
        #[arg(value_enum)]
        kind: LocationKindArg,
    },
    Create {
        #[arg(value_enum)]
        kind: LocationKindArg,
        #[command(flatten)]
        name: NameArgs,
        #[arg(long)]
        parent: Option<DbId>,
    },
    Delete {
        #[arg(value_enum)]
        kind: LocationKindArg,
        id: DbId,
    },
}

#[derive(Subcommand, Debug)]
pub enum NewsCommand {
    List,
    Create {
        #[command(flatten)]
        text: TextArgs,
        #[arg(long)]
        publish: bool,
    },
    Delete { id: DbId },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum AudienceArg {
    All,
    Users,
    Dealers,
}

impl From<AudienceArg> for Audience {
    fn from(arg: AudienceArg) -> Self {
        match arg {
            AudienceArg::All => Audience::All,
            AudienceArg::Users => Audience::Users,
            AudienceArg::Dealers => Audience::Dealers,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum NotificationsCommand {
    List,
    Send {
        #[command(flatten)]
        text: TextArgs,
        #[arg(long, value_enum, default_value_t = AudienceArg::All)]
        audience: AudienceArg,
    },
    Delete { id: DbId },
}

#[derive(Subcommand, Debug)]
pub enum Media360Command {
    /// Upload, validate and generate a 360° model from a video.
    Process { file: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn pairs_split_on_pipe() {
        assert_eq!(
            parse_pair("أوتوماتيك | Automatic").unwrap(),
            Localized::new("أوتوماتيك", "Automatic")
        );
        assert!(parse_pair("Automatic").is_err());
    }

    #[test]
    fn wizard_main_info_parses() {
        let cli = Cli::try_parse_from([
            "dealerdash",
            "wizard",
            "main-info",
            "--name-ar",
            "كامري",
            "--name-en",
            "Camry",
            "--brand",
            "1",
            "--model",
            "1",
            "--price",
            "98000",
            "--image",
            "a.jpg",
            "--image",
            "b.jpg",
            "--remove-image",
            "501",
        ])
        .unwrap();
        match cli.command {
            Command::Wizard(WizardCommand::MainInfo(args)) => {
                assert_eq!(args.images.len(), 2);
                assert_eq!(args.remove_images, vec![501]);
                assert!(args.draft.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
