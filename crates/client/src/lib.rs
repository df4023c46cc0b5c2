//! Async REST client for the dealership admin backend.
//!
//! [`DashboardApi`] is the entry point. Resource operations live in their
//! own modules as inherent methods; [`wizard::WizardDriver`] binds the
//! add-car step forms to their endpoints.

pub mod api;
pub mod auth;
pub mod cache;
pub mod cars;
pub mod error;
pub mod media360;
pub mod resources;
pub mod response;
pub mod toaster;
pub mod wizard;

pub use api::{session_context, DashboardApi, SessionContext};
pub use error::{ClientError, ClientResult};
