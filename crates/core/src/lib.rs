//! Domain model and pure logic for the dealership admin dashboard.
//!
//! Nothing in this crate performs I/O; the REST client and the CLI build on
//! these types.

pub mod car;
pub mod error;
pub mod forms;
pub mod locale;
pub mod pagination;
pub mod permissions;
pub mod reconcile;
pub mod reference;
pub mod session;
pub mod staging;
pub mod table;
pub mod types;
pub mod variant;
pub mod wizard;
