//! Terminal front end for the dealership admin dashboard.

pub mod cli;
pub mod commands;
pub mod config;
pub mod notifier;
pub mod store;
