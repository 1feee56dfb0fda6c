//! Nectaris: a marketplace where beekeepers find land for their hives and
//! landowners list it.
//!
//! Persistence, auth and file storage live in a hosted backend reached through
//! [`backend`]; this crate holds the application logic on top of it.

pub mod app;
pub mod backend;
pub mod config;
pub mod error;
pub mod favorites;
pub mod filter;
pub mod listing_form;
pub mod models;
pub mod moderation;
pub mod notify;
pub mod roles;
pub mod routes;
pub mod scope;
pub mod session;
pub mod views;

pub use app::AppContext;
pub use config::Config;
pub use error::{Error, Result};
