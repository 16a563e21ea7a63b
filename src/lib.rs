//! Paste storage with short base-62 links, user accounts and signed sessions.

pub mod app;
pub mod auth;
pub mod base62;
pub mod config;
pub mod db;
pub mod error;
pub mod pastes;
pub mod state;
pub mod store;

pub use auth::{
    dto::{Login, PublicUser, Registration, UserInfo},
    services::UserService,
};
pub use error::{AppError, AppResult};
pub use pastes::{dto::NewPaste, repo_types::Paste, services::PasteService};
