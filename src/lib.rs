//! Hatena Blog CLI Library
//!
//! Publishes, updates and deletes Hatena Blog entries written in Markdown.
//! Documents are converted with pandoc, referenced images are synced with
//! Hatena Fotolife, and every request is signed with OAuth 1.0a.

pub mod api;
pub mod auth;
pub mod cli_oauth;
pub mod commands;
pub mod config;
pub mod config_store;
pub mod convert;
pub mod error;
pub mod images;
pub mod progress;
pub mod publisher;
pub mod utils;

// Re-export commonly used types for convenience
pub use api::{BlogApi, BlogClient, BlogEntry, FotolifeClient, ImageHost};
pub use auth::{CredentialManager, Credentials};
pub use config_store::ConfigStore;
pub use convert::{DocumentConverter, PandocConverter};
pub use error::{HatenaError, HatenaResult, PublishPhase};
pub use images::ImageSync;
pub use publisher::{EntryPublisher, PublishRequest};
