//! Remote APIs: Hatena Blog AtomPub and Fotolife

pub mod atom;
pub mod blog;
pub mod fotolife;

pub use blog::{BlogApi, BlogClient, BlogEntry};
pub use fotolife::{FotolifeClient, ImageHost};
