//! Core of a tabbed e-book reader.
//!
//! - `app`: reader state (groups of tabs), the message reducer and the
//!   effect-running event loop.
//! - `rendition`: the paginated rendering seam and its in-memory backend.
//! - `reconcile`: keeps rendered paragraphs consistent under external
//!   translation mutations.
//! - `selection` / `translation`: the selection menu and its translation
//!   lookups.
//! - `book`, `store`, `import`: book records, their persistence and import.

pub mod annotation;
pub mod app;
pub mod book;
pub mod config;
pub mod dom;
pub mod import;
pub mod reconcile;
pub mod rendition;
pub mod selection;
pub mod store;
pub mod translation;
