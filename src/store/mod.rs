//! Record store for captured items
//!
//! Embedded SQLite storage: an indexed `items` table for structured
//! filtering, an FTS5 shadow table over content+tags for full-text search,
//! and a `categories` table that grows as the classifier coins new
//! category names. Every read and write is scoped to an owner - no query
//! can cross owners.

pub mod items;

pub use items::{ItemStore, StoreStats};
