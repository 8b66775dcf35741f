//! Ghostforge-DB: Catalog schema, migrations, and query operations
//!
//! This crate stores the media catalog in SQLite using rusqlite and r2d2
//! connection pooling.
//!
//! # Modules
//!
//! - `migrations` - Embedded, versioned schema migrations
//! - `pool` - Connection pool management
//! - `models` - Row structs for the `collection` and `media` tables
//! - `queries` - Upserts and read-back queries
//! - `catalog` - Validated, transactional, per-ID locked writer
//!
//! # Example
//!
//! ```no_run
//! use ghostforge_db::{pool::init_pool, CatalogStore};
//!
//! let pool = init_pool("/var/lib/ghostforge/ghost.db").unwrap();
//! let store = CatalogStore::new(pool);
//! let (collections, media) = store.counts().unwrap();
//! println!("{collections} collections, {media} media");
//! ```

pub mod catalog;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;

pub use catalog::{CatalogStore, WriteSummary};
pub use models::{CollectionRow, MediaRow};
