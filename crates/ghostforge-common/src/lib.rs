//! Ghostforge-Common: Shared types, identifiers, and utilities.
//!
//! This crate provides common functionality used across ghostforge:
//!
//! - **Content IDs**: SHA-1 identifiers derived from titles, so re-ingestion is idempotent
//! - **Catalog records**: Tagged movie / episode / collection variants
//! - **Path Utilities**: Episode discovery filters and title cleanup
//! - **Error Handling**: The ingestion error taxonomy and result alias
//!
//! # Examples
//!
//! ```
//! use ghostforge_common::{ContentId, ResolutionCategory};
//!
//! let id = ContentId::scoped("Breaking Bad", "Pilot");
//! assert_eq!(id.as_str().len(), 40);
//!
//! assert_eq!(ResolutionCategory::classify(1920, 1080), ResolutionCategory::FullHd);
//! ```

pub mod error;
pub mod ids;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
