//! Metadata acquisition for ingestion requests.
//!
//! # Module layout
//!
//! - [`provider`] -- Trait definition, the normalized record, reference parsing.
//! - [`omdb`] -- The OMDb HTTP provider.
//! - [`covers`] -- Cover art download into `{covers_dir}/{ID}.png`.
//! - [`fetcher`] -- Lookup plus best-effort cover download.

pub mod covers;
pub mod fetcher;
pub mod omdb;
pub mod provider;

pub use covers::CoverStore;
pub use fetcher::{FetchedMetadata, MetadataFetcher};
pub use omdb::OmdbProvider;
pub use provider::{reference_id, MetadataProvider, MetadataRecord};
