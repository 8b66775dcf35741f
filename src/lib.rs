//! Ghostforge - media catalog ingestion
//!
//! This library crate exposes the ingestion pipeline for the binary and for
//! integration testing:
//!
//! - [`config`] -- TOML configuration threaded into every component
//! - [`metadata`] -- provider lookups and cover art
//! - [`catalog`] -- requests and their normalization into catalog records
//! - [`ingest`] -- the batch pipeline and its report

pub mod catalog;
pub mod config;
pub mod ingest;
pub mod metadata;

pub use catalog::{CatalogNormalizer, IngestRequest};
pub use ingest::{BatchReport, IngestPipeline, ItemOutcome, ItemReport};
