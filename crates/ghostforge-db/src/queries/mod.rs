//! Database query modules.
//!
//! - collections: collection upsert and read-back
//! - media: media upsert, read-back, and per-collection listing

pub mod collections;
pub mod media;

use std::str::FromStr;

use ghostforge_common::Error;
use rusqlite::types::Type;

/// Read a text column and parse it into one of the catalog enums.
pub(crate) fn parse_column<T>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = Error>,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Encode an ordered genre list for a TEXT column.
pub(crate) fn encode_genres(genres: &[String]) -> ghostforge_common::Result<String> {
    serde_json::to_string(genres).map_err(|e| Error::internal(e.to_string()))
}

pub(crate) fn decode_genres(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}
