//! Collection database queries.

use ghostforge_common::{Error, Result};
use rusqlite::Connection;

use super::{decode_genres, encode_genres, parse_column};
use crate::models::CollectionRow;

/// Insert a collection or replace every column of the existing row.
///
/// The row is updated in place rather than deleted and re-inserted, so media
/// rows referencing it stay valid.
pub fn upsert_collection(conn: &Connection, row: &CollectionRow) -> Result<()> {
    let genres_json = encode_genres(&row.genres)?;

    conn.execute(
        "INSERT INTO collection (
            ID, collection_title, collection_description, collection_rating,
            collection_type, genres, producer, image_path, episode_count
         ) VALUES (
            :id, :title, :description, :rating,
            :collection_type, :genres, :producer, :image_path, :episode_count
         )
         ON CONFLICT(ID) DO UPDATE SET
            collection_title = :title,
            collection_description = :description,
            collection_rating = :rating,
            collection_type = :collection_type,
            genres = :genres,
            producer = :producer,
            image_path = :image_path,
            episode_count = :episode_count",
        rusqlite::named_params! {
            ":id": &row.id,
            ":title": &row.title,
            ":description": &row.description,
            ":rating": row.rating,
            ":collection_type": row.collection_type.as_str(),
            ":genres": genres_json,
            ":producer": &row.producer,
            ":image_path": &row.image_path,
            ":episode_count": row.episode_count,
        },
    )
    .map_err(|e| Error::database(format!("upsert collection {}: {}", row.id, e)))?;

    Ok(())
}

fn parse_collection_row(row: &rusqlite::Row) -> rusqlite::Result<CollectionRow> {
    let genres_json: String = row.get(5)?;
    Ok(CollectionRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        rating: row.get(3)?,
        collection_type: parse_column(row, 4)?,
        genres: decode_genres(&genres_json),
        producer: row.get(6)?,
        image_path: row.get(7)?,
        episode_count: row.get(8)?,
    })
}

/// Get a collection by ID.
pub fn get_collection(conn: &Connection, id: &str) -> Result<Option<CollectionRow>> {
    let result = conn.query_row(
        "SELECT ID, collection_title, collection_description, collection_rating,
                collection_type, genres, producer, image_path, episode_count
         FROM collection WHERE ID = :id",
        rusqlite::named_params! { ":id": id },
        parse_collection_row,
    );

    match result {
        Ok(row) => Ok(Some(row)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Count all collections.
pub fn count_collections(conn: &Connection) -> Result<u32> {
    conn.query_row("SELECT COUNT(*) FROM collection", [], |row| row.get(0))
        .map_err(|e| Error::database(e.to_string()))
}
