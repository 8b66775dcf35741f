//! Media database queries.

use ghostforge_common::{Error, Result};
use rusqlite::Connection;

use super::{decode_genres, encode_genres, parse_column};
use crate::models::MediaRow;

const MEDIA_COLUMNS: &str = "ID, title, year, description, producer, rating, season, episode,
                resolution, image_path, genres, type, collection_id";

/// Insert a media row or replace every column of the existing row.
pub fn upsert_media(conn: &Connection, row: &MediaRow) -> Result<()> {
    let genres_json = row.genres.as_deref().map(encode_genres).transpose()?;

    conn.execute(
        "INSERT INTO media (
            ID, title, year, description, producer, rating, season, episode,
            resolution, image_path, genres, type, collection_id
         ) VALUES (
            :id, :title, :year, :description, :producer, :rating, :season, :episode,
            :resolution, :image_path, :genres, :type, :collection_id
         )
         ON CONFLICT(ID) DO UPDATE SET
            title = :title,
            year = :year,
            description = :description,
            producer = :producer,
            rating = :rating,
            season = :season,
            episode = :episode,
            resolution = :resolution,
            image_path = :image_path,
            genres = :genres,
            type = :type,
            collection_id = :collection_id",
        rusqlite::named_params! {
            ":id": &row.id,
            ":title": &row.title,
            ":year": row.year,
            ":description": &row.description,
            ":producer": &row.producer,
            ":rating": row.rating,
            ":season": row.season,
            ":episode": row.episode,
            ":resolution": row.resolution.as_str(),
            ":image_path": &row.image_path,
            ":genres": genres_json,
            ":type": row.kind.as_str(),
            ":collection_id": &row.collection_id,
        },
    )
    .map_err(|e| Error::database(format!("upsert media {} ({}): {}", row.id, row.title, e)))?;

    Ok(())
}

fn parse_media_row(row: &rusqlite::Row) -> rusqlite::Result<MediaRow> {
    let genres_json: Option<String> = row.get(10)?;
    Ok(MediaRow {
        id: row.get(0)?,
        title: row.get(1)?,
        year: row.get(2)?,
        description: row.get(3)?,
        producer: row.get(4)?,
        rating: row.get(5)?,
        season: row.get(6)?,
        episode: row.get(7)?,
        resolution: parse_column(row, 8)?,
        image_path: row.get(9)?,
        genres: genres_json.as_deref().map(decode_genres),
        kind: parse_column(row, 11)?,
        collection_id: row.get(12)?,
    })
}

/// Get a media row by ID.
pub fn get_media(conn: &Connection, id: &str) -> Result<Option<MediaRow>> {
    let result = conn.query_row(
        &format!("SELECT {MEDIA_COLUMNS} FROM media WHERE ID = :id"),
        rusqlite::named_params! { ":id": id },
        parse_media_row,
    );

    match result {
        Ok(row) => Ok(Some(row)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List the media owned by a collection, in season/episode order.
///
/// Movie-set members have no season or episode and sort by title.
pub fn list_media_for_collection(conn: &Connection, collection_id: &str) -> Result<Vec<MediaRow>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {MEDIA_COLUMNS} FROM media
             WHERE collection_id = :collection_id
             ORDER BY season, episode, title"
        ))
        .map_err(|e| Error::database(e.to_string()))?;

    let rows = stmt
        .query_map(
            rusqlite::named_params! { ":collection_id": collection_id },
            parse_media_row,
        )
        .map_err(|e| Error::database(e.to_string()))?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::database(e.to_string()))
}

/// Count all media rows.
pub fn count_media(conn: &Connection) -> Result<u32> {
    conn.query_row("SELECT COUNT(*) FROM media", [], |row| row.get(0))
        .map_err(|e| Error::database(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CollectionRow;
    use crate::pool::init_memory_pool;
    use crate::queries::collections::upsert_collection;
    use ghostforge_common::{CollectionType, MediaKind, ResolutionCategory};

    fn show(conn: &Connection) -> String {
        let row = CollectionRow {
            id: "show".to_string(),
            title: "Show".to_string(),
            description: None,
            rating: None,
            collection_type: CollectionType::Serie,
            genres: vec![],
            producer: None,
            image_path: None,
            episode_count: Some(3),
        };
        upsert_collection(conn, &row).unwrap();
        row.id
    }

    fn episode(collection: &str, season: u32, number: u32) -> MediaRow {
        MediaRow {
            id: format!("{collection}-s{season}e{number}"),
            title: format!("Episode {number}"),
            year: Some(2008),
            description: Some("An episode".to_string()),
            producer: None,
            rating: Some(8.0),
            season: Some(season),
            episode: Some(number),
            resolution: ResolutionCategory::FullHd,
            image_path: None,
            genres: None,
            kind: MediaKind::Episode,
            collection_id: Some(collection.to_string()),
        }
    }

    #[test]
    fn test_upsert_media() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let collection = show(&conn);

        let row = episode(&collection, 1, 1);
        upsert_media(&conn, &row).unwrap();

        let found = get_media(&conn, &row.id).unwrap().unwrap();
        assert_eq!(found, row);
    }

    #[test]
    fn test_standalone_movie_genres_round_trip() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let row = MediaRow {
            id: "heat".to_string(),
            title: "Heat".to_string(),
            year: Some(1995),
            description: None,
            producer: Some("Michael Mann".to_string()),
            rating: Some(8.3),
            season: None,
            episode: None,
            resolution: ResolutionCategory::Undefined,
            image_path: None,
            genres: Some(vec!["Crime".to_string(), "Drama".to_string()]),
            kind: MediaKind::Movie,
            collection_id: None,
        };
        upsert_media(&conn, &row).unwrap();

        let found = get_media(&conn, "heat").unwrap().unwrap();
        assert_eq!(found.genres, row.genres);
        assert_eq!(found.resolution, ResolutionCategory::Undefined);
    }

    #[test]
    fn test_upsert_replaces_instead_of_merging() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let collection = show(&conn);

        let row = episode(&collection, 1, 1);
        upsert_media(&conn, &row).unwrap();

        let replacement = MediaRow {
            description: None,
            rating: None,
            resolution: ResolutionCategory::Hd,
            ..row.clone()
        };
        upsert_media(&conn, &replacement).unwrap();

        let found = get_media(&conn, &row.id).unwrap().unwrap();
        assert_eq!(found.description, None);
        assert_eq!(found.rating, None);
        assert_eq!(found.resolution, ResolutionCategory::Hd);
        assert_eq!(count_media(&conn).unwrap(), 1);
    }

    #[test]
    fn test_list_media_for_collection_is_ordered() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let collection = show(&conn);

        for (season, number) in [(2, 1), (1, 2), (1, 1)] {
            upsert_media(&conn, &episode(&collection, season, number)).unwrap();
        }

        let listed = list_media_for_collection(&conn, &collection).unwrap();
        let order: Vec<_> = listed
            .iter()
            .map(|m| (m.season.unwrap(), m.episode.unwrap()))
            .collect();
        assert_eq!(order, vec![(1, 1), (1, 2), (2, 1)]);
    }

    #[test]
    fn test_missing_collection_is_a_database_error() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let err = upsert_media(&conn, &episode("ghost", 1, 1)).unwrap_err();
        assert!(matches!(err, Error::Database(_)));
    }
}
