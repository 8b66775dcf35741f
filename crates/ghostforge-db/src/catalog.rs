//! Transactional catalog writer.
//!
//! [`CatalogStore`] is the only way ingestion touches the database. Every
//! write is validated up front, runs in one transaction, and holds a per-ID
//! lock so two ingestions of the same collection or movie cannot interleave.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use ghostforge_common::{CatalogEntry, Error, Result};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::models::{CollectionRow, MediaRow};
use crate::pool::{get_conn, DbPool};
use crate::queries::{collections, media};

/// Counts of rows written by one catalog operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub collections: usize,
    pub media: usize,
}

/// Catalog writer backed by a connection pool.
#[derive(Clone)]
pub struct CatalogStore {
    pool: DbPool,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl CatalogStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            locks: Arc::new(DashMap::new()),
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    fn lock_for(&self, id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run `f` holding the locks of `ids`, which must be sorted and unique.
    ///
    /// A lock nobody else holds or waits for is dropped from the map afterwards.
    fn with_locks<T>(&self, ids: &[&str], f: impl FnOnce() -> Result<T>) -> Result<T> {
        let locks: Vec<_> = ids.iter().map(|id| self.lock_for(id)).collect();
        let result = {
            let _guards: Vec<_> = locks.iter().map(|l| l.lock()).collect();
            f()
        };
        drop(locks);
        for id in ids {
            self.locks.remove_if(*id, |_, lock| Arc::strong_count(lock) == 1);
        }
        result
    }

    /// Write a collection and the media that reference it in one transaction.
    ///
    /// Every media row must point at `collection`. If any row fails, nothing
    /// from the batch is kept.
    pub fn upsert_collection(
        &self,
        collection: &CollectionRow,
        members: &[MediaRow],
    ) -> Result<WriteSummary> {
        collection.validate()?;
        for row in members {
            row.validate()?;
            if row.collection_id.as_deref() != Some(collection.id.as_str()) {
                return Err(Error::validation(format!(
                    "media {} ({}) does not belong to collection {}",
                    row.id, row.title, collection.id
                )));
            }
        }

        self.with_locks(&[collection.id.as_str()], || {
            let mut conn = get_conn(&self.pool)?;
            let tx = conn
                .transaction()
                .map_err(|e| Error::database(format!("begin transaction: {}", e)))?;

            collections::upsert_collection(&tx, collection)?;
            for row in members {
                media::upsert_media(&tx, row)?;
            }

            tx.commit().map_err(|e| {
                Error::database(format!("commit collection {}: {}", collection.id, e))
            })
        })?;

        // rows sharing an ID replace each other
        let distinct = members
            .iter()
            .map(|r| r.id.as_str())
            .collect::<HashSet<_>>()
            .len();
        info!(
            collection_id = %collection.id,
            title = %collection.title,
            media = distinct,
            "Collection persisted"
        );

        Ok(WriteSummary {
            collections: 1,
            media: distinct,
        })
    }

    /// Write standalone media rows in one transaction.
    pub fn upsert_media(&self, rows: &[MediaRow]) -> Result<WriteSummary> {
        for row in rows {
            row.validate()?;
        }

        // Sorted and deduplicated so concurrent callers acquire locks in the same order.
        let mut ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        self.with_locks(&ids, || {
            let mut conn = get_conn(&self.pool)?;
            let tx = conn
                .transaction()
                .map_err(|e| Error::database(format!("begin transaction: {}", e)))?;

            for row in rows {
                media::upsert_media(&tx, row)?;
            }

            tx.commit()
                .map_err(|e| Error::database(format!("commit media: {}", e)))
        })?;

        debug!(count = ids.len(), "Media persisted");

        Ok(WriteSummary {
            collections: 0,
            media: ids.len(),
        })
    }

    /// Persist everything a normalized ingestion produced.
    pub fn persist(&self, entry: &CatalogEntry) -> Result<WriteSummary> {
        match entry {
            CatalogEntry::Movie(movie) => self.upsert_media(&[MediaRow::from_movie(movie, None)]),
            CatalogEntry::Series {
                collection,
                episodes,
            } => {
                let rows: Vec<_> = episodes
                    .iter()
                    .map(|e| MediaRow::from_episode(e, &collection.id))
                    .collect();
                self.upsert_collection(&CollectionRow::from_series(collection), &rows)
            }
            CatalogEntry::MovieSet { collection, movies } => {
                let rows: Vec<_> = movies
                    .iter()
                    .map(|m| MediaRow::from_movie(m, Some(&collection.id)))
                    .collect();
                self.upsert_collection(&CollectionRow::from_movie_set(collection), &rows)
            }
        }
    }

    pub fn get_collection(&self, id: &str) -> Result<Option<CollectionRow>> {
        let conn = get_conn(&self.pool)?;
        collections::get_collection(&conn, id)
    }

    pub fn get_media(&self, id: &str) -> Result<Option<MediaRow>> {
        let conn = get_conn(&self.pool)?;
        media::get_media(&conn, id)
    }

    pub fn list_media_for_collection(&self, collection_id: &str) -> Result<Vec<MediaRow>> {
        let conn = get_conn(&self.pool)?;
        media::list_media_for_collection(&conn, collection_id)
    }

    /// Number of `(collection, media)` rows currently stored.
    pub fn counts(&self) -> Result<(u32, u32)> {
        let conn = get_conn(&self.pool)?;
        Ok((
            collections::count_collections(&conn)?,
            media::count_media(&conn)?,
        ))
    }
}
