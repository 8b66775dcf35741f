//! Integration tests for series ingestion.

mod common;

use assert_matches::assert_matches;
use common::{omdb_title, TestHarness};
use ghostforge::catalog::IngestRequest;
use ghostforge::ItemOutcome;
use ghostforge_common::{CollectionType, ContentId, Error, MediaKind};
use serde_json::json;
use tokio_util::sync::CancellationToken;

const SERIES_URL: &str = "https://www.imdb.com/title/tt0903747/";

fn series_request(h: &TestHarness, dir: &str, episode_references: Vec<String>) -> IngestRequest {
    IngestRequest::Series {
        source: h.media.path().join(dir),
        reference: SERIES_URL.into(),
        episode_references,
    }
}

async fn mount_series(h: &TestHarness) {
    h.mount_title("tt0903747", omdb_title("Breaking Bad", "9.5", "Crime, Drama", None))
        .await;
}

#[tokio::test]
async fn two_seasons_end_to_end() {
    let h = TestHarness::new().await;
    mount_series(&h).await;
    h.touch("Breaking Bad/Season 1/01 Pilot [1080p].mkv");
    h.touch("Breaking Bad/Season 1/02 Cat's in the Bag.mkv");
    h.touch("Breaking Bad/Season 2/01 Seven Thirty-Seven.mkv");

    let report = h
        .pipeline()
        .run(&series_request(&h, "Breaking Bad", vec![]), &CancellationToken::new())
        .await
        .unwrap();

    let series_id = ContentId::derive("Breaking Bad");
    assert_eq!(report.catalog_id, series_id);
    assert_eq!((report.collections_written, report.media_written), (1, 3));

    let collection = h.store.get_collection(series_id.as_str()).unwrap().unwrap();
    assert_eq!(collection.collection_type, CollectionType::Serie);
    assert_eq!(collection.episode_count, Some(3));
    assert_eq!(collection.rating, Some(9.5));
    assert_eq!(collection.genres, vec!["Crime", "Drama"]);

    let episodes = h.store.list_media_for_collection(series_id.as_str()).unwrap();
    let numbering: Vec<_> = episodes
        .iter()
        .map(|e| (e.season, e.episode, e.title.as_str()))
        .collect();
    assert_eq!(
        numbering,
        vec![
            (Some(1), Some(1), "01 Pilot"),
            (Some(1), Some(2), "02 Cat's in the Bag"),
            (Some(2), Some(1), "01 Seven Thirty-Seven"),
        ]
    );
    for episode in &episodes {
        assert_eq!(episode.kind, MediaKind::Episode);
        assert_eq!(episode.collection_id.as_deref(), Some(series_id.as_str()));
        assert_eq!(episode.genres, None);
        assert_eq!(episode.rating, Some(9.5));
        assert_eq!(episode.description.as_deref(), Some("Breaking Bad plot."));
        assert_eq!(episode.producer.as_deref(), Some("Vince Gilligan"));
        assert_eq!(episode.id, ContentId::scoped("Breaking Bad", &episode.title).to_string());
    }
    assert_eq!(h.store.counts().unwrap(), (1, 3));

    assert_eq!(report.items.len(), 3);
    for item in &report.items {
        assert_eq!(item.transcode, ItemOutcome::Completed);
        let manifest = h
            .chunks()
            .join(item.media_id.as_str())
            .join(format!("{}.mpd", item.media_id));
        assert!(manifest.exists(), "missing {}", manifest.display());
    }
}

#[tokio::test]
async fn episodes_numbered_in_lexicographic_order() {
    let h = TestHarness::new().await;
    mount_series(&h).await;
    for name in ["b", "a", "c"] {
        h.touch(&format!("Show/Season 1/{name}"));
    }

    h.pipeline()
        .run(&series_request(&h, "Show", vec![]), &CancellationToken::new())
        .await
        .unwrap();

    let episodes = h
        .store
        .list_media_for_collection(ContentId::derive("Breaking Bad").as_str())
        .unwrap();
    let numbering: Vec<_> = episodes
        .iter()
        .map(|e| (e.episode, e.title.as_str()))
        .collect();
    assert_eq!(numbering, vec![(Some(1), "a"), (Some(2), "b"), (Some(3), "c")]);
}

#[tokio::test]
async fn reingesting_replaces_rows_and_skips_encodes() {
    let h = TestHarness::new().await;
    mount_series(&h).await;
    h.touch("BB/S1/e1.mkv");
    h.touch("BB/S1/e2.mkv");
    let request = series_request(&h, "BB", vec![]);
    let series_id = ContentId::derive("Breaking Bad");

    let pipeline = h.pipeline();
    pipeline.run(&request, &CancellationToken::new()).await.unwrap();
    let collection_before = h.store.get_collection(series_id.as_str()).unwrap();
    let episodes_before = h.store.list_media_for_collection(series_id.as_str()).unwrap();

    let second = pipeline.run(&request, &CancellationToken::new()).await.unwrap();

    assert_eq!(h.store.get_collection(series_id.as_str()).unwrap(), collection_before);
    assert_eq!(
        h.store.list_media_for_collection(series_id.as_str()).unwrap(),
        episodes_before
    );
    assert_eq!(h.store.counts().unwrap(), (1, 2));

    assert_eq!(h.runner.encode_count(), 2);
    for item in &second.items {
        assert_eq!(item.transcode, ItemOutcome::skipped("output already present"));
        assert_eq!(item.subtitles, ItemOutcome::Completed);
    }
}

#[tokio::test]
async fn per_episode_references() {
    let h = TestHarness::new().await;
    mount_series(&h).await;
    let poster = h.mount_poster("/posters/pilot.jpg", b"pilot-cover").await;
    h.mount_title(
        "tt0959621",
        json!({
            "Title": "Pilot", "Year": "2008", "Season": "1", "Episode": "1",
            "Plot": "Walt's first cook.", "imdbRating": "9.0", "Genre": "Crime",
            "Poster": poster, "Response": "True"
        }),
    )
    .await;
    h.mount_title(
        "tt1054724",
        json!({
            "Title": "Cat's in the Bag...", "Year": "2008", "Season": "1", "Episode": "2",
            "imdbRating": "N/A", "Response": "True"
        }),
    )
    .await;
    h.touch("BB/Season 1/x1.mkv");
    h.touch("BB/Season 1/x2.mkv");

    let request = series_request(
        &h,
        "BB",
        vec![
            "https://www.imdb.com/title/tt0959621/".into(),
            "https://www.imdb.com/title/tt1054724/".into(),
        ],
    );
    h.pipeline().run(&request, &CancellationToken::new()).await.unwrap();

    let pilot_id = ContentId::scoped("Breaking Bad", "Pilot");
    let pilot = h.store.get_media(pilot_id.as_str()).unwrap().unwrap();
    assert_eq!(pilot.rating, Some(9.0));
    assert_eq!(pilot.description.as_deref(), Some("Walt's first cook."));

    let cover = h.covers().join(format!("{pilot_id}.png"));
    assert_eq!(std::fs::read(&cover).unwrap(), b"pilot-cover");
    assert_eq!(pilot.image_path.as_deref(), Some(cover.to_string_lossy().as_ref()));

    let second = h
        .store
        .get_media(ContentId::scoped("Breaking Bad", "Cat's in the Bag...").as_str())
        .unwrap()
        .unwrap();
    assert_eq!((second.season, second.episode), (Some(1), Some(2)));
    // falls back to the series rating
    assert_eq!(second.rating, Some(9.5));
}

#[tokio::test]
async fn episode_reference_count_mismatch_is_rejected() {
    let h = TestHarness::new().await;
    mount_series(&h).await;
    h.touch("BB/S1/e1.mkv");
    h.touch("BB/S1/e2.mkv");

    let err = h
        .pipeline()
        .run(
            &series_request(&h, "BB", vec!["tt0959621".into()]),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_matches!(err, Error::Validation(_));
    assert_eq!(h.store.counts().unwrap(), (0, 0));
    assert!(h.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn provider_not_found_aborts_without_writes() {
    let h = TestHarness::new().await;
    h.mount_title(
        "tt0903747",
        json!({"Response": "False", "Error": "Incorrect IMDb ID."}),
    )
    .await;
    h.touch("BB/S1/e1.mkv");

    let err = h
        .pipeline()
        .run(&series_request(&h, "BB", vec![]), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_matches!(err, Error::NotFound(ref msg) if msg.contains("tt0903747"));
    assert_eq!(h.store.counts().unwrap(), (0, 0));
    assert_eq!(h.runner.encode_count(), 0);
}

#[tokio::test]
async fn empty_series_directory_is_rejected() {
    let h = TestHarness::new().await;
    mount_series(&h).await;
    std::fs::create_dir_all(h.media.path().join("Empty/Season 1")).unwrap();

    let err = h
        .pipeline()
        .run(&series_request(&h, "Empty", vec![]), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_matches!(err, Error::Validation(_));
}
