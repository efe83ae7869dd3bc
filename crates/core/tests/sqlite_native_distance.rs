//! Native ranking against a real SQLite database with sqlite-vec registered.
//!
//! Lives in its own test binary: the extension is registered process-wide, which would
//! leak into the unit tests that expect the probe to fail.

use content_intel_core::{
    ContentStore, SearchMode, SimilaritySearch, SqliteContentStore, EMBED_DIM,
};
use std::sync::Once;
use tempfile::{tempdir, TempDir};

fn register_sqlite_vec() {
    static REGISTER: Once = Once::new();
    REGISTER.call_once(|| unsafe {
        libsqlite3_sys::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite_vec::sqlite3_vec_init as *const (),
        )));
    });
}

async fn open_store() -> (SqliteContentStore, TempDir) {
    register_sqlite_vec();
    let dir = tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("pages.db").display());
    let store = SqliteContentStore::connect(&url, None).await.unwrap();
    store.init_schema().await.unwrap();
    (store, dir)
}

fn axis(index: usize, value: f32) -> Vec<f32> {
    let mut vector = vec![0.0; EMBED_DIM];
    vector[index] = value;
    vector
}

async fn seed(store: &SqliteContentStore) {
    store.upsert("far", "far away", 0, &axis(0, 3.0)).await.unwrap();
    store.upsert("tie-a", "tie a", 0, &axis(1, 1.0)).await.unwrap();
    store.upsert("tie-b", "tie b", 0, &axis(2, 1.0)).await.unwrap();
    store.upsert("exact", "exact match?", 1, &axis(3, 1.0)).await.unwrap();
}

#[tokio::test]
async fn probe_succeeds_with_extension_registered() {
    let (store, _dir) = open_store().await;
    store.probe_native_distance().await.unwrap();
}

#[tokio::test]
async fn nearest_orders_by_distance_then_insertion() {
    let (store, _dir) = open_store().await;
    seed(&store).await;

    let rows = store.nearest(&axis(3, 1.0), 3).await.unwrap();
    let urls = rows.iter().map(|row| row.url.as_str()).collect::<Vec<_>>();
    assert_eq!(urls, vec!["exact", "tie-a", "tie-b"]);
    assert_eq!(rows[0].distance, 0.0);
    assert!((rows[1].distance - std::f32::consts::SQRT_2).abs() < 1e-6);
    assert_eq!(rows[1].distance, rows[2].distance);
    assert_eq!(rows[0].quality_score, 1);
}

#[tokio::test]
async fn reupsert_keeps_tie_position() {
    let (store, _dir) = open_store().await;
    seed(&store).await;
    store
        .upsert("tie-a", "tie a, rewritten", 0, &axis(1, 1.0))
        .await
        .unwrap();

    let outcome = SimilaritySearch::new(&store)
        .search(&axis(3, 1.0), 3, None)
        .await
        .unwrap();
    assert_eq!(outcome.mode, SearchMode::Native);
    let urls = outcome
        .hits
        .iter()
        .map(|hit| hit.url.as_str())
        .collect::<Vec<_>>();
    assert_eq!(urls, vec!["exact", "tie-a", "tie-b"]);
    assert_eq!(outcome.hits[1].content.as_deref(), Some("tie a, rewritten"));
    assert_eq!(store.count().await.unwrap(), 4);
}
