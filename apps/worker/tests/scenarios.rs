// [apps/worker/tests/scenarios.rs]
//! End-to-end scenarios from spec §8, each spinning up real `pod` and
//! `origin` servers in-process against a real Redis. Set `REDIS_TEST_URL`
//! to run these; they are silently skipped otherwise.

use podcache_core_coordination::CoordinationStore;
use podcache_pod_lib::state::{AppState, FillLocks};
use podcache_worker_lib::{download_logical_path, Outcome};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::TempDir;
use tower_http::services::ServeDir;
use uuid::Uuid;

fn now_secs() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs_f64()
}

async fn store() -> Option<CoordinationStore> {
    let url = std::env::var("REDIS_TEST_URL").ok()?;
    Some(CoordinationStore::connect(&url).await.expect("connect to REDIS_TEST_URL"))
}

fn unique_path(label: &str) -> String {
    format!("scenario/{label}/{}.pkg", Uuid::new_v4())
}

/// Spawns a plain static file server over `root`, returning its base URL.
async fn spawn_origin(root: PathBuf) -> String {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let app = axum::Router::new().fallback_service(ServeDir::new(root));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{port}")
}

/// Spawns a pod server with the given capacity, registers it in the
/// store, and returns its pod id.
async fn spawn_pod(store: &CoordinationStore, origin: &str, max_conns: u32) -> (String, TempDir) {
    let cache_dir = TempDir::new().unwrap();
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let state = AppState {
        cache_dir: cache_dir.path().to_path_buf(),
        origin: origin.to_string(),
        store: store.clone(),
        pod_id: format!("127.0.0.1:{port}"),
        http_client: reqwest::Client::new(),
        fill_locks: FillLocks::default(),
    };
    let pod_id = state.pod_id.clone();
    let descriptor = state.descriptor("127.0.0.1", port, max_conns, now_secs());

    let mut registering = store.clone();
    registering.heartbeat(&descriptor, now_secs()).await.unwrap();

    let router = podcache_pod_lib::router(state);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    // Give the listener a moment to accept connections.
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    (pod_id, cache_dir)
}

#[tokio::test]
async fn a_first_download_seeds_the_digest() {
    let Some(mut store) = store().await else { return };
    let origin_dir = TempDir::new().unwrap();
    let logical_path = unique_path("first");
    tokio::fs::write(origin_dir.path().join(&logical_path), b"hello\n").await.unwrap();
    let origin_url = spawn_origin(origin_dir.path().to_path_buf()).await;
    let (_pod_id, _guard) = spawn_pod(&store, &origin_url, 2).await;

    let dest = TempDir::new().unwrap();
    let dest_path = dest.path().join("downloaded.pkg");
    let client = reqwest::Client::new();

    let outcome = download_logical_path(&mut store, &client, &logical_path, &dest_path, &origin_url)
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Success));

    let digest = store.digest(&logical_path).await.unwrap().unwrap();
    assert_eq!(digest.len(), 64);
    let members = store.preheat_members(&logical_path).await.unwrap();
    assert_eq!(members.len(), 1);
}

#[tokio::test]
async fn b_second_worker_reuses_the_recorded_digest() {
    let Some(mut store) = store().await else { return };
    let origin_dir = TempDir::new().unwrap();
    let logical_path = unique_path("second");
    tokio::fs::write(origin_dir.path().join(&logical_path), b"hello\n").await.unwrap();
    let origin_url = spawn_origin(origin_dir.path().to_path_buf()).await;
    let (_pod_id, _guard) = spawn_pod(&store, &origin_url, 2).await;
    let client = reqwest::Client::new();

    let dest_a = TempDir::new().unwrap();
    let outcome_a = download_logical_path(
        &mut store,
        &client,
        &logical_path,
        &dest_a.path().join("a.pkg"),
        &origin_url,
    )
    .await
    .unwrap();
    assert!(matches!(outcome_a, Outcome::Success));
    let digest_before = store.digest(&logical_path).await.unwrap().unwrap();

    let dest_b = TempDir::new().unwrap();
    let outcome_b = download_logical_path(
        &mut store,
        &client,
        &logical_path,
        &dest_b.path().join("b.pkg"),
        &origin_url,
    )
    .await
    .unwrap();
    assert!(matches!(outcome_b, Outcome::Success));
    let digest_after = store.digest(&logical_path).await.unwrap().unwrap();
    assert_eq!(digest_before, digest_after);
}

#[tokio::test]
async fn c_capacity_is_enforced_and_the_loser_falls_back_to_origin() {
    let Some(store) = store().await else { return };
    let origin_dir = TempDir::new().unwrap();
    let path_a = unique_path("cap-a");
    let path_b = unique_path("cap-b");
    tokio::fs::write(origin_dir.path().join(&path_a), b"one\n").await.unwrap();
    tokio::fs::write(origin_dir.path().join(&path_b), b"two\n").await.unwrap();
    let origin_url = spawn_origin(origin_dir.path().to_path_buf()).await;
    let (_pod_id, _guard) = spawn_pod(&store, &origin_url, 1).await;

    let dest = TempDir::new().unwrap();
    let client = reqwest::Client::new();

    let mut store_a = store.clone();
    let client_a = client.clone();
    let dest_a = dest.path().join("a.pkg");
    let origin_a = origin_url.clone();
    let path_a_clone = path_a.clone();
    let task_a = tokio::spawn(async move {
        download_logical_path(&mut store_a, &client_a, &path_a_clone, &dest_a, &origin_a).await
    });

    let mut store_b = store.clone();
    let client_b = client.clone();
    let dest_b = dest.path().join("b.pkg");
    let origin_b = origin_url.clone();
    let path_b_clone = path_b.clone();
    let task_b = tokio::spawn(async move {
        download_logical_path(&mut store_b, &client_b, &path_b_clone, &dest_b, &origin_b).await
    });

    let result_a = task_a.await.unwrap().unwrap();
    let result_b = task_b.await.unwrap().unwrap();
    assert!(matches!(result_a, Outcome::Success));
    assert!(matches!(result_b, Outcome::Success));
}

#[tokio::test]
async fn d_replica_set_is_bounded_and_enforced_at_pod_ingress() {
    let Some(store) = store().await else { return };
    let origin_dir = TempDir::new().unwrap();
    let logical_path = unique_path("replica");
    tokio::fs::write(origin_dir.path().join(&logical_path), b"replicated\n").await.unwrap();
    let origin_url = spawn_origin(origin_dir.path().to_path_buf()).await;

    let mut pods = Vec::new();
    for _ in 0..5 {
        pods.push(spawn_pod(&store, &origin_url, 2).await);
    }

    let client = reqwest::Client::new();
    for _ in 0..3 {
        let mut worker_store = store.clone();
        let dest = TempDir::new().unwrap();
        let outcome = download_logical_path(
            &mut worker_store,
            &client,
            &logical_path,
            &dest.path().join("r.pkg"),
            &origin_url,
        )
        .await
        .unwrap();
        assert!(matches!(outcome, Outcome::Success));
    }

    let mut store = store;
    let members = store.preheat_members(&logical_path).await.unwrap();
    assert!(members.len() <= 2);

    for (pod_id, _guard) in &pods {
        let descriptor = store.descriptor(pod_id).await.unwrap().unwrap();
        let url = format!("{}/files/{}", descriptor.base_url(), logical_path);
        let response = client.get(&url).send().await.unwrap();
        if members.contains(pod_id) {
            assert_eq!(response.status(), 200);
        } else {
            assert_eq!(response.status(), 425);
        }
    }
}

#[tokio::test]
async fn f_digest_mismatch_is_reported_and_file_preserved() {
    let Some(mut store) = store().await else { return };
    let origin_dir = TempDir::new().unwrap();
    let logical_path = unique_path("corrupt");
    tokio::fs::write(origin_dir.path().join(&logical_path), b"hello\n").await.unwrap();
    let origin_url = spawn_origin(origin_dir.path().to_path_buf()).await;
    let (_pod_id, _guard) = spawn_pod(&store, &origin_url, 2).await;

    let wrong_digest = "0".repeat(64);
    assert!(store.set_digest_if_absent(&logical_path, &wrong_digest).await.unwrap());

    let dest = TempDir::new().unwrap();
    let dest_path = dest.path().join("corrupt.pkg");
    let client = reqwest::Client::new();

    let outcome = download_logical_path(&mut store, &client, &logical_path, &dest_path, &origin_url)
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::DigestMismatch));
    assert!(dest_path.exists());

    let recorded = store.digest(&logical_path).await.unwrap().unwrap();
    assert_eq!(recorded, wrong_digest);
}
