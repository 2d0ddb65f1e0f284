//! The `fetch` workflow: folder list, every collection page, then the snapshot.

use crate::{
    config::DiscogsConfig,
    discogs::{
        CollectionPage, CollectionSnapshot, DEFAULT_MAX_ATTEMPTS, DiscogsClient, Folder,
        FolderList, Pagination, Release,
    },
    error::FetchError,
    pacer::{Clock, Pacer},
    snapshot::{COLLECTION_FILE, FOLDERS_FILE, SnapshotStore},
};
use chrono::Utc;
use serde_json::Value;
use std::{path::PathBuf, sync::Arc};
use tracing::{info, warn};

pub const PER_PAGE: u32 = 100;

#[derive(Debug, Clone)]
pub struct CollectedReleases {
    /// Metadata reported with page 1.
    pub pagination: Pagination,
    pub releases: Vec<Release>,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub releases: usize,
    pub output: PathBuf,
}

/// Picks the "All" folder (id 0), falling back to the first one listed.
pub fn resolve_folder(folders: &[Folder]) -> Result<&Folder, FetchError> {
    folders
        .iter()
        .find(|f| f.id == 0)
        .or_else(|| folders.first())
        .ok_or(FetchError::NoFolders)
}

/// Fetches every page of a folder sequentially, keeping page order.
pub async fn collect_releases(
    client: &DiscogsClient,
    pacer: &Pacer,
    config: &DiscogsConfig,
    folder_id: u64,
) -> Result<CollectedReleases, FetchError> {
    info!("Fetching collection page 1...");
    pacer.pace().await;
    let first: CollectionPage = client
        .fetch_json(
            &config.folder_releases_url(folder_id, PER_PAGE, 1),
            DEFAULT_MAX_ATTEMPTS,
        )
        .await?;

    let pagination = first.pagination.unwrap_or_default();
    let total_pages = pagination.total_pages();
    let total_items = pagination.total_items();
    info!(
        items = total_items,
        pages = total_pages,
        "Found {} items across {} pages",
        total_items,
        total_pages
    );

    let mut releases = first.releases;
    for page in 2..=total_pages {
        pacer.pace().await;
        info!("Fetching collection page {}/{}...", page, total_pages);
        let data: CollectionPage = client
            .fetch_json(
                &config.folder_releases_url(folder_id, PER_PAGE, page),
                DEFAULT_MAX_ATTEMPTS,
            )
            .await?;
        releases.extend(data.releases);
    }

    if pagination.items.is_some() && releases.len() as u64 != total_items {
        warn!(
            expected = total_items,
            fetched = releases.len(),
            "Collection size changed while fetching"
        );
    }

    Ok(CollectedReleases {
        pagination,
        releases,
    })
}

/// Mirrors the whole collection into `config.data_dir`.
///
/// `folders.json` is written as soon as it arrives; `collection.json` only
/// once every page has been fetched.
pub async fn run(config: &DiscogsConfig, clock: Arc<dyn Clock>) -> Result<RunSummary, FetchError> {
    info!(username = %config.username, "Fetching Discogs collection for user: {}", config.username);

    let client = DiscogsClient::new(config, clock.clone())?;
    let pacer = Pacer::discogs(clock);
    info!(interval_ms = pacer.interval().as_millis() as u64, "Pacing Discogs requests");
    let store = SnapshotStore::new(config.data_dir.clone());

    info!("Fetching collection folders...");
    pacer.pace().await;
    let folders_raw: Value = client
        .fetch_json(&config.folders_url(), DEFAULT_MAX_ATTEMPTS)
        .await?;
    store.write_json(FOLDERS_FILE, &folders_raw)?;

    let folder_list: FolderList = serde_json::from_value(folders_raw)?;
    let folder = resolve_folder(&folder_list.folders)?;
    info!(folder_id = folder.id, name = %folder.name, count = folder.count, "Using collection folder");

    let collected = collect_releases(&client, &pacer, config, folder.id).await?;

    let snapshot = CollectionSnapshot::new(collected.pagination, collected.releases, Utc::now());
    let output = store.write_json(COLLECTION_FILE, &snapshot)?;

    Ok(RunSummary {
        releases: snapshot.releases.len(),
        output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::pacer::manual::ManualClock;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FOLDERS_PATH: &str = "/users/crate_digger/collection/folders";

    fn folder(id: u64, name: &str, count: u64) -> Value {
        json!({"id": id, "name": name, "count": count})
    }

    fn page_body(page: u32, pages: u32, items: u64, ids: std::ops::Range<u64>) -> Value {
        let releases: Vec<Value> = ids.map(|id| json!({"id": id, "page": page})).collect();
        json!({
            "pagination": {"page": page, "pages": pages, "items": items, "per_page": 100},
            "releases": releases,
        })
    }

    async fn mount_folders(server: &MockServer, folders: Value) {
        Mock::given(method("GET"))
            .and(path(FOLDERS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"folders": folders})))
            .mount(server)
            .await;
    }

    async fn mount_page(server: &MockServer, folder_id: u64, page: u32, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("{}/{}/releases", FOLDERS_PATH, folder_id)))
            .and(query_param("per_page", "100"))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(server)
            .await;
    }

    async fn setup() -> (MockServer, TempDir, DiscogsConfig, Arc<ManualClock>) {
        let server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&server.uri(), temp_dir.path().join("data"));
        (server, temp_dir, config, ManualClock::new())
    }

    #[test]
    fn resolve_prefers_all_folder_anywhere_in_list() {
        let folders: Vec<Folder> = serde_json::from_value(json!([
            folder(12, "Jazz", 40),
            folder(0, "All", 90),
            folder(1, "Uncategorized", 50),
        ]))
        .unwrap();
        assert_eq!(resolve_folder(&folders).unwrap().id, 0);
    }

    #[test]
    fn resolve_falls_back_to_first_folder() {
        let folders: Vec<Folder> =
            serde_json::from_value(json!([folder(12, "Jazz", 40), folder(3, "Soul", 2)])).unwrap();
        assert_eq!(resolve_folder(&folders).unwrap().id, 12);
    }

    #[test]
    fn resolve_fails_on_empty_list() {
        assert!(matches!(resolve_folder(&[]), Err(FetchError::NoFolders)));
    }

    #[tokio::test]
    async fn collects_pages_in_order() {
        let (server, _temp_dir, config, clock) = setup().await;
        mount_page(&server, 0, 1, page_body(1, 3, 250, 0..100)).await;
        mount_page(&server, 0, 2, page_body(2, 3, 250, 100..200)).await;
        mount_page(&server, 0, 3, page_body(3, 3, 250, 200..250)).await;

        let client = DiscogsClient::new(&config, clock.clone()).unwrap();
        let pacer = Pacer::discogs(clock.clone());
        let collected = collect_releases(&client, &pacer, &config, 0).await.unwrap();

        assert_eq!(collected.releases.len(), 250);
        let ids: Vec<u64> = collected
            .releases
            .iter()
            .map(|r| r["id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, (0..250).collect::<Vec<_>>());
        assert_eq!(collected.pagination.page, Some(1), "metadata comes from page 1");
        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_millis(1200), Duration::from_millis(1200)],
            "no wait before page 1 or after the last page"
        );
    }

    #[tokio::test]
    async fn single_page_never_requests_page_two() {
        let (server, _temp_dir, config, clock) = setup().await;
        mount_page(&server, 0, 1, page_body(1, 1, 2, 0..2)).await;
        Mock::given(method("GET"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = DiscogsClient::new(&config, clock.clone()).unwrap();
        let pacer = Pacer::discogs(clock.clone());
        let collected = collect_releases(&client, &pacer, &config, 0).await.unwrap();

        assert_eq!(collected.releases.len(), 2);
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn missing_pagination_means_one_page() {
        let (server, _temp_dir, config, clock) = setup().await;
        mount_page(&server, 0, 1, json!({"releases": [{"id": 1}]})).await;

        let client = DiscogsClient::new(&config, clock.clone()).unwrap();
        let pacer = Pacer::discogs(clock);
        let collected = collect_releases(&client, &pacer, &config, 0).await.unwrap();

        assert_eq!(collected.releases, vec![json!({"id": 1})]);
        assert_eq!(collected.pagination, Pagination::default());
    }

    #[tokio::test]
    async fn run_writes_folders_and_collection() {
        let (server, _temp_dir, config, clock) = setup().await;
        mount_folders(&server, json!([folder(4, "Vinyl", 3), folder(0, "All", 150)])).await;
        mount_page(&server, 0, 1, page_body(1, 2, 150, 0..100)).await;
        mount_page(&server, 0, 2, page_body(2, 2, 150, 100..150)).await;

        let summary = run(&config, clock.clone()).await.unwrap();

        assert_eq!(summary.releases, 150);
        assert_eq!(summary.output, config.data_dir.join(COLLECTION_FILE));

        let store = SnapshotStore::new(config.data_dir.clone());
        let folders: Value =
            serde_json::from_str(&store.read_raw(FOLDERS_FILE).unwrap().unwrap()).unwrap();
        assert_eq!(folders["folders"][1]["name"], "All");

        let snapshot: CollectionSnapshot =
            serde_json::from_str(&store.read_raw(COLLECTION_FILE).unwrap().unwrap()).unwrap();
        assert_eq!(snapshot.releases.len(), 150);
        assert_eq!(snapshot.releases[0], json!({"id": 0, "page": 1}));
        assert_eq!(snapshot.releases[149], json!({"id": 149, "page": 2}));
        assert_eq!(snapshot.pagination.total_items(), 150);
        assert!(chrono::DateTime::parse_from_rfc3339(&snapshot.last_updated).is_ok());

        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_millis(1200), Duration::from_millis(1200)]
        );
    }

    #[tokio::test]
    async fn run_fails_on_empty_folder_list_before_paging() {
        let (server, _temp_dir, config, clock) = setup().await;
        mount_folders(&server, json!([])).await;
        Mock::given(method("GET"))
            .and(path_regex(r"/releases$"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = run(&config, clock).await.unwrap_err();

        assert!(matches!(err, FetchError::NoFolders));
        let store = SnapshotStore::new(config.data_dir.clone());
        assert!(store.read_raw(FOLDERS_FILE).unwrap().is_some());
        assert!(store.read_raw(COLLECTION_FILE).unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_page_leaves_only_folder_list() {
        let (server, _temp_dir, config, clock) = setup().await;
        mount_folders(&server, json!([folder(0, "All", 200)])).await;
        mount_page(&server, 0, 1, page_body(1, 2, 200, 0..100)).await;
        Mock::given(method("GET"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;

        let err = run(&config, clock).await.unwrap_err();

        assert!(matches!(err, FetchError::RequestFailed { status: 502, .. }));
        let store = SnapshotStore::new(config.data_dir.clone());
        assert!(store.read_raw(FOLDERS_FILE).unwrap().is_some());
        assert!(store.read_raw(COLLECTION_FILE).unwrap().is_none());
    }
}
