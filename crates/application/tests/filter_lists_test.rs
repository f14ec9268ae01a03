use oxiguard_application::ports::FilterStorePort;
use oxiguard_application::use_cases::{
    AddFilterUseCase, GetFiltersUseCase, RefreshFiltersUseCase, RemoveFilterUseCase,
    UpdateFilterUseCase,
};
use oxiguard_domain::{DomainError, ModifyStatus, UpdateEvent};
use std::sync::Arc;
use tempfile::TempDir;

mod helpers;
use helpers::MockFilterStore;

fn make_store() -> (TempDir, Arc<MockFilterStore>) {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MockFilterStore::new(dir.path().to_path_buf()));
    (dir, store)
}

#[tokio::test]
async fn test_add_success_notifies_consumers() {
    let (_dir, store) = make_store();
    let use_case = AddFilterUseCase::new(store.clone());

    let filter = use_case
        .execute(
            "Ads".to_string(),
            "https://example.com/ads.txt".to_string(),
        )
        .await
        .unwrap();

    assert!(filter.enabled);
    assert!(filter.rule_count > 0);
    assert_eq!(store.count().await, 1);
    assert_eq!(
        store.events(),
        vec![UpdateEvent::BeforeUpdate, UpdateEvent::AfterUpdate]
    );
}

#[tokio::test]
async fn test_add_empty_name_rejected() {
    let (_dir, store) = make_store();
    let use_case = AddFilterUseCase::new(store.clone());

    let result = use_case
        .execute(String::new(), "https://example.com/a.txt".to_string())
        .await;

    match result.unwrap_err() {
        DomainError::InvalidFilterList(_) => {}
        other => panic!("Expected InvalidFilterList, got {other:?}"),
    }
    assert_eq!(store.count().await, 0);
    assert!(store.events().is_empty());
}

#[tokio::test]
async fn test_add_bad_scheme_rejected() {
    let (_dir, store) = make_store();
    let use_case = AddFilterUseCase::new(store);

    let result = use_case
        .execute("FTP list".to_string(), "ftp://example.com/a.txt".to_string())
        .await;

    assert!(matches!(result, Err(DomainError::InvalidFilterList(_))));
}

#[tokio::test]
async fn test_add_missing_local_file_rejected() {
    let (_dir, store) = make_store();
    let use_case = AddFilterUseCase::new(store);

    let result = use_case
        .execute(
            "Local".to_string(),
            "/nonexistent/oxiguard/list.txt".to_string(),
        )
        .await;

    assert!(matches!(result, Err(DomainError::InvalidFilterList(_))));
}

#[tokio::test]
async fn test_add_duplicate_surfaced() {
    let (_dir, store) = make_store();
    let use_case = AddFilterUseCase::new(store);

    use_case
        .execute("Ads".to_string(), "https://example.com/a.txt".to_string())
        .await
        .unwrap();
    let result = use_case
        .execute("Ads 2".to_string(), "https://example.com/a.txt".to_string())
        .await;

    assert!(matches!(result, Err(DomainError::DuplicateFilter(_))));
}

#[tokio::test]
async fn test_add_download_failure_surfaced() {
    let (_dir, store) = make_store();
    let use_case = AddFilterUseCase::new(store.clone());
    store.set_fail_downloads(true);

    let result = use_case
        .execute("Ads".to_string(), "https://example.com/a.txt".to_string())
        .await;

    assert!(matches!(result, Err(DomainError::Network(_))));
    assert!(store.events().is_empty());
}

#[tokio::test]
async fn test_remove_unlinks_file_and_notifies() {
    let (_dir, store) = make_store();
    let add = AddFilterUseCase::new(store.clone());
    let remove = RemoveFilterUseCase::new(store.clone());

    let filter = add
        .execute("Ads".to_string(), "https://example.com/a.txt".to_string())
        .await
        .unwrap();
    let path = filter.path.clone().unwrap();
    assert!(path.exists());

    let removed = remove.execute("https://example.com/a.txt").await.unwrap();

    assert_eq!(removed.url, filter.url);
    assert!(!path.exists());
    assert_eq!(store.count().await, 0);
    // add pair + remove pair
    assert_eq!(store.events().len(), 4);
}

#[tokio::test]
async fn test_remove_disabled_filter_skips_notification() {
    let (_dir, store) = make_store();
    let add = AddFilterUseCase::new(store.clone());
    let update = UpdateFilterUseCase::new(store.clone());
    let remove = RemoveFilterUseCase::new(store.clone());

    let url = "https://example.com/a.txt";
    add.execute("Ads".to_string(), url.to_string()).await.unwrap();
    update.execute(url, false, "Ads", url).await.unwrap();

    let events_before = store.events().len();
    remove.execute(url).await.unwrap();

    assert_eq!(store.events().len(), events_before);
}

#[tokio::test]
async fn test_remove_not_found() {
    let (_dir, store) = make_store();
    let remove = RemoveFilterUseCase::new(store);

    let result = remove.execute("https://example.com/missing.txt").await;

    assert!(matches!(result, Err(DomainError::FilterNotFound(_))));
}

#[tokio::test]
async fn test_update_toggle_enabled() {
    let (_dir, store) = make_store();
    let add = AddFilterUseCase::new(store.clone());
    let update = UpdateFilterUseCase::new(store.clone());

    let url = "https://example.com/a.txt";
    add.execute("Ads".to_string(), url.to_string()).await.unwrap();

    let status = update.execute(url, false, "Ads", url).await.unwrap();

    assert_eq!(status, ModifyStatus::CHANGED_ENABLED);
    assert_eq!(status.bits(), 2);
    assert!(!store.list().await[0].enabled);
}

#[tokio::test]
async fn test_update_metadata_only_skips_notification() {
    let (_dir, store) = make_store();
    let add = AddFilterUseCase::new(store.clone());
    let update = UpdateFilterUseCase::new(store.clone());

    let url = "https://example.com/a.txt";
    add.execute("Ads".to_string(), url.to_string()).await.unwrap();
    let events_before = store.events().len();

    let status = update.execute(url, true, "Renamed", url).await.unwrap();

    assert!(status.is_empty());
    assert_eq!(store.list().await[0].name, "Renamed");
    assert_eq!(store.events().len(), events_before);
}

#[tokio::test]
async fn test_update_url_unlinks_old_file() {
    let (_dir, store) = make_store();
    let add = AddFilterUseCase::new(store.clone());
    let update = UpdateFilterUseCase::new(store.clone());

    let url = "https://example.com/a.txt";
    let filter = add.execute("Ads".to_string(), url.to_string()).await.unwrap();
    let old_path = filter.path.clone().unwrap();
    assert!(old_path.exists());

    let status = update
        .execute(url, true, "Ads", "https://example.com/b.txt")
        .await
        .unwrap();

    assert_eq!(status, ModifyStatus::CHANGED_URL);
    assert_eq!(status.bits(), 4);
    assert!(!old_path.exists());
    let listed = store.list().await;
    assert_eq!(listed[0].url, "https://example.com/b.txt");
    assert_ne!(listed[0].id, filter.id);
}

#[tokio::test]
async fn test_update_invalid_new_url_never_reaches_store() {
    let (_dir, store) = make_store();
    let update = UpdateFilterUseCase::new(store.clone());

    let result = update
        .execute("https://example.com/a.txt", true, "Ads", "gopher://x")
        .await;

    assert!(matches!(result, Err(DomainError::InvalidFilterList(_))));
    assert_eq!(store.modify_count(), 0);
}

#[tokio::test]
async fn test_update_not_found() {
    let (_dir, store) = make_store();
    let update = UpdateFilterUseCase::new(store);

    let result = update
        .execute(
            "https://example.com/missing.txt",
            true,
            "Ads",
            "https://example.com/missing.txt",
        )
        .await;

    assert!(matches!(result, Err(DomainError::FilterNotFound(_))));
}

#[tokio::test]
async fn test_get_active_skips_disabled_and_unloaded() {
    let (_dir, store) = make_store();
    let add = AddFilterUseCase::new(store.clone());
    let update = UpdateFilterUseCase::new(store.clone());
    let get = GetFiltersUseCase::new(store.clone());

    add.execute("A".to_string(), "https://example.com/a.txt".to_string())
        .await
        .unwrap();
    add.execute("B".to_string(), "https://example.com/b.txt".to_string())
        .await
        .unwrap();
    update
        .execute(
            "https://example.com/b.txt",
            false,
            "B",
            "https://example.com/b.txt",
        )
        .await
        .unwrap();

    assert_eq!(get.get_all().await.len(), 2);
    let active = get.get_active().await;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].url, "https://example.com/a.txt");
}

#[tokio::test]
async fn test_refresh_forwards_to_store() {
    let (_dir, store) = make_store();
    let refresh = RefreshFiltersUseCase::new(store.clone());

    refresh.execute().await;

    assert_eq!(store.refresh_count(), 1);
}
