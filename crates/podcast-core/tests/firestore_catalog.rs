mod common;

use std::sync::Arc;

use common::{catalog_config, episode_doc, serve, string_value, MockFirestore};
use podcast_core::catalog::{load_catalog, CatalogService, Category};
use podcast_core::error::FetchError;
use podcast_core::firestore::FirestoreCatalog;
use serde_json::json;

fn utils_fields() -> serde_json::Value {
    json!({
        "description": string_value("long-form talks"),
        "description_2obj": string_value("two objects, one story"),
        "description_funny": string_value("jokes"),
        "mailing_list_link": string_value("https://list.example/join"),
    })
}

#[tokio::test]
async fn lists_every_page_in_order() {
    let docs = (0..5)
        .map(|i| episode_doc("podcasts", &format!("ep{}", i), &format!("Episode {}", i)))
        .collect();
    let mock = Arc::new(MockFirestore::default().with_collection("podcasts", docs));
    let addr = serve(mock.clone()).await;
    let catalog = FirestoreCatalog::new(&catalog_config(addr, 2)).unwrap();

    let episodes = catalog.list_episodes(Category::Podcasts).await.unwrap();
    let ids: Vec<_> = episodes.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["ep0", "ep1", "ep2", "ep3", "ep4"]);
    assert_eq!(episodes[3].audio_source_url, "https://cdn.example/ep3.mp3");

    let requests = mock.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests
        .iter()
        .all(|(_, q)| q.get("key").map(String::as_str) == Some("test-key")));
    assert_eq!(requests[1].1.get("pageToken").map(String::as_str), Some("2"));
}

#[tokio::test]
async fn missing_collection_is_empty() {
    let mock = Arc::new(MockFirestore::default());
    let addr = serve(mock).await;
    let catalog = FirestoreCatalog::new(&catalog_config(addr, 10)).unwrap();

    let episodes = catalog.list_episodes(Category::Funny).await.unwrap();
    assert!(episodes.is_empty());
}

#[tokio::test]
async fn server_error_is_reported() {
    let mock = Arc::new(MockFirestore::default().failing("podcasts_2obj"));
    let addr = serve(mock).await;
    let catalog = FirestoreCatalog::new(&catalog_config(addr, 10)).unwrap();

    let err = catalog
        .list_episodes(Category::TwoObjects)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Status { .. }));
}

#[tokio::test]
async fn description_follows_category() {
    let mock = Arc::new(MockFirestore::default().with_utils(utils_fields()));
    let addr = serve(mock).await;
    let catalog = FirestoreCatalog::new(&catalog_config(addr, 10)).unwrap();

    assert_eq!(
        catalog.get_description(Category::Podcasts).await.unwrap(),
        "long-form talks"
    );
    assert_eq!(
        catalog.get_description(Category::TwoObjects).await.unwrap(),
        "two objects, one story"
    );
    assert_eq!(
        catalog.get_mailing_list_url().await.unwrap().as_deref(),
        Some("https://list.example/join")
    );
}

#[tokio::test]
async fn absent_utils_document_yields_empty_values() {
    let mock = Arc::new(MockFirestore::default());
    let addr = serve(mock).await;
    let catalog = FirestoreCatalog::new(&catalog_config(addr, 10)).unwrap();

    assert_eq!(catalog.get_description(Category::Funny).await.unwrap(), "");
    assert!(catalog.get_mailing_list_url().await.unwrap().is_none());
}

#[tokio::test]
async fn load_catalog_keeps_description_when_list_fails() {
    let mock = Arc::new(
        MockFirestore::default()
            .failing("podcasts_funny")
            .with_utils(utils_fields()),
    );
    let addr = serve(mock).await;
    let catalog = FirestoreCatalog::new(&catalog_config(addr, 10)).unwrap();

    let snap = load_catalog(&catalog, Category::Funny).await;
    assert!(snap.episodes.is_empty());
    assert_eq!(snap.description, "jokes");
    assert_eq!(
        snap.mailing_list_url.as_deref(),
        Some("https://list.example/join")
    );
}

#[tokio::test]
async fn unreachable_host_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let catalog = FirestoreCatalog::new(&catalog_config(addr, 10)).unwrap();

    let err = catalog.list_episodes(Category::Podcasts).await.unwrap_err();
    assert!(matches!(err, FetchError::Transport { .. }));
}
