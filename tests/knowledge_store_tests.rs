use assistant_backend::services::knowledge_store::KnowledgeStore;
use httpmock::prelude::*;
use serde_json::json;

#[tokio::test]
async fn store_and_query_round_trip() {
    let server = MockServer::start_async().await;

    let collection = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/collections");
            then.status(200).json_body(json!({ "id": "col-1" }));
        })
        .await;
    let add = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/collections/col-1/add")
                .body_contains("doc.pdf");
            then.status(201).json_body(json!({}));
        })
        .await;
    let query = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/collections/col-1/query");
            then.status(200)
                .json_body(json!({ "documents": [["alpha", "beta"]] }));
        })
        .await;

    let store = KnowledgeStore::new(reqwest::Client::new(), server.base_url(), "pdf_collection");

    let stored = store
        .store(&["alpha".to_string(), "beta".to_string()], "doc.pdf")
        .await
        .unwrap();
    assert_eq!(stored, 2);

    let results = store.query("what is alpha?", 3).await;
    assert_eq!(results, vec!["alpha".to_string(), "beta".to_string()]);

    add.assert_async().await;
    query.assert_async().await;
    // The collection id is resolved once and cached.
    collection.assert_hits_async(1).await;
}

#[tokio::test]
async fn query_on_empty_store_returns_empty() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/collections");
            then.status(200).json_body(json!({ "id": "col-1" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/collections/col-1/query");
            then.status(200).json_body(json!({ "documents": [[]] }));
        })
        .await;

    let store = KnowledgeStore::new(reqwest::Client::new(), server.base_url(), "pdf_collection");
    assert!(store.query("anything", 3).await.is_empty());
}

#[tokio::test]
async fn query_failure_yields_empty_not_error() {
    // No mocks registered: every request comes back as an error status.
    let server = MockServer::start_async().await;
    let store = KnowledgeStore::new(reqwest::Client::new(), server.base_url(), "pdf_collection");

    assert!(store.query("anything", 3).await.is_empty());
}

#[tokio::test]
async fn storing_zero_chunks_skips_the_service() {
    let server = MockServer::start_async().await;
    let store = KnowledgeStore::new(reqwest::Client::new(), server.base_url(), "pdf_collection");

    let stored = store.store(&[], "empty.pdf").await.unwrap();
    assert_eq!(stored, 0);
}
