//! Integration tests for the remote sync engine against a mock remote store.

use ideacap_core::{Error, Idea, RemoteIdeaRecord, RemoteStore, RemoteStoreConfig};
use ideacap_sync::RemoteSyncEngine;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, headers, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "pk_test_123";

fn engine_for(server: &MockServer) -> RemoteSyncEngine {
    RemoteSyncEngine::from_config(RemoteStoreConfig::new(server.uri(), KEY))
        .expect("Failed to create engine")
}

fn text_idea(content: &str) -> Idea {
    Idea::new(None, content, vec!["test".to_string()], None)
}

#[tokio::test]
async fn test_upload_idea_with_image_sends_url_not_bytes() {
    let mock_server = MockServer::start().await;
    let idea = Idea::new(Some("Sketch"), "Draw a bridge", vec![], Some(vec![0xff, 0xd8, 1, 2]));
    let object_path = format!("/storage/v1/object/idea-images/{}.jpg", idea.id());
    let public_url = format!(
        "{}/storage/v1/object/public/idea-images/{}.jpg",
        mock_server.uri(),
        idea.id()
    );

    Mock::given(method("PUT"))
        .and(path(object_path.as_str()))
        .and(header("apikey", KEY))
        .and(header("Authorization", format!("Bearer {}", KEY).as_str()))
        .and(header("Content-Type", "image/jpeg"))
        .and(header("x-upsert", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Key": "ok"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/ideas"))
        .and(headers("Prefer", vec!["resolution=merge-duplicates", "return=minimal"]))
        .and(body_partial_json(json!({
            "id": idea.wire_id(),
            "title": "Sketch",
            "image_url": public_url,
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let engine = engine_for(&mock_server);
    let outcome = engine
        .upload_idea_detailed(&idea)
        .await
        .expect("Upload should succeed");

    assert_eq!(outcome.remote_id, idea.wire_id());
    assert_eq!(outcome.image_url.as_deref(), Some(public_url.as_str()));

    let requests = mock_server.received_requests().await.unwrap();
    let post = requests
        .iter()
        .find(|r| r.method.as_str() == "POST")
        .expect("record POST");
    let body: serde_json::Value = serde_json::from_slice(&post.body).unwrap();
    assert!(body.get("image_data").is_none());
    assert_eq!(
        post.headers.get("prefer").unwrap().to_str().unwrap(),
        "resolution=merge-duplicates,return=minimal"
    );
}

#[tokio::test]
async fn test_repeated_upload_is_idempotent() {
    let mock_server = MockServer::start().await;
    let idea = text_idea("Same idea twice");

    Mock::given(method("POST"))
        .and(path("/rest/v1/ideas"))
        .and(headers("Prefer", vec!["resolution=merge-duplicates", "return=minimal"]))
        .and(body_partial_json(json!({"id": idea.wire_id(), "image_url": null})))
        .respond_with(ResponseTemplate::new(201))
        .expect(2)
        .mount(&mock_server)
        .await;

    let engine = engine_for(&mock_server);
    let first = engine.upload_idea(&idea).await.unwrap();
    let second = engine.upload_idea(&idea).await.unwrap();

    assert_eq!(first, idea.wire_id());
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_previous_image_url_is_resent() {
    let mock_server = MockServer::start().await;
    let url = "https://cdn.example/idea-images/abc.jpg";
    let record = RemoteIdeaRecord {
        id: uuid::Uuid::new_v4().to_string(),
        title: "Old".into(),
        content: "Has image".into(),
        tags: vec![],
        created_at: "2026-01-01T00:00:00Z".into(),
        updated_at: "2026-01-01T00:00:00Z".into(),
        image_data: None,
        image_url: Some(url.into()),
    };
    let idea = Idea::from_remote(&record).unwrap();

    Mock::given(method("POST"))
        .and(path("/rest/v1/ideas"))
        .and(body_partial_json(json!({"image_url": url})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    // No storage mock: an image PUT would fail the test with a 404.
    let engine = engine_for(&mock_server);
    let outcome = engine.upload_idea_detailed(&idea).await.unwrap();
    assert_eq!(outcome.image_url.as_deref(), Some(url));
}

#[tokio::test]
async fn test_image_failure_aborts_record_upload() {
    let mock_server = MockServer::start().await;
    let idea = Idea::new(None, "Big image", vec![], Some(vec![0; 16]));

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(413).set_body_string("Payload too large"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let engine = engine_for(&mock_server);
    match engine.upload_idea(&idea).await {
        Err(Error::UploadFailed { status, body }) => {
            assert_eq!(status, 413);
            assert_eq!(body, "Payload too large");
        }
        other => panic!("Expected UploadFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_batch_isolates_failures() {
    let mock_server = MockServer::start().await;
    let ideas = vec![text_idea("one"), text_idea("two"), text_idea("three")];
    let bad = ideas[1].id();

    // Mounted first so it takes precedence for the bad record.
    Mock::given(method("POST"))
        .and(path("/rest/v1/ideas"))
        .and(body_partial_json(json!({"id": bad.to_string()})))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/ideas"))
        .respond_with(ResponseTemplate::new(201))
        .expect(2)
        .mount(&mock_server)
        .await;

    let engine = engine_for(&mock_server);
    let report = engine.upload_ideas_with_report(&ideas).await.unwrap();

    assert_eq!(report.success_count(), 2);
    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.failed[0].0, bad);
    assert!(report.outcome_for(bad).is_none());
    assert!(report.outcome_for(ideas[0].id()).is_some());
    assert!(report.outcome_for(ideas[2].id()).is_some());
}

#[tokio::test]
async fn test_upload_ideas_returns_success_count() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/ideas"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let engine = engine_for(&mock_server);
    let count = engine
        .upload_ideas(&[text_idea("a"), text_idea("b")])
        .await
        .expect("Batch itself never fails once configured");
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_fetch_all_ideas() {
    let mock_server = MockServer::start().await;
    let id = uuid::Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/ideas"))
        .and(query_param("select", "*"))
        .and(header("apikey", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": id,
            "title": "Remote",
            "content": "From another device",
            "tags": ["sync"],
            "created_at": "2026-03-01T10:00:00Z",
            "updated_at": "2026-03-02T10:00:00Z",
            "image_url": null
        }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let records = engine_for(&mock_server).fetch_all_ideas().await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, id);
    assert_eq!(records[0].tags, vec!["sync"]);
    assert!(records[0].image_url.is_none());
}

#[tokio::test]
async fn test_fetch_requires_exact_200() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/ideas"))
        .respond_with(ResponseTemplate::new(206).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let err = engine_for(&mock_server).fetch_all_ideas().await.unwrap_err();
    assert!(matches!(err, Error::FetchFailed { status: 206, .. }));
}

#[tokio::test]
async fn test_delete_idea() {
    let mock_server = MockServer::start().await;
    let id = uuid::Uuid::new_v4().to_string();

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/ideas"))
        .and(query_param("id", format!("eq.{}", id).as_str()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    engine_for(&mock_server)
        .delete_idea(&id)
        .await
        .expect("Delete should succeed");
}

#[tokio::test]
async fn test_delete_failure_preserves_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&mock_server)
        .await;

    let err = engine_for(&mock_server).delete_idea("x").await.unwrap_err();
    match err {
        Error::DeleteFailed { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "bad key");
        }
        other => panic!("Expected DeleteFailed, got {:?}", other),
    }
}
