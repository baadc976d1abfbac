//! Client tests against a live server on an ephemeral port.

use serde_json::json;
use tokio::net::TcpListener;

use salesesy::api::{router, AppState};
use salesesy::client::{load_view, ApiClient, DataSource, FallbackPolicy, ListParams};
use salesesy::storage::SqliteStorage;
use salesesy::Error;

/// Serve a seeded in-memory store and return its base URL.
async fn spawn_server() -> String {
    let mut storage = SqliteStorage::open_memory().unwrap();
    storage.seed_demo("test").unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(AppState::new(storage));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// A base URL nothing listens on.
async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

#[tokio::test]
async fn fetches_seeded_resources() {
    let client = ApiClient::new(&spawn_server().await).unwrap();

    assert_eq!(client.health().await.unwrap().status, "ok");
    assert_eq!(client.contacts(&ListParams::default()).await.unwrap().len(), 3);
    let deals = client.deals(&ListParams::max_page()).await.unwrap();
    assert_eq!(deals.len(), 2);
    assert!(deals.iter().all(|d| d.stage_name.as_deref() == Some("New")));

    let catalog = client.pipelines().await.unwrap();
    assert_eq!(catalog.pipelines[0].name, "Sales Pipeline");
    assert_eq!(catalog.stages.len(), 6);
}

#[tokio::test]
async fn company_lookup_encodes_the_name() {
    let client = ApiClient::new(&spawn_server().await).unwrap();
    client
        .create_contact(&json!({ "first_name": "Sam", "company": "Acme Inc." }))
        .await
        .unwrap();

    let profile = client.company("ACME INC.").await.unwrap();
    assert_eq!(profile.summary.name, "Acme Inc.");

    let err = client.company("Nobody Ltd").await.unwrap_err();
    assert!(matches!(err, Error::Api { status: 404, .. }), "{err:?}");
}

#[tokio::test]
async fn validation_errors_carry_the_server_message() {
    let client = ApiClient::new(&spawn_server().await).unwrap();
    let err = client.create_deal(&json!({ "amount": 5 })).await.unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Deal name is required.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn contact_round_trip_through_update_and_delete() {
    let client = ApiClient::new(&spawn_server().await).unwrap();
    let contact = client
        .create_contact(&json!({ "last_name": "Lee" }))
        .await
        .unwrap();

    let updated = client
        .update_contact(&contact.id, &json!({ "title": "CFO" }))
        .await
        .unwrap();
    assert_eq!(updated.title.as_deref(), Some("CFO"));
    assert_eq!(client.contact(&contact.id).await.unwrap().title.as_deref(), Some("CFO"));

    assert!(client.delete_contact(&contact.id).await.unwrap());
    assert!(!client.delete_contact(&contact.id).await.unwrap());
}

#[tokio::test]
async fn load_view_uses_live_data() {
    let client = ApiClient::new(&spawn_server().await).unwrap();
    let state = load_view(&client, FallbackPolicy::Demo).await;

    assert_eq!(state.source, DataSource::Live);
    assert_eq!(state.health.as_deref(), Some("ok"));
    assert_eq!(state.contacts.len(), 3);
    let board = state.leaderboard();
    assert_eq!(board.top().unwrap().name, "Acme");
}

#[tokio::test]
async fn unreachable_server_falls_back_only_when_allowed() {
    let client = ApiClient::new(&dead_url().await).unwrap();

    let state = load_view(&client, FallbackPolicy::Demo).await;
    assert_eq!(state.source, DataSource::Demo);
    assert_eq!(state.deals.len(), 10);

    let state = load_view(&client, FallbackPolicy::Strict).await;
    assert_eq!(state.source, DataSource::Unloaded);
    assert_eq!(state.errors.len(), 5);
    assert!(state.deals.is_empty());
}
