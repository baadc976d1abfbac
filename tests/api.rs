//! HTTP API tests driven through the router with `oneshot`.

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use salesesy::api::{router, AppState};
use salesesy::storage::SqliteStorage;

fn app() -> Router {
    router(AppState::new(SqliteStorage::open_memory().unwrap()))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let body = body.map_or_else(Body::empty, |v| Body::from(v.to_string()));
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn post(app: &Router, uri: &str, body: Value) -> Value {
    let (status, json) = call(app, Method::POST, uri, Some(body)).await;
    assert_eq!(status, StatusCode::OK, "POST {uri} failed: {json}");
    json["data"].clone()
}

fn error_message(json: &Value) -> &str {
    json["error"]["message"].as_str().unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app();
    let (status, json) = call(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "data": { "status": "ok" } }));
}

#[tokio::test]
async fn unknown_route_is_404() {
    let app = app();
    let (status, json) = call(&app, Method::GET, "/api/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_message(&json), "Not found");
}

#[tokio::test]
async fn contact_create_trims_and_requires_a_name() {
    let app = app();

    let contact = post(
        &app,
        "/api/contacts",
        json!({ "last_name": "  Nowak ", "company": " Acme Inc. " }),
    )
    .await;
    assert_eq!(contact["last_name"], "Nowak");
    assert_eq!(contact["company"], "Acme Inc.");
    assert!(contact["first_name"].is_null());

    let (status, json) =
        call(&app, Method::POST, "/api/contacts", Some(json!({ "email": "a@b.co" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&json), "Contact needs at least a first or last name.");
}

#[tokio::test]
async fn validation_messages_are_combined() {
    let app = app();
    let (status, json) = call(
        &app,
        Method::POST,
        "/api/contacts",
        Some(json!({ "first_name": 42, "email": "not-an-email" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = error_message(&json);
    assert!(message.contains("must be a string."), "{message}");
    assert!(message.contains("Email must be valid."), "{message}");
}

#[tokio::test]
async fn invalid_json_is_rejected() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/deals")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_query_uses_error_envelope() {
    let app = app();
    let (status, json) = call(&app, Method::GET, "/api/contacts?limit=1&limit=2", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "VALIDATION_FAILED");
    assert!(error_message(&json).contains("limit"), "{json}");
}

#[tokio::test]
async fn oversized_body_uses_error_envelope() {
    let app = app();
    let payload = json!({ "first_name": "a".repeat(3 * 1024 * 1024) }).to_string();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/contacts")
        .header("content-type", "application/json")
        .header("content-length", payload.len())
        .body(Body::from(payload))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["error"]["code"], "PAYLOAD_TOO_LARGE");
    assert_eq!(
        error_message(&json),
        "Request body is larger than 2097152 bytes."
    );

    let (status, _) = call(&app, Method::GET, "/api/contacts", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn deal_requires_name_and_non_negative_amount() {
    let app = app();

    let (status, json) = call(&app, Method::POST, "/api/deals", Some(json!({ "amount": 10 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&json), "Deal name is required.");

    let (status, json) = call(
        &app,
        Method::POST,
        "/api/deals",
        Some(json!({ "name": "Renewal", "amount": -5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&json), "Amount cannot be negative.");

    let deal = post(&app, "/api/deals", json!({ "name": "Renewal", "amount": "1200.5" })).await;
    assert_eq!(deal["amount"], 1200.5);
}

#[tokio::test]
async fn deal_stage_must_belong_to_pipeline() {
    let app = app();
    let sales = post(
        &app,
        "/api/pipelines",
        json!({ "name": "Sales", "stages": [{ "name": "New", "probability": 0.1 }] }),
    )
    .await;
    let other = post(&app, "/api/pipelines", json!({ "name": "Partners" })).await;
    let stage_id = sales["stages"][0]["id"].as_str().unwrap();

    let (status, json) = call(
        &app,
        Method::POST,
        "/api/deals",
        Some(json!({ "name": "X", "pipeline_id": other["id"], "stage_id": stage_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&json), "Stage does not belong to the selected pipeline.");

    let deal = post(&app, "/api/deals", json!({ "name": "Y", "stage_id": stage_id })).await;
    assert_eq!(deal["pipeline_id"], sales["id"]);
    assert_eq!(deal["stage_name"], "New");
    assert_eq!(deal["pipeline_name"], "Sales");
}

#[tokio::test]
async fn list_paginates_and_sorts() {
    let app = app();
    for (name, amount) in [("A", 300), ("B", 100), ("C", 200)] {
        post(&app, "/api/deals", json!({ "name": name, "amount": amount })).await;
    }

    let (_, json) = call(&app, Method::GET, "/api/deals?sort=amount&order=asc", None).await;
    let names: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["B", "C", "A"]);

    let (_, json) = call(
        &app,
        Method::GET,
        "/api/deals?sort=amount&sortDirection=desc&limit=1&offset=1",
        None,
    )
    .await;
    let page = json["data"].as_array().unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["name"], "C");

    let (status, json) = call(&app, Method::GET, "/api/deals?limit=abc&sort=bogus", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn contact_search_matches_name_email_and_phone() {
    let app = app();
    post(&app, "/api/contacts", json!({ "first_name": "Ava", "email": "ava@acme.test" })).await;
    post(&app, "/api/contacts", json!({ "first_name": "Jan", "phone": "+48 555" })).await;

    let (_, json) = call(&app, Method::GET, "/api/contacts?q=acme", None).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    let (_, json) = call(&app, Method::GET, "/api/contacts?q=555", None).await;
    assert_eq!(json["data"][0]["first_name"], "Jan");
}

#[tokio::test]
async fn update_checks_existence_before_validation() {
    let app = app();

    let (status, _) = call(&app, Method::PUT, "/api/contacts/missing", Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let contact = post(&app, "/api/contacts", json!({ "first_name": "Ava" })).await;
    let uri = format!("/api/contacts/{}", contact["id"].as_str().unwrap());

    let (status, json) = call(&app, Method::PUT, &uri, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&json), "Provide at least one field to update.");

    let (status, json) = call(&app, Method::PUT, &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&json), "Provide at least one field to update.");

    let (status, json) = call(&app, Method::PUT, &uri, Some(json!({ "title": "CFO" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["title"], "CFO");
    assert_eq!(json["data"]["first_name"], "Ava");
}

#[tokio::test]
async fn delete_reports_whether_a_row_went_away() {
    let app = app();
    let task = post(&app, "/api/tasks", json!({ "subject": "Call back" })).await;
    let uri = format!("/api/tasks/{}", task["id"].as_str().unwrap());

    let (_, json) = call(&app, Method::DELETE, &uri, None).await;
    assert_eq!(json, json!({ "data": { "deleted": true } }));
    let (_, json) = call(&app, Method::DELETE, &uri, None).await;
    assert_eq!(json, json!({ "data": { "deleted": false } }));

    let (status, _) = call(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn task_status_synonyms_and_suggestions() {
    let app = app();
    let task = post(&app, "/api/tasks", json!({ "subject": "Prep", "status": "WIP" })).await;
    assert_eq!(task["status"], "in_progress");

    let (status, json) = call(
        &app,
        Method::POST,
        "/api/tasks",
        Some(json!({ "subject": "Prep", "status": "donee" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&json).contains("done"));

    let (status, json) = call(
        &app,
        Method::POST,
        "/api/tasks",
        Some(json!({ "subject": "Prep", "related_type": "company" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error_message(&json),
        "Related type and related id must be provided together."
    );
}

#[tokio::test]
async fn company_profile_aggregates_by_normalized_name() {
    let app = app();
    post(
        &app,
        "/api/contacts",
        json!({ "first_name": "Ava", "last_name": "Nowak", "company": "Acme Inc." }),
    )
    .await;
    post(
        &app,
        "/api/deals",
        json!({ "name": "Website redesign", "amount": 40000, "company": "Acme Inc." }),
    )
    .await;
    post(
        &app,
        "/api/tasks",
        json!({ "subject": "Kick-off", "related_type": "Organisation", "related_id": "ACME inc." }),
    )
    .await;

    let (status, json) = call(&app, Method::GET, "/api/companies/acme%20inc.", None).await;
    assert_eq!(status, StatusCode::OK);
    let data = &json["data"];
    assert_eq!(data["summary"]["name"], "Acme Inc.");
    assert_eq!(data["summary"]["contactsCount"], 1);
    assert_eq!(data["summary"]["dealsCount"], 1);
    assert_eq!(data["summary"]["pipelineValue"], 40000.0);
    assert_eq!(data["summary"]["stageBreakdown"], json!({ "Unknown": 1 }));
    assert_eq!(data["tasks"].as_array().unwrap().len(), 1);

    let (status, json) = call(&app, Method::GET, "/api/companies/globex", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_message(&json), "Company not found.");
}

#[tokio::test]
async fn pipeline_catalog_and_stage_lifecycle() {
    let app = app();
    let pipeline = post(&app, "/api/pipelines", json!({ "name": "Sales" })).await;
    let pipeline_id = pipeline["id"].as_str().unwrap();

    let first = post(
        &app,
        "/api/stages",
        json!({ "pipeline_id": pipeline_id, "name": "New", "probability": 0.1 }),
    )
    .await;
    let second = post(
        &app,
        "/api/stages",
        json!({ "pipeline_id": pipeline_id, "name": "Won", "probability": 1 }),
    )
    .await;
    assert_eq!(first["order_index"], 0);
    assert_eq!(second["order_index"], 1);

    let (status, json) = call(
        &app,
        Method::POST,
        "/api/stages",
        Some(json!({ "pipeline_id": pipeline_id, "name": "Odd", "probability": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&json), "Probability must be between 0 and 1.");

    let (_, json) = call(&app, Method::GET, "/api/pipelines", None).await;
    assert_eq!(json["data"]["pipelines"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"]["stages"].as_array().unwrap().len(), 2);

    let (_, json) = call(&app, Method::DELETE, &format!("/api/pipelines/{pipeline_id}"), None).await;
    assert_eq!(json["data"]["deleted"], true);
    let (_, json) = call(&app, Method::GET, "/api/pipelines", None).await;
    assert!(json["data"]["stages"].as_array().unwrap().is_empty());
}
