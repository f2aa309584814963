use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use adc_common::DefinitionRequest;
use adc_controller::auth::{
    AuthError, CredentialProvider, KeystoneOptions, KeystoneProvider, TokenSlot,
};
use adc_controller::remote::{MonascaClient, RemoteError, RemoteGateway};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

const TOKEN: &str = "tok-valid";

struct Fake {
    base: String,
    bodies: Mutex<Vec<Value>>,
    deleted: Mutex<Vec<String>>,
}

impl Fake {
    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("X-Auth-Token")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == TOKEN)
            .unwrap_or(false)
    }
}

fn definition(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": "",
        "expression": format!("avg({id}) > 1"),
        "deterministic": false,
        "match_by": ["hostname"],
        "severity": "LOW",
        "actions_enabled": true,
        "alarm_actions": [],
        "ok_actions": [],
        "undetermined_actions": [],
        "links": [{ "rel": "self", "href": "ignored" }],
    })
}

async fn list_definitions(
    State(fake): State<Arc<Fake>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !Fake::authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let page = match query.get("offset").map(String::as_str) {
        None => json!({
            "links": [
                { "rel": "self", "href": format!("{}/v2.0/alarm-definitions", fake.base) },
                { "rel": "next", "href": format!("{}/v2.0/alarm-definitions?offset=1", fake.base) },
            ],
            "elements": [definition("1", "cpu - adc"), definition("2", "handmade")],
        }),
        Some(_) => json!({
            "links": [{ "rel": "self", "href": "ignored" }],
            "elements": [definition("3", "disk - adc")],
        }),
    };
    Json(page).into_response()
}

async fn create_definition(
    State(fake): State<Arc<Fake>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !Fake::authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    fake.bodies.lock().unwrap().push(body.clone());
    let name = body["name"].as_str().unwrap_or_default().to_string();
    if name == "taken - adc" {
        return (StatusCode::CONFLICT, "definition already exists").into_response();
    }
    let mut created = definition("created-1", &name);
    created["expression"] = body["expression"].clone();
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn update_definition(
    State(fake): State<Arc<Fake>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    fake.bodies.lock().unwrap().push(body.clone());
    if id == "missing" {
        return StatusCode::NOT_FOUND.into_response();
    }
    let mut updated = definition(&id, body["name"].as_str().unwrap_or_default());
    updated["severity"] = body["severity"].clone();
    Json(updated).into_response()
}

async fn delete_definition(State(fake): State<Arc<Fake>>, Path(id): Path<String>) -> StatusCode {
    match id.as_str() {
        "missing" => StatusCode::NOT_FOUND,
        "broken" => StatusCode::INTERNAL_SERVER_ERROR,
        _ => {
            fake.deleted.lock().unwrap().push(id);
            StatusCode::NO_CONTENT
        }
    }
}

async fn list_notifications(headers: HeaderMap) -> Response {
    if !Fake::authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "links": [],
        "elements": [
            { "id": "n-1", "name": "ops", "type": "EMAIL", "address": "ops@example.com", "period": 0 },
            { "id": "n-2", "name": "pager", "type": "WEBHOOK", "address": "http://pager", "period": 60 },
        ],
    }))
    .into_response()
}

async fn issue_token(Json(body): Json<Value>) -> Response {
    let user = &body["auth"]["identity"]["password"]["user"];
    if user["password"] != "secret" {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if user["name"] == "tokenless" {
        return (StatusCode::CREATED, Json(json!({ "token": {} }))).into_response();
    }
    (
        StatusCode::CREATED,
        [("X-Subject-Token", TOKEN)],
        Json(json!({ "token": { "methods": ["password"] } })),
    )
        .into_response()
}

async fn start() -> Arc<Fake> {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let fake = Arc::new(Fake {
        base: format!("http://{addr}"),
        bodies: Mutex::new(Vec::new()),
        deleted: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route(
            "/v2.0/alarm-definitions",
            get(list_definitions).post(create_definition),
        )
        .route(
            "/v2.0/alarm-definitions/:id",
            patch(update_definition).delete(delete_definition),
        )
        .route("/v2.0/notification-methods", get(list_notifications))
        .route("/identity/v3/auth/tokens", post(issue_token))
        .with_state(fake.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    fake
}

fn client(fake: &Fake, token: Option<&str>) -> MonascaClient {
    let slot = TokenSlot::default();
    if let Some(token) = token {
        slot.install(token.to_string());
    }
    MonascaClient::new(
        &format!("{}/v2.0", fake.base),
        slot,
        reqwest::Client::new(),
    )
}

fn request(name: &str) -> DefinitionRequest {
    let mut spec = adc_controller::test_support::spec(name);
    spec.match_by = vec!["hostname".into()];
    DefinitionRequest::for_create(&spec)
}

#[tokio::test]
async fn listing_follows_next_links() {
    let fake = start().await;
    let monasca = client(&fake, Some(TOKEN));

    let defs = monasca.list_definitions().await.unwrap();

    let ids: Vec<&str> = defs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(defs[0].match_by, vec!["hostname".to_string()]);
}

#[tokio::test]
async fn wrong_token_is_rejected() {
    let fake = start().await;
    let monasca = client(&fake, Some("stale"));

    let err = monasca.list_definitions().await.unwrap_err();

    assert!(matches!(err, RemoteError::Status { status: 401, .. }));
}

#[tokio::test]
async fn missing_token_fails_before_sending() {
    let fake = start().await;
    let monasca = client(&fake, None);

    let err = monasca.list_definitions().await.unwrap_err();

    assert!(matches!(err, RemoteError::Unauthenticated));
}

#[tokio::test]
async fn create_posts_managed_name_and_decodes_result() {
    let fake = start().await;
    let monasca = client(&fake, Some(TOKEN));

    let created = monasca.create_definition(&request("cpu")).await.unwrap();

    assert_eq!(created.id, "created-1");
    assert_eq!(created.name, "cpu - adc");
    assert_eq!(created.expression, "avg(cpu) > 90");
    let bodies = fake.bodies.lock().unwrap();
    assert_eq!(bodies[0]["name"], "cpu - adc");
    assert_eq!(bodies[0]["match_by"], json!(["hostname"]));
    assert!(bodies[0].get("alarm_actions").is_none());
    assert!(bodies[0].get("deterministic").is_none());
}

#[tokio::test]
async fn duplicate_create_is_a_conflict() {
    let fake = start().await;
    let monasca = client(&fake, Some(TOKEN));

    let err = monasca.create_definition(&request("taken")).await.unwrap_err();

    assert!(err.is_conflict());
    assert!(err.to_string().contains("already exists"));
}

#[tokio::test]
async fn update_sends_every_field() {
    let fake = start().await;
    let monasca = client(&fake, Some(TOKEN));
    let mut spec = adc_controller::test_support::spec("cpu");
    spec.severity = "CRITICAL".into();

    let updated = monasca
        .update_definition("7", &DefinitionRequest::for_update(&spec))
        .await
        .unwrap();

    assert_eq!(updated.id, "7");
    assert_eq!(updated.severity, "CRITICAL");
    let bodies = fake.bodies.lock().unwrap();
    assert_eq!(bodies[0]["alarm_actions"], json!([]));
    assert_eq!(bodies[0]["deterministic"], json!(false));
}

#[tokio::test]
async fn update_of_unknown_id_is_not_found() {
    let fake = start().await;
    let monasca = client(&fake, Some(TOKEN));
    let spec = adc_controller::test_support::spec("cpu");

    let err = monasca
        .update_definition("missing", &DefinitionRequest::for_update(&spec))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn delete_statuses_are_classified() {
    let fake = start().await;
    let monasca = client(&fake, Some(TOKEN));

    monasca.delete_definition("4").await.unwrap();
    assert!(monasca.delete_definition("missing").await.unwrap_err().is_not_found());
    let err = monasca.delete_definition("broken").await.unwrap_err();
    assert!(matches!(err, RemoteError::Status { status: 500, .. }));
    assert_eq!(*fake.deleted.lock().unwrap(), vec!["4".to_string()]);
}

#[tokio::test]
async fn notification_methods_are_listed() {
    let fake = start().await;
    let monasca = client(&fake, Some(TOKEN));

    let methods = monasca.list_notification_methods().await.unwrap();

    assert_eq!(methods.len(), 2);
    assert_eq!(methods[1].kind, "WEBHOOK");
    assert_eq!(methods[1].period, 60);
}

fn keystone_options(fake: &Fake, username: &str, password: &str) -> KeystoneOptions {
    KeystoneOptions {
        auth_url: format!("{}/identity", fake.base),
        username: Some(username.into()),
        password: password.into(),
        project_name: Some("monitoring".into()),
        domain_name: Some("Default".into()),
        ..Default::default()
    }
}

#[tokio::test]
async fn keystone_token_feeds_the_monasca_client() {
    let fake = start().await;
    let slot = TokenSlot::default();
    let keystone = KeystoneProvider::new(
        keystone_options(&fake, "monasca-agent", "secret"),
        slot.clone(),
        reqwest::Client::new(),
    );
    let monasca = MonascaClient::new(
        &format!("{}/v2.0", fake.base),
        slot.clone(),
        reqwest::Client::new(),
    );

    assert!(matches!(
        monasca.list_definitions().await,
        Err(RemoteError::Unauthenticated)
    ));

    let credential = keystone.refresh().await.unwrap();
    assert_eq!(credential.token, TOKEN);
    assert_eq!(slot.current().as_deref(), Some(TOKEN));
    assert_eq!(monasca.list_definitions().await.unwrap().len(), 3);
}

#[tokio::test]
async fn keystone_rejection_keeps_previous_token() {
    let fake = start().await;
    let slot = TokenSlot::default();
    slot.install("previous".into());
    let keystone = KeystoneProvider::new(
        keystone_options(&fake, "monasca-agent", "wrong"),
        slot.clone(),
        reqwest::Client::new(),
    );

    let err = keystone.refresh().await.unwrap_err();

    assert!(matches!(err, AuthError::Rejected { status: 401 }));
    assert_eq!(slot.current().as_deref(), Some("previous"));
}

#[tokio::test]
async fn keystone_reply_without_token_header_is_an_error() {
    let fake = start().await;
    let keystone = KeystoneProvider::new(
        keystone_options(&fake, "tokenless", "secret"),
        TokenSlot::default(),
        reqwest::Client::new(),
    );

    assert!(matches!(
        keystone.refresh().await,
        Err(AuthError::MissingToken)
    ));
}
