mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use common::{
    digikey_config, http_client, seed_digikey_credential, temp_db, tme_config, token_body,
};
use parts_nexus::Suppliers;
use parts_nexus::api::{DigikeyApi, TmeApi};
use parts_nexus::router::{NexusState, nexus_router};
use parts_nexus::types::ApiVersion;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "test-key";

fn app(suppliers: Suppliers) -> Router {
    nexus_router(NexusState::new(suppliers, Arc::from(KEY)))
}

fn tme_only(server: &MockServer) -> Suppliers {
    let mut suppliers = Suppliers::new();
    suppliers.register(Arc::new(
        TmeApi::new(tme_config(&server.uri()), http_client()).expect("tme adapter"),
    ));
    suppliers
}

async fn json_body(resp: axum::response::Response) -> Value {
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&body).expect("response body was not json")
}

fn search_request(uri: &str, key: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(key) = key {
        builder = builder.header("x-nexus-key", key);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

#[tokio::test]
async fn requests_without_key_are_rejected() {
    let server = MockServer::start().await;
    let resp = app(tme_only(&server))
        .oneshot(search_request(
            "/api/tme/search",
            Some("wrong"),
            json!({"partNumber": "BC547"}),
        ))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_supplier_is_404() {
    let server = MockServer::start().await;
    let resp = app(tme_only(&server))
        .oneshot(
            Request::builder()
                .uri("/api/mouser/categories")
                .header("authorization", format!("Bearer {KEY}"))
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], "UNKNOWN_SUPPLIER");
}

#[tokio::test]
async fn supplier_search_returns_api_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Products/Search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Status": "OK",
            "Data": {"ProductList": [{"Symbol": "BC547B", "OriginalSymbol": "BC547B"}], "Amount": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = app(tme_only(&server))
        .oneshot(search_request(
            "/api/tme/search",
            Some(KEY),
            json!({"partNumber": "BC547B", "recordCount": 5, "mountingType": "ThroughHole"}),
        ))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["requiresAuthorization"], false);
    assert_eq!(body["data"]["totalCount"], 1);
    assert_eq!(body["data"]["parts"][0]["supplierPartNumber"], "BC547B");
}

#[tokio::test]
async fn bad_record_count_is_400() {
    let server = MockServer::start().await;
    let resp = app(tme_only(&server))
        .oneshot(search_request(
            "/api/search",
            Some(KEY),
            json!({"partNumber": "BC547", "recordCount": 0}),
        ))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"]["code"], "ARGUMENT_OUT_OF_RANGE");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn digikey_routes_need_digikey_enabled() {
    let server = MockServer::start().await;
    let resp = app(tme_only(&server))
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/digikey/authorization?key={KEY}"))
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oauth_callback_validates_query() {
    let server = MockServer::start().await;
    let resp = app(tme_only(&server))
        .oneshot(
            Request::builder()
                .uri("/authorize/digikey?state=abc")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"]["code"], "OAUTH_FLOW");
}

#[tokio::test]
async fn digikey_search_without_credential_asks_for_consent() {
    let server = MockServer::start().await;
    let db = temp_db("router-consent").await;
    let digikey = DigikeyApi::new(digikey_config(&server.uri()), http_client(), db.storage.clone());
    let suppliers = Suppliers::new().with_digikey(Arc::new(digikey));

    let resp = app(suppliers)
        .oneshot(search_request(
            "/api/digikey/search",
            Some(KEY),
            json!({"partNumber": "BAV99"}),
        ))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["requiresAuthorization"], true);
    assert!(
        body["authorizationUrl"]
            .as_str()
            .unwrap()
            .contains("/v1/oauth2/authorize")
    );
}

#[tokio::test]
async fn forgetting_digikey_authorization_over_http() {
    let server = MockServer::start().await;
    let db = temp_db("router-forget").await;
    seed_digikey_credential(&db.storage, "token", 30, ApiVersion::V3).await;
    let digikey = DigikeyApi::new(digikey_config(&server.uri()), http_client(), db.storage.clone());
    let suppliers = Suppliers::new().with_digikey(Arc::new(digikey));

    let resp = app(suppliers)
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/digikey/authorization")
                .header("x-nexus-key", KEY)
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["removed"], true);
    assert!(
        db.storage
            .get_oauth_credential("DigiKey")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn oauth_callback_reports_stored_authorization() {
    let server = MockServer::start().await;
    let db = temp_db("router-callback").await;
    let digikey = DigikeyApi::new(digikey_config(&server.uri()), http_client(), db.storage.clone());
    let app = app(Suppliers::new().with_digikey(Arc::new(digikey)));

    let resp = app
        .clone()
        .oneshot(search_request(
            "/api/digikey/search",
            Some(KEY),
            json!({"partNumber": "BAV99"}),
        ))
        .await
        .expect("request failed");
    let consent = json_body(resp).await["authorizationUrl"]
        .as_str()
        .unwrap()
        .to_string();
    let state = url::Url::parse(&consent)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/v1/oauth2/token"))
        .and(body_string_contains("code=auth-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("fresh-token")))
        .expect(1)
        .mount(&server)
        .await;

    let resp = app
        .oneshot(
            Request::builder()
                .uri(format!("/authorize/digikey?code=auth-code&state={state}"))
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["provider"], "DigiKey");
    assert_eq!(body["authorized"], true);
    assert!(body["expiresAt"].is_string());
}
