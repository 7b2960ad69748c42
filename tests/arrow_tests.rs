mod common;

use common::{arrow_config, http_client};
use parts_nexus::NexusError;
use parts_nexus::api::ArrowApi;
use parts_nexus::types::SearchRequest;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn results() -> serde_json::Value {
    json!({
        "itemserviceresult": {
            "transactionArea": [{"response": {"returnCode": "0", "success": true}}],
            "data": [{
                "resultCount": 1,
                "PartList": [{
                    "partNum": "BAV99",
                    "manufacturer": {"mfrCd": "NXP", "mfrName": "Nexperia"},
                    "desc": "Diode Switching 100V 0.215A",
                    "InvOrg": {"webSites": [{"code": "arrow.com", "sources": [{
                        "currency": "USD",
                        "sourceParts": [{
                            "Availability": [{"fohQty": 42}],
                            "Prices": {"resaleList": [{"price": 0.12, "minQty": 1}]}
                        }]
                    }]}]}
                }]
            }]
        }
    })
}

#[tokio::test]
async fn search_sends_credentials_as_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/itemservice/v3/en/search/token"))
        .and(query_param("login", "arrow-user"))
        .and(query_param("apikey", "arrow-key"))
        .and(query_param("search_token", "BAV99"))
        .and(query_param("rows", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results()))
        .expect(1)
        .mount(&server)
        .await;

    let api = ArrowApi::new(arrow_config(&server.uri()), http_client());
    let resp = api
        .search(&SearchRequest::new("BAV99").with_record_count(5))
        .await
        .unwrap();
    assert!(resp.is_success(), "{resp:?}");
    let results = resp.data.unwrap();
    assert_eq!(results.total_count, 1);
    assert_eq!(results.parts[0].quantity_available, 42);
    assert_eq!(results.parts[0].cost, Some(0.12));
}

#[tokio::test]
async fn details_pick_exact_match() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/itemservice/v3/en/search/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results()))
        .mount(&server)
        .await;

    let api = ArrowApi::new(arrow_config(&server.uri()), http_client());
    let found = api.get_product_details("bav99").await.unwrap();
    assert_eq!(found.data.unwrap().manufacturer.as_deref(), Some("Nexperia"));

    let missing = api.get_product_details("BAV70").await.unwrap();
    assert!(missing.data.is_none());
    assert_eq!(missing.errors, vec!["Arrow has no product `BAV70`"]);
}

#[tokio::test]
async fn unauthorized_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let api = ArrowApi::new(arrow_config(&server.uri()), http_client());
    let err = api.search(&SearchRequest::new("BAV99")).await.unwrap_err();
    assert!(matches!(err, NexusError::Unauthorized(_)));
}

#[tokio::test]
async fn server_error_is_reported_in_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let api = ArrowApi::new(arrow_config(&server.uri()), http_client());
    let resp = api.search(&SearchRequest::new("BAV99")).await.unwrap();
    assert_eq!(
        resp.errors,
        vec!["Arrow returned error status code 500 Internal Server Error: boom"]
    );
}
