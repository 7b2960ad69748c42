mod common;

use common::{http_client, tme_config};
use parts_nexus::NexusError;
use parts_nexus::api::TmeApi;
use parts_nexus::api::tme::signing;
use parts_nexus::types::{MountingType, SearchRequest};
use serde_json::json;
use std::collections::BTreeMap;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn form(body: &[u8]) -> BTreeMap<String, String> {
    url::form_urlencoded::parse(body).into_owned().collect()
}

fn search_ok(products: serde_json::Value, amount: i64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "Status": "OK",
        "Data": {"ProductList": products, "Amount": amount, "PageNumber": 1}
    }))
}

fn resistor() -> serde_json::Value {
    json!({
        "Symbol": "RC0805JR-0710KL",
        "OriginalSymbol": "RC0805JR-0710KL",
        "Producer": "YAGEO",
        "Description": "Resistor: thick film; SMD; 0805; 10kΩ; 125mW; ±5%",
        "Category": "SMD resistors",
        "Photo": "//ce8dc832c.cloudimg.io/v7/_cdn_/rc0805.jpg",
        "ProductInformationPage": "//www.tme.eu/en/details/rc0805jr-0710kl/"
    })
}

#[tokio::test]
async fn search_posts_signed_form_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Products/Search.json"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .respond_with(search_ok(json!([resistor()]), 1))
        .expect(1)
        .mount(&server)
        .await;

    let api = TmeApi::new(tme_config(&server.uri()), http_client()).unwrap();
    let resp = api.search(&SearchRequest::new("RC0805JR-0710KL")).await.unwrap();
    assert!(resp.is_success(), "{resp:?}");
    let part = &resp.data.unwrap().parts[0];
    assert_eq!(part.supplier, "TME");
    assert_eq!(part.manufacturer.as_deref(), Some("YAGEO"));
    assert_eq!(
        part.image_url.as_deref(),
        Some("https://ce8dc832c.cloudimg.io/v7/_cdn_/rc0805.jpg")
    );

    let requests = server.received_requests().await.unwrap();
    let mut fields = form(&requests[0].body);
    assert_eq!(fields["Token"], "tme-token");
    assert_eq!(fields["Country"], "US");
    assert_eq!(fields["Language"], "EN");
    assert_eq!(fields["SearchPlain"], "RC0805JR-0710KL");

    let sent_signature = fields.remove("ApiSignature").unwrap();
    let url = format!("{}/Products/Search.json", server.uri());
    let expected =
        signing::signature("tme-secret", &url, &signing::form_body(&fields)).unwrap();
    assert_eq!(sent_signature, expected);
}

#[tokio::test]
async fn empty_parametric_search_issues_one_broadened_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Products/Search.json"))
        .and(body_string_contains("SearchPlain=0805&"))
        .respond_with(search_ok(json!([]), 0))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/Products/Search.json"))
        .and(body_string_contains("SearchPlain=10k+5%25+0805&"))
        .respond_with(search_ok(json!([resistor()]), 1))
        .expect(1)
        .mount(&server)
        .await;

    let api = TmeApi::new(tme_config(&server.uri()), http_client()).unwrap();
    let resp = api.search(&SearchRequest::new("10k 5% 0805")).await.unwrap();
    assert!(resp.is_success(), "{resp:?}");
    assert_eq!(resp.data.unwrap().total_count, 1);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    let first = form(&requests[0].body);
    assert_eq!(first["SearchParameters[38][0]"], "10 kOhms");
    assert_eq!(first["SearchParameters[35][0]"], "5%");
    let second = form(&requests[1].body);
    assert_eq!(second["SearchPlain"], "10k 5% 0805");
    assert!(!second.keys().any(|k| k.starts_with("SearchParameters")));
}

#[tokio::test]
async fn empty_search_without_removed_keywords_is_not_repeated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Products/Search.json"))
        .respond_with(search_ok(json!([]), 0))
        .expect(1)
        .mount(&server)
        .await;

    let api = TmeApi::new(tme_config(&server.uri()), http_client()).unwrap();
    let resp = api.search(&SearchRequest::new("NOSUCHPART")).await.unwrap();
    assert!(resp.data.unwrap().is_empty());
}

#[tokio::test]
async fn resistor_part_type_drops_mounting_filter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Products/Search.json"))
        .respond_with(search_ok(json!([resistor()]), 1))
        .expect(2)
        .mount(&server)
        .await;

    let api = TmeApi::new(tme_config(&server.uri()), http_client()).unwrap();
    let resistor_search = SearchRequest::new("10k")
        .with_part_type("resistor")
        .with_mounting_type(MountingType::SurfaceMount);
    assert!(api.search(&resistor_search).await.unwrap().is_success());
    let generic_search =
        SearchRequest::new("10k").with_mounting_type(MountingType::SurfaceMount);
    assert!(api.search(&generic_search).await.unwrap().is_success());

    let requests = server.received_requests().await.unwrap();
    let resistor_fields = form(&requests[0].body);
    assert_eq!(resistor_fields["SearchParameters[38][0]"], "10 kOhms");
    assert!(!resistor_fields.contains_key("SearchParameters[2][0]"));
    assert!(!resistor_fields.keys().any(|k| k.contains("52")));
    let generic_fields = form(&requests[1].body);
    assert!(generic_fields.contains_key("SearchParameters[2][0]"));
}

#[tokio::test]
async fn unauthorized_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Products/Search.json"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .expect(1)
        .mount(&server)
        .await;

    let api = TmeApi::new(tme_config(&server.uri()), http_client()).unwrap();
    let err = api.search(&SearchRequest::new("BC547")).await.unwrap_err();
    assert!(matches!(err, NexusError::Unauthorized(_)));
}

#[tokio::test]
async fn missing_credentials_fail_before_network() {
    let server = MockServer::start().await;
    let mut cfg = tme_config(&server.uri());
    cfg.application_secret.clear();

    let api = TmeApi::new(cfg, http_client()).unwrap();
    let err = api.search(&SearchRequest::new("BC547")).await.unwrap_err();
    assert!(matches!(err, NexusError::Configuration(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn non_ok_status_becomes_error_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Products/Search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Status": "E_INPUT_PARAMS_VALIDATION_ERROR",
            "ErrorMessage": "SearchPlain is too short"
        })))
        .mount(&server)
        .await;

    let api = TmeApi::new(tme_config(&server.uri()), http_client()).unwrap();
    let resp = api.search(&SearchRequest::new("B")).await.unwrap();
    assert!(!resp.is_success());
    assert_eq!(
        resp.errors,
        vec!["TME returned status E_INPUT_PARAMS_VALIDATION_ERROR: SearchPlain is too short"]
    );
}

#[tokio::test]
async fn rate_limited_503_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Products/Search.json"))
        .respond_with(ResponseTemplate::new(503).insert_header("X-RateLimit-Limit", "10"))
        .mount(&server)
        .await;

    let api = TmeApi::new(tme_config(&server.uri()), http_client()).unwrap();
    let resp = api.search(&SearchRequest::new("BC547")).await.unwrap();
    assert!(resp.errors.is_empty());
    assert_eq!(
        resp.message.as_deref(),
        Some("TME API rate limit of 10 requests exceeded. Try again later.")
    );
}

#[tokio::test]
async fn product_details_merge_prices_and_documents() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Products/GetProducts.json"))
        .and(body_string_contains("SymbolList%5B0%5D=RC0805JR-0710KL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Status": "OK",
            "Data": {"ProductList": [resistor()]}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/Products/GetPrices.json"))
        .and(body_string_contains("Currency=USD"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Status": "OK",
            "Data": {"Currency": "USD", "ProductList": [{
                "Symbol": "RC0805JR-0710KL",
                "PriceList": [
                    {"Amount": 100, "PriceValue": 0.0041},
                    {"Amount": 5000, "PriceValue": 0.0012}
                ]
            }]}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/Products/GetProductsFiles.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Status": "OK",
            "Data": {"ProductList": [{
                "Symbol": "RC0805JR-0710KL",
                "Files": {"DocumentList": [
                    {"DocumentUrl": "//www.tme.eu/Document/rc0805.pdf", "DocumentType": "DTE"}
                ]}
            }]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = TmeApi::new(tme_config(&server.uri()), http_client()).unwrap();
    let resp = api.get_product_details("RC0805JR-0710KL").await.unwrap();
    assert!(resp.is_success(), "{resp:?}");
    let part = resp.data.unwrap();
    assert_eq!(part.cost, Some(0.0041));
    assert_eq!(part.currency.as_deref(), Some("USD"));
    assert_eq!(
        part.datasheet_urls,
        vec!["https://www.tme.eu/Document/rc0805.pdf"]
    );
    assert_eq!(
        part.product_url.as_deref(),
        Some("https://www.tme.eu/en/details/rc0805jr-0710kl/")
    );
}

#[tokio::test]
async fn orders_and_barcodes_are_unsupported() {
    let server = MockServer::start().await;
    let api = TmeApi::new(tme_config(&server.uri()), http_client()).unwrap();
    assert!(!api.get_order("1").await.unwrap().errors.is_empty());
    assert!(!api.get_barcode_details("x").await.unwrap().errors.is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}
