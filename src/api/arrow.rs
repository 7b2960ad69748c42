use crate::api::http::{self, ResponseClass};
use crate::config::ArrowConfig;
use crate::error::NexusError;
use crate::types::{
    ApiResponse, BarcodeDetails, Category, CommonPart, OrderDetails, SearchRequest, SearchResults,
};
use serde::Deserialize;
use tracing::debug;

const VENDOR: &str = "Arrow";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchResponse {
    itemserviceresult: ItemServiceResult,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ItemServiceResult {
    data: Vec<ResultData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResultData {
    #[serde(rename = "PartList")]
    part_list: Vec<Part>,
    #[serde(rename = "resultCount")]
    result_count: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Part {
    #[serde(rename = "partNum")]
    part_num: String,
    manufacturer: Option<Manufacturer>,
    desc: Option<String>,
    resources: Vec<Resource>,
    #[serde(rename = "InvOrg")]
    inv_org: Option<InvOrg>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Manufacturer {
    #[serde(rename = "mfrName")]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Resource {
    #[serde(rename = "type")]
    kind: String,
    uri: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InvOrg {
    #[serde(rename = "webSites")]
    web_sites: Vec<WebSite>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WebSite {
    sources: Vec<Source>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Source {
    currency: Option<String>,
    #[serde(rename = "sourceParts")]
    source_parts: Vec<SourcePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SourcePart {
    #[serde(rename = "Availability")]
    availability: Vec<Availability>,
    #[serde(rename = "Prices")]
    prices: Option<Prices>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Availability {
    #[serde(rename = "fohQty")]
    foh_qty: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Prices {
    #[serde(rename = "resaleList")]
    resale_list: Vec<Resale>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Resale {
    price: f64,
    #[serde(rename = "minQty")]
    min_qty: i64,
}

impl Part {
    fn into_common(self) -> CommonPart {
        let sources: Vec<Source> = self
            .inv_org
            .into_iter()
            .flat_map(|org| org.web_sites)
            .flat_map(|site| site.sources)
            .collect();
        let currency = sources.iter().find_map(|s| s.currency.clone());
        let source_parts: Vec<&SourcePart> =
            sources.iter().flat_map(|s| &s.source_parts).collect();
        let quantity_available = source_parts
            .iter()
            .flat_map(|p| &p.availability)
            .map(|a| a.foh_qty)
            .sum();
        let cost = source_parts
            .iter()
            .filter_map(|p| p.prices.as_ref())
            .flat_map(|p| &p.resale_list)
            .min_by_key(|r| r.min_qty)
            .map(|r| r.price);

        let mut datasheet_urls = Vec::new();
        let mut image_url = None;
        for resource in self.resources {
            match resource.kind.as_str() {
                "datasheet" => datasheet_urls.push(resource.uri),
                "image_large" | "image_small" if image_url.is_none() => {
                    image_url = Some(resource.uri)
                }
                _ => {}
            }
        }

        CommonPart {
            supplier: VENDOR.to_string(),
            supplier_part_number: self.part_num.clone(),
            manufacturer: self.manufacturer.map(|m| m.name),
            manufacturer_part_number: self.part_num,
            description: self.desc,
            datasheet_urls,
            image_url,
            cost,
            currency,
            quantity_available,
            ..CommonPart::default()
        }
    }
}

pub struct ArrowApi {
    config: ArrowConfig,
    http: reqwest::Client,
}

impl ArrowApi {
    pub fn new(config: ArrowConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    fn ensure_configured(&self) -> Result<(), NexusError> {
        if self.config.is_configured() {
            Ok(())
        } else {
            Err(NexusError::Configuration(
                "Arrow requires enabled, username and api_key".to_string(),
            ))
        }
    }

    async fn search_token(
        &self,
        token: &str,
        rows: i32,
    ) -> Result<ApiResponse<SearchResults>, NexusError> {
        let url = format!(
            "{}/itemservice/v3/en/search/token",
            self.config.api_url.trim_end_matches('/')
        );
        let rows = rows.to_string();
        debug!(token, "Arrow search");
        let resp = self
            .http
            .get(url)
            .query(&[
                ("login", self.config.username.as_str()),
                ("apikey", self.config.api_key.as_str()),
                ("search_token", token),
                ("rows", rows.as_str()),
            ])
            .send()
            .await?;
        match http::classify(VENDOR, resp).await? {
            ResponseClass::Success(resp) => {
                let body: SearchResponse = http::read_json(resp).await?;
                let mut parts = Vec::new();
                let mut total_count = 0;
                for data in body.itemserviceresult.data {
                    total_count += data.result_count;
                    parts.extend(data.part_list.into_iter().map(Part::into_common));
                }
                Ok(ApiResponse::ok(SearchResults { parts, total_count }))
            }
            ResponseClass::Unauthorized(body) => Err(NexusError::Unauthorized(format!(
                "Arrow rejected the API key: {body}"
            ))),
            other => Ok(http::non_success_response(VENDOR, other)),
        }
    }

    pub async fn search(
        &self,
        request: &SearchRequest,
    ) -> Result<ApiResponse<SearchResults>, NexusError> {
        request.validate()?;
        self.ensure_configured()?;
        self.search_token(request.part_number.trim(), request.record_count)
            .await
    }

    /// Arrow has no details endpoint; an exact part-number match from search stands in.
    pub async fn get_product_details(
        &self,
        part_number: &str,
    ) -> Result<ApiResponse<CommonPart>, NexusError> {
        self.ensure_configured()?;
        let part_number = part_number.trim();
        let response = self.search_token(part_number, 10).await?;
        let Some(results) = response.data else {
            return Ok(response.cast());
        };
        match results
            .parts
            .into_iter()
            .find(|p| p.manufacturer_part_number.eq_ignore_ascii_case(part_number))
        {
            Some(part) => Ok(ApiResponse::ok(part)),
            None => Ok(ApiResponse::error(format!(
                "Arrow has no product `{part_number}`"
            ))),
        }
    }

    pub async fn get_order(&self, _order_id: &str) -> Result<ApiResponse<OrderDetails>, NexusError> {
        Ok(ApiResponse::error("Arrow does not support order lookups"))
    }

    pub async fn get_barcode_details(
        &self,
        _barcode: &str,
    ) -> Result<ApiResponse<BarcodeDetails>, NexusError> {
        Ok(ApiResponse::error("Arrow does not support barcode lookups"))
    }

    pub async fn get_categories(&self) -> Result<ApiResponse<Vec<Category>>, NexusError> {
        Ok(ApiResponse::error("Arrow does not support category listings"))
    }
}
