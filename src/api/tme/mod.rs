//! TME adapter: HMAC-SHA1 signed form POSTs to `{api_url}/{Prefix}/{Action}.json`.

mod documents;
pub mod signing;

pub use documents::DocumentResolver;
pub use signing::TmeSigner;

use crate::api::http::{self, ResponseClass};
use crate::config::TmeConfig;
use crate::error::NexusError;
use crate::service::parametric::{self, ParametricMapping};
use crate::service::taxonomy;
use crate::types::{
    ApiResponse, BarcodeDetails, Category, CommonPart, OrderDetails, SearchRequest, SearchResults,
};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use tracing::{debug, info};

const VENDOR: &str = "TME";
/// TME pages search results in fixed blocks.
const SEARCH_PAGE_SIZE: u32 = 20;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Envelope<D> {
    #[serde(default)]
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    data: Option<D>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct SearchData {
    product_list: Vec<Product>,
    amount: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ProductsData {
    product_list: Vec<Product>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Product {
    symbol: String,
    original_symbol: String,
    producer: Option<String>,
    description: Option<String>,
    category: Option<String>,
    photo: Option<String>,
    product_information_page: Option<String>,
}

impl Product {
    fn into_common(self, currency: &str) -> CommonPart {
        CommonPart {
            supplier: VENDOR.to_string(),
            supplier_part_number: self.symbol,
            manufacturer: self.producer,
            manufacturer_part_number: self.original_symbol,
            description: self.description,
            image_url: self.photo.map(|p| absolute_url(&p)),
            product_url: self.product_information_page.map(|p| absolute_url(&p)),
            currency: Some(currency.to_string()),
            category: self.category,
            ..CommonPart::default()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct PricesData {
    currency: Option<String>,
    product_list: Vec<ProductPrices>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ProductPrices {
    symbol: String,
    price_list: Vec<PriceBreak>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct PriceBreak {
    amount: i64,
    price_value: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct FilesData {
    product_list: Vec<ProductFiles>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ProductFiles {
    symbol: String,
    files: Files,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Files {
    document_list: Vec<Document>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Document {
    document_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct CategoriesData {
    category_tree: CategoryNode,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct CategoryNode {
    id: i64,
    name: String,
    total_products: i64,
    sub_tree: Vec<CategoryNode>,
}

impl From<CategoryNode> for Category {
    fn from(node: CategoryNode) -> Self {
        Category {
            id: node.id,
            name: node.name,
            product_count: node.total_products,
            children: node.sub_tree.into_iter().map(Category::from).collect(),
        }
    }
}

/// TME returns protocol-relative links for photos and documents.
fn absolute_url(link: &str) -> String {
    match link.strip_prefix("//") {
        Some(rest) => format!("https://{rest}"),
        None => link.to_string(),
    }
}

fn search_params(mapping: &ParametricMapping, request: &SearchRequest) -> BTreeMap<String, String> {
    let mut params = BTreeMap::from([
        ("SearchPlain".to_string(), mapping.keyword_text()),
        (
            "SearchPage".to_string(),
            (request.options.start_position / SEARCH_PAGE_SIZE + 1).to_string(),
        ),
    ]);
    if request.options.in_stock_only {
        params.insert("SearchWithStock".to_string(), "true".to_string());
    }
    for filter in &mapping.filters {
        params.insert(
            format!("SearchParameters[{}][0]", filter.parameter_id.tme_id()),
            filter.label.clone(),
        );
    }
    params
}

pub struct TmeApi {
    config: TmeConfig,
    http: reqwest::Client,
    signer: TmeSigner,
    documents: Option<DocumentResolver>,
}

impl TmeApi {
    pub fn new(config: TmeConfig, http: reqwest::Client) -> Result<Self, NexusError> {
        let signer = TmeSigner::new(
            config.api_key.clone(),
            config.application_secret.clone(),
            &config.country,
            &config.language,
        );
        let documents = if config.resolve_external_links {
            Some(DocumentResolver::new()?)
        } else {
            None
        };
        Ok(Self {
            config,
            http,
            signer,
            documents,
        })
    }

    fn ensure_configured(&self) -> Result<(), NexusError> {
        if self.config.is_configured() {
            Ok(())
        } else {
            Err(NexusError::Configuration(
                "TME requires enabled, api_key and application_secret".to_string(),
            ))
        }
    }

    /// Signed POST of one action. 401 is fatal; a body whose `Status` is not
    /// `OK` becomes an error response.
    async fn post<D: DeserializeOwned>(
        &self,
        action: &str,
        params: BTreeMap<String, String>,
    ) -> Result<ApiResponse<D>, NexusError> {
        let url = format!("{}/{action}.json", self.config.api_url.trim_end_matches('/'));
        let body = self.signer.signed_body(&url, params)?;
        debug!(action, "TME request");
        let resp = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;
        match http::classify(VENDOR, resp).await? {
            ResponseClass::Success(resp) => {
                let envelope: Envelope<D> = http::read_json(resp).await?;
                match envelope.data {
                    Some(data) if envelope.status == "OK" => Ok(ApiResponse::ok(data)),
                    _ => Ok(ApiResponse::error(format!(
                        "TME returned status {}: {}",
                        envelope.status,
                        envelope.error_message.unwrap_or_default()
                    ))),
                }
            }
            ResponseClass::Unauthorized(body) => Err(NexusError::Unauthorized(format!(
                "TME rejected the API token: {body}"
            ))),
            other => Ok(http::non_success_response(VENDOR, other)),
        }
    }

    async fn search_once(
        &self,
        mapping: &ParametricMapping,
        request: &SearchRequest,
    ) -> Result<ApiResponse<SearchResults>, NexusError> {
        let limit = usize::try_from(request.record_count).unwrap_or_default();
        let currency = self.config.currency.clone();
        let response = self
            .post::<SearchData>("Products/Search", search_params(mapping, request))
            .await?;
        Ok(response.map(|data| SearchResults {
            parts: data
                .product_list
                .into_iter()
                .take(limit)
                .map(|p| p.into_common(&currency))
                .collect(),
            total_count: data.amount,
        }))
    }

    pub async fn search(
        &self,
        request: &SearchRequest,
    ) -> Result<ApiResponse<SearchResults>, NexusError> {
        request.validate()?;
        self.ensure_configured()?;

        // Taxonomies only steer the mapper; search_params never sends them.
        let taxonomies = taxonomy::taxonomies_for(request.part_type.as_deref());
        let mapping =
            parametric::map_keywords(&request.keywords(), request.mounting_type, &taxonomies);
        let response = self.search_once(&mapping, request).await?;
        let empty = response.data.as_ref().is_some_and(SearchResults::is_empty);
        if !empty || !mapping.removed_keywords() {
            return Ok(response);
        }
        info!(
            keywords = %mapping.keyword_text(),
            filters = mapping.filters.len(),
            "TME parametric search empty; retrying with original keywords"
        );
        self.search_once(&mapping.broadened(), request).await
    }

    pub async fn get_product_details(
        &self,
        part_number: &str,
    ) -> Result<ApiResponse<CommonPart>, NexusError> {
        self.ensure_configured()?;
        let symbols = BTreeMap::from([("SymbolList[0]".to_string(), part_number.to_string())]);

        let products = self
            .post::<ProductsData>("Products/GetProducts", symbols.clone())
            .await?;
        let Some(data) = products.data else {
            return Ok(products.cast());
        };
        let Some(product) = data.product_list.into_iter().next() else {
            return Ok(ApiResponse::error(format!(
                "TME has no product `{part_number}`"
            )));
        };
        let mut part = product.into_common(&self.config.currency);

        let mut price_params = symbols.clone();
        price_params.insert("Currency".to_string(), self.config.currency.clone());
        let prices = self.post::<PricesData>("Products/GetPrices", price_params).await?;
        if let Some(prices) = prices.data
            && let Some(entry) = prices
                .product_list
                .into_iter()
                .find(|p| p.symbol == part.supplier_part_number)
        {
            part.cost = entry
                .price_list
                .iter()
                .min_by_key(|p| p.amount)
                .map(|p| p.price_value);
            if prices.currency.is_some() {
                part.currency = prices.currency;
            }
        }

        let files = self
            .post::<FilesData>("Products/GetProductsFiles", symbols)
            .await?;
        if let Some(files) = files.data {
            let links: Vec<String> = files
                .product_list
                .into_iter()
                .filter(|f| f.symbol == part.supplier_part_number)
                .flat_map(|f| f.files.document_list)
                .map(|d| absolute_url(&d.document_url))
                .collect();
            part.datasheet_urls = match &self.documents {
                Some(resolver) => resolver.resolve_all(links).await,
                None => links,
            };
        }
        Ok(ApiResponse::ok(part))
    }

    pub async fn get_order(&self, _order_id: &str) -> Result<ApiResponse<OrderDetails>, NexusError> {
        Ok(ApiResponse::error("TME does not support order lookups"))
    }

    pub async fn get_barcode_details(
        &self,
        _barcode: &str,
    ) -> Result<ApiResponse<BarcodeDetails>, NexusError> {
        Ok(ApiResponse::error("TME does not support barcode lookups"))
    }

    pub async fn get_categories(&self) -> Result<ApiResponse<Vec<Category>>, NexusError> {
        self.ensure_configured()?;
        let params = BTreeMap::from([("Tree".to_string(), "true".to_string())]);
        let response = self
            .post::<CategoriesData>("Products/GetCategories", params)
            .await?;
        Ok(response.map(|data| {
            data.category_tree
                .sub_tree
                .into_iter()
                .map(Category::from)
                .collect()
        }))
    }
}
