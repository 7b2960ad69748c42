//! DigiKey Product Information V4 and Order Status V4.

use super::client::{CallOutcome, DigikeyClient, VENDOR, path_segment};
use super::v3::DigikeyV3;
use crate::error::NexusError;
use crate::service::parametric::ParametricMapping;
use crate::types::{
    ApiVersion, BarcodeDetails, Category, CommonPart, OrderDetails, OrderLineItem, SearchRequest,
    SearchResults,
};
use reqwest::Method;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct KeywordRequest {
    keywords: String,
    limit: i32,
    offset: u32,
    filter_options_request: FilterOptionsRequest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct FilterOptionsRequest {
    category_filter: Vec<IdFilter>,
    search_options: Vec<&'static str>,
    market_place_filter: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameter_filter_request: Option<ParameterFilterRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct IdFilter {
    id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ParameterFilterRequest {
    category_filter: IdFilter,
    parameter_filters: Vec<ParameterFilter>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ParameterFilter {
    parameter_id: i32,
    filter_values: Vec<IdFilter>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct KeywordResponse {
    products: Vec<Product>,
    products_count: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ProductDetailsResponse {
    product: Product,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Description {
    product_description: Option<String>,
    detailed_description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Named {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ProductVariation {
    digi_key_product_number: String,
    package_type: Option<Named>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Parameter {
    parameter_text: String,
    value_text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Product {
    description: Description,
    manufacturer: Option<Named>,
    manufacturer_product_number: String,
    unit_price: f64,
    product_url: Option<String>,
    datasheet_url: Option<String>,
    photo_url: Option<String>,
    product_variations: Vec<ProductVariation>,
    quantity_available: i64,
    category: Option<Named>,
    parameters: Vec<Parameter>,
}

impl Product {
    fn into_common(self, currency: &str) -> CommonPart {
        let variation = self.product_variations.into_iter().next();
        let (supplier_part_number, packaging) = match variation {
            Some(v) => (v.digi_key_product_number, v.package_type.map(|p| p.name)),
            None => (String::new(), None),
        };
        CommonPart {
            supplier: VENDOR.to_string(),
            supplier_part_number,
            manufacturer: self.manufacturer.map(|m| m.name),
            manufacturer_part_number: self.manufacturer_product_number,
            description: self.description.product_description,
            detailed_description: self.description.detailed_description,
            datasheet_urls: self.datasheet_url.into_iter().collect(),
            image_url: self.photo_url,
            product_url: self.product_url,
            cost: (self.unit_price > 0.0).then_some(self.unit_price),
            currency: Some(currency.to_string()),
            quantity_available: self.quantity_available,
            packaging,
            category: self.category.map(|c| c.name),
            parameters: self
                .parameters
                .into_iter()
                .map(|p| (p.parameter_text, p.value_text))
                .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct SalesOrderResponse {
    sales_order_id: i64,
    currency: Option<String>,
    status: Option<SalesOrderStatus>,
    line_items: Vec<LineItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct SalesOrderStatus {
    sales_order_status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct LineItem {
    digi_key_product_number: String,
    manufacturer_product_number: Option<String>,
    description: Option<String>,
    quantity_ordered: i64,
    unit_price: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct CategoriesResponse {
    categories: Vec<CategoryDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct CategoryDto {
    category_id: i64,
    name: String,
    product_count: i64,
    child_categories: Vec<CategoryDto>,
}

impl From<CategoryDto> for Category {
    fn from(dto: CategoryDto) -> Self {
        Category {
            id: dto.category_id,
            name: dto.name,
            product_count: dto.product_count,
            children: dto.child_categories.into_iter().map(Category::from).collect(),
        }
    }
}

/// V4 only accepts parameter filters scoped to one category. Without a
/// category the filter labels are folded back into the keyword text.
fn keyword_request(mapping: &ParametricMapping, request: &SearchRequest) -> KeywordRequest {
    let mut keywords = mapping.keywords.clone();
    let parameter_filter_request = match mapping.taxonomies.first() {
        Some(category) if !mapping.filters.is_empty() => Some(ParameterFilterRequest {
            category_filter: IdFilter {
                id: category.to_string(),
            },
            parameter_filters: mapping
                .filters
                .iter()
                .map(|f| ParameterFilter {
                    parameter_id: f.parameter_id.id(),
                    filter_values: vec![IdFilter {
                        id: f.value_id.clone(),
                    }],
                })
                .collect(),
        }),
        _ => {
            keywords.extend(mapping.filters.iter().map(|f| f.label.clone()));
            None
        }
    };

    let mut search_options = Vec::new();
    if request.options.in_stock_only {
        search_options.push("InStock");
    }
    KeywordRequest {
        keywords: keywords.join(" "),
        limit: request.record_count,
        offset: request.options.start_position,
        filter_options_request: FilterOptionsRequest {
            category_filter: mapping
                .taxonomies
                .iter()
                .map(|id| IdFilter { id: id.to_string() })
                .collect(),
            search_options,
            market_place_filter: if request.options.exclude_marketplace {
                "ExcludeMarketPlace"
            } else {
                "NoFilter"
            },
            parameter_filter_request,
        },
    }
}

pub struct DigikeyV4;

impl DigikeyV4 {
    pub async fn search(
        client: &DigikeyClient,
        access_token: &str,
        mapping: &ParametricMapping,
        request: &SearchRequest,
    ) -> Result<CallOutcome<SearchResults>, NexusError> {
        let builder = client
            .request(Method::POST, "/products/v4/search/keyword", access_token)
            .json(&keyword_request(mapping, request));
        let currency = client.config().currency.clone();
        let outcome = client
            .execute::<KeywordResponse>(ApiVersion::V4, builder)
            .await?;
        Ok(outcome.map(|resp| SearchResults {
            parts: resp
                .products
                .into_iter()
                .map(|p| p.into_common(&currency))
                .collect(),
            total_count: resp.products_count,
        }))
    }

    pub async fn product_details(
        client: &DigikeyClient,
        access_token: &str,
        part_number: &str,
    ) -> Result<CallOutcome<CommonPart>, NexusError> {
        let path = format!(
            "/products/v4/search/{}/productdetails",
            path_segment(part_number)
        );
        let builder = client.request(Method::GET, &path, access_token);
        let currency = client.config().currency.clone();
        let outcome = client
            .execute::<ProductDetailsResponse>(ApiVersion::V4, builder)
            .await?;
        Ok(outcome.map(|resp| resp.product.into_common(&currency)))
    }

    pub async fn order(
        client: &DigikeyClient,
        access_token: &str,
        order_id: &str,
    ) -> Result<CallOutcome<OrderDetails>, NexusError> {
        let path = format!("/orderstatus/v4/salesorder/{}", path_segment(order_id));
        let builder = client.request(Method::GET, &path, access_token);
        let outcome = client
            .execute::<SalesOrderResponse>(ApiVersion::V4, builder)
            .await?;
        Ok(outcome.map(|resp| OrderDetails {
            order_id: resp.sales_order_id.to_string(),
            status: resp.status.and_then(|s| s.sales_order_status),
            currency: resp.currency,
            line_items: resp
                .line_items
                .into_iter()
                .map(|item| OrderLineItem {
                    supplier_part_number: item.digi_key_product_number,
                    manufacturer_part_number: item.manufacturer_product_number,
                    description: item.description,
                    quantity: item.quantity_ordered,
                    unit_price: item.unit_price,
                })
                .collect(),
        }))
    }

    pub async fn barcode(
        client: &DigikeyClient,
        access_token: &str,
        barcode: &str,
    ) -> Result<CallOutcome<BarcodeDetails>, NexusError> {
        DigikeyV3::barcode(client, access_token, barcode, ApiVersion::V4).await
    }

    pub async fn categories(
        client: &DigikeyClient,
        access_token: &str,
    ) -> Result<CallOutcome<Vec<Category>>, NexusError> {
        let builder = client.request(Method::GET, "/products/v4/search/categories", access_token);
        let outcome = client
            .execute::<CategoriesResponse>(ApiVersion::V4, builder)
            .await?;
        Ok(outcome.map(|resp| resp.categories.into_iter().map(Category::from).collect()))
    }
}
