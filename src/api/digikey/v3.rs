//! DigiKey Product Information V3 and the V3-only order/barcode APIs.

use super::client::{CallOutcome, DigikeyClient, VENDOR, path_segment};
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
struct KeywordSearchRequest {
    keywords: String,
    record_count: i32,
    record_start_position: u32,
    filters: Filters,
    search_options: Vec<&'static str>,
    exclude_market_place_products: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Filters {
    taxonomy_ids: Vec<u32>,
    parametric_filters: Vec<ParametricFilterDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ParametricFilterDto {
    parameter_id: i32,
    value_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct KeywordSearchResponse {
    products: Vec<Product>,
    products_count: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct PidVid {
    parameter: String,
    value: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Product {
    digi_key_part_number: String,
    manufacturer_part_number: String,
    manufacturer: Option<PidVid>,
    product_description: Option<String>,
    detailed_description: Option<String>,
    primary_datasheet: Option<String>,
    primary_photo: Option<String>,
    product_url: Option<String>,
    unit_price: f64,
    quantity_available: i64,
    packaging: Option<PidVid>,
    category: Option<PidVid>,
    parameters: Vec<PidVid>,
}

impl Product {
    fn into_common(self, currency: &str) -> CommonPart {
        CommonPart {
            supplier: VENDOR.to_string(),
            supplier_part_number: self.digi_key_part_number,
            manufacturer: self.manufacturer.map(|m| m.value),
            manufacturer_part_number: self.manufacturer_part_number,
            description: self.product_description,
            detailed_description: self.detailed_description,
            datasheet_urls: self.primary_datasheet.into_iter().collect(),
            image_url: self.primary_photo,
            product_url: self.product_url,
            cost: (self.unit_price > 0.0).then_some(self.unit_price),
            currency: Some(currency.to_string()),
            quantity_available: self.quantity_available,
            packaging: self.packaging.map(|p| p.value),
            category: self.category.map(|c| c.value),
            parameters: self
                .parameters
                .into_iter()
                .map(|p| (p.parameter, p.value))
                .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct OrderStatusResponse {
    salesorder_id: i64,
    currency: Option<String>,
    order_status: Option<String>,
    line_items: Vec<LineItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct LineItem {
    digi_key_part_number: String,
    manufacturer_part_number: Option<String>,
    product_description: Option<String>,
    quantity: i64,
    unit_price: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ProductBarcodeResponse {
    digi_key_part_number: String,
    manufacturer_part_number: Option<String>,
    manufacturer_name: Option<String>,
    product_description: Option<String>,
    quantity: i64,
    salesorder_id: Option<i64>,
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
    children: Vec<CategoryDto>,
}

impl From<CategoryDto> for Category {
    fn from(dto: CategoryDto) -> Self {
        Category {
            id: dto.category_id,
            name: dto.name,
            product_count: dto.product_count,
            children: dto.children.into_iter().map(Category::from).collect(),
        }
    }
}

pub struct DigikeyV3;

impl DigikeyV3 {
    pub async fn search(
        client: &DigikeyClient,
        access_token: &str,
        mapping: &ParametricMapping,
        request: &SearchRequest,
    ) -> Result<CallOutcome<SearchResults>, NexusError> {
        let mut search_options = Vec::new();
        if request.options.in_stock_only {
            search_options.push("InStock");
        }
        let body = KeywordSearchRequest {
            keywords: mapping.keyword_text(),
            record_count: request.record_count,
            record_start_position: request.options.start_position,
            filters: Filters {
                taxonomy_ids: mapping.taxonomies.clone(),
                parametric_filters: mapping
                    .filters
                    .iter()
                    .map(|f| ParametricFilterDto {
                        parameter_id: f.parameter_id.id(),
                        value_id: f.value_id.clone(),
                    })
                    .collect(),
            },
            search_options,
            exclude_market_place_products: request.options.exclude_marketplace,
        };
        let builder = client
            .request(Method::POST, "/Search/v3/Products/Keyword", access_token)
            .json(&body);
        let currency = client.config().currency.clone();
        let outcome = client
            .execute::<KeywordSearchResponse>(ApiVersion::V3, builder)
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
        let path = format!("/Search/v3/Products/{}", path_segment(part_number));
        let builder = client.request(Method::GET, &path, access_token);
        let currency = client.config().currency.clone();
        let outcome = client.execute::<Product>(ApiVersion::V3, builder).await?;
        Ok(outcome.map(|p| p.into_common(&currency)))
    }

    pub async fn order(
        client: &DigikeyClient,
        access_token: &str,
        order_id: &str,
    ) -> Result<CallOutcome<OrderDetails>, NexusError> {
        let path = format!("/OrderDetails/v3/Status/{}", path_segment(order_id));
        let builder = client.request(Method::GET, &path, access_token);
        let outcome = client
            .execute::<OrderStatusResponse>(ApiVersion::V3, builder)
            .await?;
        Ok(outcome.map(|resp| OrderDetails {
            order_id: resp.salesorder_id.to_string(),
            status: resp.order_status,
            currency: resp.currency,
            line_items: resp
                .line_items
                .into_iter()
                .map(|item| OrderLineItem {
                    supplier_part_number: item.digi_key_part_number,
                    manufacturer_part_number: item.manufacturer_part_number,
                    description: item.product_description,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
                .collect(),
        }))
    }

    /// Also serves V4 callers; DigiKey publishes no V4 barcode API.
    pub async fn barcode(
        client: &DigikeyClient,
        access_token: &str,
        barcode: &str,
        version: ApiVersion,
    ) -> Result<CallOutcome<BarcodeDetails>, NexusError> {
        let path = format!("/Barcoding/v3/ProductBarcodes/{}", path_segment(barcode));
        let builder = client.request(Method::GET, &path, access_token);
        let outcome = client
            .execute::<ProductBarcodeResponse>(version, builder)
            .await?;
        Ok(outcome.map(|resp| BarcodeDetails {
            supplier_part_number: resp.digi_key_part_number,
            manufacturer_part_number: resp.manufacturer_part_number,
            manufacturer: resp.manufacturer_name,
            description: resp.product_description,
            quantity: resp.quantity,
            sales_order_id: resp.salesorder_id,
        }))
    }

    pub async fn categories(
        client: &DigikeyClient,
        access_token: &str,
    ) -> Result<CallOutcome<Vec<Category>>, NexusError> {
        let builder = client.request(Method::GET, "/Search/v3/Categories", access_token);
        let outcome = client
            .execute::<CategoriesResponse>(ApiVersion::V3, builder)
            .await?;
        Ok(outcome.map(|resp| resp.categories.into_iter().map(Category::from).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_normalizes_nested_fields() {
        let raw = r#"{
            "DigiKeyPartNumber": "311-10.0KCRCT-ND",
            "ManufacturerPartNumber": "RC0805FR-0710KL",
            "Manufacturer": {"ParameterId": -1, "Parameter": "Manufacturer", "Value": "YAGEO"},
            "ProductDescription": "RES 10K OHM 1% 1/8W 0805",
            "PrimaryDatasheet": "https://example.test/ds.pdf",
            "UnitPrice": 0.1,
            "QuantityAvailable": 1500,
            "Parameters": [{"ParameterId": 2085, "Parameter": "Resistance", "Value": "10 kOhms"}]
        }"#;
        let product: Product = serde_json::from_str(raw).unwrap();
        let part = product.into_common("USD");
        assert_eq!(part.supplier, "DigiKey");
        assert_eq!(part.manufacturer.as_deref(), Some("YAGEO"));
        assert_eq!(part.datasheet_urls, vec!["https://example.test/ds.pdf"]);
        assert_eq!(part.cost, Some(0.1));
        assert_eq!(part.parameters.get("Resistance").map(String::as_str), Some("10 kOhms"));
    }

    #[test]
    fn keyword_request_uses_pascal_case() {
        let body = KeywordSearchRequest {
            keywords: "100".to_string(),
            record_count: 5,
            record_start_position: 0,
            filters: Filters {
                taxonomy_ids: vec![52],
                parametric_filters: vec![ParametricFilterDto {
                    parameter_id: 2085,
                    value_id: "10 kOhms".to_string(),
                }],
            },
            search_options: vec!["InStock"],
            exclude_market_place_products: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["RecordCount"], 5);
        assert_eq!(json["Filters"]["TaxonomyIds"][0], 52);
        assert_eq!(json["Filters"]["ParametricFilters"][0]["ParameterId"], 2085);
        assert_eq!(json["ExcludeMarketPlaceProducts"], true);
    }
}
