//! Vendor-neutral result shapes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonPart {
    pub supplier: String,
    pub supplier_part_number: String,
    pub manufacturer: Option<String>,
    pub manufacturer_part_number: String,
    pub description: Option<String>,
    pub detailed_description: Option<String>,
    pub datasheet_urls: Vec<String>,
    pub image_url: Option<String>,
    pub product_url: Option<String>,
    pub cost: Option<f64>,
    pub currency: Option<String>,
    pub quantity_available: i64,
    pub packaging: Option<String>,
    pub category: Option<String>,
    pub parameters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub parts: Vec<CommonPart>,
    pub total_count: i64,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    pub supplier_part_number: String,
    pub manufacturer_part_number: Option<String>,
    pub description: Option<String>,
    pub quantity: i64,
    pub unit_price: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub order_id: String,
    pub status: Option<String>,
    pub currency: Option<String>,
    pub line_items: Vec<OrderLineItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarcodeDetails {
    pub supplier_part_number: String,
    pub manufacturer_part_number: Option<String>,
    pub manufacturer: Option<String>,
    pub description: Option<String>,
    pub quantity: i64,
    pub sales_order_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub product_count: i64,
    pub children: Vec<Category>,
}
