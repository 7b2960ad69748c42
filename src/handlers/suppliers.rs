use axum::{
    Json,
    extract::{Path, State},
};
use std::collections::BTreeMap;

use crate::middleware::RequireKeyAuth;
use crate::types::{
    ApiResponse, BarcodeDetails, Category, CommonPart, OrderDetails, SearchRequest, SearchResults,
};
use crate::{NexusError, router::NexusState};

pub async fn search_handler(
    _auth: RequireKeyAuth,
    State(state): State<NexusState>,
    Path(supplier): Path<String>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<ApiResponse<SearchResults>>, NexusError> {
    let supplier = state.suppliers.get(&supplier)?;
    Ok(Json(supplier.search(&request).await?))
}

/// Fan the same request out to every enabled supplier.
pub async fn search_all_handler(
    _auth: RequireKeyAuth,
    State(state): State<NexusState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<BTreeMap<&'static str, ApiResponse<SearchResults>>>, NexusError> {
    Ok(Json(state.suppliers.search_all(&request).await?))
}

pub async fn product_details_handler(
    _auth: RequireKeyAuth,
    State(state): State<NexusState>,
    Path((supplier, part_number)): Path<(String, String)>,
) -> Result<Json<ApiResponse<CommonPart>>, NexusError> {
    let supplier = state.suppliers.get(&supplier)?;
    Ok(Json(supplier.get_product_details(&part_number).await?))
}

pub async fn order_handler(
    _auth: RequireKeyAuth,
    State(state): State<NexusState>,
    Path((supplier, order_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<OrderDetails>>, NexusError> {
    let supplier = state.suppliers.get(&supplier)?;
    Ok(Json(supplier.get_order(&order_id).await?))
}

pub async fn barcode_handler(
    _auth: RequireKeyAuth,
    State(state): State<NexusState>,
    Path((supplier, barcode)): Path<(String, String)>,
) -> Result<Json<ApiResponse<BarcodeDetails>>, NexusError> {
    let supplier = state.suppliers.get(&supplier)?;
    Ok(Json(supplier.get_barcode_details(&barcode).await?))
}

pub async fn categories_handler(
    _auth: RequireKeyAuth,
    State(state): State<NexusState>,
    Path(supplier): Path<String>,
) -> Result<Json<ApiResponse<Vec<Category>>>, NexusError> {
    let supplier = state.suppliers.get(&supplier)?;
    Ok(Json(supplier.get_categories().await?))
}
