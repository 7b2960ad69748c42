use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;

use crate::handlers::digikey_oauth::{digikey_forget_authorization, digikey_oauth_callback};
use crate::handlers::suppliers::{
    barcode_handler, categories_handler, order_handler, product_details_handler,
    search_all_handler, search_handler,
};
use crate::service::Suppliers;

#[derive(Clone)]
pub struct NexusState {
    pub suppliers: Arc<Suppliers>,
    pub nexus_key: Arc<str>,
}

impl NexusState {
    pub fn new(suppliers: Suppliers, nexus_key: Arc<str>) -> Self {
        Self {
            suppliers: Arc::new(suppliers),
            nexus_key,
        }
    }
}

pub fn nexus_router(state: NexusState) -> Router {
    Router::new()
        .route("/api/search", post(search_all_handler))
        .route("/api/digikey/authorization", delete(digikey_forget_authorization))
        .route("/api/{supplier}/search", post(search_handler))
        .route("/api/{supplier}/parts/{part_number}", get(product_details_handler))
        .route("/api/{supplier}/orders/{order_id}", get(order_handler))
        .route("/api/{supplier}/barcodes/{barcode}", get(barcode_handler))
        .route("/api/{supplier}/categories", get(categories_handler))
        .route("/authorize/digikey", get(digikey_oauth_callback))
        .with_state(state)
}
