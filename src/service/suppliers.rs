use crate::api::{ArrowApi, DigikeyApi, TmeApi};
use crate::config::Config;
use crate::db::CredentialsStorage;
use crate::error::NexusError;
use crate::types::{
    ApiResponse, BarcodeDetails, Category, CommonPart, OrderDetails, SearchRequest, SearchResults,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Uniform surface over every vendor adapter.
#[async_trait]
pub trait Supplier: Send + Sync {
    /// Route key, lower case.
    fn key(&self) -> &'static str;

    async fn search(&self, request: &SearchRequest)
    -> Result<ApiResponse<SearchResults>, NexusError>;

    async fn get_product_details(
        &self,
        part_number: &str,
    ) -> Result<ApiResponse<CommonPart>, NexusError>;

    async fn get_order(&self, order_id: &str) -> Result<ApiResponse<OrderDetails>, NexusError>;

    async fn get_barcode_details(
        &self,
        barcode: &str,
    ) -> Result<ApiResponse<BarcodeDetails>, NexusError>;

    async fn get_categories(&self) -> Result<ApiResponse<Vec<Category>>, NexusError>;
}

#[async_trait]
impl Supplier for DigikeyApi {
    fn key(&self) -> &'static str {
        "digikey"
    }

    async fn search(
        &self,
        request: &SearchRequest,
    ) -> Result<ApiResponse<SearchResults>, NexusError> {
        DigikeyApi::search(self, request).await
    }

    async fn get_product_details(
        &self,
        part_number: &str,
    ) -> Result<ApiResponse<CommonPart>, NexusError> {
        DigikeyApi::get_product_details(self, part_number).await
    }

    async fn get_order(&self, order_id: &str) -> Result<ApiResponse<OrderDetails>, NexusError> {
        DigikeyApi::get_order(self, order_id).await
    }

    async fn get_barcode_details(
        &self,
        barcode: &str,
    ) -> Result<ApiResponse<BarcodeDetails>, NexusError> {
        DigikeyApi::get_barcode_details(self, barcode).await
    }

    async fn get_categories(&self) -> Result<ApiResponse<Vec<Category>>, NexusError> {
        DigikeyApi::get_categories(self).await
    }
}

#[async_trait]
impl Supplier for TmeApi {
    fn key(&self) -> &'static str {
        "tme"
    }

    async fn search(
        &self,
        request: &SearchRequest,
    ) -> Result<ApiResponse<SearchResults>, NexusError> {
        TmeApi::search(self, request).await
    }

    async fn get_product_details(
        &self,
        part_number: &str,
    ) -> Result<ApiResponse<CommonPart>, NexusError> {
        TmeApi::get_product_details(self, part_number).await
    }

    async fn get_order(&self, order_id: &str) -> Result<ApiResponse<OrderDetails>, NexusError> {
        TmeApi::get_order(self, order_id).await
    }

    async fn get_barcode_details(
        &self,
        barcode: &str,
    ) -> Result<ApiResponse<BarcodeDetails>, NexusError> {
        TmeApi::get_barcode_details(self, barcode).await
    }

    async fn get_categories(&self) -> Result<ApiResponse<Vec<Category>>, NexusError> {
        TmeApi::get_categories(self).await
    }
}

#[async_trait]
impl Supplier for ArrowApi {
    fn key(&self) -> &'static str {
        "arrow"
    }

    async fn search(
        &self,
        request: &SearchRequest,
    ) -> Result<ApiResponse<SearchResults>, NexusError> {
        ArrowApi::search(self, request).await
    }

    async fn get_product_details(
        &self,
        part_number: &str,
    ) -> Result<ApiResponse<CommonPart>, NexusError> {
        ArrowApi::get_product_details(self, part_number).await
    }

    async fn get_order(&self, order_id: &str) -> Result<ApiResponse<OrderDetails>, NexusError> {
        ArrowApi::get_order(self, order_id).await
    }

    async fn get_barcode_details(
        &self,
        barcode: &str,
    ) -> Result<ApiResponse<BarcodeDetails>, NexusError> {
        ArrowApi::get_barcode_details(self, barcode).await
    }

    async fn get_categories(&self) -> Result<ApiResponse<Vec<Category>>, NexusError> {
        ArrowApi::get_categories(self).await
    }
}

/// Enabled suppliers keyed by route name.
#[derive(Clone, Default)]
pub struct Suppliers {
    entries: BTreeMap<&'static str, Arc<dyn Supplier>>,
    digikey: Option<Arc<DigikeyApi>>,
}

impl Suppliers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every supplier whose section is enabled in `cfg`.
    pub fn from_config(
        cfg: &Config,
        http: reqwest::Client,
        storage: CredentialsStorage,
    ) -> Result<Self, NexusError> {
        let mut suppliers = Self::new();
        if cfg.digikey.enabled {
            suppliers = suppliers.with_digikey(Arc::new(DigikeyApi::new(
                cfg.digikey.clone(),
                http.clone(),
                storage,
            )));
        }
        if cfg.tme.enabled {
            suppliers.register(Arc::new(TmeApi::new(cfg.tme.clone(), http.clone())?));
        }
        if cfg.arrow.enabled {
            suppliers.register(Arc::new(ArrowApi::new(cfg.arrow.clone(), http)));
        }
        if suppliers.is_empty() {
            warn!("no suppliers enabled; every supplier route will return 404");
        } else {
            info!(suppliers = ?suppliers.keys(), "suppliers ready");
        }
        Ok(suppliers)
    }

    pub fn register(&mut self, supplier: Arc<dyn Supplier>) {
        self.entries.insert(supplier.key(), supplier);
    }

    /// Register DigiKey and keep a typed handle for the OAuth routes.
    pub fn with_digikey(mut self, digikey: Arc<DigikeyApi>) -> Self {
        self.register(digikey.clone());
        self.digikey = Some(digikey);
        self
    }

    pub fn digikey(&self) -> Result<&Arc<DigikeyApi>, NexusError> {
        self.digikey
            .as_ref()
            .ok_or_else(|| NexusError::UnknownSupplier("digikey".to_string()))
    }

    pub fn get(&self, key: &str) -> Result<Arc<dyn Supplier>, NexusError> {
        self.entries
            .get(key.to_ascii_lowercase().as_str())
            .cloned()
            .ok_or_else(|| NexusError::UnknownSupplier(key.to_string()))
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.entries.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Search every supplier concurrently. A supplier error is reported in its
    /// own slot rather than failing the whole fan-out.
    pub async fn search_all(
        &self,
        request: &SearchRequest,
    ) -> Result<BTreeMap<&'static str, ApiResponse<SearchResults>>, NexusError> {
        request.validate()?;
        let searches = self.entries.iter().map(|(key, supplier)| async move {
            let response = match supplier.search(request).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(supplier = key, error = %e, "supplier search failed");
                    ApiResponse::error(e.to_string())
                }
            };
            (*key, response)
        });
        Ok(futures::future::join_all(searches).await.into_iter().collect())
    }
}
