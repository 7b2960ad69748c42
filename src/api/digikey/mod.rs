//! DigiKey adapter: OAuth2 session handling plus V3/V4 fallback.
//!
//! The active API version is never adapter state. It travels with the
//! [`DigikeySession`] returned by [`DigikeyApi::authorize`] and is persisted
//! in the credential's `api_settings` whenever a call settles on a version.

mod client;
mod v3;
mod v4;

pub use client::{CallOutcome, DigikeyClient};

use crate::config::DigikeyConfig;
use crate::db::CredentialsStorage;
use crate::digikey_oauth::{DIGIKEY_PROVIDER, DigikeyOauthService};
use crate::error::NexusError;
use crate::service::parametric::{self, ParametricMapping};
use crate::service::taxonomy;
use crate::types::authorization::ApiSettings;
use crate::types::{
    ApiResponse, ApiVersion, BarcodeDetails, Category, CommonPart, OAuthAuthorization,
    OrderDetails, SearchRequest, SearchResults,
};
use std::future::Future;
use tracing::{info, warn};
use uuid::Uuid;
use v3::DigikeyV3;
use v4::DigikeyV4;

/// An authorized token set and the API version to call with it.
#[derive(Debug, Clone)]
pub struct DigikeySession {
    pub authorization: OAuthAuthorization,
    pub version: ApiVersion,
}

#[derive(Debug, Clone)]
pub enum AuthorizeOutcome {
    Authorized(DigikeySession),
    /// No usable credential; carries the consent URL.
    Pending(OAuthAuthorization),
}

pub struct DigikeyApi {
    client: DigikeyClient,
    oauth: DigikeyOauthService,
    storage: CredentialsStorage,
}

impl DigikeyApi {
    pub fn new(config: DigikeyConfig, http: reqwest::Client, storage: CredentialsStorage) -> Self {
        Self {
            client: DigikeyClient::new(http.clone(), config.clone()),
            oauth: DigikeyOauthService::new(config, http),
            storage,
        }
    }

    fn config(&self) -> &DigikeyConfig {
        self.client.config()
    }

    fn ensure_configured(&self) -> Result<(), NexusError> {
        if self.config().is_configured() {
            Ok(())
        } else {
            Err(NexusError::Configuration(
                "DigiKey requires enabled, client_id, client_secret, oauth_postback_url and api_url"
                    .to_string(),
            ))
        }
    }

    /// Load the stored credential, or register a consent request when there is none.
    pub async fn authorize(&self) -> Result<AuthorizeOutcome, NexusError> {
        if let Some(credential) = self.storage.get_oauth_credential(DIGIKEY_PROVIDER).await? {
            let version = credential
                .settings()
                .version()
                .unwrap_or(self.config().api_version);
            let authorization = OAuthAuthorization::from_credential(
                &credential,
                self.config().client_id.clone(),
                self.config().oauth_postback_url.clone(),
            );
            return Ok(AuthorizeOutcome::Authorized(DigikeySession {
                authorization,
                version,
            }));
        }
        self.begin_authorization()
            .await
            .map(AuthorizeOutcome::Pending)
    }

    async fn begin_authorization(&self) -> Result<OAuthAuthorization, NexusError> {
        let mut pending = self.oauth.pending_authorization();
        let request_id = Uuid::new_v4();
        pending.request_id = Some(request_id);
        let mut created = self.storage.create_oauth_request(&pending).await?;
        created.authorization_url = Some(self.oauth.authorization_url(request_id)?);
        info!(%request_id, "DigiKey authorization required; consent request registered");
        Ok(created)
    }

    async fn requires_authorization<T>(&self) -> Result<ApiResponse<T>, NexusError> {
        let pending = self.begin_authorization().await?;
        Ok(ApiResponse::requires_authorization(
            pending.authorization_url.unwrap_or_default(),
        ))
    }

    /// OAuth callback: `state` is the request id handed out with the consent URL.
    pub async fn complete_authorization(
        &self,
        code: &str,
        state: &str,
    ) -> Result<OAuthAuthorization, NexusError> {
        self.ensure_configured()?;
        let request_id = Uuid::parse_str(state)
            .map_err(|_| NexusError::OauthFlow(format!("malformed state `{state}`")))?;
        let request = self
            .storage
            .get_oauth_request(request_id)
            .await?
            .ok_or_else(|| NexusError::OauthFlow(format!("unknown state `{state}`")))?;
        if request.authorization_received {
            return Err(NexusError::OauthFlow(format!(
                "authorization request {request_id} was already completed"
            )));
        }

        let pending: OAuthAuthorization = request.into();
        let authorized = match self.oauth.exchange_code(pending, code).await {
            Ok(authorized) => authorized,
            Err(e) => {
                self.storage
                    .complete_oauth_request(request_id, Some(&e.to_string()))
                    .await?;
                return Err(e);
            }
        };
        let settings = ApiSettings::for_version(self.config().api_version);
        self.storage
            .save_oauth_credential(&authorized.to_credential(&settings))
            .await?;
        self.storage.complete_oauth_request(request_id, None).await?;
        info!(%request_id, "DigiKey authorization completed");
        Ok(authorized)
    }

    /// Drop the stored credential; the next call starts a new consent flow.
    pub async fn forget_authorization(&self) -> Result<bool, NexusError> {
        let removed = self.storage.remove_oauth_credential(DIGIKEY_PROVIDER).await?;
        if removed {
            info!("DigiKey credential removed");
        }
        Ok(removed)
    }

    /// Persist `authorization` with `version` recorded in its settings,
    /// keeping any other stored settings keys.
    async fn save_session(
        &self,
        authorization: &OAuthAuthorization,
        version: ApiVersion,
    ) -> Result<(), NexusError> {
        let settings = self
            .storage
            .get_oauth_credential(DIGIKEY_PROVIDER)
            .await?
            .map(|c| c.settings())
            .unwrap_or_default()
            .with_version(version);
        self.storage
            .save_oauth_credential(&authorization.to_credential(&settings))
            .await?;
        Ok(())
    }

    /// Run `call` under the expiry and subscription fallback policy.
    async fn wrap_call<T, F, Fut>(
        &self,
        session: DigikeySession,
        call: F,
    ) -> Result<ApiResponse<T>, NexusError>
    where
        F: Fn(ApiVersion, OAuthAuthorization) -> Fut,
        Fut: Future<Output = Result<CallOutcome<T>, NexusError>>,
    {
        let DigikeySession {
            authorization,
            version,
        } = session;
        if authorization.is_expired() {
            info!(%version, "stored DigiKey token already expired; refreshing first");
            return self
                .refresh_and_retry(authorization, version, version, &call)
                .await;
        }

        match call(version, authorization.clone()).await? {
            CallOutcome::Completed(response) => Ok(response),
            CallOutcome::Unsubscribed(attempted) => {
                let other = attempted.other();
                warn!(%attempted, %other, "DigiKey API version not subscribed; switching");
                match call(other, authorization.clone()).await? {
                    CallOutcome::Completed(response) => {
                        self.save_session(&authorization, other).await?;
                        Ok(response)
                    }
                    CallOutcome::Expired => {
                        self.refresh_and_retry(authorization, other, version, &call)
                            .await
                    }
                    CallOutcome::Unsubscribed(_) => Ok(unsubscribed_response(attempted, other)),
                }
            }
            CallOutcome::Expired => {
                self.refresh_and_retry(authorization, version, version, &call)
                    .await
            }
        }
    }

    /// Refresh `stale`, store it under `stored_version`, then retry on
    /// `version`. A different `version` is recorded only once the retry completes.
    async fn refresh_and_retry<T, F, Fut>(
        &self,
        stale: OAuthAuthorization,
        version: ApiVersion,
        stored_version: ApiVersion,
        call: &F,
    ) -> Result<ApiResponse<T>, NexusError>
    where
        F: Fn(ApiVersion, OAuthAuthorization) -> Fut,
        Fut: Future<Output = Result<CallOutcome<T>, NexusError>>,
    {
        let refreshed = match self.oauth.refresh(&stale).await {
            Ok(refreshed) => refreshed,
            Err(e) if e.is_retryable() => return Err(e),
            Err(e) => {
                warn!(error = %e, "DigiKey token refresh rejected; starting a new consent request");
                return self.requires_authorization().await;
            }
        };
        self.save_session(&refreshed, stored_version).await?;
        info!(%version, "DigiKey token refreshed");

        match call(version, refreshed.clone()).await? {
            CallOutcome::Completed(response) => {
                if version != stored_version {
                    self.save_session(&refreshed, version).await?;
                }
                Ok(response)
            }
            CallOutcome::Unsubscribed(attempted) => Ok(ApiResponse::error(format!(
                "DigiKey API is not subscribed for {attempted}"
            ))),
            CallOutcome::Expired => {
                warn!("DigiKey rejected a freshly refreshed token; discarding stored credential");
                self.storage.remove_oauth_credential(DIGIKEY_PROVIDER).await?;
                match self.authorize().await? {
                    AuthorizeOutcome::Pending(pending) => Ok(ApiResponse::requires_authorization(
                        pending.authorization_url.unwrap_or_default(),
                    )),
                    AuthorizeOutcome::Authorized(session) => {
                        match call(session.version, session.authorization).await? {
                            CallOutcome::Completed(response) => Ok(response),
                            _ => Ok(ApiResponse::error(
                                "DigiKey rejected the credentials after re-authorization",
                            )),
                        }
                    }
                }
            }
        }
    }

    /// Validate, authorize, then run one vendor operation under [`Self::wrap_call`].
    async fn run<T, F, Fut>(&self, call: F) -> Result<ApiResponse<T>, NexusError>
    where
        F: Fn(ApiVersion, OAuthAuthorization) -> Fut,
        Fut: Future<Output = Result<CallOutcome<T>, NexusError>>,
    {
        self.ensure_configured()?;
        match self.authorize().await? {
            AuthorizeOutcome::Pending(pending) => Ok(ApiResponse::requires_authorization(
                pending.authorization_url.unwrap_or_default(),
            )),
            AuthorizeOutcome::Authorized(session) => self.wrap_call(session, call).await,
        }
    }

    async fn dispatch_search(
        &self,
        version: ApiVersion,
        authorization: OAuthAuthorization,
        mapping: &ParametricMapping,
        request: &SearchRequest,
    ) -> Result<CallOutcome<SearchResults>, NexusError> {
        let token = authorization.access_token.as_str();
        match version {
            ApiVersion::V3 => DigikeyV3::search(&self.client, token, mapping, request).await,
            ApiVersion::V4 => DigikeyV4::search(&self.client, token, mapping, request).await,
        }
    }

    pub async fn search(
        &self,
        request: &SearchRequest,
    ) -> Result<ApiResponse<SearchResults>, NexusError> {
        request.validate()?;
        self.ensure_configured()?;

        let taxonomies = taxonomy::taxonomies_for(request.part_type.as_deref());
        let mapping =
            parametric::map_keywords(&request.keywords(), request.mounting_type, &taxonomies);
        let filtered = &mapping;
        let response = self
            .run(move |version, auth| self.dispatch_search(version, auth, filtered, request))
            .await?;

        let empty = response.data.as_ref().is_some_and(SearchResults::is_empty);
        if !empty || !mapping.removed_keywords() {
            return Ok(response);
        }
        info!(
            keywords = %mapping.keyword_text(),
            filters = mapping.filters.len(),
            "DigiKey parametric search empty; retrying with original keywords"
        );
        let broadened = &mapping.broadened();
        self.run(move |version, auth| self.dispatch_search(version, auth, broadened, request))
            .await
    }

    pub async fn get_product_details(
        &self,
        part_number: &str,
    ) -> Result<ApiResponse<CommonPart>, NexusError> {
        let client = &self.client;
        self.run(move |version, auth| async move {
            match version {
                ApiVersion::V3 => {
                    DigikeyV3::product_details(client, &auth.access_token, part_number).await
                }
                ApiVersion::V4 => {
                    DigikeyV4::product_details(client, &auth.access_token, part_number).await
                }
            }
        })
        .await
    }

    pub async fn get_order(&self, order_id: &str) -> Result<ApiResponse<OrderDetails>, NexusError> {
        let client = &self.client;
        self.run(move |version, auth| async move {
            match version {
                ApiVersion::V3 => DigikeyV3::order(client, &auth.access_token, order_id).await,
                ApiVersion::V4 => DigikeyV4::order(client, &auth.access_token, order_id).await,
            }
        })
        .await
    }

    pub async fn get_barcode_details(
        &self,
        barcode: &str,
    ) -> Result<ApiResponse<BarcodeDetails>, NexusError> {
        let client = &self.client;
        self.run(move |version, auth| async move {
            match version {
                ApiVersion::V3 => {
                    DigikeyV3::barcode(client, &auth.access_token, barcode, ApiVersion::V3).await
                }
                ApiVersion::V4 => DigikeyV4::barcode(client, &auth.access_token, barcode).await,
            }
        })
        .await
    }

    pub async fn get_categories(&self) -> Result<ApiResponse<Vec<Category>>, NexusError> {
        let client = &self.client;
        self.run(move |version, auth| async move {
            match version {
                ApiVersion::V3 => DigikeyV3::categories(client, &auth.access_token).await,
                ApiVersion::V4 => DigikeyV4::categories(client, &auth.access_token).await,
            }
        })
        .await
    }
}

fn unsubscribed_response<T>(first: ApiVersion, second: ApiVersion) -> ApiResponse<T> {
    ApiResponse::error(format!(
        "DigiKey API is not subscribed for {first} or {second}"
    ))
}
