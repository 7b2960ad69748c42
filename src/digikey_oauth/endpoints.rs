use crate::config::DigikeyConfig;
use crate::error::NexusError;

use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, Client as OAuth2Client, ClientId, ClientSecret,
    CsrfToken, EndpointNotSet, EndpointSet, ExtraTokenFields, RedirectUrl, RefreshToken,
    StandardRevocableToken, StandardTokenResponse, TokenUrl,
    basic::{
        BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
        BasicTokenType,
    },
};
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

/// Stateless DigiKey OAuth endpoints.
pub(super) struct DigikeyOauthEndpoints;

impl DigikeyOauthEndpoints {
    /// Consent URL carrying `state` so the callback can be matched to its request.
    pub(super) fn build_authorize_url(cfg: &DigikeyConfig, state: String) -> Result<Url, NexusError> {
        let client = build_oauth2_client(cfg)?;
        let (url, _csrf) = client.authorize_url(|| CsrfToken::new(state)).url();
        Ok(url)
    }

    pub(super) async fn exchange_authorization_code(
        cfg: &DigikeyConfig,
        code: AuthorizationCode,
        http_client: &reqwest::Client,
    ) -> Result<DigikeyTokenResponse, NexusError> {
        let client = build_oauth2_client(cfg)?;
        let token_result = client
            .exchange_code(code)
            .request_async(http_client)
            .await?;
        info!("DigiKey authorization code exchanged successfully");
        Ok(token_result)
    }

    /// Refresh the access token using the current refresh token.
    pub(super) async fn refresh_access_token(
        cfg: &DigikeyConfig,
        refresh_token: &str,
        http_client: &reqwest::Client,
    ) -> Result<DigikeyTokenResponse, NexusError> {
        let client = build_oauth2_client(cfg)?;
        let token_result = client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(http_client)
            .await?;
        info!("DigiKey access token refreshed successfully");
        Ok(token_result)
    }
}

/// Build the DigiKey OAuth2 client from configuration.
fn build_oauth2_client(cfg: &DigikeyConfig) -> Result<DigikeyOauth2Client, NexusError> {
    let base = cfg.api_url.trim_end_matches('/');
    let client = OAuth2Client::new(ClientId::new(cfg.client_id.clone()))
        .set_client_secret(ClientSecret::new(cfg.client_secret.clone()))
        .set_auth_uri(AuthUrl::new(format!("{base}/v1/oauth2/authorize"))?)
        .set_token_uri(TokenUrl::new(format!("{base}/v1/oauth2/token"))?)
        .set_redirect_uri(RedirectUrl::new(cfg.oauth_postback_url.clone())?)
        // DigiKey expects client credentials in the form body, not Basic auth
        .set_auth_type(AuthType::RequestBody);
    Ok(client)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub(super) struct DigikeyTokenField {
    #[serde(rename = "refresh_token_expires_in")]
    pub refresh_token_expires_in: Option<u64>,
}
impl ExtraTokenFields for DigikeyTokenField {}

pub(super) type DigikeyTokenResponse = StandardTokenResponse<DigikeyTokenField, BasicTokenType>;

pub(super) type DigikeyOauth2Client = OAuth2Client<
    BasicErrorResponse,
    DigikeyTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_embeds_state_and_redirect() {
        let cfg = DigikeyConfig {
            client_id: "client-123".to_string(),
            client_secret: "secret".to_string(),
            oauth_postback_url: "https://localhost:8000/authorize/digikey".to_string(),
            ..DigikeyConfig::default()
        };
        let url = DigikeyOauthEndpoints::build_authorize_url(&cfg, "req-1".to_string())
            .expect("valid url");

        assert_eq!(url.path(), "/v1/oauth2/authorize");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("state".to_string(), "req-1".to_string())));
        assert!(pairs.contains(&("client_id".to_string(), "client-123".to_string())));
        assert!(pairs.contains(&("response_type".to_string(), "code".to_string())));
        assert!(pairs.contains(&(
            "redirect_uri".to_string(),
            "https://localhost:8000/authorize/digikey".to_string()
        )));
    }
}
