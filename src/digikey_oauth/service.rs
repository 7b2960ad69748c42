use super::endpoints::{DigikeyOauthEndpoints, DigikeyTokenResponse};
use crate::config::DigikeyConfig;
use crate::error::NexusError;
use crate::types::authorization::OAuthAuthorization;
use backon::{ExponentialBuilder, Retryable};
use oauth2::{AuthorizationCode, TokenResponse};
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

pub const DIGIKEY_PROVIDER: &str = "DigiKey";

fn default_retry_policy() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(500))
        .with_max_delay(Duration::from_secs(3))
        .with_max_times(2)
        .with_jitter()
}

/// Authorization-code and refresh-token exchanges against DigiKey.
#[derive(Clone)]
pub struct DigikeyOauthService {
    config: DigikeyConfig,
    http: reqwest::Client,
}

impl DigikeyOauthService {
    pub fn new(config: DigikeyConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    pub fn config(&self) -> &DigikeyConfig {
        &self.config
    }

    /// A fresh pending authorization for this client, not yet registered anywhere.
    pub fn pending_authorization(&self) -> OAuthAuthorization {
        OAuthAuthorization::pending(
            DIGIKEY_PROVIDER,
            self.config.client_id.clone(),
            self.config.oauth_postback_url.clone(),
        )
    }

    pub fn authorization_url(&self, request_id: Uuid) -> Result<String, NexusError> {
        DigikeyOauthEndpoints::build_authorize_url(&self.config, request_id.to_string())
            .map(|url| url.to_string())
    }

    /// Exchange the callback `code` and return an authorized copy of `pending`.
    pub async fn exchange_code(
        &self,
        pending: OAuthAuthorization,
        code: &str,
    ) -> Result<OAuthAuthorization, NexusError> {
        let token = DigikeyOauthEndpoints::exchange_authorization_code(
            &self.config,
            AuthorizationCode::new(code.to_string()),
            &self.http,
        )
        .await?;
        Ok(apply_token(pending, &token))
    }

    /// Refresh-token exchange. Transport failures are retried; a rejection by
    /// the token endpoint is returned immediately.
    pub async fn refresh(
        &self,
        authorization: &OAuthAuthorization,
    ) -> Result<OAuthAuthorization, NexusError> {
        if authorization.refresh_token.is_empty() {
            return Err(NexusError::Oauth2Server {
                error: "no refresh token stored".to_string(),
            });
        }
        let token = (|| async {
            DigikeyOauthEndpoints::refresh_access_token(
                &self.config,
                &authorization.refresh_token,
                &self.http,
            )
            .await
        })
        .retry(default_retry_policy())
        .when(|e: &NexusError| e.is_retryable())
        .notify(|err, dur: Duration| {
            warn!(
                "DigiKey token refresh retrying after error {}, sleeping {:?}",
                err, dur
            );
        })
        .await?;
        Ok(apply_token(authorization.clone(), &token))
    }
}

fn apply_token(authorization: OAuthAuthorization, token: &DigikeyTokenResponse) -> OAuthAuthorization {
    authorization.with_tokens(
        token.access_token().secret().clone(),
        token.refresh_token().map(|r| r.secret().clone()),
        token.expires_in(),
    )
}
