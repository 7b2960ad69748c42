use crate::types::authorization::{OAuthAuthorization, OAuthCredential};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DbOAuthCredential {
    pub id: i64,
    pub provider: String,
    pub access_token: String,
    pub refresh_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub api_settings: String,
}

impl From<OAuthCredential> for DbOAuthCredential {
    fn from(c: OAuthCredential) -> Self {
        Self {
            id: 0,
            provider: c.provider,
            access_token: c.access_token,
            refresh_token: c.refresh_token,
            created_at: c.created_at,
            expires_at: c.expires_at,
            api_settings: c.api_settings,
        }
    }
}

impl From<DbOAuthCredential> for OAuthCredential {
    fn from(d: DbOAuthCredential) -> Self {
        OAuthCredential {
            provider: d.provider,
            access_token: d.access_token,
            refresh_token: d.refresh_token,
            created_at: d.created_at,
            expires_at: d.expires_at,
            api_settings: d.api_settings,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DbOAuthRequest {
    pub request_id: Uuid,
    pub provider: String,
    pub client_id: String,
    pub redirect_url: String,
    pub authorization_received: bool,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbOAuthRequest> for OAuthAuthorization {
    fn from(d: DbOAuthRequest) -> Self {
        let mut auth = OAuthAuthorization::pending(d.provider, d.client_id, d.redirect_url);
        auth.request_id = Some(d.request_id);
        auth.created_at = d.created_at;
        auth.authorization_received = d.authorization_received;
        auth
    }
}
