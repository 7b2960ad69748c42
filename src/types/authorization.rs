use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// DigiKey API major version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiVersion {
    #[default]
    V3,
    V4,
}

impl ApiVersion {
    pub fn other(self) -> Self {
        match self {
            ApiVersion::V3 => ApiVersion::V4,
            ApiVersion::V4 => ApiVersion::V3,
        }
    }

    pub fn major(self) -> u8 {
        match self {
            ApiVersion::V3 => 3,
            ApiVersion::V4 => 4,
        }
    }

    pub fn from_major(major: u8) -> Option<Self> {
        match major {
            3 => Some(ApiVersion::V3),
            4 => Some(ApiVersion::V4),
            _ => None,
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.major())
    }
}

/// Opaque settings blob stored next to a credential.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(rename = "ApiVersion", default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<u8>,
    /// Keys written by other tools are carried through untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ApiSettings {
    pub fn for_version(version: ApiVersion) -> Self {
        Self {
            api_version: Some(version.major()),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_version(mut self, version: ApiVersion) -> Self {
        self.api_version = Some(version.major());
        self
    }

    /// Unparseable blobs are treated as empty settings.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::default();
        }
        serde_json::from_str(raw).unwrap_or_default()
    }

    pub fn version(&self) -> Option<ApiVersion> {
        self.api_version.and_then(ApiVersion::from_major)
    }

    pub fn to_blob(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// In-flight OAuth state for one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthAuthorization {
    pub provider: String,
    pub client_id: String,
    pub redirect_url: String,
    pub access_token: String,
    pub refresh_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub authorization_received: bool,
    pub user_id: Option<i64>,
    pub authorization_url: Option<String>,
    pub request_id: Option<Uuid>,
}

impl OAuthAuthorization {
    /// A not-yet-authorized request; the consent URL is filled in later.
    pub fn pending(
        provider: impl Into<String>,
        client_id: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            provider: provider.into(),
            client_id: client_id.into(),
            redirect_url: redirect_url.into(),
            access_token: String::new(),
            refresh_token: String::new(),
            created_at: now,
            expires_at: now,
            authorization_received: false,
            user_id: None,
            authorization_url: None,
            request_id: None,
        }
    }

    /// Rebuild an authorization from a persisted credential without contacting the vendor.
    pub fn from_credential(
        credential: &OAuthCredential,
        client_id: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            provider: credential.provider.clone(),
            client_id: client_id.into(),
            redirect_url: redirect_url.into(),
            access_token: credential.access_token.clone(),
            refresh_token: credential.refresh_token.clone(),
            created_at: credential.created_at,
            expires_at: credential.expires_at,
            authorization_received: true,
            user_id: None,
            authorization_url: None,
            request_id: None,
        }
    }

    pub fn is_authorized(&self) -> bool {
        self.authorization_received && !self.access_token.is_empty() && Utc::now() < self.expires_at
    }

    pub fn must_authorize(&self) -> bool {
        !self.is_authorized()
    }

    /// Tokens are present but the access token lifetime has run out.
    pub fn is_expired(&self) -> bool {
        self.authorization_received && !self.access_token.is_empty() && Utc::now() >= self.expires_at
    }

    pub fn to_credential(&self, settings: &ApiSettings) -> OAuthCredential {
        OAuthCredential {
            provider: self.provider.clone(),
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            created_at: self.created_at,
            expires_at: self.expires_at,
            api_settings: settings.to_blob(),
        }
    }

    pub fn with_tokens(
        mut self,
        access_token: String,
        refresh_token: Option<String>,
        expires_in: Option<std::time::Duration>,
    ) -> Self {
        let now = Utc::now();
        self.access_token = access_token;
        if let Some(refresh) = refresh_token {
            self.refresh_token = refresh;
        }
        self.created_at = now;
        self.expires_at = now
            + expires_in
                .and_then(|d| Duration::from_std(d).ok())
                .unwrap_or_else(|| Duration::minutes(30));
        self.authorization_received = true;
        self.authorization_url = None;
        self
    }
}

/// Persisted token set, one per provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthCredential {
    pub provider: String,
    pub access_token: String,
    pub refresh_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub api_settings: String,
}

impl OAuthCredential {
    pub fn settings(&self) -> ApiSettings {
        ApiSettings::parse(&self.api_settings)
    }
}
