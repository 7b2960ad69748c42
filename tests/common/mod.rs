#![allow(dead_code)]

use chrono::{Duration, Utc};
use parts_nexus::config::{ArrowConfig, BasicConfig, DigikeyConfig, TmeConfig};
use parts_nexus::db::CredentialsStorage;
use parts_nexus::types::authorization::ApiSettings;
use parts_nexus::types::{ApiVersion, OAuthCredential};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

pub struct TempDb {
    pub storage: CredentialsStorage,
    path: PathBuf,
}

impl Drop for TempDb {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

pub async fn temp_db(tag: &str) -> TempDb {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "parts-nexus-{tag}-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));
    let storage = parts_nexus::db::connect(&format!("sqlite:{}", path.display()))
        .await
        .expect("open temp database");
    TempDb { storage, path }
}

pub fn http_client() -> reqwest::Client {
    parts_nexus::api::http::build_client(&BasicConfig::default()).expect("http client")
}

pub fn digikey_config(api_url: &str) -> DigikeyConfig {
    DigikeyConfig {
        enabled: true,
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        api_url: api_url.to_string(),
        ..DigikeyConfig::default()
    }
}

pub fn tme_config(api_url: &str) -> TmeConfig {
    TmeConfig {
        enabled: true,
        api_key: "tme-token".to_string(),
        application_secret: "tme-secret".to_string(),
        api_url: api_url.to_string(),
        resolve_external_links: false,
        ..TmeConfig::default()
    }
}

pub fn arrow_config(api_url: &str) -> ArrowConfig {
    ArrowConfig {
        enabled: true,
        username: "arrow-user".to_string(),
        api_key: "arrow-key".to_string(),
        api_url: api_url.to_string(),
    }
}

/// Store a DigiKey credential whose access token expires `minutes` from now.
pub async fn seed_digikey_credential(
    storage: &CredentialsStorage,
    access_token: &str,
    minutes: i64,
    version: ApiVersion,
) {
    let now = Utc::now();
    let credential = OAuthCredential {
        provider: "DigiKey".to_string(),
        access_token: access_token.to_string(),
        refresh_token: "refresh-1".to_string(),
        created_at: now - Duration::minutes(5),
        expires_at: now + Duration::minutes(minutes),
        api_settings: ApiSettings::for_version(version).to_blob(),
    };
    storage
        .save_oauth_credential(&credential)
        .await
        .expect("seed credential");
}

pub fn token_body(access_token: &str) -> serde_json::Value {
    serde_json::json!({
        "access_token": access_token,
        "refresh_token": "refresh-2",
        "expires_in": 1799,
        "refresh_token_expires_in": 7776000,
        "token_type": "Bearer"
    })
}
