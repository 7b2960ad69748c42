use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use url::Url;

use crate::types::authorization::ApiVersion;

/// Process-wide configuration: defaults, then `config.toml`, then `NEXUS_*` env vars.
pub static CONFIG: LazyLock<Config> = LazyLock::new(|| match Config::load("config.toml") {
    Ok(cfg) => cfg,
    Err(e) => {
        eprintln!("invalid configuration, falling back to defaults: {e}");
        Config::default()
    }
});

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub basic: BasicConfig,
    pub digikey: DigikeyConfig,
    pub tme: TmeConfig,
    pub arrow: ArrowConfig,
}

impl Config {
    pub fn load(path: &str) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }

    pub fn figment(path: &str) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("NEXUS_").split("__"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicConfig {
    pub listen_addr: String,
    pub nexus_key: String,
    pub database_url: String,
    pub loglevel: String,
    pub proxy: Option<Url>,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            nexus_key: "pwd".to_string(),
            database_url: "sqlite://data.db".to_string(),
            loglevel: "info".to_string(),
            proxy: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DigikeyConfig {
    pub enabled: bool,
    pub client_id: String,
    pub client_secret: String,
    /// Redirect URI registered with DigiKey; receives `code` and `state`.
    pub oauth_postback_url: String,
    pub api_url: String,
    pub site: String,
    pub language: String,
    pub currency: String,
    /// Version used until a credential records a different preference.
    pub api_version: ApiVersion,
}

impl Default for DigikeyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            client_id: String::new(),
            client_secret: String::new(),
            oauth_postback_url: "https://localhost:8000/authorize/digikey".to_string(),
            api_url: "https://api.digikey.com".to_string(),
            site: "US".to_string(),
            language: "en".to_string(),
            currency: "USD".to_string(),
            api_version: ApiVersion::V3,
        }
    }
}

impl DigikeyConfig {
    pub fn is_configured(&self) -> bool {
        self.enabled
            && !self.client_id.is_empty()
            && !self.client_secret.is_empty()
            && !self.oauth_postback_url.is_empty()
            && !self.api_url.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TmeConfig {
    pub enabled: bool,
    pub api_key: String,
    pub application_secret: String,
    pub api_url: String,
    pub country: String,
    pub language: String,
    pub currency: String,
    pub resolve_external_links: bool,
}

impl Default for TmeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            application_secret: String::new(),
            api_url: "https://api.tme.eu".to_string(),
            country: "US".to_string(),
            language: "EN".to_string(),
            currency: "USD".to_string(),
            resolve_external_links: true,
        }
    }
}

impl TmeConfig {
    pub fn is_configured(&self) -> bool {
        self.enabled && !self.api_key.is_empty() && !self.application_secret.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrowConfig {
    pub enabled: bool,
    pub username: String,
    pub api_key: String,
    pub api_url: String,
}

impl Default for ArrowConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            username: String::new(),
            api_key: String::new(),
            api_url: "https://api.arrow.com".to_string(),
        }
    }
}

impl ArrowConfig {
    pub fn is_configured(&self) -> bool {
        self.enabled && !self.username.is_empty() && !self.api_key.is_empty()
    }
}
