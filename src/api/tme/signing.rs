//! TME request signing.
//!
//! The signature base is `POST&{enc(url)}&{enc(body)}` where `body` is the
//! form-encoded, key-sorted parameter list and `enc` is RFC 3986 percent
//! encoding with upper-case hex escapes. The HMAC-SHA1 of that base, keyed
//! with the application secret and Base64 encoded, is sent as `ApiSignature`.

use crate::error::NexusError;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha1::Sha1;
use std::collections::BTreeMap;

type HmacSha1 = Hmac<Sha1>;

const DEFAULT_COUNTRY: &str = "US";
const DEFAULT_LANGUAGE: &str = "EN";

/// RFC 3986 unreserved characters stay literal; `percent_encoding` emits
/// upper-case hex for everything else.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, UNRESERVED).to_string()
}

/// `application/x-www-form-urlencoded` body in key order.
pub fn form_body(params: &BTreeMap<String, String>) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish()
}

pub fn signature(secret: &str, url: &str, body: &str) -> Result<String, NexusError> {
    let base = format!("POST&{}&{}", percent_encode(url), percent_encode(body));
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .map_err(|e| NexusError::Configuration(format!("TME application secret: {e}")))?;
    mac.update(base.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

fn upper_or(value: &str, default: &str) -> String {
    match value.trim() {
        "" => default.to_string(),
        value => value.to_ascii_uppercase(),
    }
}

/// Account-level fields injected into every TME call.
#[derive(Debug, Clone)]
pub struct TmeSigner {
    api_key: String,
    application_secret: String,
    country: String,
    language: String,
}

impl TmeSigner {
    pub fn new(
        api_key: impl Into<String>,
        application_secret: impl Into<String>,
        country: &str,
        language: &str,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            application_secret: application_secret.into(),
            country: upper_or(country, DEFAULT_COUNTRY),
            language: upper_or(language, DEFAULT_LANGUAGE),
        }
    }

    /// Final request body for `url`: action parameters plus `Country`,
    /// `Language`, `Token` and `ApiSignature`, sorted by key.
    pub fn signed_body(
        &self,
        url: &str,
        mut params: BTreeMap<String, String>,
    ) -> Result<String, NexusError> {
        params.insert("Country".to_string(), self.country.clone());
        params.insert("Language".to_string(), self.language.clone());
        params.insert("Token".to_string(), self.api_key.clone());
        let signature = signature(&self.application_secret, url, &form_body(&params))?;
        params.insert("ApiSignature".to_string(), signature);
        Ok(form_body(&params))
    }
}
