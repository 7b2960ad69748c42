use crate::api::http::{self, ResponseClass};
use crate::config::DigikeyConfig;
use crate::error::NexusError;
use crate::types::{ApiResponse, ApiVersion};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

pub(crate) const VENDOR: &str = "DigiKey";

const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Part numbers may carry `/` or `#`; escape them for use as a path segment.
pub(crate) fn path_segment(raw: &str) -> String {
    utf8_percent_encode(raw.trim(), PATH_SEGMENT).to_string()
}

/// Result of one DigiKey call before the retry policy has looked at it.
#[derive(Debug)]
pub enum CallOutcome<T> {
    Completed(ApiResponse<T>),
    /// Bearer token expired or revoked.
    Expired,
    /// The client is not subscribed to this API version.
    Unsubscribed(ApiVersion),
}

impl<T> CallOutcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CallOutcome<U> {
        match self {
            CallOutcome::Completed(response) => CallOutcome::Completed(response.map(f)),
            CallOutcome::Expired => CallOutcome::Expired,
            CallOutcome::Unsubscribed(version) => CallOutcome::Unsubscribed(version),
        }
    }
}

/// Tell a missing entitlement apart from a dead token by the 401 body.
pub(crate) fn classify_unauthorized<T>(body: &str, version: ApiVersion) -> CallOutcome<T> {
    let lower = body.to_ascii_lowercase();
    if lower.contains("not subscribed") || lower.contains("unsubscribed") {
        CallOutcome::Unsubscribed(version)
    } else {
        CallOutcome::Expired
    }
}

/// Authenticated request plumbing shared by the V3 and V4 sub-adapters.
#[derive(Clone)]
pub struct DigikeyClient {
    http: reqwest::Client,
    config: DigikeyConfig,
}

impl DigikeyClient {
    pub fn new(http: reqwest::Client, config: DigikeyConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &DigikeyConfig {
        &self.config
    }

    pub fn request(&self, method: Method, path: &str, access_token: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.api_url.trim_end_matches('/'), path);
        self.http
            .request(method, url)
            .bearer_auth(access_token)
            .header("X-DIGIKEY-Client-Id", &self.config.client_id)
            .header("X-DIGIKEY-Locale-Site", &self.config.site)
            .header("X-DIGIKEY-Locale-Language", &self.config.language)
            .header("X-DIGIKEY-Locale-Currency", &self.config.currency)
    }

    /// Send and decode. 401 becomes `Expired`/`Unsubscribed`; every other
    /// non-2xx becomes a completed error response.
    pub async fn execute<D: DeserializeOwned>(
        &self,
        version: ApiVersion,
        request: RequestBuilder,
    ) -> Result<CallOutcome<D>, NexusError> {
        let resp = request.send().await?;
        match http::classify(VENDOR, resp).await? {
            ResponseClass::Success(resp) => {
                let body = http::read_json(resp).await?;
                Ok(CallOutcome::Completed(ApiResponse::ok(body)))
            }
            ResponseClass::Unauthorized(body) => {
                let outcome = classify_unauthorized(&body, version);
                debug!(%version, expired = matches!(outcome, CallOutcome::Expired), "DigiKey returned 401");
                Ok(outcome)
            }
            other => Ok(CallOutcome::Completed(http::non_success_response(
                VENDOR, other,
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_segment_escapes_separators() {
        assert_eq!(path_segment(" 296-1234-1-ND "), "296-1234-1-ND");
        assert_eq!(path_segment("AB/C#1"), "AB%2FC%231");
    }

    #[test]
    fn unauthorized_body_distinguishes_subscription() {
        let body = r#"{"ErrorMessage":"The API you are trying to access is not subscribed"}"#;
        assert!(matches!(
            classify_unauthorized::<()>(body, ApiVersion::V4),
            CallOutcome::Unsubscribed(ApiVersion::V4)
        ));
        assert!(matches!(
            classify_unauthorized::<()>("Client is Unsubscribed", ApiVersion::V3),
            CallOutcome::Unsubscribed(ApiVersion::V3)
        ));
        assert!(matches!(
            classify_unauthorized::<()>(r#"{"ErrorMessage":"Bearer token expired"}"#, ApiVersion::V3),
            CallOutcome::Expired
        ));
    }
}
