use crate::config::BasicConfig;
use crate::error::NexusError;
use crate::types::ApiResponse;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{StatusCode, redirect::Policy};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Pooled client shared by every vendor adapter. Redirects are not followed so
/// OAuth token responses cannot be bounced elsewhere.
pub fn build_client(cfg: &BasicConfig) -> Result<reqwest::Client, NexusError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(concat!("parts-nexus/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::none());
    if let Some(proxy_url) = cfg.proxy.as_ref() {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
    }
    Ok(builder.build()?)
}

/// How a vendor HTTP response should be handled.
#[derive(Debug)]
pub enum ResponseClass {
    Success(reqwest::Response),
    /// 401; body kept so callers can tell expiry from missing entitlement.
    Unauthorized(String),
    RateLimited(String),
    BadRequest(String),
    Failed { status: StatusCode, body: String },
}

pub async fn classify(vendor: &str, resp: reqwest::Response) -> Result<ResponseClass, NexusError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(ResponseClass::Success(resp));
    }
    if status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::SERVICE_UNAVAILABLE && is_rate_limited(resp.headers()))
    {
        let message = rate_limit_message(vendor, resp.headers());
        warn!(vendor, %status, "{message}");
        return Ok(ResponseClass::RateLimited(message));
    }
    let body = resp.text().await?;
    debug!(vendor, %status, body = %body, "vendor returned error status");
    Ok(match status {
        StatusCode::UNAUTHORIZED => ResponseClass::Unauthorized(body),
        StatusCode::BAD_REQUEST => ResponseClass::BadRequest(body),
        _ => ResponseClass::Failed { status, body },
    })
}

/// Non-auth outcomes share one conversion to `ApiResponse`.
pub fn non_success_response<T>(vendor: &str, class: ResponseClass) -> ApiResponse<T> {
    match class {
        ResponseClass::Success(_) => ApiResponse::default(),
        ResponseClass::RateLimited(message) => ApiResponse::message(message),
        ResponseClass::BadRequest(body) => {
            ApiResponse::error(format!("{vendor} rejected the request: {body}"))
        }
        ResponseClass::Unauthorized(body) => {
            ApiResponse::error(format!("{vendor} rejected the credentials: {body}"))
        }
        ResponseClass::Failed { status, body } => {
            let reason = status.canonical_reason().unwrap_or("unknown");
            let mut error = format!(
                "{vendor} returned error status code {} {reason}",
                status.as_u16()
            );
            if !body.is_empty() {
                error.push_str(": ");
                error.push_str(&body);
            }
            ApiResponse::error(error)
        }
    }
}

pub async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, NexusError> {
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn is_rate_limited(headers: &HeaderMap) -> bool {
    headers.contains_key("x-ratelimit-limit") || headers.contains_key("x-burstlimit-limit")
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

fn rate_limit_message(vendor: &str, headers: &HeaderMap) -> String {
    let limit = header_u64(headers, "x-ratelimit-limit")
        .or_else(|| header_u64(headers, "x-burstlimit-limit"));
    let retry_after = header_u64(headers, RETRY_AFTER.as_str())
        .or_else(|| header_u64(headers, "x-ratelimit-reset"));
    let mut message = match limit {
        Some(limit) => format!("{vendor} API rate limit of {limit} requests exceeded."),
        None => format!("{vendor} API rate limit exceeded."),
    };
    match retry_after {
        Some(secs) => message.push_str(&format!(" Try again in {secs} seconds.")),
        None => message.push_str(" Try again later."),
    }
    message
}
