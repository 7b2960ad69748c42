use axum::{Json, http::StatusCode, response::IntoResponse};
use oauth2::basic::BasicErrorResponseType;
use oauth2::reqwest::Error as ReqwestClientError;
use oauth2::{HttpClientError, RequestTokenError, StandardErrorResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum NexusError {
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Argument `{name}` out of range: {value}")]
    ArgumentOutOfRange { name: &'static str, value: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("OAuth flow error: {0}")]
    OauthFlow(String),

    #[error("OAuth2 token request error: {0}")]
    Oauth2Token(String),

    #[error("OAuth2 server error: {error}")]
    Oauth2Server { error: String },

    #[error("Unknown supplier: {0}")]
    UnknownSupplier(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),
}

impl NexusError {
    /// Transport failures worth another attempt; vendor rejections are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            NexusError::Reqwest(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            NexusError::Oauth2Token(_) => true,
            _ => false,
        }
    }
}

impl
    From<
        RequestTokenError<
            HttpClientError<ReqwestClientError>,
            StandardErrorResponse<BasicErrorResponseType>,
        >,
    > for NexusError
{
    fn from(
        e: RequestTokenError<
            HttpClientError<ReqwestClientError>,
            StandardErrorResponse<BasicErrorResponseType>,
        >,
    ) -> Self {
        match e {
            RequestTokenError::ServerResponse(err) => NexusError::Oauth2Server {
                error: err.error().to_string(),
            },
            RequestTokenError::Request(req_e) => {
                NexusError::Oauth2Token(format!("request failed: {}", req_e))
            }
            RequestTokenError::Parse(parse_err, _body) => NexusError::Json(parse_err.into_inner()),
            RequestTokenError::Other(s) => NexusError::Oauth2Server { error: s },
        }
    }
}

impl IntoResponse for NexusError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match &self {
            NexusError::ArgumentOutOfRange { .. } => (
                StatusCode::BAD_REQUEST,
                "ARGUMENT_OUT_OF_RANGE",
                self.to_string(),
            ),
            NexusError::UnknownSupplier(_) => {
                (StatusCode::NOT_FOUND, "UNKNOWN_SUPPLIER", self.to_string())
            }
            NexusError::Configuration(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "NOT_CONFIGURED",
                self.to_string(),
            ),
            NexusError::OauthFlow(_) => (StatusCode::BAD_REQUEST, "OAUTH_FLOW", self.to_string()),
            NexusError::Unauthorized(_)
            | NexusError::Oauth2Token(_)
            | NexusError::Oauth2Server { .. } => (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_UNAUTHORIZED",
                "Upstream authentication failed.".to_string(),
            ),
            NexusError::Reqwest(_) | NexusError::UrlParse(_) | NexusError::Json(_) => (
                StatusCode::BAD_GATEWAY,
                "BAD_GATEWAY",
                "Upstream service is unavailable.".to_string(),
            ),
            NexusError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal server error occurred.".to_string(),
            ),
        };
        let body = ApiErrorResponse {
            error: ApiErrorBody {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
