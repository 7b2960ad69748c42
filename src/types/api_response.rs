use serde::{Deserialize, Serialize};

/// Uniform result of every supplier operation.
///
/// Expected outcomes (consent required, throttling, vendor-side validation
/// errors) are carried here rather than as `Err`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub requires_authorization: bool,
    pub authorization_url: Option<String>,
    pub message: Option<String>,
    pub errors: Vec<String>,
    pub data: Option<T>,
}

impl<T> Default for ApiResponse<T> {
    fn default() -> Self {
        Self {
            requires_authorization: false,
            authorization_url: None,
            message: None,
            errors: Vec::new(),
            data: None,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    pub fn requires_authorization(authorization_url: impl Into<String>) -> Self {
        Self {
            requires_authorization: true,
            authorization_url: Some(authorization_url.into()),
            ..Self::default()
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            errors: vec![error.into()],
            ..Self::default()
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        !self.requires_authorization && self.errors.is_empty() && self.data.is_some()
    }

    /// Re-type a response that carries no data.
    pub fn cast<U>(self) -> ApiResponse<U> {
        ApiResponse {
            requires_authorization: self.requires_authorization,
            authorization_url: self.authorization_url,
            message: self.message,
            errors: self.errors,
            data: None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            requires_authorization: self.requires_authorization,
            authorization_url: self.authorization_url,
            message: self.message,
            errors: self.errors,
            data: self.data.map(f),
        }
    }
}
