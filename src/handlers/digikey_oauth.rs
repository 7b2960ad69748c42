use crate::middleware::RequireKeyAuth;
use crate::{NexusError, router::NexusState};
use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct AuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationStatus {
    pub provider: String,
    pub authorized: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// GET /authorize/digikey -> exchanges the callback code and stores the credential.
pub async fn digikey_oauth_callback(
    State(state): State<NexusState>,
    Query(query): Query<AuthCallbackQuery>,
) -> Result<impl IntoResponse, NexusError> {
    if let Some(error) = query.error.as_deref() {
        warn!(error, "DigiKey declined the authorization request");
        return Err(NexusError::OauthFlow(format!(
            "DigiKey returned `{error}`: {}",
            query.error_description.unwrap_or_default()
        )));
    }
    let state_param = query
        .state
        .as_deref()
        .ok_or_else(|| NexusError::OauthFlow("missing `state` in callback".to_string()))?;
    let code = query
        .code
        .as_deref()
        .ok_or_else(|| NexusError::OauthFlow("missing `code` in callback".to_string()))?;

    let digikey = state.suppliers.digikey()?;
    let authorization = digikey.complete_authorization(code, state_param).await?;

    info!("OAuth callback stored DigiKey credential");
    let authorized = authorization.is_authorized();
    Ok(Json(AuthorizationStatus {
        provider: authorization.provider,
        authorized,
        expires_at: Some(authorization.expires_at),
    }))
}

/// DELETE /api/digikey/authorization -> forgets the stored credential.
pub async fn digikey_forget_authorization(
    _auth: RequireKeyAuth,
    State(state): State<NexusState>,
) -> Result<impl IntoResponse, NexusError> {
    let removed = state.suppliers.digikey()?.forget_authorization().await?;
    Ok(Json(serde_json::json!({ "removed": removed })))
}
