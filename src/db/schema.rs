//! SQL DDL for initializing the credential storage.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema with:
/// - `oauth_credentials`: one row per provider, `provider` UNIQUE
/// - `oauth_requests`: pending consent requests keyed by the `state` UUID
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS oauth_credentials (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    provider TEXT NOT NULL UNIQUE,
    access_token TEXT NOT NULL,
    refresh_token TEXT NOT NULL,
    created_at TEXT NOT NULL, -- RFC3339
    expires_at TEXT NOT NULL, -- RFC3339
    api_settings TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS oauth_requests (
    request_id TEXT PRIMARY KEY, -- UUID, echoed back as OAuth `state`
    provider TEXT NOT NULL,
    client_id TEXT NOT NULL,
    redirect_url TEXT NOT NULL,
    authorization_received INTEGER NOT NULL DEFAULT 0,
    error TEXT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_oauth_requests_provider ON oauth_requests(provider);
"#;
