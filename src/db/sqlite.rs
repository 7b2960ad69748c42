use crate::db::models::{DbOAuthCredential, DbOAuthRequest};
use crate::db::schema::SQLITE_INIT;
use crate::error::NexusError;
use crate::types::authorization::{OAuthAuthorization, OAuthCredential};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

pub type SqlitePool = Pool<Sqlite>;

/// Open (creating if missing) the database and apply the schema.
pub async fn connect(database_url: &str) -> Result<CredentialsStorage, NexusError> {
    let connect_opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
    let storage = CredentialsStorage::new(pool);
    storage.init_schema().await?;
    Ok(storage)
}

/// OAuth credential and consent-request persistence, keyed by provider name.
#[derive(Clone)]
pub struct CredentialsStorage {
    pool: SqlitePool,
}

impl CredentialsStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), NexusError> {
        // sqlx::query runs one statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn get_oauth_credential(
        &self,
        provider: &str,
    ) -> Result<Option<OAuthCredential>, NexusError> {
        let row = sqlx::query(
            r#"SELECT id, provider, access_token, refresh_token, created_at, expires_at, api_settings
               FROM oauth_credentials WHERE provider = ?"#,
        )
        .bind(provider)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_credential)
            .transpose()
            .map(|opt| opt.map(Into::into))
    }

    /// Upsert by unique provider. Returns the row id.
    pub async fn save_oauth_credential(
        &self,
        credential: &OAuthCredential,
    ) -> Result<i64, NexusError> {
        sqlx::query(
            r#"
            INSERT INTO oauth_credentials (
                provider, access_token, refresh_token, created_at, expires_at, api_settings
            ) VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(provider) DO UPDATE SET
                access_token=excluded.access_token,
                refresh_token=excluded.refresh_token,
                created_at=excluded.created_at,
                expires_at=excluded.expires_at,
                api_settings=excluded.api_settings
            "#,
        )
        .bind(&credential.provider)
        .bind(&credential.access_token)
        .bind(&credential.refresh_token)
        .bind(credential.created_at.to_rfc3339())
        .bind(credential.expires_at.to_rfc3339())
        .bind(&credential.api_settings)
        .execute(&self.pool)
        .await?;

        let rec: (i64,) = sqlx::query_as("SELECT id FROM oauth_credentials WHERE provider = ?")
            .bind(&credential.provider)
            .fetch_one(&self.pool)
            .await?;
        debug!(provider = %credential.provider, id = rec.0, "oauth credential saved");
        Ok(rec.0)
    }

    /// Returns whether a row was deleted.
    pub async fn remove_oauth_credential(&self, provider: &str) -> Result<bool, NexusError> {
        let result = sqlx::query("DELETE FROM oauth_credentials WHERE provider = ?")
            .bind(provider)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Register a pending consent request and return the authorization with its id assigned.
    pub async fn create_oauth_request(
        &self,
        authorization: &OAuthAuthorization,
    ) -> Result<OAuthAuthorization, NexusError> {
        let request_id = authorization.request_id.unwrap_or_else(Uuid::new_v4);
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"INSERT INTO oauth_requests (
                request_id, provider, client_id, redirect_url,
                authorization_received, error, created_at, updated_at
            ) VALUES (?, ?, ?, ?, 0, NULL, ?, ?)"#,
        )
        .bind(request_id.to_string())
        .bind(&authorization.provider)
        .bind(&authorization.client_id)
        .bind(&authorization.redirect_url)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let mut created = authorization.clone();
        created.request_id = Some(request_id);
        Ok(created)
    }

    pub async fn get_oauth_request(
        &self,
        request_id: Uuid,
    ) -> Result<Option<DbOAuthRequest>, NexusError> {
        let row = sqlx::query(
            r#"SELECT request_id, provider, client_id, redirect_url,
               authorization_received, error, created_at, updated_at
               FROM oauth_requests WHERE request_id = ?"#,
        )
        .bind(request_id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_request).transpose()
    }

    /// Mark a consent request as finished, recording the vendor error if any.
    pub async fn complete_oauth_request(
        &self,
        request_id: Uuid,
        error: Option<&str>,
    ) -> Result<(), NexusError> {
        let received = if error.is_none() { 1 } else { 0 };
        sqlx::query(
            r#"UPDATE oauth_requests SET
                authorization_received = ?,
                error = ?,
                updated_at = ?
              WHERE request_id = ?"#,
        )
        .bind(received)
        .bind(error)
        .bind(Utc::now().to_rfc3339())
        .bind(request_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn row_to_credential(row: SqliteRow) -> Result<DbOAuthCredential, NexusError> {
        Ok(DbOAuthCredential {
            id: row.try_get("id")?,
            provider: row.try_get("provider")?,
            access_token: row.try_get("access_token")?,
            refresh_token: row.try_get("refresh_token")?,
            created_at: parse_timestamp(row.try_get("created_at")?)?,
            expires_at: parse_timestamp(row.try_get("expires_at")?)?,
            api_settings: row.try_get("api_settings")?,
        })
    }

    fn row_to_request(row: SqliteRow) -> Result<DbOAuthRequest, NexusError> {
        let request_id: String = row.try_get("request_id")?;
        let request_id =
            Uuid::parse_str(&request_id).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let received: i64 = row.try_get("authorization_received")?;
        Ok(DbOAuthRequest {
            request_id,
            provider: row.try_get("provider")?,
            client_id: row.try_get("client_id")?,
            redirect_url: row.try_get("redirect_url")?,
            authorization_received: received != 0,
            error: row.try_get("error")?,
            created_at: parse_timestamp(row.try_get("created_at")?)?,
            updated_at: parse_timestamp(row.try_get("updated_at")?)?,
        })
    }
}

fn parse_timestamp(raw: String) -> Result<DateTime<Utc>, NexusError> {
    let parsed = DateTime::parse_from_rfc3339(&raw).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    Ok(parsed.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn memory_storage() -> CredentialsStorage {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:").expect("memory url");
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await
            .expect("open memory db");
        let storage = CredentialsStorage::new(pool);
        storage.init_schema().await.expect("schema");
        storage
    }

    fn credential(access: &str, settings: &str) -> OAuthCredential {
        let now = Utc::now();
        OAuthCredential {
            provider: "DigiKey".to_string(),
            access_token: access.to_string(),
            refresh_token: "refresh".to_string(),
            created_at: now,
            expires_at: now + Duration::minutes(30),
            api_settings: settings.to_string(),
        }
    }

    #[tokio::test]
    async fn save_overwrites_single_row_per_provider() {
        let storage = memory_storage().await;
        let first = storage
            .save_oauth_credential(&credential("a1", ""))
            .await
            .expect("save");
        let second = storage
            .save_oauth_credential(&credential("a2", r#"{"ApiVersion":4}"#))
            .await
            .expect("save again");
        assert_eq!(first, second);

        let loaded = storage
            .get_oauth_credential("DigiKey")
            .await
            .expect("load")
            .expect("present");
        assert_eq!(loaded.access_token, "a2");
        assert_eq!(loaded.api_settings, r#"{"ApiVersion":4}"#);
    }

    #[tokio::test]
    async fn remove_deletes_credential() {
        let storage = memory_storage().await;
        storage
            .save_oauth_credential(&credential("a1", ""))
            .await
            .expect("save");
        assert!(storage.remove_oauth_credential("DigiKey").await.expect("remove"));
        assert!(!storage.remove_oauth_credential("DigiKey").await.expect("remove twice"));
        assert!(
            storage
                .get_oauth_credential("DigiKey")
                .await
                .expect("load")
                .is_none()
        );
    }

    #[tokio::test]
    async fn oauth_request_lifecycle() {
        let storage = memory_storage().await;
        let pending = OAuthAuthorization::pending("DigiKey", "client", "https://cb");
        let created = storage.create_oauth_request(&pending).await.expect("create");
        let id = created.request_id.expect("id assigned");

        let row = storage
            .get_oauth_request(id)
            .await
            .expect("load")
            .expect("present");
        assert!(!row.authorization_received);
        assert_eq!(row.redirect_url, "https://cb");

        storage.complete_oauth_request(id, None).await.expect("complete");
        let row = storage
            .get_oauth_request(id)
            .await
            .expect("load")
            .expect("present");
        assert!(row.authorization_received);
        assert!(row.error.is_none());
    }
}
