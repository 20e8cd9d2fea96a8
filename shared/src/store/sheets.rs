use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use tokio::sync::Mutex;

use crate::error::{Result, ServiceError};
use crate::store::{CellUpdate, RowStore};

const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DEFAULT_SPREADSHEET_ID: &str = "1FJPePAwh8Xy9revrg8-ANn7GK2Xwd0Xe_6DdLqDujbc";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Refresh the cached token this long before it actually expires.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;
const TOKEN_LIFETIME_SECS: i64 = 3600;

// Service-account credentials, the subset of the Google credentials JSON we
// need for the signed-assertion token exchange.
#[derive(Deserialize, Clone)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    token_uri: String,
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

struct CachedToken {
    access_token: String,
    expires_at: i64,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Serialize)]
struct WriteRange<'a> {
    range: &'a str,
    values: &'a [Vec<Value>],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdateRequest<'a> {
    value_input_option: &'a str,
    data: Vec<WriteRange<'a>>,
}

#[derive(Serialize)]
struct AppendBody<'a> {
    values: &'a [Vec<Value>],
}

/// Google Sheets implementation of [`RowStore`], one spreadsheet per store.
pub struct SheetsRowStore {
    client: reqwest::Client,
    spreadsheet_id: String,
    key: ServiceAccountKey,
    token: Mutex<Option<CachedToken>>,
}

impl SheetsRowStore {
    /// Builds a store from `GOOGLE_API_CREDS` (service-account JSON) and
    /// `SPREADSHEET_ID`, falling back to the compiled-in spreadsheet.
    pub fn new() -> Result<Self> {
        let creds = env::var("GOOGLE_API_CREDS")
            .map_err(|_| ServiceError::Internal("GOOGLE_API_CREDS is not set".to_string()))?;
        let key: ServiceAccountKey = serde_json::from_str(&creds).map_err(|err| {
            ServiceError::Internal(format!("unable to parse GOOGLE_API_CREDS: {}", err))
        })?;

        let spreadsheet_id =
            env::var("SPREADSHEET_ID").unwrap_or_else(|_| DEFAULT_SPREADSHEET_ID.to_string());

        Ok(Self {
            client: reqwest::Client::new(),
            spreadsheet_id,
            key,
            token: Mutex::new(None),
        })
    }

    /// Returns a bearer token for the Sheets scope, exchanging a fresh signed
    /// assertion only when the cached token is close to expiry.
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        let now = Utc::now().timestamp();
        if let Some(token) = cached.as_ref() {
            if token.expires_at - TOKEN_EXPIRY_MARGIN_SECS > now {
                return Ok(token.access_token.clone());
            }
        }

        debug!("Requesting a fresh Sheets access token");
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };
        let signing_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|err| {
                ServiceError::Internal(format!("invalid service account private key: {}", err))
            })?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
            .map_err(|err| {
                ServiceError::Internal(format!("unable to sign token assertion: {}", err))
            })?;

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Internal(format!(
                "token exchange failed (status {}): {}",
                status.as_u16(),
                body
            )));
        }

        let token: TokenResponse = response.json().await?;
        let access_token = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            expires_at: now + token.expires_in,
        });
        Ok(access_token)
    }

    fn values_url(&self, range: &str) -> String {
        format!("{}/{}/values/{}", SHEETS_BASE_URL, self.spreadsheet_id, range)
    }
}

#[async_trait]
impl RowStore for SheetsRowStore {
    async fn get(&self, table: &str, range: &str) -> Result<Vec<Vec<Value>>> {
        let token = self.access_token().await?;
        let url = self.values_url(&format!("{}!{}", table, range));
        let response = self.client.get(&url).bearer_auth(&token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Internal(format!(
                "sheet read of {}!{} failed (status {}): {}",
                table,
                range,
                status.as_u16(),
                body
            )));
        }

        let value_range: ValueRange = response.json().await?;
        Ok(value_range.values)
    }

    async fn append(&self, table: &str, rows: Vec<Vec<Value>>) -> Result<()> {
        let token = self.access_token().await?;
        // The range only anchors the append; rows land after the last data row.
        let url = format!("{}:append", self.values_url(&format!("{}!A2:E2", table)));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&AppendBody { values: &rows })
            .send()
            .await
            .map_err(|err| ServiceError::StoreWrite(format!("append request failed: {}", err)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::StoreWrite(format!(
                "append to {} failed (status {}): {}",
                table,
                status.as_u16(),
                body
            )));
        }
        debug!("Appended {} row(s) to {}", rows.len(), table);
        Ok(())
    }

    async fn batch_update(&self, updates: Vec<CellUpdate>) -> Result<()> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/{}/values:batchUpdate",
            SHEETS_BASE_URL, self.spreadsheet_id
        );
        let body = BatchUpdateRequest {
            value_input_option: "USER_ENTERED",
            data: updates
                .iter()
                .map(|update| WriteRange {
                    range: &update.range,
                    values: &update.rows,
                })
                .collect(),
        };
        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                ServiceError::StoreWrite(format!("batch update request failed: {}", err))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::StoreWrite(format!(
                "batch update of {} range(s) failed (status {}): {}",
                updates.len(),
                status.as_u16(),
                body
            )));
        }
        debug!("Batch updated {} range(s)", updates.len());
        Ok(())
    }
}
