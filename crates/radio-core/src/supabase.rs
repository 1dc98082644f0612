//! Supabase client: PostgREST table calls and GoTrue password auth.
//!
//! Requests carry the project's anon key as `apikey`; the bearer token is the
//! signed-in user's access token when there is one, the anon key otherwise.
//! Row-level security on the server decides what a bearer may write.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::SupabaseConfig;
use crate::protocol::{SortOrder, Station, StationDraft, StationId};
use crate::session::{AuthError, AuthService, Session};
use crate::sync::{StationTable, SyncError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const VISITOR_PAGE_ID: i64 = 1;

pub struct SupabaseClient {
    http: Client,
    base_url: String,
    anon_key: String,
    table: String,
    access_token: RwLock<Option<String>>,
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig) -> Result<Self, SyncError> {
        if config.url.trim().is_empty() || config.anon_key.trim().is_empty() {
            return Err(SyncError::NotConfigured(
                "set [supabase] url and anon_key in config.toml".to_string(),
            ));
        }
        let http = Client::builder()
            .user_agent(concat!("radioplay/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            table: config.table.clone(),
            access_token: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, path)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    async fn headers(&self) -> HeaderMap {
        let bearer = self
            .access_token
            .read()
            .await
            .clone()
            .unwrap_or_else(|| self.anon_key.clone());
        let mut headers = HeaderMap::new();
        if let Ok(v) = HeaderValue::from_str(&self.anon_key) {
            headers.insert("apikey", v);
        }
        if let Ok(v) = HeaderValue::from_str(&format!("Bearer {}", bearer)) {
            headers.insert(AUTHORIZATION, v);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, SyncError> {
        let resp = req.headers(self.headers().await).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(SyncError::Api {
            status: status.as_u16(),
            message: api_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            }),
        })
    }

    /// Bump and read the page visit counter.  Falls back to a plain read when
    /// the increment RPC is unavailable.
    pub async fn visit_count(&self) -> Result<i64, SyncError> {
        let rpc = self
            .http
            .post(self.rest_url("rpc/increment_visitor_count"))
            .json(&json!({ "page_id": VISITOR_PAGE_ID }));
        match self.send(rpc).await {
            Ok(resp) => return Ok(resp.json::<i64>().await?),
            Err(e) => warn!("[visitors] increment failed, reading current count: {}", e),
        }

        #[derive(serde::Deserialize)]
        struct CountRow {
            count: i64,
        }
        let read = self
            .http
            .get(self.rest_url("visitor_count"))
            .query(&[
                ("select", "count".to_string()),
                ("id", format!("eq.{}", VISITOR_PAGE_ID)),
            ])
            .header(ACCEPT, "application/vnd.pgrst.object+json");
        let row: CountRow = self.send(read).await?.json().await?;
        Ok(row.count)
    }
}

/// PostgREST order clause: city then name, missing city last.
pub fn order_clause(order: SortOrder) -> String {
    let dir = order.as_str();
    format!("city.{dir}.nullslast,name.{dir}")
}

/// Pull a human message out of a PostgREST or GoTrue error body.
pub fn api_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error_description", "msg", "message", "error"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl StationTable for SupabaseClient {
    async fn fetch_all(&self, order: SortOrder) -> Result<Vec<Station>, SyncError> {
        let req = self
            .http
            .get(self.rest_url(&self.table))
            .query(&[("select", "*".to_string()), ("order", order_clause(order))]);
        let stations: Vec<Station> = self.send(req).await?.json().await?;
        debug!("[supabase] fetch_all -> {} rows", stations.len());
        Ok(stations)
    }

    async fn insert(&self, draft: &StationDraft) -> Result<(), SyncError> {
        let req = self
            .http
            .post(self.rest_url(&self.table))
            .header("Prefer", "return=minimal")
            .json(&[draft]);
        self.send(req).await?;
        Ok(())
    }

    async fn update_by_id(&self, station: &Station) -> Result<(), SyncError> {
        let req = self
            .http
            .patch(self.rest_url(&self.table))
            .query(&[("id", format!("eq.{}", station.id))])
            .header("Prefer", "return=minimal")
            .json(&station.to_patch());
        self.send(req).await?;
        Ok(())
    }

    async fn delete_by_id(&self, id: StationId) -> Result<(), SyncError> {
        let req = self
            .http
            .delete(self.rest_url(&self.table))
            .query(&[("id", format!("eq.{}", id))]);
        self.send(req).await?;
        Ok(())
    }
}

#[async_trait]
impl AuthService for SupabaseClient {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let resp = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(AuthError::Rejected(
                api_message(&body).unwrap_or_else(|| format!("sign-in failed (HTTP {})", status)),
            ));
        }
        let session: Session = serde_json::from_str(&body)
            .map_err(|e| AuthError::Rejected(format!("unexpected auth response: {}", e)))?;
        *self.access_token.write().await = Some(session.access_token.clone());
        Ok(session)
    }

    async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
        *self.access_token.write().await = None;
        let resp = self
            .http
            .post(self.auth_url("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::Rejected(
                api_message(&body).unwrap_or_else(|| format!("sign-out failed (HTTP {})", status)),
            ));
        }
        Ok(())
    }
}
