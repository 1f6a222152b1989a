use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::GatewayConfig;
use crate::error::{BotboardError, Result};
use crate::interfaces::gateway::{
    Filter, GatewayError, GatewayResponse, PersistenceGateway, Session, Table,
};

/// Talks to a hosted Postgres through its PostgREST (`/rest/v1`) and GoTrue
/// (`/auth/v1`) endpoints.
pub struct PostgrestGateway {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

#[derive(Deserialize)]
struct AuthUser {
    id: String,
    email: Option<String>,
}

#[derive(Deserialize)]
struct TokenGrant {
    access_token: String,
    user: AuthUser,
}

#[derive(Deserialize)]
struct PostgrestErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    code: Option<Value>,
}

impl PostgrestGateway {
    pub fn new(base_url: &str, config: &GatewayConfig) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(BotboardError::Config("gateway url is empty".to_string()));
        }
        let anon_key = config
            .anon_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| BotboardError::Config("gateway.anon_key is not set".to_string()))?
            .to_string();

        let mut builder = reqwest::Client::builder();
        if let Some(seconds) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds.max(1)));
        }
        let client = builder
            .build()
            .map_err(|e| BotboardError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            anon_key,
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.as_str())
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn headers(&self, bearer: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.anon_key)
                .map_err(|e| BotboardError::Config(e.to_string()))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {bearer}"))
                .map_err(|_| BotboardError::Unauthorized)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn table_request(
        &self,
        method: Method,
        session: &Session,
        table: Table,
        filters: &[Filter],
    ) -> Result<RequestBuilder> {
        let pairs = filter_pairs(filters);
        Ok(self
            .client
            .request(method, self.table_url(table))
            .headers(self.headers(&session.access_token)?)
            .query(&pairs))
    }

    async fn send(&self, request: RequestBuilder, table: Table) -> Result<GatewayResponse> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(table = table.as_str(), status = status.as_u16(), "gateway response");
        decode_response(status, &body)
    }
}

fn filter_pairs(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|filter| (filter.column.clone(), format!("eq.{}", filter.value)))
        .collect()
}

fn decode_response(status: StatusCode, body: &str) -> Result<GatewayResponse> {
    let code = status.as_u16();
    if status.is_success() {
        let data = if body.trim().is_empty() {
            None
        } else {
            Some(serde_json::from_str::<Value>(body)?)
        };
        return Ok(GatewayResponse::ok(code, data));
    }

    let error = match serde_json::from_str::<PostgrestErrorBody>(body) {
        Ok(parsed) => GatewayError {
            message: parsed
                .message
                .or(parsed.msg)
                .or(parsed.error_description)
                .unwrap_or_else(|| status.to_string()),
            code: parsed.code.map(|value| match value {
                Value::String(text) => text,
                other => other.to_string(),
            }),
        },
        Err(_) => GatewayError {
            message: if body.trim().is_empty() {
                status.to_string()
            } else {
                body.trim().to_string()
            },
            code: None,
        },
    };
    warn!(status = code, message = %error.message, "gateway reported an error");
    Ok(GatewayResponse {
        data: None,
        error: Some(error),
        status: code,
    })
}

#[async_trait]
impl PersistenceGateway for PostgrestGateway {
    async fn select(
        &self,
        session: &Session,
        table: Table,
        filters: &[Filter],
    ) -> Result<GatewayResponse> {
        let request = self
            .table_request(Method::GET, session, table, filters)?
            .query(&[("select", "*")]);
        self.send(request, table).await
    }

    async fn insert(
        &self,
        session: &Session,
        table: Table,
        row: Value,
    ) -> Result<GatewayResponse> {
        let request = self
            .table_request(Method::POST, session, table, &[])?
            .header("Prefer", "return=representation")
            .json(&row);
        self.send(request, table).await
    }

    async fn update(
        &self,
        session: &Session,
        table: Table,
        patch: Value,
        filters: &[Filter],
    ) -> Result<GatewayResponse> {
        let request = self
            .table_request(Method::PATCH, session, table, filters)?
            .header("Prefer", "return=minimal")
            .json(&patch);
        self.send(request, table).await
    }

    async fn upsert(
        &self,
        session: &Session,
        table: Table,
        rows: Vec<Value>,
    ) -> Result<GatewayResponse> {
        let request = self
            .table_request(Method::POST, session, table, &[])?
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&Value::Array(rows));
        self.send(request, table).await
    }

    async fn delete(
        &self,
        session: &Session,
        table: Table,
        filters: &[Filter],
    ) -> Result<GatewayResponse> {
        let request = self.table_request(Method::DELETE, session, table, filters)?;
        self.send(request, table).await
    }

    async fn user_for_token(&self, access_token: &str) -> Result<Option<Session>> {
        let token = access_token.trim();
        if token.is_empty() {
            return Ok(None);
        }
        let response = self
            .client
            .get(self.auth_url("user"))
            .headers(self.headers(token)?)
            .send()
            .await?;
        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(BotboardError::Http(format!(
                "auth lookup failed with status {}",
                response.status()
            )));
        }
        let user: AuthUser = response.json().await?;
        Ok(Some(Session {
            access_token: token.to_string(),
            user_id: user.id,
            email: user.email,
        }))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Option<Session>> {
        let response = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .headers(self.headers(&self.anon_key)?)
            .json(&json!({"email": email, "password": password}))
            .send()
            .await?;
        if response.status().is_client_error() {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(BotboardError::Http(format!(
                "sign-in failed with status {}",
                response.status()
            )));
        }
        let grant: TokenGrant = response.json().await?;
        Ok(Some(Session {
            access_token: grant.access_token,
            user_id: grant.user.id,
            email: grant.user.email,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_become_eq_query_pairs() {
        let pairs = filter_pairs(&[
            Filter::eq("user_id", "u-1"),
            Filter::eq("id", "42"),
        ]);
        assert_eq!(
            pairs,
            vec![
                ("user_id".to_string(), "eq.u-1".to_string()),
                ("id".to_string(), "eq.42".to_string()),
            ]
        );
    }

    #[test]
    fn error_bodies_are_carried_in_band() {
        let response = decode_response(
            StatusCode::FORBIDDEN,
            r#"{"code":"42501","message":"new row violates row-level security policy"}"#,
        )
        .unwrap();
        assert_eq!(response.status, 403);
        let error = response.error.unwrap();
        assert_eq!(error.code.as_deref(), Some("42501"));
        assert!(error.message.contains("row-level security"));
    }

    #[test]
    fn empty_success_body_has_no_data() {
        let response = decode_response(StatusCode::NO_CONTENT, "").unwrap();
        assert!(response.is_success());
        assert!(response.data.is_none());
    }
}
