//! PostgREST gateway
//!
//! Talks to a hosted Supabase-style backend: `/rest/v1/<table>` for rows and
//! `/auth/v1` for password sessions.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use parking_lot::RwLock;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{Filter, Gateway, GatewayError, Query, Row, Table, UserId};

const TIMEOUT: u64 = 30;

/// Postgres error code for unique constraint violations
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Clone)]
struct AuthSession {
    access_token: String,
    user_id: UserId,
}

/// Gateway backed by a hosted PostgREST API
#[derive(Clone)]
pub struct RestGateway {
    client: Client,
    base_url: String,
    anon_key: String,
    session: Arc<RwLock<Option<AuthSession>>>,
}

impl std::fmt::Debug for RestGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestGateway")
            .field("base_url", &self.base_url)
            .field("signed_in", &self.session.read().is_some())
            .finish()
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: TokenUser,
}

#[derive(Deserialize)]
struct TokenUser {
    id: String,
}

impl RestGateway {
    /// Create a client for `base_url` using the project's anon key
    pub fn new(base_url: &str, anon_key: &str, proxy_url: Option<String>) -> Result<Self> {
        let mut builder = Client::builder().timeout(Duration::from_secs(TIMEOUT));
        if let Some(url) = proxy_url {
            builder = builder.proxy(reqwest::Proxy::all(&url)?);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            session: Arc::new(RwLock::new(None)),
        })
    }

    /// Start a password session
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserId, GatewayError> {
        let url = format!("{}/auth/v1/token", self.base_url);
        let response = self
            .client
            .post(url)
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(transport)?;

        let token: TokenResponse = check(response)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        let user_id = UserId::new(token.user.id);
        info!(user_id = %user_id, "Signed in");
        *self.session.write() = Some(AuthSession {
            access_token: token.access_token,
            user_id: user_id.clone(),
        });
        Ok(user_id)
    }

    /// End the session. The local session is dropped even if the server call fails.
    pub async fn sign_out(&self) {
        let Some(session) = self.session.write().take() else {
            return;
        };
        let url = format!("{}/auth/v1/logout", self.base_url);
        let result = self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await;
        if let Err(e) = result {
            warn!("Sign-out request failed: {}", e);
        }
    }

    fn rest_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.name())
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self
            .session
            .read()
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.anon_key.clone());
        request.header("apikey", &self.anon_key).bearer_auth(token)
    }
}

impl Gateway for RestGateway {
    async fn select(&self, query: &Query) -> Result<Vec<Row>, GatewayError> {
        query.validate()?;
        let params = query_params(query);
        debug!(table = %query.table, ?params, "select");

        let response = self
            .authorized(self.client.get(self.rest_url(query.table)))
            .query(&params)
            .send()
            .await
            .map_err(transport)?;

        check(response)
            .await?
            .json::<Vec<Row>>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Row, GatewayError> {
        for column in row.keys() {
            table.check_column(column)?;
        }

        let response = self
            .authorized(self.client.post(self.rest_url(table)))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await
            .map_err(transport)?;

        let mut rows = check(response)
            .await?
            .json::<Vec<Row>>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        if rows.is_empty() {
            return Err(GatewayError::Decode("insert returned no row".to_string()));
        }
        Ok(rows.swap_remove(0))
    }

    async fn update(&self, table: Table, id: &str, changes: Row) -> Result<(), GatewayError> {
        for column in changes.keys() {
            table.check_column(column)?;
        }

        let response = self
            .authorized(self.client.patch(self.rest_url(table)))
            .query(&[("id", format!("eq.{}", id))])
            .json(&changes)
            .send()
            .await
            .map_err(transport)?;
        check(response).await?;
        Ok(())
    }

    async fn delete(&self, table: Table, id: &str) -> Result<(), GatewayError> {
        let response = self
            .authorized(self.client.delete(self.rest_url(table)))
            .query(&[("id", format!("eq.{}", id))])
            .send()
            .await
            .map_err(transport)?;
        check(response).await?;
        Ok(())
    }

    fn current_user(&self) -> Option<UserId> {
        self.session.read().as_ref().map(|s| s.user_id.clone())
    }
}

fn transport(e: reqwest::Error) -> GatewayError {
    GatewayError::Transport(e.to_string())
}

/// Turn a non-success response into a typed error
async fn check(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(error_from_body(status, &body))
}

fn error_from_body(status: StatusCode, body: &str) -> GatewayError {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
    let code = parsed.as_ref().and_then(|b| b.code.clone());
    let message = parsed
        .and_then(|b| b.message.or(b.error_description).or(b.msg))
        .unwrap_or_else(|| body.to_string());

    if code.as_deref() == Some(UNIQUE_VIOLATION) {
        return GatewayError::UniqueViolation(message);
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::Unauthorized,
        _ => GatewayError::Backend(format!("{}: {}", status.as_u16(), message)),
    }
}

/// Render a query as PostgREST URL parameters
pub(crate) fn query_params(query: &Query) -> Vec<(String, String)> {
    let mut params = Vec::new();

    let select = if query.columns.is_empty() {
        "*".to_string()
    } else {
        query.columns.join(",")
    };
    params.push(("select".to_string(), select));

    for filter in &query.filters {
        match filter {
            Filter::Eq(column, value) => params.push((column.clone(), eq_operand(value))),
            Filter::Gte(column, value) => {
                params.push((column.clone(), format!("gte.{}", render_value(value))))
            }
            Filter::Lte(column, value) => {
                params.push((column.clone(), format!("lte.{}", render_value(value))))
            }
            Filter::ILike(column, pattern) => {
                params.push((column.clone(), format!("ilike.{}", wildcards(pattern))))
            }
            Filter::Or(filters) => params.push(("or".to_string(), render_group(filters))),
            Filter::And(filters) => params.push(("and".to_string(), render_group(filters))),
        }
    }

    if let Some(order) = &query.order {
        let direction = if order.ascending { "asc" } else { "desc" };
        params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }

    params
}

fn eq_operand(value: &Value) -> String {
    match value {
        Value::Null => "is.null".to_string(),
        other => format!("eq.{}", render_value(other)),
    }
}

fn render_group(filters: &[Filter]) -> String {
    let inner: Vec<String> = filters.iter().map(render_nested).collect();
    format!("({})", inner.join(","))
}

/// Filter inside an `or=(...)`/`and=(...)` group
fn render_nested(filter: &Filter) -> String {
    match filter {
        Filter::Eq(column, Value::Null) => format!("{}.is.null", column),
        Filter::Eq(column, value) => format!("{}.eq.{}", column, quote(&render_value(value))),
        Filter::Gte(column, value) => format!("{}.gte.{}", column, quote(&render_value(value))),
        Filter::Lte(column, value) => format!("{}.lte.{}", column, quote(&render_value(value))),
        Filter::ILike(column, pattern) => {
            format!("{}.ilike.{}", column, quote(&wildcards(pattern)))
        }
        Filter::Or(filters) => format!("or{}", render_group(filters)),
        Filter::And(filters) => format!("and{}", render_group(filters)),
    }
}

/// PostgREST spells the `%` wildcard as `*`; escaped `\%` stays literal
fn wildcards(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '%' => out.push('*'),
            other => out.push(other),
        }
    }
    out
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Quote values that contain PostgREST's reserved characters
fn quote(value: &str) -> String {
    if value.contains([',', '.', ':', '(', ')', '"', '\\']) {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}
