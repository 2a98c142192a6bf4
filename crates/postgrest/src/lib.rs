//! PostgREST client for the storefront tables
//!
//! A small, owned query builder over the Supabase REST endpoint
//! (`{base_url}/rest/v1/{table}`).
//!
//! # Features
//!
//! - Query API (`select`, `insert`, `update`, `delete`)
//! - Filtering (`eq` and `or` groups, with `quote_filter_value` and `escape_like`
//!   for user text)
//! - Ordering and limits
//! - Exact row counts via `Content-Range`

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Error body returned by PostgREST on a failed request
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PostgrestApiErrorDetails {
    pub code: Option<String>,
    pub message: Option<String>,
    pub details: Option<String>,
    pub hint: Option<String>,
}

impl fmt::Display for PostgrestApiErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(code) = &self.code {
            parts.push(format!("Code: {}", code));
        }
        if let Some(message) = &self.message {
            parts.push(format!("Message: {}", message));
        }
        if let Some(details) = &self.details {
            parts.push(format!("Details: {}", details));
        }
        if let Some(hint) = &self.hint {
            parts.push(format!("Hint: {}", hint));
        }
        write!(f, "{}", parts.join(", "))
    }
}

#[derive(Error, Debug)]
pub enum PostgrestError {
    #[error("API error: {details} (Status: {status})")]
    ApiError {
        details: PostgrestApiErrorDetails,
        status: reqwest::StatusCode,
    },

    #[error("API error (unparsed): {message} (Status: {status})")]
    UnparsedApiError {
        message: String,
        status: reqwest::StatusCode,
    },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

/// Quote a value for use inside an `or=(...)` group.
///
/// PostgREST treats `,` `.` `:` `(` `)` as syntax inside logical groups, so
/// values carrying any of them are wrapped in double quotes with `"` and `\`
/// escaped.
pub fn quote_filter_value(value: &str) -> String {
    let reserved = |c: char| matches!(c, ',' | '.' | ':' | '(' | ')' | '"' | '\\');
    if !value.contains(reserved) {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// Escape the LIKE metacharacters `\`, `%` and `_` so user text inside an
/// `ilike` pattern only matches itself.
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// PostgREST client bound to one table
#[derive(Debug, Clone)]
pub struct PostgrestClient {
    base_url: String,
    table: String,
    http_client: Client,
    headers: HeaderMap,
    query_params: Vec<(String, String)>,
}

impl PostgrestClient {
    /// Create a client for `table`. An API key that is not a valid header
    /// value is left out; the server will then answer 401.
    pub fn new(base_url: &str, api_key: &str, table: &str, http_client: Client) -> Self {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(api_key) {
            headers.insert("apikey", value);
        }
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            table: table.to_string(),
            http_client,
            headers,
            query_params: Vec::new(),
        }
    }

    /// Add a request header
    pub fn with_header(mut self, key: &str, value: &str) -> Result<Self, PostgrestError> {
        let header_value = HeaderValue::from_str(value).map_err(|_| {
            PostgrestError::InvalidParameters(format!("Invalid header value: {}", value))
        })?;
        let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
            PostgrestError::InvalidParameters(format!("Invalid header name: {}", key))
        })?;

        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Send the user's access token instead of the anonymous role
    pub fn with_auth(self, token: &str) -> Result<Self, PostgrestError> {
        self.with_header("Authorization", &format!("Bearer {}", token))
    }

    /// Target a schema other than `public` for both reads and writes
    pub fn schema(self, schema_name: &str) -> Result<Self, PostgrestError> {
        self.with_header("Accept-Profile", schema_name)?
            .with_header("Content-Profile", schema_name)
    }

    fn set_param(&mut self, key: &str, value: String) {
        match self.query_params.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.query_params.push((key.to_string(), value)),
        }
    }

    fn push_param(mut self, key: &str, value: String) -> Self {
        self.query_params.push((key.to_string(), value));
        self
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.set_param("select", columns.to_string());
        self
    }

    pub fn eq(self, column: &str, value: &str) -> Self {
        self.push_param(column, format!("eq.{}", value))
    }

    /// Logical OR over comma separated conditions,
    /// e.g. `name.ilike.*pizza*,description.ilike.*pizza*`
    pub fn or(self, conditions: &str) -> Self {
        self.push_param("or", format!("({})", conditions))
    }

    pub fn order(mut self, column: &str, order: SortOrder) -> Self {
        self.set_param("order", format!("{}.{}", column, order.as_str()));
        self
    }

    pub fn limit(mut self, count: u32) -> Self {
        self.set_param("limit", count.to_string());
        self
    }

    /// Full request URL including the query string
    pub fn build_url(&self) -> Result<Url, PostgrestError> {
        let mut url = Url::parse(&format!("{}/rest/v1/{}", self.base_url, self.table))?;
        if !self.query_params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query_params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Fetch rows
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<Vec<T>, PostgrestError> {
        let url = self.build_url()?;
        debug!(table = %self.table, %url, "postgrest select");

        let response = self
            .http_client
            .get(url)
            .headers(self.headers.clone())
            .send()
            .await?;

        let response = check_status(response).await?;
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| PostgrestError::DeserializationError(e.to_string()))
    }

    /// Exact number of rows matching the current filters, without a body
    pub async fn count(&self) -> Result<u64, PostgrestError> {
        let url = self.build_url()?;
        let mut headers = self.headers.clone();
        headers.insert(
            HeaderName::from_static("prefer"),
            HeaderValue::from_static("count=exact"),
        );

        let response = self
            .http_client
            .head(url)
            .headers(headers)
            .send()
            .await?;
        let response = check_status(response).await?;

        let range = response
            .headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                PostgrestError::DeserializationError("Missing Content-Range header".to_string())
            })?;
        parse_content_range_total(range)
    }

    /// Insert rows; returns the inserted representation
    pub async fn insert<T: Serialize>(&self, values: T) -> Result<Value, PostgrestError> {
        let body = serde_json::to_value(values)?;
        self.mutate(Method::POST, Some(body)).await
    }

    /// Update rows matching the current filters
    pub async fn update<T: Serialize>(&self, values: T) -> Result<Value, PostgrestError> {
        if self.query_params.iter().all(|(k, _)| k == "select") {
            return Err(PostgrestError::InvalidParameters(
                "update without a filter would touch every row".to_string(),
            ));
        }
        let body = serde_json::to_value(values)?;
        self.mutate(Method::PATCH, Some(body)).await
    }

    /// Delete rows matching the current filters
    pub async fn delete(&self) -> Result<Value, PostgrestError> {
        if self.query_params.iter().all(|(k, _)| k == "select") {
            return Err(PostgrestError::InvalidParameters(
                "delete without a filter would touch every row".to_string(),
            ));
        }
        self.mutate(Method::DELETE, None).await
    }

    async fn mutate(&self, method: Method, body: Option<Value>) -> Result<Value, PostgrestError> {
        let url = self.build_url()?;
        debug!(table = %self.table, %method, %url, "postgrest mutation");

        let mut headers = self.headers.clone();
        headers.insert(
            HeaderName::from_static("prefer"),
            HeaderValue::from_static("return=representation"),
        );

        let mut request = self.http_client.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = check_status(request.send().await?).await?;
        let body_text = response.text().await.map_err(|e| {
            PostgrestError::DeserializationError(format!("Failed to read response body: {}", e))
        })?;

        // 204 No Content and friends
        if body_text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str::<Value>(&body_text)
            .map_err(|e| PostgrestError::DeserializationError(e.to_string()))
    }
}

async fn check_status(response: Response) -> Result<Response, PostgrestError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error response".to_string());

    match serde_json::from_str::<PostgrestApiErrorDetails>(&error_text) {
        Ok(details) => Err(PostgrestError::ApiError { details, status }),
        Err(_) => Err(PostgrestError::UnparsedApiError {
            message: error_text,
            status,
        }),
    }
}

/// `0-24/3573` or `*/0` -> total after the slash
fn parse_content_range_total(range: &str) -> Result<u64, PostgrestError> {
    range
        .rsplit('/')
        .next()
        .and_then(|total| total.trim().parse::<u64>().ok())
        .ok_or_else(|| {
            PostgrestError::DeserializationError(format!("Unexpected Content-Range: {}", range))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(uri: &str, table: &str) -> PostgrestClient {
        PostgrestClient::new(uri, "fake-key", table, Client::new())
    }

    #[test]
    fn test_build_url_keeps_filter_order() {
        let url = client("https://example.supabase.co/", "itens")
            .select("*")
            .eq("status", "ativo")
            .eq("id_categoria", "c1")
            .order("nome_item", SortOrder::Ascending)
            .build_url()
            .unwrap();

        assert_eq!(url.path(), "/rest/v1/itens");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("select".to_string(), "*".to_string()),
                ("status".to_string(), "eq.ativo".to_string()),
                ("id_categoria".to_string(), "eq.c1".to_string()),
                ("order".to_string(), "nome_item.asc".to_string()),
            ]
        );
    }

    #[test]
    fn test_select_and_order_replace_previous_value() {
        let url = client("http://localhost", "itens")
            .select("id_item")
            .select("*")
            .order("preco", SortOrder::Descending)
            .order("nome_item", SortOrder::Ascending)
            .build_url()
            .unwrap();
        assert_eq!(url.query(), Some("select=*&order=nome_item.asc"));
    }

    #[test]
    fn test_quote_filter_value() {
        assert_eq!(quote_filter_value("pizza"), "pizza");
        assert_eq!(quote_filter_value("*x-burger*"), "*x-burger*");
        assert_eq!(quote_filter_value("a,b"), "\"a,b\"");
        assert_eq!(quote_filter_value("say \"hi\""), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("pizza"), "pizza");
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        // quoted inside an or group, the backslashes are escaped once more
        assert_eq!(
            quote_filter_value(&format!("*{}*", escape_like("a\\b"))),
            "\"*a\\\\\\\\b*\""
        );
    }

    #[test]
    fn test_limit() {
        let url = client("http://localhost", "usuarios")
            .select("id_usuario")
            .eq("id_usuario", "u1")
            .limit(5)
            .limit(1)
            .build_url()
            .unwrap();
        assert_eq!(url.query(), Some("select=id_usuario&id_usuario=eq.u1&limit=1"));
    }

    #[test]
    fn test_parse_content_range_total() {
        assert_eq!(parse_content_range_total("0-24/3573").unwrap(), 3573);
        assert_eq!(parse_content_range_total("*/0").unwrap(), 0);
        assert!(parse_content_range_total("0-24/*").is_err());
    }

    #[tokio::test]
    async fn test_select_with_or_group() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/itens"))
            .and(header("apikey", "fake-key"))
            .and(query_param("status", "eq.ativo"))
            .and(query_param(
                "or",
                "(nome_item.ilike.*pizza*,descricao_item.ilike.*pizza*)",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id_item": "1", "nome_item": "Pizza Margherita" }
            ])))
            .mount(&mock_server)
            .await;

        let rows = client(&mock_server.uri(), "itens")
            .select("*")
            .eq("status", "ativo")
            .or("nome_item.ilike.*pizza*,descricao_item.ilike.*pizza*")
            .execute::<Value>()
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["nome_item"], "Pizza Margherita");
    }

    #[tokio::test]
    async fn test_count() {
        let mock_server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(path("/rest/v1/categorias"))
            .and(header("prefer", "count=exact"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-range", "0-3/4"))
            .mount(&mock_server)
            .await;

        let total = client(&mock_server.uri(), "categorias")
            .select("id_categoria")
            .count()
            .await
            .unwrap();
        assert_eq!(total, 4);
    }

    #[tokio::test]
    async fn test_insert() {
        let mock_server = MockServer::start().await;
        let payload = json!({ "nome_categoria": "Bebidas" });

        Mock::given(method("POST"))
            .and(path("/rest/v1/categorias"))
            .and(header("prefer", "return=representation"))
            .and(body_json(&payload))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([
                { "id_categoria": "c9", "nome_categoria": "Bebidas" }
            ])))
            .mount(&mock_server)
            .await;

        let inserted = client(&mock_server.uri(), "categorias")
            .insert(&payload)
            .await
            .unwrap();
        assert_eq!(inserted[0]["id_categoria"], "c9");
    }

    #[tokio::test]
    async fn test_update_with_empty_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/itens"))
            .and(query_param("id_item", "eq.42"))
            .and(body_json(json!({ "status": "inativo" })))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let result = client(&mock_server.uri(), "itens")
            .eq("id_item", "42")
            .update(json!({ "status": "inativo" }))
            .await
            .unwrap();
        assert_eq!(result, Value::Null);
    }

    #[tokio::test]
    async fn test_unfiltered_mutations_are_refused() {
        let c = client("http://localhost:1", "user_roles");
        assert!(matches!(
            c.delete().await,
            Err(PostgrestError::InvalidParameters(_))
        ));
        assert!(matches!(
            c.update(json!({ "role": "admin" })).await,
            Err(PostgrestError::InvalidParameters(_))
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/rest/v1/user_roles"))
            .and(query_param("user_id", "eq.u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "user_id": "u1", "role": "cliente" }
            ])))
            .mount(&mock_server)
            .await;

        let deleted = client(&mock_server.uri(), "user_roles")
            .eq("user_id", "u1")
            .delete()
            .await
            .unwrap();
        assert_eq!(deleted[0]["role"], "cliente");
    }

    #[tokio::test]
    async fn test_error_handling() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/itens"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "message": "Invalid API key"
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/server_error"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&mock_server)
            .await;

        match client(&mock_server.uri(), "itens").execute::<Value>().await {
            Err(PostgrestError::ApiError { details, status }) => {
                assert_eq!(status, reqwest::StatusCode::UNAUTHORIZED);
                assert_eq!(details.message, Some("Invalid API key".to_string()));
            }
            other => panic!("Expected ApiError for 401, got {:?}", other),
        }

        match client(&mock_server.uri(), "server_error")
            .execute::<Value>()
            .await
        {
            Err(PostgrestError::UnparsedApiError { message, status }) => {
                assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(message, "Internal Server Error");
            }
            other => panic!("Expected UnparsedApiError for 500, got {:?}", other),
        }
    }
}
