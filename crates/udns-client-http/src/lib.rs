// # UltraDNS REST Client
//
// This crate provides the `DnsClient` implementation that talks to the
// UltraDNS REST API v2 over HTTPS.
//
// ## Behavior
//
// - One HTTP request per trait call (plus a token request when no token is cached)
// - No retry, no backoff: listing retries are owned by `udns-core`'s `RetryPolicy`
// - Non-success status → `Error::Remote` carrying the status
// - No response at all, or an undecodable body → `Error::Transport`
// - HTTP timeout of 30 seconds
//
// ## Security Requirements
//
// - Password and bearer token NEVER appear in logs or `Debug` output
// - A 401 drops the cached token; the next call authenticates again
//
// ## API Reference
//
// - Token: POST `/v2/authorization/token` (password grant)
// - List zones: GET `/v2/zones?q=account_name:{account}&offset=..&limit=..`
// - Record sets: GET|POST|PUT|DELETE `/v2/zones/{zone}/rrsets/{type}/{name}`

use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::RwLock;
use udns_core::model::{Page, RecordSet, ResultInfo, RrSetKey, Zone, ZoneKey};
use udns_core::{DnsClient, Error, Result, UltraDnsConfig};

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("udns-sync/", env!("CARGO_PKG_VERSION"));

// ============================================================
// Wire Types
// ============================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(rename = "accessToken", alias = "access_token")]
    access_token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResultInfo {
    #[serde(default)]
    total_count: usize,
    #[serde(default)]
    offset: usize,
    #[serde(default)]
    returned_count: usize,
}

impl From<WireResultInfo> for ResultInfo {
    fn from(info: WireResultInfo) -> Self {
        ResultInfo {
            returned_count: info.returned_count,
            offset: info.offset,
            total_count: info.total_count,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ZoneListResponse {
    #[serde(default)]
    zones: Vec<WireZone>,
    #[serde(default)]
    result_info: WireResultInfo,
}

#[derive(Debug, Deserialize)]
struct WireZone {
    properties: ZoneProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ZoneProperties {
    name: String,
    #[serde(default)]
    account_name: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    resource_record_count: u64,
}

impl From<WireZone> for Zone {
    fn from(zone: WireZone) -> Self {
        let p = zone.properties;
        Zone {
            name: p.name,
            account_name: p.account_name,
            record_count: p.resource_record_count,
            status: p.status,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RrSetListResponse {
    #[serde(default)]
    rr_sets: Vec<WireRrSet>,
    #[serde(default)]
    result_info: WireResultInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRrSet {
    #[serde(default)]
    owner_name: String,
    #[serde(rename = "rrtype")]
    rr_type: String,
    #[serde(default)]
    ttl: u32,
    #[serde(default)]
    rdata: Vec<String>,
}

impl From<WireRrSet> for RecordSet {
    fn from(rrset: WireRrSet) -> Self {
        RecordSet {
            owner_name: rrset.owner_name,
            rr_type: rrset.rr_type,
            ttl: rrset.ttl,
            rdata: rrset.rdata,
        }
    }
}

/// Body of a record set create or replace
#[derive(Debug, Serialize)]
struct RrSetBody<'a> {
    ttl: u32,
    rdata: &'a [String],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiError {
    #[serde(default)]
    error_code: i64,
    #[serde(default)]
    error_message: String,
}

// ============================================================
// Client Implementation
// ============================================================

/// UltraDNS REST API client
///
/// Holds the bearer token between calls. Nothing else is cached.
pub struct UltraDnsHttpClient {
    /// Service username
    username: String,

    /// Service password
    /// ⚠️ NEVER log this value
    password: String,

    /// REST API root, e.g. "https://api.ultradns.com"
    base_url: Url,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Bearer token from the last successful authentication
    token: RwLock<Option<String>>,
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for UltraDnsHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UltraDnsHttpClient")
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"<REDACTED>")
            .finish()
    }
}

impl UltraDnsHttpClient {
    /// Create a client from validated configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the base URL does not parse, or a
    /// transport error if the HTTP client cannot be built.
    pub fn new(config: &UltraDnsConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| Error::config(format!("invalid base URL {:?}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::config(format!("invalid base URL {:?}", config.base_url)));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            username: config.username.clone(),
            password: config.password.clone(),
            base_url,
            client,
            token: RwLock::new(None),
        })
    }

    /// Build `{base}/v2/{segments...}`
    fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::config("base URL cannot carry a path"))?
            .pop_if_empty()
            .push("v2")
            .extend(segments);
        Ok(url)
    }

    /// URL of the record sets selected by `key`
    ///
    /// An empty type becomes `ANY`; an empty name selects every owner.
    fn rrset_url(&self, key: &RrSetKey) -> Result<Url> {
        let rr_type = if key.rr_type.is_empty() { "ANY" } else { key.rr_type.as_str() };
        let mut segments = vec!["zones", key.zone.as_str(), "rrsets", rr_type];
        if !key.name.is_empty() {
            segments.push(key.name.as_str());
        }
        self.url(segments)
    }

    /// Return the cached bearer token, authenticating when there is none
    async fn bearer(&self) -> Result<String> {
        if let Some(token) = self.token.read().await.as_ref() {
            return Ok(token.clone());
        }

        let mut slot = self.token.write().await;
        if let Some(token) = slot.as_ref() {
            return Ok(token.clone());
        }

        let url = self.url(["authorization", "token"])?;
        tracing::debug!(username = %self.username, "Requesting access token");

        let response = self
            .client
            .post(url)
            .form(&[
                ("grant_type", "password"),
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::transport(format!("token request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(remote_error(response, "Authentication failed").await);
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::transport(format!("failed to parse token response: {}", e)))?;

        *slot = Some(body.access_token.clone());
        Ok(body.access_token)
    }

    /// Send one authenticated request and return the successful response
    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<reqwest::Response> {
        let token = self.bearer().await?;
        tracing::debug!("{} {}", method, url);

        let mut request = self.client.request(method.clone(), url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            tracing::debug!("Access token rejected, dropping it");
            *self.token.write().await = None;
        }

        Err(remote_error(response, &format!("{} failed", method)).await)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        self.execute::<()>(Method::GET, url, None)
            .await?
            .json()
            .await
            .map_err(|e| Error::transport(format!("failed to parse response: {}", e)))
    }
}

/// Turn a non-success response into `Error::Remote`
///
/// The service reports errors as `[{"errorCode": .., "errorMessage": ..}]`;
/// anything else is passed through as text.
async fn remote_error(response: reqwest::Response, context: &str) -> Error {
    let status = response.status();
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());

    let detail = match serde_json::from_str::<Vec<ApiError>>(&text) {
        Ok(errors) if !errors.is_empty() => errors
            .iter()
            .map(|e| format!("{} ({})", e.error_message, e.error_code))
            .collect::<Vec<_>>()
            .join(", "),
        _ => text,
    };

    Error::remote(status.as_u16(), format!("{}: {}", context, detail))
}

/// Search expression for a zone listing
fn zone_query(key: &ZoneKey) -> String {
    let mut terms = Vec::new();
    if !key.zone.is_empty() {
        terms.push(format!("name:{}", key.zone));
    }
    if !key.account_name.is_empty() {
        terms.push(format!("account_name:{}", key.account_name));
    }
    terms.join(" ")
}

#[async_trait]
impl DnsClient for UltraDnsHttpClient {
    async fn list_zones(&self, key: &ZoneKey, offset: usize, limit: usize) -> Result<Page<Zone>> {
        let mut url = self.url(["zones"])?;
        {
            let mut query = url.query_pairs_mut();
            let q = zone_query(key);
            if !q.is_empty() {
                query.append_pair("q", &q);
            }
            query
                .append_pair("offset", &offset.to_string())
                .append_pair("limit", &limit.to_string());
        }

        let body: ZoneListResponse = self.get_json(url).await?;
        Ok(Page::new(
            body.zones.into_iter().map(Zone::from).collect(),
            body.result_info.into(),
        ))
    }

    async fn list_rrsets(
        &self,
        key: &RrSetKey,
        offset: usize,
        limit: usize,
    ) -> Result<Page<RecordSet>> {
        let mut url = self.rrset_url(key)?;
        url.query_pairs_mut()
            .append_pair("offset", &offset.to_string())
            .append_pair("limit", &limit.to_string());

        let body: RrSetListResponse = self.get_json(url).await?;
        Ok(Page::new(
            body.rr_sets.into_iter().map(RecordSet::from).collect(),
            body.result_info.into(),
        ))
    }

    async fn select_rrset(&self, key: &RrSetKey) -> Result<Vec<RecordSet>> {
        let body: RrSetListResponse = self.get_json(self.rrset_url(key)?).await?;
        Ok(body.rr_sets.into_iter().map(RecordSet::from).collect())
    }

    async fn create_rrset(&self, key: &RrSetKey, rrset: &RecordSet) -> Result<()> {
        let body = RrSetBody {
            ttl: rrset.ttl,
            rdata: &rrset.rdata,
        };
        self.execute(Method::POST, self.rrset_url(key)?, Some(&body)).await?;
        Ok(())
    }

    async fn update_rrset(&self, key: &RrSetKey, rrset: &RecordSet) -> Result<()> {
        let body = RrSetBody {
            ttl: rrset.ttl,
            rdata: &rrset.rdata,
        };
        self.execute(Method::PUT, self.rrset_url(key)?, Some(&body)).await?;
        Ok(())
    }

    async fn delete_rrset(&self, key: &RrSetKey) -> Result<()> {
        self.execute::<()>(Method::DELETE, self.rrset_url(key)?, None).await?;
        Ok(())
    }

    fn client_name(&self) -> &'static str {
        "ultradns"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str) -> UltraDnsConfig {
        UltraDnsConfig::new("teamrest-user", "secret_password_123", base_url, "teamrest")
    }

    async fn server_with_token() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/authorization/token"))
            .and(body_string_contains("grant_type=password"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tokenType": "Bearer",
                "accessToken": "tok-1",
                "refreshToken": "refresh-1",
                "expiresIn": "3600"
            })))
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_credentials_not_exposed_in_debug() {
        let client = UltraDnsHttpClient::new(&config("https://api.example.net")).unwrap();

        let debug_str = format!("{:?}", client);
        assert!(!debug_str.contains("secret_password_123"));
        assert!(debug_str.contains("UltraDnsHttpClient"));
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let result = UltraDnsHttpClient::new(&config("not a url"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rrset_url_shapes() {
        let client = UltraDnsHttpClient::new(&config("https://api.example.net/")).unwrap();

        let whole = client.rrset_url(&RrSetKey::whole_zone("example.com.")).unwrap();
        assert_eq!(whole.as_str(), "https://api.example.net/v2/zones/example.com./rrsets/ANY");

        let one = client
            .rrset_url(&RrSetKey::new("example.com.", "A", "www.example.com."))
            .unwrap();
        assert_eq!(
            one.as_str(),
            "https://api.example.net/v2/zones/example.com./rrsets/A/www.example.com."
        );
    }

    #[test]
    fn test_zone_query() {
        assert_eq!(zone_query(&ZoneKey::account("teamrest")), "account_name:teamrest");
        let key = ZoneKey {
            zone: "example.com.".to_string(),
            account_name: "teamrest".to_string(),
        };
        assert_eq!(zone_query(&key), "name:example.com. account_name:teamrest");
    }

    #[tokio::test]
    async fn test_list_zones_maps_page() {
        let server = server_with_token().await;
        Mock::given(method("GET"))
            .and(path("/v2/zones"))
            .and(query_param("q", "account_name:teamrest"))
            .and(query_param("offset", "0"))
            .and(query_param("limit", "1000"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "queryInfo": {"q": "account_name:teamrest", "sort": "NAME"},
                "resultInfo": {"totalCount": 2, "offset": 0, "returnedCount": 2},
                "zones": [
                    {"properties": {"name": "example.com.", "accountName": "teamrest",
                        "type": "PRIMARY", "dnssecStatus": "UNSIGNED", "status": "ACTIVE",
                        "owner": "teamrest", "resourceRecordCount": 7,
                        "lastModifiedDateTime": "2024-01-01T00:00Z"}},
                    {"properties": {"name": "example.org.", "accountName": "teamrest",
                        "type": "PRIMARY", "status": "ACTIVE", "resourceRecordCount": 0}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = UltraDnsHttpClient::new(&config(&server.uri())).unwrap();
        let page = client
            .list_zones(&ZoneKey::account("teamrest"), 0, 1000)
            .await
            .unwrap();

        assert_eq!(page.info.total_count, 2);
        assert_eq!(page.info.returned_count, 2);
        assert_eq!(page.items[0].name, "example.com.");
        assert_eq!(page.items[0].record_count, 7);
        assert_eq!(page.items[1].record_count, 0);
    }

    #[tokio::test]
    async fn test_list_rrsets_keeps_decorated_type() {
        let server = server_with_token().await;
        Mock::given(method("GET"))
            .and(path("/v2/zones/example.com./rrsets/ANY"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "zoneName": "example.com.",
                "rrSets": [
                    {"ownerName": "www.example.com.", "rrtype": "A (1)", "ttl": 300,
                        "rdata": ["10.0.0.1", "10.0.0.2"]},
                    {"ownerName": "", "rrtype": "TXT (16)", "ttl": 86400, "rdata": ["\"hello\""]}
                ],
                "resultInfo": {"totalCount": 2, "offset": 0, "returnedCount": 2}
            })))
            .mount(&server)
            .await;

        let client = UltraDnsHttpClient::new(&config(&server.uri())).unwrap();
        let page = client
            .list_rrsets(&RrSetKey::whole_zone("example.com."), 0, 1000)
            .await
            .unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].rr_type, "A (1)");
        assert_eq!(page.items[0].base_type(), "A");
        assert_eq!(page.items[0].rdata, vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(page.items[1].owner_name, "");
    }

    #[tokio::test]
    async fn test_create_sends_ttl_and_rdata() {
        let server = server_with_token().await;
        Mock::given(method("POST"))
            .and(path("/v2/zones/example.com./rrsets/A/www.example.com."))
            .and(body_json(json!({"ttl": 86400, "rdata": ["10.0.0.1"]})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"message": "Successful"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = UltraDnsHttpClient::new(&config(&server.uri())).unwrap();
        let rrset = RecordSet {
            owner_name: "www.example.com.".to_string(),
            rr_type: "A".to_string(),
            ttl: 86400,
            rdata: vec!["10.0.0.1".to_string()],
        };
        client
            .create_rrset(&RrSetKey::new("example.com.", "A", "www.example.com."), &rrset)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_not_found_maps_to_remote_404() {
        let server = server_with_token().await;
        Mock::given(method("GET"))
            .and(path("/v2/zones/example.com./rrsets/A/old.example.com."))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!([
                {"errorCode": 70002, "errorMessage": "Data not found."}
            ])))
            .mount(&server)
            .await;

        let client = UltraDnsHttpClient::new(&config(&server.uri())).unwrap();
        let err = client
            .select_rrset(&RrSetKey::new("example.com.", "A", "old.example.com."))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(404));
        assert!(err.to_string().contains("Data not found."));
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let server = server_with_token().await;
        Mock::given(method("GET"))
            .and(path("/v2/zones"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let client = UltraDnsHttpClient::new(&config(&server.uri())).unwrap();
        let err = client
            .list_zones(&ZoneKey::account("teamrest"), 0, 1000)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(503));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_token_is_reused_across_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/authorization/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok-2"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/v2/zones/example.com./rrsets/A/www.example.com."))
            .and(header("authorization", "Bearer tok-2"))
            .respond_with(ResponseTemplate::new(204))
            .expect(2)
            .mount(&server)
            .await;

        let client = UltraDnsHttpClient::new(&config(&server.uri())).unwrap();
        let key = RrSetKey::new("example.com.", "A", "www.example.com.");
        client.delete_rrset(&key).await.unwrap();
        client.delete_rrset(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_credentials_are_remote_401() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/authorization/token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!([
                {"errorCode": 60001, "errorMessage": "invalid_grant:Invalid username & password combination."}
            ])))
            .mount(&server)
            .await;

        let client = UltraDnsHttpClient::new(&config(&server.uri())).unwrap();
        let err = client
            .list_zones(&ZoneKey::account("teamrest"), 0, 1000)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(401));
        assert!(!err.is_transient());
        assert!(!err.to_string().contains("secret_password_123"));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        // Nothing listens on the discard port
        let client = UltraDnsHttpClient::new(&config("http://127.0.0.1:9")).unwrap();
        let err = client
            .list_zones(&ZoneKey::account("teamrest"), 0, 1000)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(err.status(), None);
    }
}
