use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{HttpConfig, ServiceName};
use crate::error::ClientError;
use crate::session::store::SharedStore;

/// Scheme word of the authorization header. Case-sensitive, followed by one space.
pub const AUTH_SCHEME: &str = "Token";

/// What to do when a request that carried credentials comes back 401
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthFailurePolicy {
    /// Hand the 401 back as a plain `Http` error, touch nothing
    #[default]
    PassThrough,
    /// Clear the shared session and report `SessionExpired`
    ExpireSession,
}

#[derive(Debug, Clone, Default)]
pub struct GatewayOptions {
    pub user_agent: Option<String>,
    pub auth_failure: AuthFailurePolicy,
}

impl From<&HttpConfig> for GatewayOptions {
    fn from(http: &HttpConfig) -> Self {
        Self {
            user_agent: Some(http.user_agent.clone()),
            auth_failure: if http.expire_on_unauthorized {
                AuthFailurePolicy::ExpireSession
            } else {
                AuthFailurePolicy::PassThrough
            },
        }
    }
}

/// Outbound request, relative to the Gateway's base address
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub headers: HeaderMap,
    pub anonymous: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: HeaderMap::new(),
            anonymous: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn queries<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Never attach the stored credential to this request
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }
}

/// Successful (2xx) backend response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Single choke point for calls to one backend service.
///
/// Reads the shared store at dispatch time, so a logout through any Gateway
/// (or the controller) is seen by all of them on their next request.
#[derive(Debug, Clone)]
pub struct Gateway {
    service: ServiceName,
    base_url: String,
    http: reqwest::Client,
    store: SharedStore,
    policy: AuthFailurePolicy,
}

impl Gateway {
    pub fn new(
        service: ServiceName,
        base_url: impl Into<String>,
        store: SharedStore,
        options: GatewayOptions,
    ) -> Result<Self, ClientError> {
        let base_url = base_url.into();
        url::Url::parse(&base_url).map_err(|e| {
            ClientError::Config(format!("invalid {} service address '{}': {}", service, base_url, e))
        })?;

        let mut builder = reqwest::Client::builder();
        if let Some(agent) = &options.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        let http = builder
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            service,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            store,
            policy: options.auth_failure,
        })
    }

    pub fn service(&self) -> ServiceName {
        self.service
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Absolute URL for `path`, keeping the base address' own path segments
    pub fn url_for(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            format!("{}/", self.base_url)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Header set actually sent: caller headers plus or minus the credential
    fn prepare_headers(&self, request: &ApiRequest) -> Result<(HeaderMap, bool), ClientError> {
        let mut headers = request.headers.clone();
        headers.remove(AUTHORIZATION);

        if request.anonymous {
            return Ok((headers, false));
        }

        match self.store.get().filter(|t| !t.is_empty()) {
            Some(token) => {
                let value = HeaderValue::from_str(&format!("{} {}", AUTH_SCHEME, token))
                    .map_err(|_| ClientError::InvalidPayload("stored token is not a valid header value".to_string()))?;
                headers.insert(AUTHORIZATION, value);
                Ok((headers, true))
            }
            None => Ok((headers, false)),
        }
    }

    /// Dispatch exactly once. 2xx comes back as `ApiResponse`; anything else is an error.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let (headers, authenticated) = self.prepare_headers(&request)?;
        let url = self.url_for(&request.path);

        debug!(
            service = %self.service,
            method = %request.method,
            path = %request.path,
            authenticated,
            "Dispatching request"
        );

        let mut builder = self.http.request(request.method.clone(), &url).headers(headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(service = %self.service, url = %url, "Transport failure: {}", e);
            ClientError::Transport {
                service: self.service,
                message: e.to_string(),
            }
        })?;

        let status = response.status();
        let response_headers = response.headers().clone();
        let bytes = response.bytes().await.map_err(|e| ClientError::Transport {
            service: self.service,
            message: format!("failed to read response body: {}", e),
        })?;
        let body = decode_body(&bytes);

        if status.is_success() {
            return Ok(ApiResponse {
                status: status.as_u16(),
                headers: response_headers,
                body,
            });
        }

        debug!(service = %self.service, status = status.as_u16(), "Backend returned error status");

        if status == StatusCode::UNAUTHORIZED
            && authenticated
            && self.policy == AuthFailurePolicy::ExpireSession
        {
            warn!(service = %self.service, "Credential rejected, clearing session");
            if let Err(e) = self.store.clear() {
                warn!(service = %self.service, "Failed to persist session clear: {}", e);
            }
            return Err(ClientError::SessionExpired {
                service: self.service,
            });
        }

        Err(ClientError::Http {
            service: self.service,
            status: status.as_u16(),
            headers: response_headers,
            body,
        })
    }
}

/// Empty -> Null, JSON -> parsed, anything else -> the text as a JSON string
fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::store::MemoryStore;
    use serde_json::json;

    fn gateway(base: &str, store: SharedStore) -> Gateway {
        Gateway::new(ServiceName::User, base, store, GatewayOptions::default()).unwrap()
    }

    #[test]
    fn test_url_for_keeps_base_path() {
        let gw = gateway("http://localhost:8000/user/api/", MemoryStore::new().shared());
        assert_eq!(gw.url_for("/users/"), "http://localhost:8000/user/api/users/");
        assert_eq!(gw.url_for("users/7/"), "http://localhost:8000/user/api/users/7/");
        assert_eq!(gw.url_for(""), "http://localhost:8000/user/api/");
    }

    #[test]
    fn test_token_header_attached_when_present() {
        let gw = gateway("http://localhost:8000/user/api", MemoryStore::with_token("T1").shared());
        let (headers, authenticated) = gw.prepare_headers(&ApiRequest::get("/users/")).unwrap();
        assert!(authenticated);
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Token T1");
    }

    #[test]
    fn test_stale_header_removed_when_absent() {
        let gw = gateway("http://localhost:8000/user/api", MemoryStore::new().shared());
        let request = ApiRequest::get("/users/")
            .header(AUTHORIZATION, HeaderValue::from_static("Token stale"));
        let (headers, authenticated) = gw.prepare_headers(&request).unwrap();
        assert!(!authenticated);
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_anonymous_request_never_authenticated() {
        let gw = gateway("http://localhost:8000/user/api", MemoryStore::with_token("T1").shared());
        let (headers, authenticated) = gw
            .prepare_headers(&ApiRequest::post("/login/").anonymous())
            .unwrap();
        assert!(!authenticated);
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_gateways_share_one_store() {
        let store = MemoryStore::with_token("T1").shared();
        let users = gateway("http://localhost:8000/user/api", store.clone());
        let products = Gateway::new(
            ServiceName::Product,
            "http://localhost:8000/product/api",
            store.clone(),
            GatewayOptions::default(),
        )
        .unwrap();

        users.store().clear().unwrap();
        let (headers, _) = products.prepare_headers(&ApiRequest::get("/categories/")).unwrap();
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_decode_body_shapes() {
        assert_eq!(decode_body(b""), Value::Null);
        assert_eq!(decode_body(b"  \n"), Value::Null);
        assert_eq!(decode_body(br#"{"count": 2}"#), json!({"count": 2}));
        assert_eq!(decode_body(b"<h1>Server Error</h1>"), json!("<h1>Server Error</h1>"));
    }

    #[test]
    fn test_invalid_base_address_rejected() {
        let err = Gateway::new(
            ServiceName::Maintenance,
            "::nope::",
            MemoryStore::new().shared(),
            GatewayOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }
}
