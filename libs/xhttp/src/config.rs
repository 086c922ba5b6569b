use crate::logger::RequestLogger;
use crate::option::BeforeRequestHook;
use crate::response::ResponseCapture;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default round-trip timeout for a single request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Headers every request starts with
pub const DEFAULT_HEADERS: [(&str, &str); 2] = [
    ("Connection", "close"),
    ("Content-Type", "application/json"),
];

/// Query/body parameters, keyed and iterated in sorted order.
pub type Params = BTreeMap<String, serde_json::Value>;

/// Request headers as plain strings; validated when the request is built.
pub type Headers = BTreeMap<String, String>;

/// HTTP verb supported by the client facade
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Upper-case wire form of the verb
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => http::Method::GET,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Delete => http::Method::DELETE,
        }
    }
}

/// TLS settings for the per-request transport
///
/// Certificate verification is always enabled for the built-in variants.
/// Use [`TlsConfig::Custom`] to supply a fully configured rustls client
/// config (client certificates, pinned roots, custom verifiers).
#[derive(Clone, Default)]
#[non_exhaustive]
pub enum TlsConfig {
    /// Use Mozilla's root certificates (webpki-roots, no OS dependency)
    #[default]
    WebPki,
    /// Use OS native root certificate store
    Native,
    /// Caller-provided rustls configuration
    Custom(Arc<rustls::ClientConfig>),
}

impl fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TlsConfig::WebPki => f.write_str("WebPki"),
            TlsConfig::Native => f.write_str("Native"),
            TlsConfig::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Per-request configuration record
///
/// One record is created for every request invocation, mutated by the
/// request options and the before-request hooks, then consumed by the
/// executor. It is never shared between calls.
pub struct RequestConfig {
    pub(crate) url: String,
    pub(crate) method: Method,
    pub(crate) timeout: Duration,
    pub(crate) headers: Headers,
    pub(crate) params: Params,
    pub(crate) body: Option<Bytes>,
    pub(crate) tls: TlsConfig,
    pub(crate) response: Option<ResponseCapture>,
    pub(crate) logger: Option<Arc<dyn RequestLogger>>,
    pub(crate) delete_uri_flag: bool,
    pub(crate) before_request: Vec<BeforeRequestHook>,
    pub(crate) cancellation: Option<CancellationToken>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: Method::Get,
            timeout: DEFAULT_TIMEOUT,
            headers: DEFAULT_HEADERS
                .iter()
                .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
                .collect(),
            params: Params::new(),
            body: None,
            tls: TlsConfig::default(),
            response: None,
            logger: None,
            delete_uri_flag: true,
            before_request: Vec::new(),
            cancellation: None,
        }
    }
}

impl RequestConfig {
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    /// Request body, if one has been set
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = Some(body.into());
    }

    #[must_use]
    pub fn tls(&self) -> &TlsConfig {
        &self.tls
    }

    #[must_use]
    pub fn delete_uri_flag(&self) -> bool {
        self.delete_uri_flag
    }

    /// Emit an informational line through the configured logger, if any.
    pub fn log(&self, line: &str) {
        if let Some(logger) = &self.logger {
            logger.log_line(line);
        }
    }

    #[must_use]
    pub fn has_logger(&self) -> bool {
        self.logger.is_some()
    }

    /// Number of registered before-request hooks
    #[must_use]
    pub fn hook_count(&self) -> usize {
        self.before_request.len()
    }
}

impl fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestConfig")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("timeout", &self.timeout)
            .field("headers", &self.headers)
            .field("params", &self.params)
            .field("body", &self.body)
            .field("tls", &self.tls)
            .field("response", &self.response.is_some())
            .field("logger", &self.logger.is_some())
            .field("delete_uri_flag", &self.delete_uri_flag)
            .field("before_request", &self.before_request.len())
            .field("cancellation", &self.cancellation.is_some())
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_record_defaults() {
        let record = RequestConfig::default();
        assert_eq!(record.method(), Method::Get);
        assert_eq!(record.timeout(), Duration::from_secs(3));
        assert_eq!(record.headers().get("Connection").unwrap(), "close");
        assert_eq!(
            record.headers().get("Content-Type").unwrap(),
            "application/json"
        );
        assert!(record.params().is_empty());
        assert!(record.body().is_none());
        assert!(matches!(record.tls(), TlsConfig::WebPki));
        assert!(record.delete_uri_flag());
        assert!(!record.has_logger());
        assert_eq!(record.hook_count(), 0);
    }

    #[test]
    fn test_method_conversions() {
        assert_eq!(Method::Delete.to_string(), "DELETE");
        assert_eq!(http::Method::from(Method::Put), http::Method::PUT);
        assert_eq!(Method::default(), Method::Get);
    }

    #[test]
    fn test_set_body_replaces_previous() {
        let mut record = RequestConfig::default();
        record.set_body("first");
        record.set_body(Bytes::from_static(b"second"));
        assert_eq!(record.body().unwrap().as_ref(), b"second");
    }
}
