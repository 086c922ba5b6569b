//! Functional options applied to a [`RequestConfig`].
//!
//! A [`RequestOption`] is a reusable mutation of the per-request record.
//! Options are applied left to right; scalar settings follow last-writer-wins
//! while header and parameter options merge key by key.

use crate::config::{Headers, Method, Params, RequestConfig, TlsConfig};
use crate::error::BoxError;
use crate::logger::RequestLogger;
use crate::response::ResponseCapture;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

type HookFn = dyn Fn(&mut RequestConfig) -> Result<(), BoxError> + Send + Sync;
type ApplyFn = dyn Fn(&mut RequestConfig) + Send + Sync;

/// Fallible callback run right before the request is built
///
/// Hooks see the fully optioned record and finalize URL and body. They run in
/// registration order and the first failure aborts the request.
#[derive(Clone)]
pub struct BeforeRequestHook(Arc<HookFn>);

impl BeforeRequestHook {
    #[must_use]
    pub fn new<F>(hook: F) -> Self
    where
        F: Fn(&mut RequestConfig) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self(Arc::new(hook))
    }

    /// Run the hook against the record
    ///
    /// # Errors
    /// Returns whatever error the hook produced.
    pub fn run(&self, record: &mut RequestConfig) -> Result<(), BoxError> {
        (self.0)(record)
    }
}

impl fmt::Debug for BeforeRequestHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BeforeRequestHook")
    }
}

/// Named mutation of the per-request [`RequestConfig`]
///
/// Cheap to clone; the same option can be applied to any number of requests.
///
/// # Example
///
/// ```ignore
/// use xhttp::RequestOption;
///
/// let opts = [
///     RequestOption::timeout(10),
///     RequestOption::header("authorization", "Bearer token"),
/// ];
/// client.get("https://api.example.com/users", Some(&mut users), opts).await?;
/// ```
#[derive(Clone)]
pub struct RequestOption {
    name: &'static str,
    apply: Arc<ApplyFn>,
}

impl RequestOption {
    fn new<F>(name: &'static str, apply: F) -> Self
    where
        F: Fn(&mut RequestConfig) + Send + Sync + 'static,
    {
        Self {
            name,
            apply: Arc::new(apply),
        }
    }

    /// Apply the option to a record in place
    pub fn apply(&self, record: &mut RequestConfig) {
        (self.apply)(record);
    }

    /// Name of the setting this option changes
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Set the target URL
    #[must_use]
    pub fn url(url: impl Into<String>) -> Self {
        let url = url.into();
        Self::new("url", move |record| record.url.clone_from(&url))
    }

    /// Set the HTTP verb
    #[must_use]
    pub fn method(method: Method) -> Self {
        Self::new("method", move |record| record.method = method)
    }

    /// Set the round-trip timeout in whole seconds
    #[must_use]
    pub fn timeout(secs: u64) -> Self {
        Self::timeout_duration(Duration::from_secs(secs))
    }

    /// Set the round-trip timeout
    #[must_use]
    pub fn timeout_duration(timeout: Duration) -> Self {
        Self::new("timeout", move |record| record.timeout = timeout)
    }

    /// Merge headers into the record, replacing values of existing names
    #[must_use]
    pub fn headers<I, K, V>(headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let headers: Headers = headers
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();
        Self::new("headers", move |record| {
            for (name, value) in &headers {
                record.headers.insert(name.clone(), value.clone());
            }
        })
    }

    /// Merge a single header into the record
    #[must_use]
    pub fn header(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::headers([(name.into(), value.into())])
    }

    /// Merge parameters into the record
    #[must_use]
    pub fn params(params: Params) -> Self {
        Self::new("params", move |record| {
            for (key, value) in &params {
                record.params.insert(key.clone(), value.clone());
            }
        })
    }

    /// Append a before-request hook
    #[must_use]
    pub fn before_request<F>(hook: F) -> Self
    where
        F: Fn(&mut RequestConfig) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self::before_request_hook(BeforeRequestHook::new(hook))
    }

    /// Append an already constructed before-request hook
    #[must_use]
    pub fn before_request_hook(hook: BeforeRequestHook) -> Self {
        Self::new("before_request", move |record| {
            record.before_request.push(hook.clone());
        })
    }

    /// Replace the TLS settings
    #[must_use]
    pub fn tls_config(tls: TlsConfig) -> Self {
        Self::new("tls_config", move |record| record.tls = tls.clone())
    }

    /// Capture status, headers and body of the response into `capture`
    #[must_use]
    pub fn response(capture: ResponseCapture) -> Self {
        Self::new("response", move |record| {
            record.response = Some(capture.clone());
        })
    }

    /// Route informational request traces to `logger`
    #[must_use]
    pub fn logger(logger: impl RequestLogger + 'static) -> Self {
        Self::shared_logger(Arc::new(logger))
    }

    /// Route informational request traces to a shared logger
    #[must_use]
    pub fn shared_logger(logger: Arc<dyn RequestLogger>) -> Self {
        Self::new("logger", move |record| {
            record.logger = Some(Arc::clone(&logger));
        })
    }

    /// Whether DELETE also sends its parameters as a query string
    #[must_use]
    pub fn delete_uri_flag(flag: bool) -> Self {
        Self::new("delete_uri_flag", move |record| {
            record.delete_uri_flag = flag;
        })
    }

    /// Set a raw request body
    #[must_use]
    pub fn body(body: impl Into<Bytes>) -> Self {
        let body = body.into();
        Self::new("body", move |record| record.body = Some(body.clone()))
    }

    /// Abort the request when `token` is cancelled
    #[must_use]
    pub fn cancellation(token: CancellationToken) -> Self {
        Self::new("cancellation", move |record| {
            record.cancellation = Some(token.clone());
        })
    }
}

impl fmt::Debug for RequestOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RequestOption").field(&self.name).finish()
    }
}

/// Apply `options` in order to a fresh record.
pub fn apply_all<'a, I>(options: I) -> RequestConfig
where
    I: IntoIterator<Item = &'a RequestOption>,
{
    let mut record = RequestConfig::default();
    for option in options {
        option.apply(&mut record);
    }
    record
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, serde_json::Value)]) -> Params {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), value.clone()))
            .collect()
    }

    #[test]
    fn test_scalar_options_last_writer_wins() {
        let opts = [
            RequestOption::url("http://x/first"),
            RequestOption::method(Method::Post),
            RequestOption::timeout(5),
            RequestOption::url("http://x/second"),
            RequestOption::method(Method::Delete),
        ];
        let record = apply_all(&opts);

        assert_eq!(record.url(), "http://x/second");
        assert_eq!(record.method(), Method::Delete);
        assert_eq!(record.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_scalar_option_applied_twice_is_idempotent() {
        let timeout = RequestOption::timeout(7);
        let flag = RequestOption::delete_uri_flag(false);

        let once = apply_all([&timeout, &flag]);
        let twice = apply_all([&timeout, &flag, &timeout, &flag]);

        assert_eq!(once.timeout(), twice.timeout());
        assert_eq!(once.delete_uri_flag(), twice.delete_uri_flag());
        assert!(!twice.delete_uri_flag());
    }

    #[test]
    fn test_params_accumulate() {
        let opts = [
            RequestOption::params(params(&[("a", json!(1))])),
            RequestOption::params(params(&[("b", json!("two"))])),
        ];
        let record = apply_all(&opts);

        assert_eq!(record.params(), &params(&[("a", json!(1)), ("b", json!("two"))]));
    }

    #[test]
    fn test_params_overlapping_key_last_wins() {
        let opts = [
            RequestOption::params(params(&[("a", json!(1))])),
            RequestOption::params(params(&[("a", json!(2))])),
        ];
        let record = apply_all(&opts);

        assert_eq!(record.params().get("a"), Some(&json!(2)));
    }

    #[test]
    fn test_headers_merge_over_defaults() {
        let opts = [
            RequestOption::header("Content-Type", "text/plain"),
            RequestOption::headers([("X-Trace", "abc")]),
        ];
        let record = apply_all(&opts);

        assert_eq!(record.headers().get("Content-Type").unwrap(), "text/plain");
        assert_eq!(record.headers().get("Connection").unwrap(), "close");
        assert_eq!(record.headers().get("X-Trace").unwrap(), "abc");
    }

    #[test]
    fn test_before_request_appends_in_order() {
        let opts = [
            RequestOption::before_request(|record| {
                record.set_url(format!("{}/one", record.url()));
                Ok(())
            }),
            RequestOption::before_request(|record| {
                record.set_url(format!("{}/two", record.url()));
                Ok(())
            }),
        ];
        let mut record = apply_all(&opts);
        assert_eq!(record.hook_count(), 2);

        let hooks = record.before_request.clone();
        for hook in &hooks {
            hook.run(&mut record).unwrap();
        }
        assert_eq!(record.url(), "/one/two");
    }

    #[test]
    fn test_body_and_tls_options() {
        let opts = [
            RequestOption::body("raw"),
            RequestOption::tls_config(TlsConfig::Native),
        ];
        let record = apply_all(&opts);

        assert_eq!(record.body().unwrap().as_ref(), b"raw");
        assert!(matches!(record.tls(), TlsConfig::Native));
    }

    #[test]
    fn test_option_debug_shows_name() {
        let opt = RequestOption::timeout(1);
        assert_eq!(opt.name(), "timeout");
        assert_eq!(format!("{opt:?}"), "RequestOption(\"timeout\")");
    }
}
