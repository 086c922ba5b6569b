use crate::client::HttpClient;
use crate::config::TlsConfig;
use crate::logger::RequestLogger;
use crate::option::RequestOption;
use std::time::Duration;

/// Builder for an [`HttpClient`] carrying default options
///
/// Defaults are applied to every request of the built client, before the
/// verb's own options and before the options passed to the call.
#[derive(Debug, Clone, Default)]
pub struct HttpClientBuilder {
    defaults: Vec<RequestOption>,
}

impl HttpClientBuilder {
    /// Create a new builder with no default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the round-trip timeout
    ///
    /// Covers sending the request, reading the body and finishing the stream.
    #[must_use]
    pub fn timeout(self, timeout: Duration) -> Self {
        self.option(RequestOption::timeout_duration(timeout))
    }

    /// Set the round-trip timeout in whole seconds
    #[must_use]
    pub fn timeout_secs(self, secs: u64) -> Self {
        self.option(RequestOption::timeout(secs))
    }

    /// Add a default header
    ///
    /// Replaces any built-in header of the same name, such as `Content-Type`.
    #[must_use]
    pub fn header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.option(RequestOption::header(name, value))
    }

    /// Add several default headers
    #[must_use]
    pub fn headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.option(RequestOption::headers(headers))
    }

    /// Set TLS root configuration
    #[must_use]
    pub fn tls(self, tls: TlsConfig) -> Self {
        self.option(RequestOption::tls_config(tls))
    }

    /// Log a line per request through `logger`
    #[must_use]
    pub fn logger(self, logger: impl RequestLogger + 'static) -> Self {
        self.option(RequestOption::logger(logger))
    }

    /// Whether DELETE params also go into the query string (default: true)
    #[must_use]
    pub fn delete_uri_flag(self, flag: bool) -> Self {
        self.option(RequestOption::delete_uri_flag(flag))
    }

    /// Add an arbitrary default option
    #[must_use]
    pub fn option(mut self, option: RequestOption) -> Self {
        self.defaults.push(option);
        self
    }

    /// Build the client
    #[must_use]
    pub fn build(self) -> HttpClient {
        HttpClient::with_defaults(self.defaults)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::logger::TracingLogger;
    use crate::option::apply_all;

    #[test]
    fn test_builder_default() {
        let client = HttpClientBuilder::new().build();
        assert!(client.defaults().is_empty());
    }

    #[test]
    fn test_builder_with_timeout() {
        let client = HttpClientBuilder::new()
            .timeout(Duration::from_millis(250))
            .build();

        let record = apply_all(client.defaults());
        assert_eq!(record.timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_builder_later_settings_win() {
        let client = HttpClient::builder()
            .timeout_secs(30)
            .timeout_secs(5)
            .delete_uri_flag(false)
            .build();

        let record = apply_all(client.defaults());
        assert_eq!(record.timeout(), Duration::from_secs(5));
        assert!(!record.delete_uri_flag());
    }

    #[test]
    fn test_builder_headers_merge_with_builtins() {
        let client = HttpClient::builder()
            .header("Content-Type", "application/xml")
            .headers([("X-A", "1"), ("X-B", "2")])
            .build();

        let record = apply_all(client.defaults());
        let headers = record.headers();
        assert_eq!(headers.get("Content-Type").unwrap(), "application/xml");
        assert_eq!(headers.get("Connection").unwrap(), "close");
        assert_eq!(headers.get("X-A").unwrap(), "1");
        assert_eq!(headers.get("X-B").unwrap(), "2");
    }

    #[test]
    fn test_builder_tls_and_logger() {
        let client = HttpClient::builder()
            .tls(TlsConfig::Native)
            .logger(TracingLogger)
            .build();

        let record = apply_all(client.defaults());
        assert!(matches!(record.tls(), TlsConfig::Native));
        assert!(record.has_logger());
        assert_eq!(client.defaults()[0].name(), "tls_config");
    }
}
