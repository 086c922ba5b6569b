use crate::builder::HttpClientBuilder;
use crate::config::{Method, Params, RequestConfig};
use crate::error::{BoxError, HttpError};
use crate::logger::format_headers;
use crate::option::{RequestOption, apply_all};
use crate::query;
use crate::request;
use crate::response::ResponseTarget;
use std::sync::{Arc, OnceLock};

/// HTTP client facade over the request pipeline
///
/// Each verb method assembles a request from, in order: the URL, the
/// client's default options, the verb's own options and hooks, and the
/// caller's options. Later options win on scalar settings.
///
/// # Thread Safety
///
/// `HttpClient` is `Clone + Send + Sync`. It only holds immutable default
/// options; every call builds its own record and its own transport.
///
/// # Example
///
/// ```ignore
/// let client = HttpClient::builder().timeout_secs(10).build();
///
/// let mut users = serde_json::Value::Null;
/// client
///     .get("https://api.example.com/users", Some(&mut users), [])
///     .await?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct HttpClient {
    defaults: Arc<[RequestOption]>,
}

impl HttpClient {
    /// Client with no default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for a client with default options
    #[must_use]
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    pub(crate) fn with_defaults(defaults: Vec<RequestOption>) -> Self {
        Self {
            defaults: defaults.into(),
        }
    }

    /// Options applied to every request of this client
    #[must_use]
    pub fn defaults(&self) -> &[RequestOption] {
        &self.defaults
    }

    /// Send a GET request
    ///
    /// The record's params replace the URL query string; no body is sent.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::request`].
    pub async fn get<I>(
        &self,
        url: &str,
        result: Option<&mut dyn ResponseTarget>,
        options: I,
    ) -> Result<(), HttpError>
    where
        I: IntoIterator<Item = RequestOption>,
    {
        let injected = vec![
            RequestOption::method(Method::Get),
            RequestOption::before_request(|record| {
                rewrite_query(record)?;
                if record.has_logger() {
                    record.log(&format!(
                        "{} url {} {}",
                        Method::Get,
                        format_headers(record.headers()),
                        record.url()
                    ));
                }
                Ok(())
            }),
        ];
        self.dispatch(url, result, injected, options).await
    }

    /// Send a POST request with `params` as its JSON body
    ///
    /// `None` sends no body at all, while `Some` of an empty map sends `{}`.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::request`].
    pub async fn post<I>(
        &self,
        url: &str,
        params: Option<Params>,
        result: Option<&mut dyn ResponseTarget>,
        options: I,
    ) -> Result<(), HttpError>
    where
        I: IntoIterator<Item = RequestOption>,
    {
        let injected = body_options(Method::Post, params, false);
        self.dispatch(url, result, injected, options).await
    }

    /// Send a PUT request with `params` as its JSON body
    ///
    /// # Errors
    ///
    /// See [`HttpClient::request`].
    pub async fn put<I>(
        &self,
        url: &str,
        params: Option<Params>,
        result: Option<&mut dyn ResponseTarget>,
        options: I,
    ) -> Result<(), HttpError>
    where
        I: IntoIterator<Item = RequestOption>,
    {
        let injected = body_options(Method::Put, params, false);
        self.dispatch(url, result, injected, options).await
    }

    /// Send a DELETE request with `params` as its JSON body
    ///
    /// While the record's delete flag is set (the default), the params are
    /// also sent as the URL query string, replacing any existing one.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::request`].
    pub async fn delete<I>(
        &self,
        url: &str,
        params: Option<Params>,
        result: Option<&mut dyn ResponseTarget>,
        options: I,
    ) -> Result<(), HttpError>
    where
        I: IntoIterator<Item = RequestOption>,
    {
        let injected = body_options(Method::Delete, params, true);
        self.dispatch(url, result, injected, options).await
    }

    /// Run the request pipeline with the client's defaults and `options`
    ///
    /// The method is whatever the options set (GET otherwise). A non-empty
    /// response body is decoded into `result` when one is given; valid JSON
    /// is deserialized and anything else is stored as text in string
    /// targets. HTTP error statuses are not errors.
    ///
    /// # Errors
    ///
    /// - `HttpError::Hook` if a before-request hook fails (nothing is sent)
    /// - `HttpError::InvalidUri` / `InvalidScheme` / `InvalidHeaderName` /
    ///   `InvalidHeaderValue` / `RequestBuild` if the request cannot be built
    /// - `HttpError::Transport`, `Tls`, `Timeout` or `Cancelled` on dispatch
    /// - `HttpError::BodyRead` / `Decode` while consuming the response
    /// - `HttpError::Close` if finishing the response stream fails
    pub async fn request<I>(
        &self,
        url: &str,
        result: Option<&mut dyn ResponseTarget>,
        options: I,
    ) -> Result<(), HttpError>
    where
        I: IntoIterator<Item = RequestOption>,
    {
        self.dispatch(url, result, Vec::new(), options).await
    }

    async fn dispatch<I>(
        &self,
        url: &str,
        result: Option<&mut dyn ResponseTarget>,
        injected: Vec<RequestOption>,
        options: I,
    ) -> Result<(), HttpError>
    where
        I: IntoIterator<Item = RequestOption>,
    {
        let url_option = RequestOption::url(url);
        let caller: Vec<RequestOption> = options.into_iter().collect();

        let record = apply_all(
            std::iter::once(&url_option)
                .chain(self.defaults.iter())
                .chain(injected.iter())
                .chain(caller.iter()),
        );

        tracing::trace!(method = %record.method(), hooks = record.hook_count(), "dispatching request");
        request::execute(record, result).await
    }
}

/// Verb options for requests carrying a JSON body.
///
/// With `None` params only the method is set, so no body is produced.
fn body_options(method: Method, params: Option<Params>, query: bool) -> Vec<RequestOption> {
    let mut options = vec![RequestOption::method(method)];
    let Some(params) = params else {
        return options;
    };

    options.push(RequestOption::params(params));
    options.push(RequestOption::before_request(move |record| {
        let body = serde_json::to_vec(record.params())?;
        if record.has_logger() {
            record.log(&format!(
                "{method} url {} {} {}",
                format_headers(record.headers()),
                record.url(),
                String::from_utf8_lossy(&body)
            ));
        }
        record.set_body(body);

        if query && record.delete_uri_flag() {
            rewrite_query(record)?;
            if record.has_logger() {
                record.log(&format!("{method} url {}", record.url()));
            }
        }
        Ok(())
    }));
    options
}

fn rewrite_query(record: &mut RequestConfig) -> Result<(), BoxError> {
    let url = query::with_query(record.url(), record.params())?;
    record.set_url(url);
    Ok(())
}

static DEFAULT_CLIENT: OnceLock<HttpClient> = OnceLock::new();

/// Process-wide client used by the free functions [`get`], [`post`], [`put`]
/// and [`delete`]
///
/// Built on first use with no default options.
#[must_use]
pub fn default_client() -> &'static HttpClient {
    DEFAULT_CLIENT.get_or_init(HttpClient::new)
}

/// [`HttpClient::get`] on the [`default_client`]
///
/// # Errors
///
/// See [`HttpClient::request`].
pub async fn get<I>(
    url: &str,
    result: Option<&mut dyn ResponseTarget>,
    options: I,
) -> Result<(), HttpError>
where
    I: IntoIterator<Item = RequestOption>,
{
    default_client().get(url, result, options).await
}

/// [`HttpClient::post`] on the [`default_client`]
///
/// # Errors
///
/// See [`HttpClient::request`].
pub async fn post<I>(
    url: &str,
    params: Option<Params>,
    result: Option<&mut dyn ResponseTarget>,
    options: I,
) -> Result<(), HttpError>
where
    I: IntoIterator<Item = RequestOption>,
{
    default_client().post(url, params, result, options).await
}

/// [`HttpClient::put`] on the [`default_client`]
///
/// # Errors
///
/// See [`HttpClient::request`].
pub async fn put<I>(
    url: &str,
    params: Option<Params>,
    result: Option<&mut dyn ResponseTarget>,
    options: I,
) -> Result<(), HttpError>
where
    I: IntoIterator<Item = RequestOption>,
{
    default_client().put(url, params, result, options).await
}

/// [`HttpClient::delete`] on the [`default_client`]
///
/// # Errors
///
/// See [`HttpClient::request`].
pub async fn delete<I>(
    url: &str,
    params: Option<Params>,
    result: Option<&mut dyn ResponseTarget>,
    options: I,
) -> Result<(), HttpError>
where
    I: IntoIterator<Item = RequestOption>,
{
    default_client().delete(url, params, result, options).await
}
