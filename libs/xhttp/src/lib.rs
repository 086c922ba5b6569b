#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Configurable HTTP client facade
//!
//! This crate sends GET/POST/PUT/DELETE requests through a small pipeline:
//! - Functional options ([`RequestOption`]) build a per-request [`RequestConfig`]
//! - Before-request hooks finalize the URL and body right before dispatch
//! - A per-call hyper client sends the request (TLS via rustls, plain HTTP allowed)
//! - The response body is decoded into a caller-supplied target: JSON is
//!   deserialized, anything else is stored as text in string targets
//!
//! # Verb behavior
//!
//! - `get` sends the parameters as the URL query string
//! - `post` and `put` send the parameters as a JSON body (no body for `None`)
//! - `delete` sends a JSON body and, unless disabled with
//!   [`RequestOption::delete_uri_flag`], the query string as well
//!
//! HTTP error statuses are not errors: a 404 with a JSON body decodes like a 200.
//!
//! # Transparent Decompression
//!
//! Requests advertise `Accept-Encoding: gzip, br, deflate` and compressed
//! responses are decoded before they reach the target. No configuration is
//! required.
//!
//! # Example
//!
//! ```ignore
//! use xhttp::{HttpClient, Params, RequestOption};
//!
//! let client = HttpClient::builder().timeout_secs(10).build();
//!
//! let mut user = serde_json::Value::Null;
//! client
//!     .get(
//!         "https://example.com/api/users",
//!         Some(&mut user),
//!         [RequestOption::params(Params::from([("id".to_owned(), 7.into())]))],
//!     )
//!     .await?;
//!
//! // Or through the process-wide client
//! xhttp::post("https://example.com/api/users", Some(Params::new()), None, []).await?;
//! ```

mod builder;
mod client;
mod config;
mod error;
mod layers;
mod logger;
mod option;
mod query;
mod request;
mod response;
mod tls;
mod transport;

pub use builder::HttpClientBuilder;
pub use client::{HttpClient, default_client, delete, get, post, put};
pub use config::{DEFAULT_HEADERS, DEFAULT_TIMEOUT, Headers, Method, Params, RequestConfig, TlsConfig};
pub use error::{BoxError, DecodeError, ErrorKind, HttpError, InvalidUriKind};
pub use layers::{RequestTraceLayer, RequestTraceService};
pub use logger::{RequestLogger, TracingLogger};
pub use option::{BeforeRequestHook, RequestOption};
pub use query::{encode_params, query_value, with_query};
pub use response::{CapturedResponse, ResponseBody, ResponseCapture, ResponseTarget};
pub use tls::native_client_config;
