use http::{Request, Response};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::Instrument;

/// Tower layer that wraps each outbound request in a `tracing` span
///
/// The span carries:
/// - `http.method`: The HTTP method
/// - `http.url`: scheme, authority and path (query string stripped)
/// - `http.status_code`: recorded once the response head arrives
///
/// A debug event is emitted when the response head arrives or the transport fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestTraceLayer;

impl RequestTraceLayer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RequestTraceLayer {
    type Service = RequestTraceService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestTraceService { inner }
    }
}

/// Service that instruments requests with a `tracing` span
#[derive(Clone, Debug)]
pub struct RequestTraceService<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RequestTraceService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: std::fmt::Display + Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let method = req.method().clone();
        let uri = req.uri();

        // Query strings may carry credentials; keep them out of traces
        let url_str = format!(
            "{}://{}{}",
            uri.scheme_str().unwrap_or("http"),
            uri.authority().map_or("", http::uri::Authority::as_str),
            uri.path()
        );

        // Swap so we call the instance that was poll_ready'd, leaving a fresh clone
        // for the next poll_ready cycle. This satisfies the Tower Service contract.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let span = tracing::debug_span!(
                "xhttp_request",
                http.method = %method,
                http.url = %url_str,
                http.status_code = tracing::field::Empty,
            );

            let result = inner.call(req).instrument(span.clone()).await;

            match &result {
                Ok(response) => {
                    span.record("http.status_code", response.status().as_u16());
                    tracing::debug!(parent: &span, status = %response.status(), "response received");
                }
                Err(err) => {
                    tracing::debug!(parent: &span, error = %err, "transport failed");
                }
            }

            result
        })
    }
}
