use crate::config::RequestConfig;
use crate::error::{HttpError, InvalidUriKind};
use crate::response::{ResponseCapture, ResponseStream, ResponseTarget, decode_into};
use crate::transport::{self, Transport};
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::response::Parts;
use http::{Request, Response};
use http_body_util::Full;
use tower::ServiceExt;

/// Run one request pipeline for an already assembled record.
///
/// Hooks run first and may still rewrite the URL and body. Everything after
/// dispatch is bounded by the record's timeout and its cancellation token.
pub async fn execute(
    mut record: RequestConfig,
    result: Option<&mut dyn ResponseTarget>,
) -> Result<(), HttpError> {
    run_hooks(&mut record)?;

    let request = build_request(&record)?;
    let transport = transport::build(&record.tls)?;

    let timeout = record.timeout;
    let cancellation = record.cancellation.clone();

    let bounded = async {
        tokio::time::timeout(timeout, round_trip(transport, request, &record, result))
            .await
            .unwrap_or(Err(HttpError::Timeout(timeout)))
    };

    match cancellation {
        Some(token) => {
            tokio::select! {
                biased;
                () = token.cancelled() => Err(HttpError::Cancelled),
                outcome = bounded => outcome,
            }
        }
        None => bounded.await,
    }
}

/// Run every registered hook in order, stopping at the first failure.
fn run_hooks(record: &mut RequestConfig) -> Result<(), HttpError> {
    // Hooks get mutable access to the record, including its hook list
    let hooks = record.before_request.clone();
    for hook in &hooks {
        hook.run(record).map_err(|source| HttpError::Hook {
            url: record.url.clone(),
            source,
        })?;
    }
    Ok(())
}

/// Parse the record URL, allowing only absolute `http://` and `https://` URLs.
fn validate_url(url: &str) -> Result<http::Uri, HttpError> {
    let uri: http::Uri = url
        .parse()
        .map_err(|e: http::uri::InvalidUri| HttpError::InvalidUri {
            url: url.to_owned(),
            kind: InvalidUriKind::ParseError,
            reason: e.to_string(),
        })?;

    if uri.authority().is_none() {
        return Err(HttpError::InvalidUri {
            url: url.to_owned(),
            kind: InvalidUriKind::MissingAuthority,
            reason: "missing host/authority".to_owned(),
        });
    }

    match uri.scheme_str() {
        Some("http" | "https") => Ok(uri),
        Some(scheme) => Err(HttpError::InvalidScheme {
            scheme: scheme.to_owned(),
        }),
        None => Err(HttpError::InvalidUri {
            url: url.to_owned(),
            kind: InvalidUriKind::MissingScheme,
            reason: "missing scheme".to_owned(),
        }),
    }
}

fn build_request(record: &RequestConfig) -> Result<Request<Full<Bytes>>, HttpError> {
    let uri = validate_url(&record.url)?;
    let method = http::Method::from(record.method);

    let mut request = Request::builder()
        .method(method.clone())
        .uri(uri)
        .body(Full::new(record.body.clone().unwrap_or_default()))
        .map_err(|source| HttpError::RequestBuild {
            method,
            url: record.url.clone(),
            source,
        })?;

    let headers = request.headers_mut();
    for (name, value) in &record.headers {
        let header_name =
            HeaderName::try_from(name.as_str()).map_err(|source| HttpError::InvalidHeaderName {
                name: name.clone(),
                source,
            })?;
        let header_value =
            HeaderValue::try_from(value.as_str()).map_err(|source| HttpError::InvalidHeaderValue {
                name: name.clone(),
                source,
            })?;
        headers.insert(header_name, header_value);
    }

    Ok(request)
}

/// Send the request, consume the response and finish the body stream.
async fn round_trip(
    transport: Transport,
    request: Request<Full<Bytes>>,
    record: &RequestConfig,
    result: Option<&mut dyn ResponseTarget>,
) -> Result<(), HttpError> {
    let response = transport
        .oneshot(request)
        .await
        .map_err(|source| HttpError::Transport {
            url: record.url.clone(),
            source,
        })?;

    let (parts, body) = Response::into_parts(response);
    let mut stream = ResponseStream::new(body);

    let outcome = consume(&parts, &mut stream, record.response.as_ref(), result).await;
    let closed = stream.close().await;
    HttpError::with_close(outcome, closed)
}

async fn consume(
    parts: &Parts,
    stream: &mut ResponseStream,
    capture: Option<&ResponseCapture>,
    result: Option<&mut dyn ResponseTarget>,
) -> Result<(), HttpError> {
    let mut buffered = None;
    if let Some(capture) = capture {
        capture.store_head(parts);
        let body = stream.read_all().await?;
        capture.fill_body(body.clone());
        buffered = Some(body);
    }

    let Some(target) = result else {
        if buffered.is_none() {
            stream.drain().await?;
        }
        return Ok(());
    };

    let body = match buffered {
        Some(body) => body,
        None => stream.read_all().await?,
    };
    if body.is_empty() {
        return Ok(());
    }

    decode_into(&body, target)
}
