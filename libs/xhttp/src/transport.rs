use crate::config::TlsConfig;
use crate::error::{BoxError, HttpError};
use crate::layers::RequestTraceLayer;
use crate::response::ResponseBody;
use crate::tls;
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tower::util::BoxCloneService;
use tower::{ServiceBuilder, ServiceExt};
use tower_http::decompression::DecompressionLayer;

/// Type-erased transport for a single request.
pub type Transport = BoxCloneService<Request<Full<Bytes>>, Response<ResponseBody>, BoxError>;

/// Build the transport used by exactly one request.
///
/// Request flow (outer → inner):
///   `RequestTrace` → Decompression → `hyper_client`
///
/// Each call gets its own hyper client, so nothing is shared between
/// concurrent requests. Redirects are not followed and nothing is retried.
///
/// # Errors
/// Returns `HttpError::Tls` if the TLS settings cannot be turned into a connector.
pub fn build(tls: &TlsConfig) -> Result<Transport, HttpError> {
    let https = tls::https_connector(tls)?;
    let hyper_client = Client::builder(TokioExecutor::new()).build::<_, Full<Bytes>>(https);

    let service = ServiceBuilder::new()
        .layer(RequestTraceLayer::new())
        .layer(DecompressionLayer::new())
        .service(hyper_client)
        .map_response(map_decompression_response)
        .map_err(box_client_error);

    Ok(service.boxed_clone())
}

fn box_client_error(err: hyper_util::client::legacy::Error) -> BoxError {
    Box::new(err)
}

/// Map the decompression response to our boxed response body type.
fn map_decompression_response<B>(response: Response<B>) -> Response<ResponseBody>
where
    B: http_body::Body<Data = Bytes> + Send + Sync + 'static,
    B::Error: Into<BoxError>,
{
    let (parts, body) = response.into_parts();
    let boxed_body: ResponseBody = body.map_err(Into::into).boxed();
    Response::from_parts(parts, boxed_body)
}
