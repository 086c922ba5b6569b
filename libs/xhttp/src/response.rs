use crate::error::{BoxError, DecodeError, HttpError};
use bytes::Bytes;
use http::{HeaderMap, StatusCode, Version};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::any::Any;
use std::sync::Arc;

/// Type alias for the boxed response body that supports decompression.
///
/// The body is type-erased so the decompression layer works transparently.
pub type ResponseBody = http_body_util::combinators::BoxBody<Bytes, BoxError>;

/// Snapshot of a response taken by [`ResponseCapture`]
///
/// The body is fully buffered, so it can be read any number of times.
#[derive(Debug, Clone)]
pub struct CapturedResponse {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
}

impl CapturedResponse {
    /// Get the response status code
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }

    /// Get the response headers
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Buffered response body
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Response body as UTF-8 text, replacing invalid sequences
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse the buffered body as JSON
    ///
    /// # Errors
    /// Returns `serde_json::Error` if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Caller-owned slot receiving the response of a request
///
/// Clones share the same slot: keep one handle, pass another to
/// [`RequestOption::response`](crate::RequestOption::response), and read the
/// snapshot once the request returns.
///
/// # Example
///
/// ```ignore
/// let capture = ResponseCapture::new();
/// client
///     .get(url, None, [RequestOption::response(capture.clone())])
///     .await?;
/// let status = capture.get().unwrap().status();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResponseCapture {
    slot: Arc<Mutex<Option<CapturedResponse>>>,
}

impl ResponseCapture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone of the captured response, if a request has filled the slot
    #[must_use]
    pub fn get(&self) -> Option<CapturedResponse> {
        self.slot.lock().clone()
    }

    /// Take the captured response out of the slot
    #[must_use]
    pub fn take(&self) -> Option<CapturedResponse> {
        self.slot.lock().take()
    }

    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Record status, version and headers with an empty body.
    pub(crate) fn store_head(&self, parts: &http::response::Parts) {
        *self.slot.lock() = Some(CapturedResponse {
            status: parts.status,
            version: parts.version,
            headers: parts.headers.clone(),
            body: Bytes::new(),
        });
    }

    /// Attach the fully read body to the stored head.
    pub(crate) fn fill_body(&self, body: Bytes) {
        if let Some(captured) = self.slot.lock().as_mut() {
            captured.body = body;
        }
    }
}

/// Destination for a decoded response body
///
/// Implemented for every `T: DeserializeOwned + Send + 'static`. JSON bodies are
/// deserialized into the target; non-JSON bodies are accepted only by
/// `String` and `Option<String>` targets.
pub trait ResponseTarget: Send {
    /// Replace the target with the JSON document in `body`
    ///
    /// # Errors
    /// Returns `DecodeError::Json` if the document does not fit the target.
    fn decode_json(&mut self, body: &[u8]) -> Result<(), DecodeError>;

    /// Store a non-JSON body as raw text
    ///
    /// # Errors
    /// Returns `DecodeError::NotString` when the target is not string-like.
    fn assign_text(&mut self, text: String) -> Result<(), DecodeError>;
}

impl<T> ResponseTarget for T
where
    T: DeserializeOwned + Send + 'static,
{
    fn decode_json(&mut self, body: &[u8]) -> Result<(), DecodeError> {
        *self = serde_json::from_slice(body)?;
        Ok(())
    }

    fn assign_text(&mut self, text: String) -> Result<(), DecodeError> {
        let target: &mut dyn Any = self;
        if let Some(s) = target.downcast_mut::<String>() {
            *s = text;
            return Ok(());
        }
        if let Some(s) = target.downcast_mut::<Option<String>>() {
            *s = Some(text);
            return Ok(());
        }
        Err(DecodeError::NotString)
    }
}

/// Decode a non-empty body into `target`.
///
/// Syntactically valid JSON goes through [`ResponseTarget::decode_json`];
/// anything else is handed over as text.
pub fn decode_into(body: &[u8], target: &mut dyn ResponseTarget) -> Result<(), HttpError> {
    if is_valid_json(body) {
        target.decode_json(body)?;
    } else {
        target.assign_text(String::from_utf8_lossy(body).into_owned())?;
    }
    Ok(())
}

fn is_valid_json(body: &[u8]) -> bool {
    serde_json::from_slice::<serde::de::IgnoredAny>(body).is_ok()
}

/// Response body owned by the executor for the duration of one request
///
/// Tracks whether the stream has ended (or failed) so that closing never
/// polls a finished body again.
pub struct ResponseStream {
    body: ResponseBody,
    finished: bool,
}

impl ResponseStream {
    pub(crate) fn new(body: ResponseBody) -> Self {
        Self {
            body,
            finished: false,
        }
    }

    async fn next_chunk(&mut self) -> Option<Result<Bytes, BoxError>> {
        while !self.finished {
            match self.body.frame().await {
                Some(Ok(frame)) => {
                    if let Ok(chunk) = frame.into_data() {
                        return Some(Ok(chunk));
                    }
                }
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e));
                }
                None => self.finished = true,
            }
        }
        None
    }

    /// Read the whole body into memory.
    pub(crate) async fn read_all(&mut self) -> Result<Bytes, HttpError> {
        let mut collected = Vec::new();
        while let Some(chunk) = self.next_chunk().await {
            collected.extend_from_slice(&chunk.map_err(HttpError::BodyRead)?);
        }
        Ok(Bytes::from(collected))
    }

    /// Read and discard the body so the connection can be reused.
    pub(crate) async fn drain(&mut self) -> Result<(), HttpError> {
        while let Some(chunk) = self.next_chunk().await {
            chunk.map_err(HttpError::BodyRead)?;
        }
        Ok(())
    }

    /// Finish the stream, consuming whatever is left of an unread body.
    pub(crate) async fn close(mut self) -> Result<(), BoxError> {
        if self.finished || http_body::Body::is_end_stream(&self.body) {
            return Ok(());
        }
        while let Some(chunk) = self.next_chunk().await {
            chunk?;
        }
        Ok(())
    }
}
