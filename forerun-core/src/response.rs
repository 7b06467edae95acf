use bytes::{Bytes, BytesMut};
use http::{Extensions, HeaderMap, HeaderValue, StatusCode};
use http_body_util::Full;

/// The response sink shared by every unit of a chain and its main handler.
///
/// Writes accumulate: the first status written wins, body chunks are
/// concatenated in the order they were written.
#[derive(Debug, Default)]
pub struct Response {
    status: Option<StatusCode>,
    headers: HeaderMap<HeaderValue>,
    extensions: Extensions,
    body: BytesMut,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commits `status` unless a status was already written.
    ///
    /// Returns `false` when the call had no effect.
    pub fn write_status(&mut self, status: StatusCode) -> bool {
        if self.status.is_some() {
            return false;
        }

        self.status = Some(status);
        true
    }

    /// Appends `data` to the body, committing `200 OK` first if no status was
    /// written yet.
    pub fn write<T: AsRef<[u8]>>(&mut self, data: T) {
        self.write_status(StatusCode::OK);
        self.body.extend_from_slice(data.as_ref());
    }

    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn status_written(&self) -> bool {
        self.status.is_some()
    }

    pub fn headers(&self) -> &HeaderMap<HeaderValue> {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap<HeaderValue> {
        &mut self.headers
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl From<Response> for http::Response<Full<Bytes>> {
    fn from(response: Response) -> Self {
        let Response {
            status,
            headers,
            extensions,
            body,
        } = response;

        let mut res = http::Response::new(Full::new(body.freeze()));

        *res.status_mut() = status.unwrap_or(StatusCode::OK);
        *res.headers_mut() = headers;
        *res.extensions_mut() = extensions;

        res
    }
}
