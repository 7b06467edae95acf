use bytes::Bytes;
use http::{header::CONTENT_TYPE, HeaderValue, StatusCode};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use mime::TEXT_PLAIN_UTF_8;
use snafu::{IntoError, Location, Snafu};

use crate::{error::BoxError, request::BodyLimit, response::Response};

/// Collects `body` into memory, failing once more than `limit` bytes arrive.
pub async fn read_body<B>(body: B, limit: BodyLimit) -> Result<Bytes, ReadBodyError>
where
    B: http_body::Body,
    B::Error: Into<BoxError>,
{
    let BodyLimit(limit) = limit;

    let collected = Limited::new(body, limit)
        .collect()
        .await
        .map_err(|e| {
            if e.is::<LengthLimitError>() {
                TooLargeSnafu { limit }.build()
            } else {
                ReadSnafu.into_error(e)
            }
        })?;

    Ok(collected.to_bytes())
}

#[derive(Debug, Snafu)]
pub enum ReadBodyError {
    #[snafu(display("request body is larger than the limit of {limit} bytes"))]
    TooLarge {
        limit: usize,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to read request body"))]
    Read {
        source: BoxError,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ReadBodyError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Read { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn location(&self) -> Location {
        match self {
            Self::TooLarge { location, .. } | Self::Read { location, .. } => *location,
        }
    }

    pub fn into_response(self) -> Response {
        let mut response = Response::new();

        response.write_status(self.status());
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static(TEXT_PLAIN_UTF_8.as_ref()),
        );
        response.write(self.to_string());

        response
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        pin::Pin,
        task::{Context, Poll},
    };

    use http_body::{Body, Frame};
    use http_body_util::Full;

    use super::*;

    /// A body whose peer goes away before sending anything.
    struct Reset;

    impl Body for Reset {
        type Data = Bytes;
        type Error = io::Error;

        fn poll_frame(
            self: Pin<&mut Self>,
            _: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
            Poll::Ready(Some(Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset",
            ))))
        }
    }

    #[tokio::test]
    async fn test_read_within_limit() {
        let body = Full::new(Bytes::from_static(b"hello"));
        let bytes = read_body(body, BodyLimit(5)).await.unwrap();

        assert_eq!(bytes, Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_read_over_limit() {
        let body = Full::new(Bytes::from_static(b"hello, world"));
        let err = read_body(body, BodyLimit(5)).await.unwrap_err();

        assert!(matches!(err, ReadBodyError::TooLarge { limit: 5, .. }));
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let res = err.into_response();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(res.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(
            res.body(),
            b"request body is larger than the limit of 5 bytes"
        );
    }

    #[tokio::test]
    async fn test_read_failure() {
        let err = read_body(Reset, BodyLimit(1024)).await.unwrap_err();

        let ReadBodyError::Read { source, .. } = &err else {
            panic!("expected a read error, got {err:?}");
        };
        assert_eq!(source.to_string(), "connection reset");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let res = err.into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(res.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(res.body(), b"failed to read request body");
    }
}
