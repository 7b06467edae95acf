use std::time::Instant;

use async_trait::async_trait;
use forerun_core::{request::Request, response::Response};
use tracing::Instrument;

use super::Middleware;
use crate::handler::Handler;

#[derive(Clone, Copy)]
pub struct Tracing;

impl<H: Handler> Middleware<H> for Tracing {
    type Output = TracingHandler<H>;

    fn transform(self, input: H) -> Self::Output {
        TracingHandler { inner: input }
    }
}

pub struct TracingHandler<H> {
    inner: H,
}

#[async_trait]
impl<H: Handler> Handler for TracingHandler<H> {
    async fn call(&self, res: &mut Response, req: &mut Request) {
        let head = &req.head;

        let span = ::tracing::info_span!(
            target: module_path!(),
            "request",
            remote_addr = %head.remote_addr(),
            version = ?head.version,
            method = %head.method,
            uri = %head.original_uri(),
        );

        async move {
            let now = Instant::now();
            self.inner.call(res, req).await;
            let duration = now.elapsed();

            ::tracing::info!(
                status = %res.status(),
                bytes = res.body().len(),
                duration = ?duration,
                "response"
            );
        }
        .instrument(span)
        .await
    }
}
