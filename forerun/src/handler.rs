use std::sync::Arc;

use async_trait::async_trait;
use forerun_core::{request::Request, response::Response};

use crate::middleware::Middleware;

/// Something invocable with a response sink and a request descriptor.
///
/// Units of a [`Group`](crate::group::Group), main handlers and composed
/// handlers all share this capability.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn call(&self, res: &mut Response, req: &mut Request);
}

#[async_trait]
impl<T: Handler + ?Sized> Handler for Arc<T> {
    async fn call(&self, res: &mut Response, req: &mut Request) {
        self.as_ref().call(res, req).await
    }
}

#[async_trait]
impl<T: Handler + ?Sized> Handler for Box<T> {
    async fn call(&self, res: &mut Response, req: &mut Request) {
        self.as_ref().call(res, req).await
    }
}

pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&mut Response, &mut Request) + Send + Sync + 'static,
{
    HandlerFn(f)
}

pub struct HandlerFn<F>(F);

#[async_trait]
impl<F> Handler for HandlerFn<F>
where
    F: Fn(&mut Response, &mut Request) + Send + Sync + 'static,
{
    async fn call(&self, res: &mut Response, req: &mut Request) {
        (self.0)(res, req)
    }
}

pub trait HandlerExt: Handler + Sized {
    fn with<M>(self, middleware: M) -> M::Output
    where
        M: Middleware<Self>,
    {
        middleware.transform(self)
    }
}

impl<T: Handler> HandlerExt for T {}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::StatusCode;

    use super::*;

    #[tokio::test]
    async fn test_handler_fn() {
        let handler = handler_fn(|res, req| {
            let path = req.head.uri.path().to_owned();
            res.write_status(StatusCode::ACCEPTED);
            res.write(path);
        });

        let mut req = Request::from(
            http::Request::builder()
                .uri("/hello")
                .body(Bytes::new())
                .unwrap(),
        );
        let mut res = Response::new();

        handler.call(&mut res, &mut req).await;

        assert_eq!(res.status(), StatusCode::ACCEPTED);
        assert_eq!(res.body(), b"/hello");
    }

    #[tokio::test]
    async fn test_shared_handler() {
        let handler: Arc<dyn Handler> = Arc::new(handler_fn(|res, _| res.write("shared")));
        let boxed: Box<dyn Handler> = Box::new(handler.clone());

        let mut req = Request::from(http::Request::new(Bytes::new()));
        let mut res = Response::new();

        handler.call(&mut res, &mut req).await;
        boxed.call(&mut res, &mut req).await;

        assert_eq!(res.body(), b"sharedshared");
    }
}
