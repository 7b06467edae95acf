use std::net::SocketAddr;

use forerun_core::request::BodyLimit;
use reqwest::{redirect::Policy, Client, RequestBuilder};
use tokio::net::TcpListener;

use crate::{handler::Handler, server::Server};

macro_rules! impl_request_methods {
    ($($name:ident),+ $(,)?) => {
        $(
            pub fn $name(&self, url: &str) -> RequestBuilder {
                self.client.$name(format!("http://{}{}", self.addr, url))
            }
        )+
    };
}

/// Serves a handler on an ephemeral local port for the lifetime of the test.
pub struct TestClient {
    client: Client,
    addr: SocketAddr,
}

impl TestClient {
    impl_request_methods![get, post, put, delete, head, patch];

    pub async fn new<H: Handler>(handler: H) -> Self {
        Self::with_body_limit(handler, BodyLimit::default()).await
    }

    pub async fn with_body_limit<H: Handler>(handler: H, body_limit: BodyLimit) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tracing::info!("listening on {}", addr);

        tokio::spawn(async move {
            Server::new(listener)
                .with_body_limit(body_limit)
                .run(handler)
                .await
                .unwrap();
        });

        let client = Client::builder().redirect(Policy::none()).build().unwrap();

        Self { client, addr }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

#[cfg(test)]
mod tests {
    use http::{HeaderValue, StatusCode};

    use super::*;
    use crate::{
        group::Group,
        handler::{handler_fn, HandlerExt},
        middleware::Tracing,
    };

    #[tokio::test]
    async fn test_serve_group() {
        let group = Group::new("api");

        group.append((
            handler_fn(|res, req| {
                let remote = req.head.remote_addr().ip().to_string();
                res.headers_mut()
                    .insert("x-remote-ip", HeaderValue::from_str(&remote).unwrap());
            }),
            handler_fn(|res, req| {
                if req.headers().get("authorization").is_none() {
                    res.write_status(StatusCode::UNAUTHORIZED);
                }
            }),
        ));

        let handler = group
            .and(handler_fn(|res, req| {
                res.write_status(StatusCode::OK);
                res.write(req.body.clone());
            }))
            .with(Tracing);

        let client = TestClient::new(handler).await;

        let response = client
            .post("/echo")
            .header("authorization", "Bearer token")
            .body("ping")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-remote-ip"], "127.0.0.1");
        assert_eq!(response.text().await.unwrap(), "ping");

        let response = client.get("/echo").send().await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_body_limit() {
        let handler = handler_fn(|res, _| res.write("accepted"));
        let client = TestClient::with_body_limit(handler, BodyLimit(4)).await;

        let response = client.post("/").body("too long").send().await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let response = client.post("/").body("ok").send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), "accepted");
    }
}
