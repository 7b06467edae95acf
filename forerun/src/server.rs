use std::{
    convert::Infallible,
    future::{self, Future},
    io,
    net::SocketAddr,
    sync::Arc,
    time::Duration,
};

use bytes::Bytes;
use forerun_core::{
    body::read_body,
    request::{BodyLimit, LocalAddr, RemoteAddr, Request},
    response::Response,
};
use futures_util::{pin_mut, FutureExt};
use http_body_util::Full;
use hyper::{body::Incoming, service::service_fn};
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto::Builder,
};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::watch::{self, Receiver, Sender},
};
use tracing::{debug, error, info, trace};

use crate::handler::Handler;

/// Serves a single handler over HTTP/1 and HTTP/2.
///
/// Each request body is read into memory up to the body limit before the
/// handler runs; requests over the limit are answered with
/// `413 Payload Too Large` without invoking the handler.
pub struct Server {
    tcp_listener: TcpListener,
    body_limit: BodyLimit,
}

impl Server {
    pub fn new(tcp_listener: TcpListener) -> Self {
        Self {
            tcp_listener,
            body_limit: BodyLimit::default(),
        }
    }

    pub fn with_body_limit(mut self, body_limit: BodyLimit) -> Self {
        self.body_limit = body_limit;
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.tcp_listener.local_addr()
    }

    pub async fn run<H>(self, handler: H) -> io::Result<()>
    where
        H: Handler,
    {
        self.run_with_graceful_shutdown(handler, future::pending::<()>())
            .await
    }

    pub async fn run_with_graceful_shutdown<H, S>(self, handler: H, signal: S) -> io::Result<()>
    where
        H: Handler,
        S: Future<Output = ()> + Send + 'static,
    {
        let Self {
            tcp_listener,
            body_limit,
        } = self;
        let local_addr = tcp_listener.local_addr()?;
        let handler = Arc::new(handler);

        info!("listening {}", local_addr);

        let (signal_sender, signal_receiver) = {
            let (sender, receiver) = watch::channel(());
            (Arc::new(sender), receiver)
        };

        tokio::spawn(async move {
            signal.await;
            trace!("received graceful shutdown signal. Telling tasks to shutdown");
            drop(signal_receiver);
        });

        let (close_sender, close_receiver) = watch::channel(());

        loop {
            tokio::select! {
                conn = tcp_accept(&tcp_listener) => {
                    match conn {
                        Some((tcp_stream, remote_addr)) => handle_conn(
                            tcp_stream,
                            Peers {
                                local_addr: LocalAddr(local_addr),
                                remote_addr: RemoteAddr(remote_addr),
                                body_limit,
                            },
                            signal_sender.clone(),
                            close_receiver.clone(),
                            handler.clone()
                        ),
                        None => continue,
                    }
                }
                _ = signal_sender.closed() => {
                    trace!("signal received, not accepting new connections");
                    break;
                }
            }
        }

        drop(close_receiver);
        drop(tcp_listener);

        trace!(
            "waiting for {} task(s) to finish",
            close_sender.receiver_count()
        );
        close_sender.closed().await;

        Ok(())
    }
}

#[derive(Clone, Copy)]
struct Peers {
    local_addr: LocalAddr,
    remote_addr: RemoteAddr,
    body_limit: BodyLimit,
}

fn is_connection_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}

async fn tcp_accept(listener: &TcpListener) -> Option<(TcpStream, SocketAddr)> {
    match listener.accept().await {
        Ok(conn) => Some(conn),
        Err(e) => {
            if is_connection_error(&e) {
                return None;
            }

            error!("accept error: {e}");
            tokio::time::sleep(Duration::from_secs(1)).await;
            None
        }
    }
}

fn handle_conn<H: Handler + Clone>(
    tcp_stream: TcpStream,
    peers: Peers,
    signal_sender: Arc<Sender<()>>,
    close_receiver: Receiver<()>,
    handler: H,
) {
    let tcp_stream = TokioIo::new(tcp_stream);
    let remote_addr = peers.remote_addr;

    trace!("connection {remote_addr} accepted");

    tokio::spawn(async move {
        let builder = Builder::new(TokioExecutor::new());
        let conn = builder.serve_connection_with_upgrades(
            tcp_stream,
            service_fn(|request: http::Request<Incoming>| {
                let handler = handler.clone();
                async move { Ok::<_, Infallible>(dispatch(&handler, request, peers).await) }
            }),
        );
        pin_mut!(conn);

        let signal_closed = signal_sender.closed().fuse();
        pin_mut!(signal_closed);

        loop {
            tokio::select! {
                result = conn.as_mut() => {
                    if let Err(err) = result {
                        error!("failed to serve connection: {err:#}");
                    }
                    break;
                }
                _ = &mut signal_closed => {
                    trace!("signal received in task, starting graceful shutdown");
                    conn.as_mut().graceful_shutdown();
                }
            }
        }

        trace!("connection {remote_addr} closed");

        drop(close_receiver);
    });
}

async fn dispatch<H: Handler>(
    handler: &H,
    request: http::Request<Incoming>,
    peers: Peers,
) -> http::Response<Full<Bytes>> {
    let (parts, body) = request.into_parts();

    let body = match read_body(body, peers.body_limit).await {
        Ok(body) => body,
        Err(e) => {
            debug!(
                remote_addr = %peers.remote_addr,
                location = %e.location(),
                "rejecting request: {e}"
            );
            return e.into_response().into();
        }
    };

    let mut req = Request::new(
        http::Request::from_parts(parts, body),
        peers.local_addr,
        peers.remote_addr,
    );
    let mut res = Response::new();

    handler.call(&mut res, &mut req).await;

    res.into()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use http::StatusCode;
    use tokio::{
        sync::{oneshot, Notify},
        time::{sleep, timeout},
    };

    use super::*;

    #[derive(Default)]
    struct Gate {
        entered: Notify,
        release: Notify,
    }

    /// Parks every request until the gate is released.
    struct Parked(Arc<Gate>);

    #[async_trait]
    impl Handler for Parked {
        async fn call(&self, res: &mut Response, _: &mut Request) {
            self.0.entered.notify_one();
            self.0.release.notified().await;
            res.write("drained");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_graceful_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let gate = Arc::new(Gate::default());
        let (shutdown, signal) = oneshot::channel::<()>();

        let server = tokio::spawn(Server::new(listener).run_with_graceful_shutdown(
            Parked(gate.clone()),
            async move {
                let _ = signal.await;
            },
        ));

        let in_flight = tokio::spawn(async move {
            let response = reqwest::get(format!("http://{addr}/slow")).await.unwrap();
            (response.status(), response.text().await.unwrap())
        });

        gate.entered.notified().await;
        shutdown.send(()).unwrap();

        let mut refused = false;
        for _ in 0..100 {
            if TcpStream::connect(addr).await.is_err() {
                refused = true;
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        assert!(refused, "listener still accepting after shutdown");
        assert!(!server.is_finished());

        gate.release.notify_one();

        let (status, body) = in_flight.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "drained");

        timeout(Duration::from_secs(5), server)
            .await
            .expect("server did not stop")
            .unwrap()
            .unwrap();
    }
}
