use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use async_trait::async_trait;
use forerun::{
    app::{run_app, Hooks},
    config::{group::GroupsConfig, Config, ConfigError},
    group::Group,
    handler::{handler_fn, Handler, HandlerExt},
    middleware::Tracing,
    request::Request,
    response::Response,
};
use http::{HeaderValue, Method, StatusCode};

struct App;

impl Hooks for App {
    fn create_handler(config: Config) -> Result<impl Handler, ConfigError> {
        let groups = config.get::<GroupsConfig>()?;

        let basic = Arc::new(Group::new("basic"));
        basic.append((handler_fn(request_id), handler_fn(server_header)));
        basic.apply_config(&groups);

        // copies the units `basic` has now; later changes to `basic` stay out
        let authed = Group::new("authed");
        authed.append((handler_fn(check_token),));
        authed.extend(&basic);
        authed.apply_config(&groups);

        Ok(Routes {
            hello: basic.and(handler_fn(hello)),
            secret: authed.and(handler_fn(secret)),
            maintenance: Maintenance {
                group: basic,
                enabled: AtomicBool::new(false),
            },
        }
        .with(Tracing))
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run_app::<App>().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

struct Routes<A, B> {
    hello: A,
    secret: B,
    maintenance: Maintenance,
}

#[async_trait]
impl<A: Handler, B: Handler> Handler for Routes<A, B> {
    async fn call(&self, res: &mut Response, req: &mut Request) {
        match req.head.uri.path() {
            "/" | "/hello" => self.hello.call(res, req).await,
            "/secret" => self.secret.call(res, req).await,
            "/admin/maintenance" => self.maintenance.call(res, req).await,
            _ => {
                res.write_status(StatusCode::NOT_FOUND);
            }
        }
    }
}

/// `POST /admin/maintenance` puts every route served by the live group into
/// maintenance. Handlers composed from the group pick the new unit up on their
/// next request.
struct Maintenance {
    group: Arc<Group>,
    enabled: AtomicBool,
}

#[async_trait]
impl Handler for Maintenance {
    async fn call(&self, res: &mut Response, req: &mut Request) {
        if req.head.method != Method::POST {
            res.write_status(StatusCode::METHOD_NOT_ALLOWED);
            return;
        }

        if self.enabled.swap(true, Ordering::AcqRel) {
            res.write("maintenance already enabled");
            return;
        }

        self.group.prepend((handler_fn(under_maintenance),));

        tracing::warn!(group = self.group.name(), "maintenance enabled");
        res.write(format!("maintenance enabled for `{}`", self.group.name()));
    }
}

#[derive(Debug, Clone, Copy)]
struct RequestId(u64);

#[derive(Debug, Clone, Copy)]
struct Unauthorized;

fn under_maintenance(res: &mut Response, _: &mut Request) {
    res.write_status(StatusCode::SERVICE_UNAVAILABLE);
    res.headers_mut()
        .insert("retry-after", HeaderValue::from_static("120"));
}

fn request_id(res: &mut Response, req: &mut Request) {
    static NEXT: AtomicU64 = AtomicU64::new(1);

    let id = NEXT.fetch_add(1, Ordering::Relaxed);

    req.extensions_mut().insert(RequestId(id));
    res.headers_mut().insert("x-request-id", HeaderValue::from(id));
}

fn server_header(res: &mut Response, _: &mut Request) {
    res.headers_mut()
        .insert("server", HeaderValue::from_static("forerun"));
}

fn check_token(res: &mut Response, req: &mut Request) {
    let authorized = req
        .headers()
        .get("authorization")
        .is_some_and(|v| v.as_bytes() == b"Bearer hunter2");

    if !authorized {
        req.extensions_mut().insert(Unauthorized);
        res.write_status(StatusCode::UNAUTHORIZED);
    }
}

fn hello(res: &mut Response, req: &mut Request) {
    if res.status_written() && res.status() == StatusCode::SERVICE_UNAVAILABLE {
        res.write("down for maintenance");
        return;
    }

    let id = req.extensions().get::<RequestId>().map_or(0, |id| id.0);
    res.write(format!("hello, request #{id}"));
}

fn secret(res: &mut Response, req: &mut Request) {
    if req.extensions().get::<Unauthorized>().is_some() {
        res.write("unauthorized");
        return;
    }

    res.write("the secret is forerun");
}
