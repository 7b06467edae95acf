use std::{io, net::SocketAddr};

use config::ConfigError;
use snafu::{Location, ResultExt, Snafu};
use tokio::{net::TcpListener, signal};

use crate::{
    config::{logger::LoggerConfig, server::ServerConfig, Config},
    environment::Environment,
    handler::Handler,
    server::Server,
};

pub trait Hooks {
    fn load_config(env: &Environment) -> Result<Config, ConfigError> {
        Config::load(env)
    }

    fn init_logger(config: &Config) -> Result<(), ConfigError> {
        let cfg = config.get::<LoggerConfig>()?;

        // a subscriber installed by the host wins
        let _ = tracing_subscriber::fmt()
            .with_max_level(cfg.level)
            .with_ansi(cfg.ansi)
            .try_init();

        Ok(())
    }

    /// Builds the handler to serve, typically groups bound to their main
    /// handlers and configured from the `groups` section.
    fn create_handler(config: Config) -> Result<impl Handler, ConfigError>;

    #[allow(async_fn_in_trait)]
    async fn start_server<H: Handler>(config: &Config, handler: H) -> Result<(), AppError> {
        let cfg = config.get::<ServerConfig>().context(LoadConfigSnafu)?;

        let addr = SocketAddr::new(cfg.ip, cfg.port);

        let listener = TcpListener::bind(addr).await.context(BindSnafu { addr })?;

        Server::new(listener)
            .with_body_limit(cfg.body_limit())
            .run_with_graceful_shutdown(handler, async {
                let _ = signal::ctrl_c().await;
            })
            .await
            .context(ServeSnafu)
    }
}

pub async fn run_app<H: Hooks>() -> Result<(), AppError> {
    let env = Environment::resolve_from_env();

    let config = H::load_config(&env).context(LoadConfigSnafu)?;

    H::init_logger(&config).context(LoadConfigSnafu)?;

    tracing::info!("starting in `{}` environment", env);

    let handler = H::create_handler(config.clone()).context(LoadConfigSnafu)?;

    H::start_server(&config, handler).await
}

#[derive(Debug, Snafu)]
pub enum AppError {
    #[snafu(display("failed to load configuration"))]
    LoadConfig {
        source: ConfigError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to bind `{addr}`"))]
    Bind {
        addr: SocketAddr,
        source: io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("server stopped with an error"))]
    Serve {
        source: io::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::config_from_toml, handler::handler_fn};

    struct Demo;

    impl Hooks for Demo {
        fn create_handler(_: Config) -> Result<impl Handler, ConfigError> {
            Ok(handler_fn(|res, _| res.write("hi")))
        }
    }

    #[test]
    fn test_init_logger() {
        assert!(Demo::init_logger(&config_from_toml("")).is_ok());

        let invalid = config_from_toml(
            r#"
            [logger]
            level = "loud"
            "#,
        );
        assert!(Demo::init_logger(&invalid).is_err());
    }

    #[tokio::test]
    async fn test_bind_error() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        let config = config_from_toml(&format!(
            r#"
            [server]
            ip = "127.0.0.1"
            port = {port}
            "#
        ));

        let handler = Demo::create_handler(config.clone()).unwrap();
        let err = Demo::start_server(&config, handler).await.unwrap_err();

        assert!(matches!(err, AppError::Bind { .. }));
        assert_eq!(err.to_string(), format!("failed to bind `127.0.0.1:{port}`"));
    }
}
