use std::net::{IpAddr, Ipv4Addr};

use forerun_core::request::{BodyLimit, DEFAULT_BODY_LIMIT};
use serde::{Deserialize, Serialize};

use super::ConfigPrefix;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_ip")]
    pub ip: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_body_limit")]
    pub request_body_limit: usize,
}

impl ServerConfig {
    pub fn body_limit(&self) -> BodyLimit {
        BodyLimit(self.request_body_limit)
    }
}

const fn default_ip() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
}

const fn default_port() -> u16 {
    9612
}

const fn default_request_body_limit() -> usize {
    DEFAULT_BODY_LIMIT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: default_ip(),
            port: default_port(),
            request_body_limit: default_request_body_limit(),
        }
    }
}

impl ConfigPrefix for ServerConfig {
    const PREFIX: &'static str = "server";
}
