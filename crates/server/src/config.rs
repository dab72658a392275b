// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The `config.server` and `config.security` sections of a pipeline
//! document.

use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::Error;

const MIN_FREQUENCY: Duration = Duration::from_secs(1);

/// Listener address and refresh cadence.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind host; default `127.0.0.1`.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port; default 8080.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Pipeline refresh cadence: a humantime string (`5m`, `90s`) or an
    /// integer number of seconds. Default 5 minutes, floored at 1 second.
    #[serde(default = "default_frequency", deserialize_with = "frequency")]
    pub frequency: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            frequency: default_frequency(),
        }
    }
}

/// Request-admission knobs.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SecurityConfig {
    /// Evaluate-endpoint budget in requests per second; 0 disables the
    /// limit.
    #[serde(default)]
    pub rate_limit_rps: u32,
}

/// The server-relevant slice of the pipeline document's `config` block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Settings {
    /// The `config.server` section, or its defaults.
    pub server: ServerConfig,
    /// The `config.security` section, or its defaults.
    pub security: SecurityConfig,
}

impl Settings {
    /// Extracts settings from a pipeline's raw `config` value.
    pub fn from_config(config: &serde_yaml::Value) -> Result<Self, Error> {
        let server = match config.get("server") {
            Some(section) => ServerConfig::deserialize(section.clone())
                .map_err(|e| Error::Config(format!("invalid server config: {e}")))?,
            None => ServerConfig::default(),
        };
        let security = match config.get("security") {
            Some(section) => SecurityConfig::deserialize(section.clone())
                .map_err(|e| Error::Config(format!("invalid security config: {e}")))?,
            None => SecurityConfig::default(),
        };

        let mut settings = Self { server, security };
        if settings.server.frequency < MIN_FREQUENCY {
            settings.server.frequency = MIN_FREQUENCY;
        }
        Ok(settings)
    }

    /// Resolves the configured host and port to a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, Error> {
        let authority = format!("{}:{}", self.server.host, self.server.port);
        authority
            .to_socket_addrs()
            .map_err(|e| Error::Config(format!("cannot resolve {authority}: {e}")))?
            .next()
            .ok_or_else(|| Error::Config(format!("{authority} resolves to no address")))
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_frequency() -> Duration {
    Duration::from_secs(5 * 60)
}

fn frequency<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Seconds(seconds) => Ok(Duration::from_secs(seconds)),
        Raw::Text(text) => humantime::parse_duration(&text).map_err(serde::de::Error::custom),
    }
}
