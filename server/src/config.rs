//! Server configuration
//!
//! Layers, lowest precedence first: built-in defaults, an optional TOML file,
//! then `HELLO_*` environment variables (`__` separates nested keys, e.g.
//! `HELLO_GREETER__MAX_REPLIES=10`). Command-line flags are applied on top by
//! the binary.

use crate::error::HelloError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

pub const ENV_PREFIX: &str = "HELLO";

/// Highest accepted `greeter.max_replies`
pub const MAX_REPLIES_LIMIT: u32 = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address for gRPC server
    pub listen_addr: String,

    /// Admin HTTP listen address (health checks, metrics, service map). Disabled when unset.
    pub admin_addr: Option<String>,

    /// Max gRPC message size in bytes
    pub max_message_size: usize,

    /// Optional bearer token for gRPC authentication
    pub auth_token: Option<String>,

    pub greeter: GreeterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GreeterConfig {
    /// Greeting text; every `{name}` is replaced with the caller's name
    pub template: String,

    /// Replies streamed by LotsOfReplies when the request does not set `maybe_int`
    pub default_replies: u32,

    /// Upper bound on replies per LotsOfReplies call
    pub max_replies: u32,

    /// Pause between streamed replies
    pub reply_interval_ms: u64,

    /// Max requests a single LotsOfGreetings call may send
    pub max_collected: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:50051".to_string(),
            admin_addr: None,
            max_message_size: 4 * 1024 * 1024,
            auth_token: None,
            greeter: GreeterConfig::default(),
        }
    }
}

impl Default for GreeterConfig {
    fn default() -> Self {
        Self {
            template: "Hello, {name}!".to_string(),
            default_replies: 3,
            max_replies: 100,
            reply_interval_ms: 0,
            max_collected: 1024,
        }
    }
}

impl GreeterConfig {
    pub fn reply_interval(&self) -> Duration {
        Duration::from_millis(self.reply_interval_ms)
    }
}

impl ServerConfig {
    /// Load defaults, then `path` (if any), then `HELLO_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&ServerConfig::default())
            .context("Failed to seed configuration defaults")?;

        let mut builder = config::Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn listen_socket_addr(&self) -> Result<SocketAddr> {
        self.listen_addr
            .parse()
            .with_context(|| format!("Invalid listen address: {}", self.listen_addr))
    }

    pub fn admin_socket_addr(&self) -> Result<Option<SocketAddr>> {
        self.admin_addr
            .as_deref()
            .map(|addr| {
                addr.parse()
                    .with_context(|| format!("Invalid admin address: {}", addr))
            })
            .transpose()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.listen_socket_addr()?;
        self.admin_socket_addr()?;

        if self.max_message_size == 0 {
            anyhow::bail!("max_message_size must be greater than 0");
        }

        if !self.greeter.template.contains("{name}") {
            return Err(HelloError::InvalidTemplate(self.greeter.template.clone()).into());
        }

        if self.greeter.max_replies > MAX_REPLIES_LIMIT {
            anyhow::bail!(
                "max_replies ({}) exceeds the limit of {}",
                self.greeter.max_replies,
                MAX_REPLIES_LIMIT
            );
        }

        if self.greeter.default_replies > self.greeter.max_replies {
            anyhow::bail!(
                "default_replies ({}) exceeds max_replies ({})",
                self.greeter.default_replies,
                self.greeter.max_replies
            );
        }

        Ok(())
    }

    /// Effective configuration rendered as TOML, with the auth token masked.
    pub fn to_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        if shown.auth_token.is_some() {
            shown.auth_token = Some("<redacted>".to_string());
        }
        toml::to_string_pretty(&shown).context("Failed to render configuration")
    }
}
