//! Subcommands and the arguments they share

use anyhow::{Context, Result};
use clap::Args;
use hello_server::proto::{say_hello_request::AOneof, SayHelloRequest};
use hello_server::{ClientOptions, HelloClient};
use hello_shared::utils::{parse_duration, parse_key_value};
use std::collections::HashMap;
use tracing::debug;

pub mod bidi;
pub mod describe;
pub mod greetings;
pub mod replies;
pub mod say;

/// Where and how to reach the server
#[derive(Args, Debug, Clone)]
pub struct ConnectArgs {
    /// HelloWorld gRPC endpoint
    #[arg(short, long, default_value = "http://127.0.0.1:50051")]
    pub endpoint: String,

    /// Bearer token sent with every call
    #[arg(long, env = "HELLO_AUTH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Connect timeout (e.g., "500ms", "5s")
    #[arg(long, default_value = "5s")]
    pub connect_timeout: String,

    /// Disable gzip compression
    #[arg(long)]
    pub no_gzip: bool,

    /// Print responses as JSON lines
    #[arg(long)]
    pub json: bool,
}

impl ConnectArgs {
    pub async fn connect(&self) -> Result<HelloClient> {
        let connect_timeout =
            parse_duration(&self.connect_timeout).context("Failed to parse connect timeout")?;
        let options = ClientOptions {
            connect_timeout,
            auth_token: self.token.clone(),
            gzip: !self.no_gzip,
            ..Default::default()
        };
        debug!(endpoint = %self.endpoint, gzip = options.gzip, "connecting");
        HelloClient::connect(&self.endpoint, options).await
    }
}

/// Fields of `SayHelloRequest`. Every name becomes one request; the other
/// fields are copied into each of them. Streaming calls accept no names at
/// all and send an empty request stream.
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Name to greet (repeat to send several requests)
    #[arg(short, long = "name")]
    pub names: Vec<String>,

    #[arg(long, default_value = "")]
    pub phone: String,

    /// Map entry as key=value (repeatable)
    #[arg(long = "map")]
    pub map: Vec<String>,

    /// Array item (repeatable)
    #[arg(long = "item")]
    pub items: Vec<String>,

    /// Set the oneof to `maybe_string`
    #[arg(long, conflicts_with = "maybe_int")]
    pub maybe_string: Option<String>,

    /// Set the oneof to `maybe_int` (LotsOfReplies uses it as the reply count)
    #[arg(long, allow_negative_numbers = true)]
    pub maybe_int: Option<i32>,
}

impl RequestArgs {
    /// Like [`Self::to_requests`], for calls that need at least one request.
    pub fn to_requests_nonempty(&self) -> Result<Vec<SayHelloRequest>> {
        if self.names.is_empty() {
            anyhow::bail!("at least one --name is required");
        }
        self.to_requests()
    }

    pub fn to_requests(&self) -> Result<Vec<SayHelloRequest>> {
        let mut a_map = HashMap::new();
        for entry in &self.map {
            let (key, value) = parse_key_value(entry)?;
            let value: u32 = value
                .parse()
                .with_context(|| format!("Map value for {:?} is not a u32: {:?}", key, value))?;
            a_map.insert(key, value);
        }

        let a_oneof = match (&self.maybe_string, self.maybe_int) {
            (Some(s), _) => Some(AOneof::MaybeString(s.clone())),
            (None, Some(n)) => Some(AOneof::MaybeInt(n)),
            (None, None) => None,
        };

        Ok(self
            .names
            .iter()
            .map(|name| SayHelloRequest {
                name: name.clone(),
                phone: self.phone.clone(),
                a_map: a_map.clone(),
                an_array: self.items.clone(),
                a_oneof: a_oneof.clone(),
            })
            .collect())
    }
}
