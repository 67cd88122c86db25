//! Greeting logic shared by every HelloWorld method

use crate::config::GreeterConfig;
use crate::error::HelloError;
use crate::proto::{say_hello_request::AOneof, SayHelloRequest, SayHelloResponse};
use std::time::Duration;
use tracing::debug;

/// Longest accepted name, in characters.
pub const MAX_NAME_LEN: usize = 256;

#[derive(Debug, Clone)]
pub struct Greeter {
    template: String,
    default_replies: u32,
    max_replies: u32,
    reply_interval: Duration,
    max_collected: usize,
}

impl Greeter {
    pub fn new(config: &GreeterConfig) -> Result<Self, HelloError> {
        if !config.template.contains("{name}") {
            return Err(HelloError::InvalidTemplate(config.template.clone()));
        }
        Ok(Self {
            template: config.template.clone(),
            default_replies: config.default_replies,
            max_replies: config.max_replies,
            reply_interval: config.reply_interval(),
            max_collected: config.max_collected,
        })
    }

    pub fn reply_interval(&self) -> Duration {
        self.reply_interval
    }

    pub fn max_collected(&self) -> usize {
        self.max_collected
    }

    /// Render the greeting for one request.
    pub fn greet(&self, req: &SayHelloRequest) -> Result<SayHelloResponse, HelloError> {
        let name = validate_name(&req.name)?;
        debug!(
            name = %name,
            has_phone = !req.phone.is_empty(),
            map_entries = req.a_map.len(),
            array_items = req.an_array.len(),
            oneof = ?req.a_oneof,
            "greeting"
        );
        Ok(SayHelloResponse::new(self.template.replace("{name}", name)))
    }

    /// Number of LotsOfReplies responses for `req`.
    ///
    /// `maybe_int` picks the count (clamped to `max_replies`); otherwise the
    /// configured default applies.
    pub fn reply_count(&self, req: &SayHelloRequest) -> Result<u32, HelloError> {
        match req.a_oneof {
            Some(AOneof::MaybeInt(n)) if n < 0 => Err(HelloError::NegativeReplyCount(n)),
            Some(AOneof::MaybeInt(n)) => {
                let n = n as u32;
                if n > self.max_replies {
                    debug!(requested = n, max = self.max_replies, "clamping reply count");
                }
                Ok(n.min(self.max_replies))
            }
            _ => Ok(self.default_replies),
        }
    }

    /// LotsOfReplies responses for `req`: `"<greeting> (i/n)"`, 1-based.
    ///
    /// Replies are rendered one at a time as the iterator is advanced.
    pub fn replies(&self, req: &SayHelloRequest) -> Result<Replies, HelloError> {
        let greeting = self.greet(req)?.hello;
        let count = self.reply_count(req)?;
        Ok(Replies {
            greeting,
            next: 1,
            count,
        })
    }
}

/// Lazily numbered LotsOfReplies responses
#[derive(Debug, Clone)]
pub struct Replies {
    greeting: String,
    next: u64,
    count: u32,
}

impl Replies {
    /// Number of replies in the whole stream, `n` in `(i/n)`.
    pub fn total(&self) -> u32 {
        self.count
    }
}

impl Iterator for Replies {
    type Item = SayHelloResponse;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > u64::from(self.count) {
            return None;
        }
        let i = self.next;
        self.next += 1;
        Some(SayHelloResponse::new(format!(
            "{} ({}/{})",
            self.greeting, i, self.count
        )))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (u64::from(self.count) + 1 - self.next) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Replies {}

fn validate_name(name: &str) -> Result<&str, HelloError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(HelloError::EmptyName);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(HelloError::NameTooLong { max: MAX_NAME_LEN });
    }
    Ok(name)
}
