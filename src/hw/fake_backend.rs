use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bon::Builder;
use tokio::time::sleep;

use super::hardware::{ExchangeReply, TransportClient};
use crate::error::{FixtureError, InteractionError};

/// Scripted replies for the fake transport.
///
/// The script is a semicolon-separated list of hexadecimal reply datagrams;
/// an empty segment or the word `timeout` scripts a receive timeout.
#[derive(Debug, Clone, derive_more::Into)]
pub struct ReplyScript {
    replies: Vec<Option<Vec<u8>>>,
}

impl FromStr for ReplyScript {
    type Err = FixtureError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let replies = value
            .split(';')
            .map(parse_reply)
            .collect::<Result<_, _>>()?;
        Ok(Self { replies })
    }
}

fn parse_reply(segment: &str) -> Result<Option<Vec<u8>>, FixtureError> {
    let compact: String = segment.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() || compact.eq_ignore_ascii_case("timeout") {
        return Ok(None);
    }

    hex::decode(&compact)
        .map(Some)
        .map_err(|_error| FixtureError::InvalidHexPayload {
            value: segment.trim().to_string(),
        })
}

/// Settings for constructing a fake transport.
#[derive(Debug, Builder)]
pub(crate) struct FakeTransportConfig {
    replies: ReplyScript,
    #[builder(default)]
    exchange_delay: Duration,
}

/// Shared view of the requests a fake transport has seen.
#[derive(Debug, Clone, Default)]
pub struct RequestLog {
    requests: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl RequestLog {
    /// Returns a copy of every request datagram sent so far.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Vec<u8>> {
        self.requests
            .lock()
            .expect("request log mutex should not be poisoned")
            .clone()
    }

    /// Returns how many requests were sent.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests
            .lock()
            .expect("request log mutex should not be poisoned")
            .len()
    }

    /// Returns whether no request was sent yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record(&self, request: &[u8]) {
        self.requests
            .lock()
            .expect("request log mutex should not be poisoned")
            .push(request.to_vec());
    }
}

/// Fake transport used in tests and non-hardware environments.
///
/// Replies are served in script order; running past the end of the script is
/// an error so tests notice unexpected extra exchanges.
#[derive(Debug)]
pub struct FakeTransport {
    replies: Mutex<VecDeque<Option<Vec<u8>>>>,
    request_log: RequestLog,
    exchange_delay: Duration,
}

impl FakeTransport {
    pub(crate) fn new(config: FakeTransportConfig) -> Self {
        Self {
            replies: Mutex::new(config.replies.replies.into()),
            request_log: RequestLog::default(),
            exchange_delay: config.exchange_delay,
        }
    }

    /// Creates a fake transport directly from a reply script.
    ///
    /// ```
    /// use vento::{FakeTransport, ReplyScript};
    ///
    /// let transport = FakeTransport::from_script("timeout".parse::<ReplyScript>()?);
    /// let _ = transport.request_log();
    /// # Ok::<(), vento::FixtureError>(())
    /// ```
    #[must_use]
    pub fn from_script(script: ReplyScript) -> Self {
        Self::new(FakeTransportConfig::builder().replies(script).build())
    }

    /// Returns a shared handle onto the requests this transport receives.
    #[must_use]
    pub fn request_log(&self) -> RequestLog {
        self.request_log.clone()
    }
}

#[async_trait]
impl TransportClient for FakeTransport {
    async fn exchange(&self, request: &[u8]) -> Result<ExchangeReply, InteractionError> {
        if !self.exchange_delay.is_zero() {
            sleep(self.exchange_delay).await;
        }
        self.request_log.record(request);

        let scripted = self
            .replies
            .lock()
            .expect("reply script mutex should not be poisoned")
            .pop_front();
        match scripted {
            None => Err(InteractionError::RepliesExhausted),
            Some(None) => Ok(ExchangeReply::TimedOut),
            Some(Some(reply)) => Ok(ExchangeReply::Datagram(reply)),
        }
    }
}
