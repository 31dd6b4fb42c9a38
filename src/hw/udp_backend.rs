use std::time::Duration;

use async_trait::async_trait;
use bon::Builder;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::instrument;

use super::hardware::{ExchangeReply, TransportClient};
use crate::error::InteractionError;
use crate::protocol::{DEFAULT_PORT, MAX_REPLY_LEN};

/// Ceiling on the wait for a reply datagram.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(15);

/// Address and timing of the controller a session talks to.
#[derive(Debug, Clone, Builder)]
pub struct UdpTarget {
    #[builder(into)]
    host: String,
    #[builder(default = DEFAULT_PORT)]
    port: u16,
    #[builder(default = DEFAULT_RECEIVE_TIMEOUT)]
    receive_timeout: Duration,
}

impl UdpTarget {
    /// Returns the controller host name or address.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the controller UDP port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the bounded receive wait.
    #[must_use]
    pub fn receive_timeout(&self) -> Duration {
        self.receive_timeout
    }
}

/// Transport backed by one transient UDP socket per exchange.
///
/// The socket is bound, used for a single send/receive pair and dropped
/// before the call returns, in every outcome.
#[derive(Debug)]
pub(crate) struct UdpBackend {
    target: UdpTarget,
}

impl UdpBackend {
    pub(crate) fn new(target: UdpTarget) -> Self {
        Self { target }
    }
}

#[async_trait]
impl TransportClient for UdpBackend {
    #[instrument(
        skip(self, request),
        level = "debug",
        fields(host = %self.target.host, port = self.target.port, request_len = request.len())
    )]
    async fn exchange(&self, request: &[u8]) -> Result<ExchangeReply, InteractionError> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))
            .await
            .map_err(|source| InteractionError::Socket { source })?;
        socket
            .connect((self.target.host.as_str(), self.target.port))
            .await
            .map_err(|source| InteractionError::Socket { source })?;
        socket
            .send(request)
            .await
            .map_err(|source| InteractionError::Socket { source })?;

        let mut buffer = [0u8; MAX_REPLY_LEN];
        match timeout(self.target.receive_timeout, socket.recv(&mut buffer)).await {
            Err(_elapsed) => Ok(ExchangeReply::TimedOut),
            Ok(Err(source)) => Err(InteractionError::Socket { source }),
            Ok(Ok(received)) => Ok(ExchangeReply::Datagram(buffer[..received].to_vec())),
        }
    }
}
