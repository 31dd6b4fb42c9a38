use async_trait::async_trait;
use tracing::info;

use super::fake_backend::{FakeTransport, FakeTransportConfig};
use super::udp_backend::{UdpBackend, UdpTarget};
use crate::error::InteractionError;

/// Result of one request/response round trip.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ExchangeReply {
    /// One reply datagram arrived within the receive window.
    Datagram(Vec<u8>),
    /// The receive window elapsed without a reply.
    TimedOut,
}

/// One-shot datagram transport towards a single controller.
///
/// Implementations perform exactly one send followed by at most one bounded
/// receive per call; no connection state survives between calls.
#[async_trait]
pub trait TransportClient: Send + Sync {
    /// Sends one request datagram and waits for at most one reply.
    async fn exchange(&self, request: &[u8]) -> Result<ExchangeReply, InteractionError>;
}

/// Builds a transport client backed by a real UDP socket.
pub(crate) fn udp_transport_client(target: UdpTarget) -> Box<dyn TransportClient> {
    Box::new(UdpBackend::new(target))
}

/// Builds a transport client backed by scripted fixture replies.
pub(crate) fn fake_transport_client(config: FakeTransportConfig) -> Box<dyn TransportClient> {
    info!("using fake UDP transport");
    Box::new(FakeTransport::new(config))
}
