use crate::error::ProtocolError;
use crate::hw::{DeviceSession, ExchangeOutcome};
use crate::protocol::{ParamId, params};

const NETWORK_PARAMS: [ParamId; 5] = [
    params::NET_DHCP,
    params::NET_IP,
    params::NET_SUBNET,
    params::NET_GATEWAY,
    params::CURRENT_IP,
];

/// Handler for the combined network-settings read.
pub struct NetworkHandler;

impl NetworkHandler {
    /// Reads DHCP mode, configured IP, subnet, gateway and the current
    /// address in a single exchange.
    ///
    /// # Errors
    ///
    /// Returns an error when the reply envelope cannot be decoded.
    pub async fn refresh_network(
        session: &mut DeviceSession,
    ) -> Result<ExchangeOutcome, ProtocolError> {
        session.read_params(&NETWORK_PARAMS).await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::handlers::read_request_payload;

    use super::*;

    #[test]
    fn network_batch_matches_wire_order() {
        assert_eq!(
            vec![0x9B, 0x00, 0x9C, 0x00, 0x9D, 0x00, 0x9E, 0x00, 0xA3, 0x00],
            read_request_payload(&NETWORK_PARAMS)
        );
    }
}
