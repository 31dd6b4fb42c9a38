use bon::Builder;
use tracing::{debug, instrument, trace, warn};

use super::hardware::{ExchangeReply, TransportClient};
use super::model::DeviceState;
use crate::error::ProtocolError;
use crate::handlers::{ChecksumMode, FrameCodec, ParamStream, value_codec};
use crate::protocol::{DeviceId, OpCode, ParamId, Password, param_metadata, params};
use crate::utils::format_hex;

/// Identity and decoding options for one controller session.
#[derive(Debug, Clone, Builder)]
pub struct SessionConfig {
    /// Display name used in reports; purely cosmetic.
    #[builder(into)]
    name: Option<String>,
    #[builder(default)]
    device_id: DeviceId,
    #[builder(default)]
    password: Password,
    /// Verify reply checksums instead of tolerating mismatches.
    #[builder(default)]
    verify_checksums: bool,
}

impl SessionConfig {
    /// Returns the configured display name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the configured device id.
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Whether an exchange changed the device-state snapshot.
#[derive(Debug, Clone, Copy, Eq, PartialEq, strum_macros::Display)]
pub enum ExchangeOutcome {
    /// A reply arrived and was decoded into the snapshot.
    #[strum(to_string = "updated")]
    Updated,
    /// No reply arrived; the snapshot is unchanged and now stale.
    #[strum(to_string = "no_update")]
    NoUpdate,
}

impl ExchangeOutcome {
    fn merge(self, other: Self) -> Self {
        if self == Self::Updated || other == Self::Updated {
            Self::Updated
        } else {
            Self::NoUpdate
        }
    }

    /// Folds several per-exchange outcomes into one refresh outcome.
    pub(crate) fn merge_all(outcomes: impl IntoIterator<Item = Self>) -> Self {
        outcomes.into_iter().fold(Self::NoUpdate, Self::merge)
    }
}

/// One authenticated request/response session towards a single controller.
///
/// The session owns the device-state snapshot and a transport; each call to
/// [`DeviceSession::exchange`] performs exactly one send-then-receive round
/// trip. Callers serialise their own calls; there is no multiplexing.
pub struct DeviceSession {
    config: SessionConfig,
    transport: Box<dyn TransportClient>,
    state: DeviceState,
    /// Populated at most once, on the first successful firmware decode.
    firmware: Option<String>,
}

impl DeviceSession {
    /// Creates a session from its configuration and a transport.
    #[must_use]
    pub fn new(config: SessionConfig, transport: Box<dyn TransportClient>) -> Self {
        Self {
            config,
            transport,
            state: DeviceState::default(),
            firmware: None,
        }
    }

    /// Returns the session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the latest device-state snapshot.
    #[must_use]
    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    /// Performs one request/response exchange and folds the reply into the
    /// snapshot.
    ///
    /// Timeouts and transport failures are soft: they log, leave the snapshot
    /// untouched and yield [`ExchangeOutcome::NoUpdate`]. A reply that does
    /// not frame correctly is a hard error; everything else inside a framed
    /// reply degrades gracefully.
    ///
    /// # Errors
    ///
    /// Returns an error when the reply envelope cannot be decoded.
    #[instrument(
        skip(self, payload),
        level = "debug",
        fields(command = %command, ?function, payload_len = payload.len())
    )]
    pub async fn exchange(
        &mut self,
        command: OpCode,
        function: Option<u16>,
        payload: &[u8],
    ) -> Result<ExchangeOutcome, ProtocolError> {
        let frame = FrameCodec::encode(
            &self.config.device_id,
            &self.config.password,
            command,
            function,
            payload,
        );
        debug!(frame = %format_hex(&frame), "sending request frame");

        let reply = match self.transport.exchange(&frame).await {
            Ok(reply) => reply,
            Err(error) => {
                warn!(%error, "transport failure during exchange");
                return Ok(ExchangeOutcome::NoUpdate);
            }
        };

        match reply {
            ExchangeReply::TimedOut => {
                debug!("no reply within the receive window");
                Ok(ExchangeOutcome::NoUpdate)
            }
            ExchangeReply::Datagram(bytes) => {
                debug!(reply = %format_hex(&bytes), "received reply frame");
                self.apply_reply(&bytes)?;
                Ok(ExchangeOutcome::Updated)
            }
        }
    }

    /// Reads a batch of parameters in one exchange.
    ///
    /// # Errors
    ///
    /// Returns an error when the reply envelope cannot be decoded.
    pub async fn read_params(
        &mut self,
        parameters: &[ParamId],
    ) -> Result<ExchangeOutcome, ProtocolError> {
        let payload = crate::handlers::read_request_payload(parameters);
        self.exchange(OpCode::Read, Some(0x0000), &payload).await
    }

    /// Returns the firmware version, querying the device at most once.
    ///
    /// The value is cached for the lifetime of the session after the first
    /// successful decode; later calls never touch the wire.
    ///
    /// # Errors
    ///
    /// Returns an error when the reply envelope cannot be decoded.
    pub async fn firmware_version(&mut self) -> Result<Option<String>, ProtocolError> {
        if let Some(firmware) = &self.firmware {
            trace!("returning cached firmware version");
            return Ok(Some(firmware.clone()));
        }

        self.exchange(OpCode::Read, Some(params::FIRMWARE_VERSION.value()), &[])
            .await?;
        self.firmware = self.state.firmware().map(ToString::to_string);
        Ok(self.firmware.clone())
    }

    fn checksum_mode(&self) -> ChecksumMode {
        if self.config.verify_checksums {
            ChecksumMode::Strict
        } else {
            ChecksumMode::Lenient
        }
    }

    fn apply_reply(&mut self, frame: &[u8]) -> Result<(), ProtocolError> {
        let payload = FrameCodec::extract_payload(frame, self.checksum_mode())?;

        for record in ParamStream::new(payload) {
            match param_metadata(record.param()) {
                Some(metadata) => {
                    let value = value_codec::decode(metadata.kind(), record.value());
                    trace!(param = %record.param(), %value, "decoded parameter");
                    self.state.apply(metadata.field(), value);
                }
                None => trace!(
                    param = %record.param(),
                    function = record.function_id(),
                    raw = %format_hex(record.value()),
                    "ignoring unknown parameter"
                ),
            }
        }

        Ok(())
    }
}
