use tracing::instrument;

use crate::error::ProtocolError;
use crate::hw::{DeviceSession, ExchangeOutcome, OperationMode, SpeedThreshold};
use crate::protocol::{OpCode, params};

use super::param_stream::write_block;

/// Handler for power and operation-mode writes.
pub struct PowerHandler;

impl PowerHandler {
    fn turn_on_payload(speed: SpeedThreshold, mode: OperationMode) -> Vec<u8> {
        let mut payload = write_block(params::DEVICE_ON, &[0x01]);
        payload.extend(write_block(params::SPEED_THRESHOLD, &[speed.as_raw()]));
        payload.extend(write_block(params::OPERATION_MODE, &[mode.as_raw()]));
        payload
    }

    /// Turns the unit on (or wakes it from stand-by) while applying a speed
    /// threshold and operation mode in the same exchange.
    ///
    /// The function-id field is omitted: the payload selects its parameters
    /// through write blocks instead.
    ///
    /// # Errors
    ///
    /// Returns an error when the reply envelope cannot be decoded.
    #[instrument(skip(session), level = "debug", fields(%speed, %mode))]
    pub async fn turn_on(
        session: &mut DeviceSession,
        speed: SpeedThreshold,
        mode: OperationMode,
    ) -> Result<ExchangeOutcome, ProtocolError> {
        session
            .exchange(
                OpCode::WriteThenRead,
                None,
                &Self::turn_on_payload(speed, mode),
            )
            .await
    }

    /// Puts the unit into stand-by.
    ///
    /// Depending on the jumper configuration the hardware may keep running at
    /// minimum power while in stand-by.
    ///
    /// # Errors
    ///
    /// Returns an error when the reply envelope cannot be decoded.
    #[instrument(skip(session), level = "debug")]
    pub async fn turn_off(session: &mut DeviceSession) -> Result<ExchangeOutcome, ProtocolError> {
        session
            .exchange(
                OpCode::WriteThenRead,
                Some(params::DEVICE_ON.value()),
                &[0x00],
            )
            .await
    }

    /// Sets the operation mode without touching the power state.
    ///
    /// # Errors
    ///
    /// Returns an error when the reply envelope cannot be decoded.
    #[instrument(skip(session), level = "debug", fields(%mode))]
    pub async fn set_operation_mode(
        session: &mut DeviceSession,
        mode: OperationMode,
    ) -> Result<ExchangeOutcome, ProtocolError> {
        session
            .exchange(
                OpCode::WriteThenRead,
                Some(params::OPERATION_MODE.value()),
                &[mode.as_raw()],
            )
            .await
    }
}
