use tracing::instrument;

use crate::error::ProtocolError;
use crate::hw::{DeviceSession, ExchangeOutcome};
use crate::protocol::{OpCode, params};

use super::status::StatusHandler;

/// Handler for the alarm and filter-countdown reset writes.
pub struct MaintenanceHandler;

impl MaintenanceHandler {
    /// Clears the alarm condition on the controller.
    ///
    /// # Errors
    ///
    /// Returns an error when the reply envelope cannot be decoded.
    #[instrument(skip(session), level = "debug")]
    pub async fn reset_alarm(
        session: &mut DeviceSession,
    ) -> Result<ExchangeOutcome, ProtocolError> {
        session
            .exchange(OpCode::Write, Some(params::ALARM_RESET.value()), &[0x01])
            .await
    }

    /// Restarts the filter-replacement countdown, then refreshes the
    /// diagnostics batch so the snapshot reflects the new countdown.
    ///
    /// # Errors
    ///
    /// Returns an error when a reply envelope cannot be decoded.
    #[instrument(skip(session), level = "debug")]
    pub async fn reset_filter_countdown(
        session: &mut DeviceSession,
    ) -> Result<ExchangeOutcome, ProtocolError> {
        session
            .exchange(
                OpCode::Write,
                Some(params::FILTER_COUNTDOWN_RESET.value()),
                &[0x00],
            )
            .await?;
        StatusHandler::refresh_diagnostics(session).await
    }
}
