use crate::error::ProtocolError;
use crate::hw::{DeviceSession, ExchangeOutcome, SINGLE_FAN_MODEL_ID};
use crate::protocol::{OpCode, ParamId, params};

const STATUS_PARAMS: [ParamId; 5] = [
    params::DEVICE_ON,
    params::SPEED_THRESHOLD,
    params::OPERATION_MODE,
    params::ALARM_STATUS,
    params::CURRENT_HUMIDITY,
];

const CLOCK_PARAMS: [ParamId; 2] = [params::RTC_TIME, params::RTC_DATE];

/// Handler for the periodic state and diagnostics reads.
pub struct StatusHandler;

impl StatusHandler {
    /// Reads power state, speed threshold, operation mode, alarm status and
    /// humidity in one exchange.
    ///
    /// # Errors
    ///
    /// Returns an error when the reply envelope cannot be decoded.
    pub async fn refresh_status(
        session: &mut DeviceSession,
    ) -> Result<ExchangeOutcome, ProtocolError> {
        session.read_params(&STATUS_PARAMS).await
    }

    /// Reads the diagnostics batch: battery voltage, machine hours, filter
    /// state and countdown, and fan speeds.
    ///
    /// Single-fan units (model id 27) do not report a second fan, so its
    /// parameter is left out of the batch once the model id is known.
    ///
    /// # Errors
    ///
    /// Returns an error when the reply envelope cannot be decoded.
    pub async fn refresh_diagnostics(
        session: &mut DeviceSession,
    ) -> Result<ExchangeOutcome, ProtocolError> {
        let parameters = Self::diagnostic_params(session.state().model_id());
        session.read_params(&parameters).await
    }

    /// Reads the RTC time and date.
    ///
    /// # Errors
    ///
    /// Returns an error when the reply envelope cannot be decoded.
    pub async fn refresh_clock(
        session: &mut DeviceSession,
    ) -> Result<ExchangeOutcome, ProtocolError> {
        session.read_params(&CLOCK_PARAMS).await
    }

    /// Reads the device id the unit reports about itself.
    ///
    /// # Errors
    ///
    /// Returns an error when the reply envelope cannot be decoded.
    pub async fn refresh_identity(
        session: &mut DeviceSession,
    ) -> Result<ExchangeOutcome, ProtocolError> {
        session
            .exchange(OpCode::Read, Some(params::DEVICE_ID.value()), &[])
            .await
    }

    /// Runs every read batch once and reports whether any reply arrived.
    ///
    /// # Errors
    ///
    /// Returns an error when a reply envelope cannot be decoded.
    pub async fn refresh_all(
        session: &mut DeviceSession,
    ) -> Result<ExchangeOutcome, ProtocolError> {
        let outcomes = [
            Self::refresh_status(session).await?,
            Self::refresh_diagnostics(session).await?,
            Self::refresh_clock(session).await?,
            Self::refresh_identity(session).await?,
        ];
        Ok(ExchangeOutcome::merge_all(outcomes))
    }

    fn diagnostic_params(model_id: Option<u64>) -> Vec<ParamId> {
        let mut parameters = vec![
            params::BATTERY_VOLTAGE,
            params::MACHINE_HOURS,
            params::FILTER_STATUS,
            params::FILTER_COUNTDOWN,
            params::FAN1_RPM,
        ];
        if model_id != Some(SINGLE_FAN_MODEL_ID) {
            parameters.push(params::FAN2_RPM);
        }
        parameters
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::handlers::read_request_payload;

    use super::*;

    #[test]
    fn status_batch_matches_wire_order() {
        assert_eq!(
            vec![0x01, 0x00, 0x02, 0x00, 0xB7, 0x00, 0x83, 0x00, 0x25, 0x00],
            read_request_payload(&STATUS_PARAMS)
        );
    }

    #[test]
    fn diagnostics_include_second_fan_by_default() {
        let parameters = StatusHandler::diagnostic_params(None);
        assert!(parameters.contains(&params::FAN2_RPM));
    }

    #[test]
    fn diagnostics_skip_second_fan_for_single_fan_units() {
        let parameters = StatusHandler::diagnostic_params(Some(SINGLE_FAN_MODEL_ID));
        assert!(!parameters.contains(&params::FAN2_RPM));
        assert_eq!(
            vec![
                params::BATTERY_VOLTAGE,
                params::MACHINE_HOURS,
                params::FILTER_STATUS,
                params::FILTER_COUNTDOWN,
                params::FAN1_RPM,
            ],
            parameters
        );
    }
}
