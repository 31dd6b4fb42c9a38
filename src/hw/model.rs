use serde_with::SerializeDisplay;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;
use tracing::trace;

use crate::handlers::Value;
use crate::protocol::StateField;

/// Model id reported by single-fan units; diagnostics skip the second fan
/// for these.
pub const SINGLE_FAN_MODEL_ID: u64 = 27;

/// Fan speed threshold reported and accepted by the controllers.
#[derive(Debug, Clone, Copy, Eq, PartialEq, strum_macros::Display, EnumIter, SerializeDisplay)]
pub enum SpeedThreshold {
    #[strum(to_string = "low")]
    Low,
    #[strum(to_string = "medium")]
    Medium,
    #[strum(to_string = "high")]
    High,
    /// Speed is governed by the potentiometer on the unit.
    #[strum(to_string = "manual")]
    Manual,
}

impl SpeedThreshold {
    /// Maps a raw wire value to a threshold.
    #[must_use]
    pub fn from_raw(raw: u64) -> Option<Self> {
        match raw {
            1 => Some(Self::Low),
            2 => Some(Self::Medium),
            3 => Some(Self::High),
            255 => Some(Self::Manual),
            _ => None,
        }
    }

    /// Returns the wire byte for this threshold.
    #[must_use]
    pub const fn as_raw(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Manual => 255,
        }
    }
}

/// Operation mode of the ventilation unit.
#[derive(Debug, Clone, Copy, Eq, PartialEq, strum_macros::Display, EnumIter, SerializeDisplay)]
pub enum OperationMode {
    #[strum(to_string = "ventilation")]
    Ventilation,
    #[strum(to_string = "heat recovery")]
    HeatRecovery,
    #[strum(to_string = "supply")]
    Supply,
}

impl OperationMode {
    /// Maps a raw wire value to a mode.
    #[must_use]
    pub fn from_raw(raw: u64) -> Option<Self> {
        match raw {
            0 => Some(Self::Ventilation),
            1 => Some(Self::HeatRecovery),
            2 => Some(Self::Supply),
            _ => None,
        }
    }

    /// Returns the wire byte for this mode.
    #[must_use]
    pub const fn as_raw(self) -> u8 {
        match self {
            Self::Ventilation => 0,
            Self::HeatRecovery => 1,
            Self::Supply => 2,
        }
    }
}

/// Alarm condition reported by the controller.
#[derive(Debug, Clone, Copy, Eq, PartialEq, strum_macros::Display, SerializeDisplay)]
pub enum AlarmState {
    #[strum(to_string = "OK")]
    Ok,
    #[strum(to_string = "ALARM")]
    Alarm,
    #[strum(to_string = "Warning")]
    Warning,
    #[strum(to_string = "Unknown")]
    Unknown,
}

impl AlarmState {
    /// Maps a raw wire value to an alarm condition.
    #[must_use]
    pub fn from_raw(raw: u64) -> Self {
        match raw {
            0 => Self::Ok,
            1 => Self::Alarm,
            2 => Self::Warning,
            _ => Self::Unknown,
        }
    }
}

/// Filter condition reported by the controller.
#[derive(Debug, Clone, Copy, Eq, PartialEq, strum_macros::Display, SerializeDisplay)]
pub enum FilterStatus {
    #[strum(to_string = "OK")]
    Ok,
    #[strum(to_string = "Needs replacement")]
    ReplacementDue,
}

impl FilterStatus {
    /// Maps a raw wire value to a filter condition.
    #[must_use]
    pub fn from_raw(raw: u64) -> Option<Self> {
        match raw {
            0 => Some(Self::Ok),
            1 => Some(Self::ReplacementDue),
            _ => None,
        }
    }
}

/// All operation modes a caller may offer, in wire order.
#[must_use]
pub fn available_modes() -> Vec<OperationMode> {
    OperationMode::iter().collect()
}

/// All speed thresholds a unit may report, in wire order.
#[must_use]
pub fn available_speed_thresholds() -> Vec<SpeedThreshold> {
    SpeedThreshold::iter().collect()
}

fn model_name(model_id: u64) -> Option<&'static str> {
    match model_id {
        1 => Some("Vento Expert A50-1 W V.2"),
        2 => Some("Vento Expert A85-1 W V.2"),
        3 => Some("Vento Expert A100-1 W V.2"),
        SINGLE_FAN_MODEL_ID => Some("Vento Expert Duo A30-1 W V.2"),
        _ => None,
    }
}

/// Last-decoded device values, one field per registered parameter.
///
/// Fields stay `None` until the first successful read that carries them;
/// there is no invalidation, so callers re-poll for freshness.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceState {
    device_on: Option<u64>,
    speed_threshold: Option<u64>,
    operation_mode: Option<u64>,
    alarm_status: Option<u64>,
    humidity: Option<u64>,
    battery_millivolts: Option<u64>,
    fan1_rpm: Option<u64>,
    fan2_rpm: Option<u64>,
    filter_status: Option<u64>,
    filter_countdown_hours: Option<f64>,
    machine_minutes: Option<u32>,
    rtc_time: Option<String>,
    rtc_date: Option<String>,
    device_id: Option<String>,
    firmware: Option<String>,
    model_id: Option<u64>,
    dhcp_enabled: Option<u64>,
    ip_address: Option<String>,
    subnet_mask: Option<String>,
    gateway: Option<String>,
    current_ip: Option<String>,
}

impl DeviceState {
    /// Routes one decoded value into its snapshot field.
    ///
    /// A value whose shape does not match the destination is dropped; decode
    /// anomalies never abort the rest of a reply.
    pub(crate) fn apply(&mut self, field: StateField, value: Value) {
        match (field, value) {
            (StateField::DeviceOn, Value::Uint(v)) => self.device_on = Some(v),
            (StateField::SpeedThreshold, Value::Uint(v)) => self.speed_threshold = Some(v),
            (StateField::OperationMode, Value::Uint(v)) => self.operation_mode = Some(v),
            (StateField::AlarmStatus, Value::Uint(v)) => self.alarm_status = Some(v),
            (StateField::Humidity, Value::Uint(v)) => self.humidity = Some(v),
            (StateField::BatteryVoltage, Value::Uint(v)) => self.battery_millivolts = Some(v),
            (StateField::Fan1Rpm, Value::Uint(v)) => self.fan1_rpm = Some(v),
            (StateField::Fan2Rpm, Value::Uint(v)) => self.fan2_rpm = Some(v),
            (StateField::FilterStatus, Value::Uint(v)) => self.filter_status = Some(v),
            (StateField::FilterCountdown, Value::HoursRemaining(v)) => {
                self.filter_countdown_hours = Some(v);
            }
            (StateField::MachineHours, Value::MachineMinutes(v)) => self.machine_minutes = Some(v),
            (StateField::RtcTime, Value::ClockTime(v)) => self.rtc_time = Some(v),
            (StateField::RtcDate, Value::CalendarDate(v)) => self.rtc_date = Some(v),
            (StateField::DeviceId, Value::Text(v)) => self.device_id = Some(v),
            (StateField::Firmware, Value::Firmware(v)) => self.firmware = Some(v),
            (StateField::ModelId, Value::Uint(v)) => self.model_id = Some(v),
            (StateField::NetDhcp, Value::Uint(v)) => self.dhcp_enabled = Some(v),
            (StateField::NetIp, Value::Ipv4(v)) => self.ip_address = Some(v),
            (StateField::NetSubnet, Value::Ipv4(v)) => self.subnet_mask = Some(v),
            (StateField::NetGateway, Value::Ipv4(v)) => self.gateway = Some(v),
            (StateField::CurrentIp, Value::Ipv4(v)) => self.current_ip = Some(v),
            (StateField::Ignored, _) => {}
            (field, value) => {
                trace!(?field, %value, "dropping value with unexpected shape");
            }
        }
    }

    /// Returns whether the unit is on, once known.
    #[must_use]
    pub fn is_on(&self) -> Option<bool> {
        self.device_on.map(|raw| raw == 1)
    }

    /// Returns the raw speed-threshold code.
    #[must_use]
    pub fn speed_code(&self) -> Option<u64> {
        self.speed_threshold
    }

    /// Returns the decoded speed threshold, once known.
    #[must_use]
    pub fn speed_threshold(&self) -> Option<SpeedThreshold> {
        self.speed_threshold.and_then(SpeedThreshold::from_raw)
    }

    /// Returns the decoded operation mode, once known.
    #[must_use]
    pub fn operation_mode(&self) -> Option<OperationMode> {
        self.operation_mode.and_then(OperationMode::from_raw)
    }

    /// Returns the alarm condition, once known.
    #[must_use]
    pub fn alarm(&self) -> Option<AlarmState> {
        self.alarm_status.map(AlarmState::from_raw)
    }

    /// Returns the relative humidity in percent.
    #[must_use]
    pub fn humidity(&self) -> Option<u64> {
        self.humidity
    }

    /// Returns the RTC battery voltage in volts.
    #[must_use]
    pub fn battery_volts(&self) -> Option<f64> {
        self.battery_millivolts
            .map(|millivolts| millivolts as f64 / 1000.0)
    }

    /// Returns fan 1 speed in RPM.
    #[must_use]
    pub fn fan1_rpm(&self) -> Option<u64> {
        self.fan1_rpm
    }

    /// Returns fan 2 speed in RPM; single-fan units never report this.
    #[must_use]
    pub fn fan2_rpm(&self) -> Option<u64> {
        self.fan2_rpm
    }

    /// Returns the filter condition, once known.
    #[must_use]
    pub fn filter_status(&self) -> Option<FilterStatus> {
        self.filter_status.and_then(FilterStatus::from_raw)
    }

    /// Returns the remaining filter life in fractional hours.
    #[must_use]
    pub fn filter_countdown_hours(&self) -> Option<f64> {
        self.filter_countdown_hours
    }

    /// Returns the remaining filter life in whole days.
    #[must_use]
    pub fn filter_countdown_days(&self) -> Option<u64> {
        self.filter_countdown_hours.map(|hours| (hours / 24.0) as u64)
    }

    /// Returns total runtime in hours, rounded to one decimal.
    #[must_use]
    pub fn machine_hours(&self) -> Option<f64> {
        self.machine_minutes
            .map(|minutes| (f64::from(minutes) / 60.0 * 10.0).round() / 10.0)
    }

    /// Returns the RTC wall-clock time as `HH:MM:SS`.
    #[must_use]
    pub fn rtc_time(&self) -> Option<&str> {
        self.rtc_time.as_deref()
    }

    /// Returns the RTC calendar date as `YYYY-MM-DD`.
    #[must_use]
    pub fn rtc_date(&self) -> Option<&str> {
        self.rtc_date.as_deref()
    }

    /// Returns the combined RTC date and time once both are known.
    #[must_use]
    pub fn rtc_datetime(&self) -> Option<String> {
        match (&self.rtc_date, &self.rtc_time) {
            (Some(date), Some(time)) => Some(format!("{date} {time}")),
            _ => None,
        }
    }

    /// Returns the device id reported by the unit.
    #[must_use]
    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    /// Returns the decoded firmware version string.
    #[must_use]
    pub fn firmware(&self) -> Option<&str> {
        self.firmware.as_deref()
    }

    /// Returns the raw model id.
    #[must_use]
    pub fn model_id(&self) -> Option<u64> {
        self.model_id
    }

    /// Returns a human-readable model name.
    #[must_use]
    pub fn model(&self) -> String {
        match self.model_id {
            None => "Unknown model".to_string(),
            Some(id) => model_name(id)
                .map(ToString::to_string)
                .unwrap_or_else(|| format!("Unknown model code {id}")),
        }
    }

    /// Returns whether DHCP is enabled, once known.
    #[must_use]
    pub fn dhcp_enabled(&self) -> Option<bool> {
        self.dhcp_enabled.map(|raw| raw == 1)
    }

    /// Returns the configured IP address.
    #[must_use]
    pub fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }

    /// Returns the configured subnet mask.
    #[must_use]
    pub fn subnet_mask(&self) -> Option<&str> {
        self.subnet_mask.as_deref()
    }

    /// Returns the configured gateway address.
    #[must_use]
    pub fn gateway(&self) -> Option<&str> {
        self.gateway.as_deref()
    }

    /// Returns the address the unit currently uses.
    #[must_use]
    pub fn current_ip(&self) -> Option<&str> {
        self.current_ip.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn fresh_snapshot_is_empty() {
        let state = DeviceState::default();
        assert_eq!(None, state.is_on());
        assert_eq!(None, state.speed_threshold());
        assert_eq!(None, state.rtc_datetime());
        assert_eq!("Unknown model", state.model());
    }

    #[test]
    fn apply_routes_values_to_typed_accessors() {
        let mut state = DeviceState::default();
        state.apply(StateField::DeviceOn, Value::Uint(1));
        state.apply(StateField::SpeedThreshold, Value::Uint(2));
        state.apply(StateField::BatteryVoltage, Value::Uint(3048));
        state.apply(StateField::MachineHours, Value::MachineMinutes(14_550));
        state.apply(StateField::FilterCountdown, Value::HoursRemaining(72.5));

        assert_eq!(Some(true), state.is_on());
        assert_eq!(Some(SpeedThreshold::Medium), state.speed_threshold());
        assert_eq!(Some(3.048), state.battery_volts());
        assert_eq!(Some(242.5), state.machine_hours());
        assert_eq!(Some(3), state.filter_countdown_days());
    }

    #[test]
    fn apply_drops_values_with_unexpected_shape() {
        let mut state = DeviceState::default();
        state.apply(StateField::DeviceOn, Value::Text("on".to_string()));
        assert_eq!(None, state.is_on());
    }

    #[test]
    fn rtc_datetime_combines_date_and_time() {
        let mut state = DeviceState::default();
        state.apply(StateField::RtcDate, Value::CalendarDate("2024-06-15".to_string()));
        assert_eq!(None, state.rtc_datetime());

        state.apply(StateField::RtcTime, Value::ClockTime("22:30:05".to_string()));
        assert_eq!(Some("2024-06-15 22:30:05".to_string()), state.rtc_datetime());
    }

    #[rstest]
    #[case(0, AlarmState::Ok)]
    #[case(1, AlarmState::Alarm)]
    #[case(2, AlarmState::Warning)]
    #[case(9, AlarmState::Unknown)]
    fn alarm_state_maps_raw_codes(#[case] raw: u64, #[case] expected: AlarmState) {
        assert_eq!(expected, AlarmState::from_raw(raw));
    }

    #[rstest]
    #[case(1, Some(SpeedThreshold::Low))]
    #[case(3, Some(SpeedThreshold::High))]
    #[case(255, Some(SpeedThreshold::Manual))]
    #[case(7, None)]
    fn speed_threshold_maps_raw_codes(#[case] raw: u64, #[case] expected: Option<SpeedThreshold>) {
        assert_eq!(expected, SpeedThreshold::from_raw(raw));
    }

    #[test]
    fn available_value_lists_follow_wire_order() {
        assert_eq!(
            vec![
                OperationMode::Ventilation,
                OperationMode::HeatRecovery,
                OperationMode::Supply,
            ],
            available_modes()
        );
        assert_eq!(
            vec![
                SpeedThreshold::Low,
                SpeedThreshold::Medium,
                SpeedThreshold::High,
                SpeedThreshold::Manual,
            ],
            available_speed_thresholds()
        );
    }

    #[test]
    fn unknown_model_id_renders_its_code() {
        let mut state = DeviceState::default();
        state.apply(StateField::ModelId, Value::Uint(914));
        assert_eq!("Unknown model code 914", state.model());
    }
}
