use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use thiserror::Error;

/// Every request and reply datagram opens with these two bytes.
pub const FRAME_MAGIC: [u8; 2] = [0xFD, 0xFD];

/// Protocol type byte carried directly after the magic.
pub const PROTOCOL_TYPE: u8 = 0x02;

/// Fixed width of the device-id field in this protocol version.
pub const DEVICE_ID_LEN: usize = 16;

/// The password length is carried in a single byte.
pub const MAX_PASSWORD_LEN: usize = 255;

/// Largest reply datagram a controller sends.
pub const MAX_REPLY_LEN: usize = 98;

/// Default UDP port the controllers listen on.
pub const DEFAULT_PORT: u16 = 4000;

/// Broadcast device id accepted by every controller.
pub const DEFAULT_DEVICE_ID: &str = "DEFAULT_DEVICEID";

/// Factory password shipped with the units.
pub const DEFAULT_PASSWORD: &str = "1111";

/// Command byte selecting the request kind.
#[derive(Debug, Clone, Copy, Eq, PartialEq, strum_macros::Display)]
pub enum OpCode {
    /// Read one or more parameters.
    #[strum(to_string = "read")]
    Read,
    /// Write one parameter.
    #[strum(to_string = "write")]
    Write,
    /// Write parameters, then read them back in the same exchange.
    #[strum(to_string = "write_then_read")]
    WriteThenRead,
    /// Increment a parameter value.
    #[strum(to_string = "increment")]
    Increment,
    /// Decrement a parameter value.
    #[strum(to_string = "decrement")]
    Decrement,
    /// Marker used by controller-originated replies.
    #[strum(to_string = "controller_response")]
    ControllerResponse,
}

impl OpCode {
    /// Returns the wire byte for this command.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Read => 0x01,
            Self::Write => 0x02,
            Self::WriteThenRead => 0x03,
            Self::Increment => 0x04,
            Self::Decrement => 0x05,
            Self::ControllerResponse => 0x06,
        }
    }
}

/// 16-bit parameter identifier, composed from an optional page high byte and a
/// low byte.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord, derive_more::From, derive_more::Into,
)]
pub struct ParamId(u16);

impl ParamId {
    /// Creates a parameter id from its raw 16-bit value.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Composes a parameter id from a page high byte and a low byte.
    ///
    /// ```
    /// use vento::ParamId;
    ///
    /// assert_eq!(ParamId::new(0x0105), ParamId::from_page(0x01, 0x05));
    /// ```
    #[must_use]
    pub const fn from_page(page: u8, low: u8) -> Self {
        Self(((page as u16) << 8) | low as u16)
    }

    /// Returns the raw 16-bit value.
    #[must_use]
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Returns the low byte used on the write path.
    #[must_use]
    pub const fn low_byte(self) -> u8 {
        (self.0 & 0xFF) as u8
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

/// Parameter ids understood by Vento controllers.
pub mod params {
    use super::ParamId;

    pub const DEVICE_ON: ParamId = ParamId::new(0x0001);
    pub const SPEED_THRESHOLD: ParamId = ParamId::new(0x0002);
    pub const BATTERY_VOLTAGE: ParamId = ParamId::new(0x0024);
    pub const CURRENT_HUMIDITY: ParamId = ParamId::new(0x0025);
    pub const FAN1_RPM: ParamId = ParamId::new(0x004A);
    pub const FAN2_RPM: ParamId = ParamId::new(0x004B);
    pub const FILTER_COUNTDOWN: ParamId = ParamId::new(0x0064);
    pub const FILTER_COUNTDOWN_RESET: ParamId = ParamId::new(0x0065);
    pub const RTC_TIME: ParamId = ParamId::new(0x006F);
    pub const RTC_DATE: ParamId = ParamId::new(0x0070);
    pub const DEVICE_ID: ParamId = ParamId::new(0x007C);
    pub const MACHINE_HOURS: ParamId = ParamId::new(0x007E);
    pub const ALARM_RESET: ParamId = ParamId::new(0x0080);
    pub const ALARM_STATUS: ParamId = ParamId::new(0x0083);
    pub const FIRMWARE_VERSION: ParamId = ParamId::new(0x0086);
    pub const FILTER_STATUS: ParamId = ParamId::new(0x0088);
    pub const NET_DHCP: ParamId = ParamId::new(0x009B);
    pub const NET_IP: ParamId = ParamId::new(0x009C);
    pub const NET_SUBNET: ParamId = ParamId::new(0x009D);
    pub const NET_GATEWAY: ParamId = ParamId::new(0x009E);
    pub const CURRENT_IP: ParamId = ParamId::new(0x00A3);
    pub const OPERATION_MODE: ParamId = ParamId::new(0x00B7);
    pub const MODEL_ID: ParamId = ParamId::new(0x00B9);
}

/// Wire encoding of a parameter value.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum ValueKind {
    /// Little-endian unsigned integer.
    Uint,
    /// ASCII text with trailing NUL padding.
    Ascii,
    /// Dot-separated decimal octets, in wire order.
    Ipv4,
    /// Seconds, minutes, hours.
    ClockTime,
    /// Day, day-of-week, month, year offset from 2000.
    CalendarDate,
    /// Minutes, hours, little-endian days of runtime.
    MachineHours,
    /// Minutes, hours, days remaining, plus one padding byte.
    TimeRemaining,
    /// Major, minor, day, month, little-endian year.
    FirmwareVersion,
}

/// Snapshot field a decoded parameter is routed to.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum StateField {
    DeviceOn,
    SpeedThreshold,
    BatteryVoltage,
    Humidity,
    Fan1Rpm,
    Fan2Rpm,
    FilterCountdown,
    RtcTime,
    RtcDate,
    DeviceId,
    MachineHours,
    AlarmStatus,
    Firmware,
    FilterStatus,
    NetDhcp,
    NetIp,
    NetSubnet,
    NetGateway,
    CurrentIp,
    OperationMode,
    ModelId,
    /// Known parameter with no snapshot destination.
    Ignored,
}

/// Registry entry describing how one parameter decodes.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) struct ParamMetadata {
    kind: ValueKind,
    length: usize,
    field: StateField,
}

impl ParamMetadata {
    /// Wire encoding of the value.
    pub(crate) fn kind(self) -> ValueKind {
        self.kind
    }

    /// Expected value length in bytes, used unless the stream overrides it.
    pub(crate) fn length(self) -> usize {
        self.length
    }

    /// Destination snapshot field.
    pub(crate) fn field(self) -> StateField {
        self.field
    }
}

const KNOWN_PARAMS: [ParamId; 23] = [
    params::DEVICE_ON,
    params::SPEED_THRESHOLD,
    params::BATTERY_VOLTAGE,
    params::CURRENT_HUMIDITY,
    params::FAN1_RPM,
    params::FAN2_RPM,
    params::FILTER_COUNTDOWN,
    params::FILTER_COUNTDOWN_RESET,
    params::RTC_TIME,
    params::RTC_DATE,
    params::DEVICE_ID,
    params::MACHINE_HOURS,
    params::ALARM_RESET,
    params::ALARM_STATUS,
    params::FIRMWARE_VERSION,
    params::FILTER_STATUS,
    params::NET_DHCP,
    params::NET_IP,
    params::NET_SUBNET,
    params::NET_GATEWAY,
    params::CURRENT_IP,
    params::OPERATION_MODE,
    params::MODEL_ID,
];

/// Registry keyed by parameter id.
static PARAMS_BY_ID: LazyLock<HashMap<ParamId, ParamMetadata>> = LazyLock::new(|| {
    KNOWN_PARAMS
        .into_iter()
        .map(|param| (param, metadata_for(param)))
        .collect()
});

/// Returns the registry entry for one parameter, if it is known.
pub(crate) fn param_metadata(param: ParamId) -> Option<&'static ParamMetadata> {
    PARAMS_BY_ID.get(&param)
}

fn metadata_for(param: ParamId) -> ParamMetadata {
    let (kind, length, field) = match param {
        params::DEVICE_ON => (ValueKind::Uint, 1, StateField::DeviceOn),
        params::SPEED_THRESHOLD => (ValueKind::Uint, 1, StateField::SpeedThreshold),
        params::BATTERY_VOLTAGE => (ValueKind::Uint, 2, StateField::BatteryVoltage),
        params::CURRENT_HUMIDITY => (ValueKind::Uint, 1, StateField::Humidity),
        params::FAN1_RPM => (ValueKind::Uint, 2, StateField::Fan1Rpm),
        params::FAN2_RPM => (ValueKind::Uint, 2, StateField::Fan2Rpm),
        // Documented as 3 bytes, but real controllers send 4. The fourth byte
        // must still be consumed to keep the stream aligned.
        params::FILTER_COUNTDOWN => (ValueKind::TimeRemaining, 4, StateField::FilterCountdown),
        params::FILTER_COUNTDOWN_RESET => (ValueKind::Uint, 1, StateField::Ignored),
        params::RTC_TIME => (ValueKind::ClockTime, 3, StateField::RtcTime),
        params::RTC_DATE => (ValueKind::CalendarDate, 4, StateField::RtcDate),
        params::DEVICE_ID => (ValueKind::Ascii, 16, StateField::DeviceId),
        params::MACHINE_HOURS => (ValueKind::MachineHours, 4, StateField::MachineHours),
        params::ALARM_RESET => (ValueKind::Uint, 1, StateField::Ignored),
        params::ALARM_STATUS => (ValueKind::Uint, 1, StateField::AlarmStatus),
        params::FIRMWARE_VERSION => (ValueKind::FirmwareVersion, 6, StateField::Firmware),
        params::FILTER_STATUS => (ValueKind::Uint, 1, StateField::FilterStatus),
        params::NET_DHCP => (ValueKind::Uint, 1, StateField::NetDhcp),
        params::NET_IP => (ValueKind::Ipv4, 4, StateField::NetIp),
        params::NET_SUBNET => (ValueKind::Ipv4, 4, StateField::NetSubnet),
        params::NET_GATEWAY => (ValueKind::Ipv4, 4, StateField::NetGateway),
        params::CURRENT_IP => (ValueKind::Ipv4, 4, StateField::CurrentIp),
        params::OPERATION_MODE => (ValueKind::Uint, 1, StateField::OperationMode),
        params::MODEL_ID => (ValueKind::Uint, 2, StateField::ModelId),
        _ => (ValueKind::Uint, 1, StateField::Ignored),
    };

    ParamMetadata {
        kind,
        length,
        field,
    }
}

/// Errors returned when session credentials cannot be put on the wire.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum EncodingError {
    /// The device id contains bytes outside the ASCII range.
    #[error("device id `{value}` is not ASCII")]
    NonAsciiDeviceId { value: String },
    /// The device id exceeds the fixed 16-byte field.
    #[error("device id is {length} bytes long; the wire field holds exactly 16")]
    DeviceIdTooLong { length: usize },
    /// The password contains bytes outside the ASCII range.
    #[error("password is not ASCII")]
    NonAsciiPassword,
    /// The password does not fit its single length byte.
    #[error("password is {length} bytes long; at most 255 are allowed")]
    PasswordTooLong { length: usize },
}

/// Device identifier, padded to the fixed 16-byte wire field.
///
/// Shorter configured ids are zero-padded so the frame always matches the
/// length declared in its header.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct DeviceId([u8; DEVICE_ID_LEN]);

impl DeviceId {
    /// Broadcast id accepted by every controller.
    pub const DEFAULT: Self = Self(*b"DEFAULT_DEVICEID");

    /// Validates and pads a configured device id.
    ///
    /// # Errors
    ///
    /// Returns an error when the id is not ASCII or longer than 16 bytes.
    ///
    /// ```
    /// use vento::DeviceId;
    ///
    /// let id = DeviceId::new("003A001122334455")?;
    /// assert_eq!(b"003A001122334455", id.as_bytes());
    /// # Ok::<(), vento::EncodingError>(())
    /// ```
    pub fn new(value: &str) -> Result<Self, EncodingError> {
        if !value.is_ascii() {
            return Err(EncodingError::NonAsciiDeviceId {
                value: value.to_string(),
            });
        }
        if value.len() > DEVICE_ID_LEN {
            return Err(EncodingError::DeviceIdTooLong {
                length: value.len(),
            });
        }

        let mut padded = [0u8; DEVICE_ID_LEN];
        padded[..value.len()].copy_from_slice(value.as_bytes());
        Ok(Self(padded))
    }

    /// Returns the 16 wire bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; DEVICE_ID_LEN] {
        &self.0
    }
}

impl Default for DeviceId {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter().take_while(|byte| **byte != 0) {
            write!(f, "{}", *byte as char)?;
        }
        Ok(())
    }
}

impl FromStr for DeviceId {
    type Err = EncodingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

/// Shared-secret password carried in the authentication header.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Password(String);

impl Password {
    /// Validates a configured password.
    ///
    /// # Errors
    ///
    /// Returns an error when the password is not ASCII or longer than 255
    /// bytes.
    pub fn new(value: &str) -> Result<Self, EncodingError> {
        if !value.is_ascii() {
            return Err(EncodingError::NonAsciiPassword);
        }
        if value.len() > MAX_PASSWORD_LEN {
            return Err(EncodingError::PasswordTooLong {
                length: value.len(),
            });
        }
        Ok(Self(value.to_string()))
    }

    /// Returns the password bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Returns the wire length, guaranteed to fit one byte.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the password is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Password {
    fn default() -> Self {
        Self(DEFAULT_PASSWORD.to_string())
    }
}

impl FromStr for Password {
    type Err = EncodingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn registry_maps_expected_lengths() {
        let firmware = param_metadata(params::FIRMWARE_VERSION).expect("firmware should be mapped");
        assert_eq!(6, firmware.length());

        let countdown = param_metadata(params::FILTER_COUNTDOWN).expect("countdown should be mapped");
        assert_eq!(4, countdown.length());
    }

    #[test]
    fn registry_drops_unknown_parameters() {
        assert_eq!(None, param_metadata(ParamId::new(0x0105)));
    }

    #[rstest]
    #[case(params::FILTER_COUNTDOWN_RESET)]
    #[case(params::ALARM_RESET)]
    fn write_only_parameters_have_no_destination(#[case] param: ParamId) {
        let metadata = param_metadata(param).expect("write-only ids should still be mapped");
        assert_eq!(StateField::Ignored, metadata.field());
    }

    #[test]
    fn device_id_pads_short_values_with_zeroes() {
        let id = DeviceId::new("VENTO1").expect("short ASCII id should validate");
        assert_eq!(b"VENTO1\0\0\0\0\0\0\0\0\0\0", id.as_bytes());
        assert_eq!("VENTO1", id.to_string());
    }

    #[test]
    fn device_id_rejects_oversized_values() {
        let result = DeviceId::new("THIS_ID_IS_MUCH_TOO_LONG");
        assert_matches!(result, Err(EncodingError::DeviceIdTooLong { length: 24 }));
    }

    #[test]
    fn device_id_rejects_non_ascii_values() {
        let result = DeviceId::new("vent\u{00F6}");
        assert_matches!(result, Err(EncodingError::NonAsciiDeviceId { .. }));
    }

    #[test]
    fn password_rejects_oversized_values() {
        let long = "x".repeat(256);
        let result = Password::new(&long);
        assert_matches!(result, Err(EncodingError::PasswordTooLong { length: 256 }));
    }

    #[test]
    fn param_id_composes_from_page_and_low_byte() {
        let param = ParamId::from_page(0x01, 0x05);
        assert_eq!(0x0105, param.value());
        assert_eq!(0x05, param.low_byte());
        assert_eq!("0x0105", param.to_string());
    }
}
