use std::fmt;

use crate::protocol::ValueKind;
use crate::utils::format_hex;

/// Sentinel rendered when a firmware value is too short to decode.
const UNKNOWN_FIRMWARE: &str = "Unknown";

/// A decoded parameter value.
///
/// Decoding is deliberately lenient: values shorter than expected arrive
/// zero-padded from the stream parser, and no variant here represents a
/// failure. Anything that cannot be interpreted stays [`Value::Raw`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Little-endian unsigned integer.
    Uint(u64),
    /// ASCII text with trailing NULs stripped.
    Text(String),
    /// Dot-separated octets in wire order.
    Ipv4(String),
    /// Wall-clock time rendered `HH:MM:SS`.
    ClockTime(String),
    /// Calendar date rendered `YYYY-MM-DD`.
    CalendarDate(String),
    /// Total runtime in minutes.
    MachineMinutes(u32),
    /// Remaining time in fractional hours.
    HoursRemaining(f64),
    /// Firmware version rendered `major.minor (YYYY-MM-DD)`.
    Firmware(String),
    /// Raw bytes kept for diagnostics.
    Raw(Vec<u8>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uint(value) => write!(f, "{value}"),
            Self::Text(value)
            | Self::Ipv4(value)
            | Self::ClockTime(value)
            | Self::CalendarDate(value)
            | Self::Firmware(value) => write!(f, "{value}"),
            Self::MachineMinutes(value) => write!(f, "{value}"),
            Self::HoursRemaining(value) => write!(f, "{value}"),
            Self::Raw(bytes) => write!(f, "{}", format_hex(bytes)),
        }
    }
}

/// Decodes raw value bytes according to their registered kind.
pub(crate) fn decode(kind: ValueKind, raw: &[u8]) -> Value {
    match kind {
        ValueKind::Uint => Value::Uint(decode_uint(raw)),
        ValueKind::Ascii => Value::Text(decode_ascii(raw)),
        ValueKind::Ipv4 => Value::Ipv4(decode_ipv4(raw)),
        ValueKind::ClockTime => Value::ClockTime(decode_clock_time(raw)),
        ValueKind::CalendarDate => Value::CalendarDate(decode_calendar_date(raw)),
        ValueKind::MachineHours => Value::MachineMinutes(decode_machine_hours(raw)),
        ValueKind::TimeRemaining => Value::HoursRemaining(decode_time_remaining(raw)),
        ValueKind::FirmwareVersion => Value::Firmware(decode_firmware_version(raw)),
    }
}

fn byte_at(raw: &[u8], index: usize) -> u8 {
    raw.get(index).copied().unwrap_or(0)
}

/// Little-endian unsigned integer of up to eight bytes.
fn decode_uint(raw: &[u8]) -> u64 {
    raw.iter()
        .take(8)
        .enumerate()
        .fold(0u64, |acc, (index, byte)| {
            acc | (u64::from(*byte) << (8 * index))
        })
}

/// ASCII text; non-ASCII bytes are dropped, trailing NULs stripped.
fn decode_ascii(raw: &[u8]) -> String {
    let text: String = raw
        .iter()
        .filter(|byte| byte.is_ascii())
        .map(|byte| *byte as char)
        .collect();
    text.trim_end_matches('\0').to_string()
}

/// Octets rendered in the order they arrived; no reordering.
fn decode_ipv4(raw: &[u8]) -> String {
    raw.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

/// Seconds, minutes, hours.
fn decode_clock_time(raw: &[u8]) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        byte_at(raw, 2),
        byte_at(raw, 1),
        byte_at(raw, 0)
    )
}

/// Day, day-of-week (not rendered), month, year offset from 2000.
fn decode_calendar_date(raw: &[u8]) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        2000 + u16::from(byte_at(raw, 3)),
        byte_at(raw, 2),
        byte_at(raw, 0)
    )
}

/// Minutes, hours, little-endian days, folded into total minutes.
fn decode_machine_hours(raw: &[u8]) -> u32 {
    let minutes = u32::from(byte_at(raw, 0));
    let hours = u32::from(byte_at(raw, 1));
    let days = u32::from(byte_at(raw, 2)) + (u32::from(byte_at(raw, 3)) << 8);
    days * 24 * 60 + hours * 60 + minutes
}

/// Minutes, hours, days remaining, as fractional hours. The fourth wire byte
/// is padding and does not contribute.
fn decode_time_remaining(raw: &[u8]) -> f64 {
    let minutes = f64::from(byte_at(raw, 0));
    let hours = f64::from(byte_at(raw, 1));
    let days = f64::from(byte_at(raw, 2));
    days * 24.0 + hours + minutes / 60.0
}

/// Major, minor, day, month, little-endian year.
fn decode_firmware_version(raw: &[u8]) -> String {
    if raw.len() < 6 {
        return UNKNOWN_FIRMWARE.to_string();
    }

    let year = u16::from_le_bytes([raw[4], raw[5]]);
    format!("{}.{} ({year:04}-{:02}-{:02})", raw[0], raw[1], raw[3], raw[2])
}
