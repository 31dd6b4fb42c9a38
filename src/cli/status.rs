use std::io;

use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::instrument;

use crate::cli::OutputFormat;
use crate::handlers::{NetworkHandler, StatusHandler};
use crate::hw::{
    AlarmState, DeviceSession, DeviceState, ExchangeOutcome, FilterStatus, OperationMode,
    SpeedThreshold,
};
use crate::utils::display_or_dash;

/// JSON snapshot emitted by the `status` command.
#[derive(Serialize)]
struct StatusReport<'a> {
    name: Option<&'a str>,
    outcome: String,
    device_id: Option<&'a str>,
    model: String,
    firmware: Option<String>,
    power: Option<bool>,
    speed: Option<SpeedThreshold>,
    mode: Option<OperationMode>,
    alarm: Option<AlarmState>,
    humidity_percent: Option<u64>,
    rtc: Option<String>,
    fan1_rpm: Option<u64>,
    fan2_rpm: Option<u64>,
    filter: Option<FilterStatus>,
    filter_days_left: Option<u64>,
    machine_hours: Option<f64>,
    battery_volts: Option<f64>,
}

/// JSON snapshot emitted by the `network` command.
#[derive(Serialize)]
struct NetworkReport<'a> {
    outcome: String,
    dhcp: Option<bool>,
    ip_address: Option<&'a str>,
    subnet_mask: Option<&'a str>,
    gateway: Option<&'a str>,
    current_ip: Option<&'a str>,
}

#[derive(Tabled)]
struct Row {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

impl Row {
    fn new(field: &'static str, value: String) -> Self {
        Self { field, value }
    }
}

/// Executes the `status` command.
#[instrument(skip(session, out), level = "info", fields(?output_format))]
pub(crate) async fn run_status<W>(
    session: &mut DeviceSession,
    out: &mut W,
    output_format: OutputFormat,
) -> Result<()>
where
    W: io::Write,
{
    let outcome = StatusHandler::refresh_all(session).await?;
    let firmware = session.firmware_version().await?;

    match output_format {
        OutputFormat::Pretty => render_status_table(session, outcome, out)?,
        OutputFormat::Json => {
            let state = session.state();
            let report = StatusReport {
                name: session.config().name(),
                outcome: outcome.to_string(),
                device_id: state.device_id(),
                model: state.model(),
                firmware,
                power: state.is_on(),
                speed: state.speed_threshold(),
                mode: state.operation_mode(),
                alarm: state.alarm(),
                humidity_percent: state.humidity(),
                rtc: state.rtc_datetime(),
                fan1_rpm: state.fan1_rpm(),
                fan2_rpm: state.fan2_rpm(),
                filter: state.filter_status(),
                filter_days_left: state.filter_countdown_days(),
                machine_hours: state.machine_hours(),
                battery_volts: state.battery_volts(),
            };
            write_json_line(out, &report)?;
        }
    }

    Ok(())
}

fn render_status_table(
    session: &DeviceSession,
    outcome: ExchangeOutcome,
    out: &mut impl io::Write,
) -> Result<()> {
    let state = session.state();
    if outcome == ExchangeOutcome::NoUpdate {
        writeln!(
            out,
            "{} no reply from the device; values below may be stale",
            "!".yellow()
        )?;
    }

    let rows = vec![
        Row::new("Device id", display_or_dash(state.device_id())),
        Row::new("Model", state.model()),
        Row::new("Firmware", display_or_dash(state.firmware())),
        Row::new("Power", display_or_dash(state.is_on().map(on_off))),
        Row::new("Speed", display_or_dash(state.speed_threshold())),
        Row::new("Mode", display_or_dash(state.operation_mode())),
        Row::new("Alarm", render_alarm(state)),
        Row::new("Humidity", display_or_dash(state.humidity().map(|v| format!("{v} %")))),
        Row::new("RTC", display_or_dash(state.rtc_datetime())),
        Row::new("Fan 1", display_or_dash(state.fan1_rpm().map(|v| format!("{v} rpm")))),
        Row::new("Fan 2", display_or_dash(state.fan2_rpm().map(|v| format!("{v} rpm")))),
        Row::new("Filter", display_or_dash(state.filter_status())),
        Row::new(
            "Filter countdown",
            display_or_dash(state.filter_countdown_days().map(|v| format!("{v} days"))),
        ),
        Row::new(
            "Machine hours",
            display_or_dash(state.machine_hours().map(|v| format!("{v} h"))),
        ),
        Row::new(
            "Battery",
            display_or_dash(state.battery_volts().map(|v| format!("{v:.3} V"))),
        ),
    ];

    let mut table = Table::new(rows);
    table.with(Style::sharp());
    writeln!(out, "{table}")?;
    Ok(())
}

fn render_alarm(state: &DeviceState) -> String {
    match state.alarm() {
        None => "-".to_string(),
        Some(AlarmState::Ok) => AlarmState::Ok.green().to_string(),
        Some(AlarmState::Alarm) => AlarmState::Alarm.red().to_string(),
        Some(AlarmState::Warning) => AlarmState::Warning.yellow().to_string(),
        Some(AlarmState::Unknown) => AlarmState::Unknown.to_string(),
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

/// Executes the `network` command.
#[instrument(skip(session, out), level = "info", fields(?output_format))]
pub(crate) async fn run_network<W>(
    session: &mut DeviceSession,
    out: &mut W,
    output_format: OutputFormat,
) -> Result<()>
where
    W: io::Write,
{
    let outcome = NetworkHandler::refresh_network(session).await?;
    let state = session.state();

    match output_format {
        OutputFormat::Pretty => {
            let rows = vec![
                Row::new("DHCP", display_or_dash(state.dhcp_enabled().map(on_off))),
                Row::new("IP address", display_or_dash(state.ip_address())),
                Row::new("Subnet mask", display_or_dash(state.subnet_mask())),
                Row::new("Gateway", display_or_dash(state.gateway())),
                Row::new("Current IP", display_or_dash(state.current_ip())),
            ];
            let mut table = Table::new(rows);
            table.with(Style::sharp());
            writeln!(out, "{table}")?;
        }
        OutputFormat::Json => {
            let report = NetworkReport {
                outcome: outcome.to_string(),
                dhcp: state.dhcp_enabled(),
                ip_address: state.ip_address(),
                subnet_mask: state.subnet_mask(),
                gateway: state.gateway(),
                current_ip: state.current_ip(),
            };
            write_json_line(out, &report)?;
        }
    }

    Ok(())
}

/// Executes the `firmware` command.
#[instrument(skip(session, out), level = "info", fields(?output_format))]
pub(crate) async fn run_firmware<W>(
    session: &mut DeviceSession,
    out: &mut W,
    output_format: OutputFormat,
) -> Result<()>
where
    W: io::Write,
{
    let firmware = session.firmware_version().await?;

    match output_format {
        OutputFormat::Pretty => {
            writeln!(out, "Firmware: {}", display_or_dash(firmware))?;
        }
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct FirmwareReport {
                firmware: Option<String>,
            }
            write_json_line(out, &FirmwareReport { firmware })?;
        }
    }

    Ok(())
}

fn write_json_line(out: &mut impl io::Write, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
