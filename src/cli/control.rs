use std::io;

use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::instrument;

use crate::cli::OutputFormat;
use crate::handlers::{ClockHandler, MaintenanceHandler, PowerHandler};
use crate::hw::{DeviceSession, OperationMode, SpeedThreshold};

/// JSON result emitted by a `control` action.
#[derive(Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum ControlResult {
    PowerOn {
        speed: SpeedThreshold,
        mode: OperationMode,
        outcome: String,
    },
    PowerOff {
        outcome: String,
    },
    Mode {
        mode: OperationMode,
        outcome: String,
    },
    SetClock {
        unix_timestamp: i64,
        outcome: String,
    },
    ResetAlarm {
        outcome: String,
    },
    ResetFilter {
        outcome: String,
    },
}

/// Arguments for the `control` command.
#[derive(Debug, Args)]
pub struct ControlArgs {
    #[command(subcommand)]
    action: ControlAction,
}

impl ControlArgs {
    /// Creates control arguments for one action.
    #[must_use]
    pub fn new(action: ControlAction) -> Self {
        Self { action }
    }
}

/// Action performed by the `control` command.
#[derive(Debug, Subcommand)]
pub enum ControlAction {
    /// Turn the unit on, applying a speed threshold and operation mode.
    On(PowerOnArgs),
    /// Put the unit into stand-by.
    Off,
    /// Set the operation mode without touching the power state.
    Mode(ModeArgs),
    /// Write the controller's RTC date and time.
    SetClock(SetClockArgs),
    /// Clear the alarm condition.
    ResetAlarm,
    /// Restart the filter-replacement countdown.
    ResetFilter,
}

/// Arguments for `control on`.
#[derive(Debug, Args)]
pub struct PowerOnArgs {
    /// Speed threshold to apply.
    #[arg(long, value_enum, default_value_t = SpeedArg::Low)]
    speed: SpeedArg,
    /// Operation mode to apply.
    #[arg(long, value_enum, default_value_t = ModeArg::HeatRecovery)]
    mode: ModeArg,
}

impl PowerOnArgs {
    /// Creates power-on arguments.
    #[must_use]
    pub fn new(speed: SpeedArg, mode: ModeArg) -> Self {
        Self { speed, mode }
    }
}

/// Arguments for `control mode`.
#[derive(Debug, Args)]
pub struct ModeArgs {
    #[arg(value_enum)]
    mode: ModeArg,
}

impl ModeArgs {
    /// Creates mode arguments.
    #[must_use]
    pub fn new(mode: ModeArg) -> Self {
        Self { mode }
    }
}

/// Arguments for `control set-clock`.
#[derive(Debug, Args)]
pub struct SetClockArgs {
    /// Unix timestamp in UTC seconds. Uses current UTC time when omitted.
    #[arg(long)]
    unix: Option<i64>,
}

impl SetClockArgs {
    /// Creates set-clock arguments.
    #[must_use]
    pub fn new(unix: Option<i64>) -> Self {
        Self { unix }
    }

    fn resolve_timestamp(&self) -> Result<OffsetDateTime> {
        match self.unix {
            Some(value) => OffsetDateTime::from_unix_timestamp(value)
                .with_context(|| format!("invalid unix timestamp: {value}")),
            None => Ok(OffsetDateTime::now_utc()),
        }
    }
}

/// Requested speed threshold.
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum SpeedArg {
    Low,
    Medium,
    High,
}

impl SpeedArg {
    fn to_handler_speed(self) -> SpeedThreshold {
        match self {
            Self::Low => SpeedThreshold::Low,
            Self::Medium => SpeedThreshold::Medium,
            Self::High => SpeedThreshold::High,
        }
    }
}

/// Requested operation mode.
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum ModeArg {
    Ventilation,
    HeatRecovery,
    Supply,
}

impl ModeArg {
    fn to_handler_mode(self) -> OperationMode {
        match self {
            Self::Ventilation => OperationMode::Ventilation,
            Self::HeatRecovery => OperationMode::HeatRecovery,
            Self::Supply => OperationMode::Supply,
        }
    }
}

/// Executes the `control` command.
#[instrument(skip(session, args, out), level = "info", fields(action = ?args.action, ?output_format))]
pub(crate) async fn run<W>(
    session: &mut DeviceSession,
    args: &ControlArgs,
    out: &mut W,
    output_format: OutputFormat,
) -> Result<()>
where
    W: io::Write,
{
    match &args.action {
        ControlAction::On(on_args) => {
            let speed = on_args.speed.to_handler_speed();
            let mode = on_args.mode.to_handler_mode();
            let outcome = PowerHandler::turn_on(session, speed, mode).await?;
            match output_format {
                OutputFormat::Pretty => {
                    writeln!(out, "Turned on: speed {speed}, mode {mode} ({outcome})")?;
                }
                OutputFormat::Json => {
                    write_json_line(
                        out,
                        &ControlResult::PowerOn {
                            speed,
                            mode,
                            outcome: outcome.to_string(),
                        },
                    )?;
                }
            }
        }
        ControlAction::Off => {
            let outcome = PowerHandler::turn_off(session).await?;
            match output_format {
                OutputFormat::Pretty => {
                    writeln!(out, "Turned off ({outcome})")?;
                }
                OutputFormat::Json => {
                    write_json_line(
                        out,
                        &ControlResult::PowerOff {
                            outcome: outcome.to_string(),
                        },
                    )?;
                }
            }
        }
        ControlAction::Mode(mode_args) => {
            let mode = mode_args.mode.to_handler_mode();
            let outcome = PowerHandler::set_operation_mode(session, mode).await?;
            match output_format {
                OutputFormat::Pretty => {
                    writeln!(out, "Applied operation mode: {mode} ({outcome})")?;
                }
                OutputFormat::Json => {
                    write_json_line(
                        out,
                        &ControlResult::Mode {
                            mode,
                            outcome: outcome.to_string(),
                        },
                    )?;
                }
            }
        }
        ControlAction::SetClock(clock_args) => {
            let timestamp = clock_args.resolve_timestamp()?;
            let outcome = ClockHandler::set_clock(session, timestamp).await?;
            match output_format {
                OutputFormat::Pretty => {
                    writeln!(
                        out,
                        "Set RTC clock (UTC unix): {} ({outcome})",
                        timestamp.unix_timestamp()
                    )?;
                }
                OutputFormat::Json => {
                    write_json_line(
                        out,
                        &ControlResult::SetClock {
                            unix_timestamp: timestamp.unix_timestamp(),
                            outcome: outcome.to_string(),
                        },
                    )?;
                }
            }
        }
        ControlAction::ResetAlarm => {
            let outcome = MaintenanceHandler::reset_alarm(session).await?;
            match output_format {
                OutputFormat::Pretty => {
                    writeln!(out, "Reset alarm ({outcome})")?;
                }
                OutputFormat::Json => {
                    write_json_line(
                        out,
                        &ControlResult::ResetAlarm {
                            outcome: outcome.to_string(),
                        },
                    )?;
                }
            }
        }
        ControlAction::ResetFilter => {
            let outcome = MaintenanceHandler::reset_filter_countdown(session).await?;
            match output_format {
                OutputFormat::Pretty => {
                    writeln!(out, "Reset filter countdown ({outcome})")?;
                }
                OutputFormat::Json => {
                    write_json_line(
                        out,
                        &ControlResult::ResetFilter {
                            outcome: outcome.to_string(),
                        },
                    )?;
                }
            }
        }
    }

    Ok(())
}

fn write_json_line(out: &mut impl io::Write, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
