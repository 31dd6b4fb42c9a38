use std::io;

use anyhow::Result;
use tracing::instrument;

use crate::cli::{Command, FakeArgs, LogLevel, OutputFormat, TransportSelection};
use crate::hw::{
    DeviceSession, SessionConfig, TransportClient, UdpTarget,
    fake_transport_client as build_fake_transport_client,
    udp_transport_client as build_udp_transport_client,
};
use crate::telemetry;

/// Creates a transport client backed by a real UDP socket.
#[must_use]
pub fn udp_transport(target: UdpTarget) -> Box<dyn TransportClient> {
    build_udp_transport_client(target)
}

/// Creates a transport client backed by scripted fixture replies.
#[must_use]
pub fn fake_transport(fake_args: FakeArgs) -> Box<dyn TransportClient> {
    build_fake_transport_client(fake_args.into_backend_config())
}

/// Builds the transport selected on the command line.
#[must_use]
pub fn transport_from_selection(selection: TransportSelection) -> Box<dyn TransportClient> {
    match selection {
        TransportSelection::Udp(target) => udp_transport(target),
        TransportSelection::Fake(fake_args) => fake_transport(fake_args),
    }
}

/// Runs one CLI command against a fresh session.
///
/// ```
/// # async fn demo() -> anyhow::Result<()> {
/// use clap::Parser;
///
/// let args = vento::Args::try_parse_from([
///     "vento",
///     "--fake",
///     "--fake-replies",
///     "timeout",
///     "firmware",
/// ])?;
/// let log_level = args.log_level();
/// let output_format = args.output_format().unwrap_or(vento::OutputFormat::Json);
/// let (command, session_config, selection) = args.into_parts()?;
/// let transport = vento::transport_from_selection(selection);
///
/// let mut out = Vec::new();
/// vento::run(command, &mut out, session_config, transport, log_level, output_format).await?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns an error if tracing initialisation fails, a reply cannot be
/// decoded, or output writing fails.
#[instrument(
    skip(out, session_config, transport),
    level = "info",
    fields(command = %command_name(&command), ?log_level, ?output_format)
)]
pub async fn run<W>(
    command: Command,
    out: &mut W,
    session_config: SessionConfig,
    transport: Box<dyn TransportClient>,
    log_level: Option<LogLevel>,
    output_format: OutputFormat,
) -> Result<()>
where
    W: io::Write,
{
    telemetry::initialise_tracing(log_level.map(LogLevel::as_level_filter))?;

    let mut session = DeviceSession::new(session_config, transport);
    match command {
        Command::Status => crate::cli::status::run_status(&mut session, out, output_format).await,
        Command::Network => {
            crate::cli::status::run_network(&mut session, out, output_format).await
        }
        Command::Firmware => {
            crate::cli::status::run_firmware(&mut session, out, output_format).await
        }
        Command::Control(args) => {
            crate::cli::control::run(&mut session, &args, out, output_format).await
        }
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Status => "status",
        Command::Network => "network",
        Command::Firmware => "firmware",
        Command::Control(_args) => "control",
    }
}
