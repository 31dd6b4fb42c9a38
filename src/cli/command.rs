use std::time::Duration;

use bon::Builder;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::filter::LevelFilter;

use crate::cli::control::ControlArgs;
use crate::error::{CliConfigError, FixtureError};
use crate::hw::{
    DEFAULT_RECEIVE_TIMEOUT, FakeTransportConfig, ReplyScript, SessionConfig, UdpTarget,
};
use crate::protocol::{
    DEFAULT_DEVICE_ID, DEFAULT_PASSWORD, DEFAULT_PORT, DeviceId, EncodingError, Password,
};

/// Command-line options for the Vento UDP tool.
#[derive(Debug, Parser)]
#[command(name = "vento", about = "Control Blauberg Vento ventilation units over UDP.")]
pub struct Args {
    /// Controller host name or IP address.
    #[arg(long, global = true)]
    host: Option<String>,
    /// Controller UDP port.
    #[arg(long, global = true, default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Display name for reports.
    #[arg(long, global = true)]
    name: Option<String>,
    /// Device id; the factory broadcast id addresses any unit.
    #[arg(long, global = true, default_value = DEFAULT_DEVICE_ID, value_parser = parse_device_id)]
    device_id: DeviceId,
    /// Controller password.
    #[arg(long, global = true, default_value = DEFAULT_PASSWORD, value_parser = parse_password)]
    password: Password,
    /// Receive timeout per exchange (e.g. `500ms`, `15s`).
    #[arg(long, global = true, value_parser = parse_duration)]
    timeout: Option<Duration>,
    /// Reject replies whose checksum does not verify.
    #[arg(long, global = true)]
    verify_checksums: bool,
    /// Telemetry log level override.
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,
    /// Output format; defaults to pretty on a terminal, JSON otherwise.
    #[arg(long, global = true, value_enum)]
    output: Option<OutputFormat>,
    /// Uses the fake transport with scripted replies instead of UDP.
    #[arg(long, global = true)]
    fake: bool,
    /// Scripted replies: semicolon-separated hex datagrams; `timeout` or an
    /// empty segment scripts a receive timeout.
    #[arg(long, global = true, requires = "fake", required_if_eq("fake", "true"))]
    fake_replies: Option<ReplyScript>,
    /// Artificial per-exchange delay for the fake transport (e.g. `250ms`).
    #[arg(long, global = true, requires = "fake", value_parser = parse_duration)]
    fake_delay: Option<Duration>,
    #[command(subcommand)]
    command: Command,
}

impl Args {
    /// Returns the telemetry log-level override, if any.
    #[must_use]
    pub fn log_level(&self) -> Option<LogLevel> {
        self.log_level
    }

    /// Returns the explicit output format, if any.
    #[must_use]
    pub fn output_format(&self) -> Option<OutputFormat> {
        self.output
    }

    /// Splits parsed CLI arguments into the command, session configuration
    /// and transport selection.
    ///
    /// # Errors
    ///
    /// Returns an error when the transport configuration is incomplete.
    pub fn into_parts(self) -> anyhow::Result<(Command, SessionConfig, TransportSelection)> {
        let Args {
            host,
            port,
            name,
            device_id,
            password,
            timeout,
            verify_checksums,
            log_level: _,
            output: _,
            fake,
            fake_replies,
            fake_delay,
            command,
        } = self;

        let session = SessionConfig::builder()
            .maybe_name(name)
            .device_id(device_id)
            .password(password)
            .verify_checksums(verify_checksums)
            .build();

        let transport = if fake {
            let Some(replies) = fake_replies else {
                return Err(CliConfigError::MissingFakeReplies.into());
            };
            TransportSelection::Fake(FakeArgs {
                reply_script: replies,
                exchange_delay: fake_delay.unwrap_or(Duration::ZERO),
            })
        } else {
            let Some(host) = host else {
                return Err(CliConfigError::MissingHost.into());
            };
            TransportSelection::Udp(
                UdpTarget::builder()
                    .host(host)
                    .port(port)
                    .receive_timeout(timeout.unwrap_or(DEFAULT_RECEIVE_TIMEOUT))
                    .build(),
            )
        };

        Ok((command, session, transport))
    }
}

/// Transport chosen by the CLI flags.
#[derive(Debug)]
pub enum TransportSelection {
    /// Real UDP socket towards a controller.
    Udp(UdpTarget),
    /// Scripted fake transport.
    Fake(FakeArgs),
}

/// Fake transport arguments for programmatic runs.
#[derive(Debug, Builder)]
pub struct FakeArgs {
    #[builder(with = |value: &str| -> std::result::Result<_, FixtureError> { value.parse() })]
    reply_script: ReplyScript,
    #[builder(default)]
    exchange_delay: Duration,
}

impl FakeArgs {
    pub(crate) fn into_backend_config(self) -> FakeTransportConfig {
        let Self {
            reply_script,
            exchange_delay,
        } = self;

        FakeTransportConfig::builder()
            .replies(reply_script)
            .exchange_delay(exchange_delay)
            .build()
    }
}

/// Supported CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read the full state, diagnostics and clock, then print the snapshot.
    Status,
    /// Read the network settings.
    Network,
    /// Query the firmware version (cached per session).
    Firmware,
    /// Send one control command.
    Control(ControlArgs),
}

/// Telemetry log level selected on the command line.
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Converts to a tracing level filter.
    #[must_use]
    pub(crate) fn as_level_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::ERROR,
            Self::Warn => LevelFilter::WARN,
            Self::Info => LevelFilter::INFO,
            Self::Debug => LevelFilter::DEBUG,
            Self::Trace => LevelFilter::TRACE,
        }
    }
}

/// Output rendering selected on the command line.
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables.
    Pretty,
    /// JSON lines for scripting.
    Json,
}

fn parse_device_id(value: &str) -> Result<DeviceId, String> {
    value
        .parse()
        .map_err(|error: EncodingError| error.to_string())
}

fn parse_password(value: &str) -> Result<Password, String> {
    value
        .parse()
        .map_err(|error: EncodingError| error.to_string())
}

fn parse_duration(value: &str) -> Result<Duration, String> {
    humantime::parse_duration(value).map_err(|error| error.to_string())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use clap::error::ErrorKind;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn fake_mode_requires_reply_script() {
        let result = Args::try_parse_from(["vento", "--fake", "status"]);

        let error = result.expect_err("missing --fake-replies should fail argument parsing");
        assert_eq!(ErrorKind::MissingRequiredArgument, error.kind());
    }

    #[test]
    fn fake_replies_require_fake_mode() {
        let result = Args::try_parse_from(["vento", "--fake-replies", "FDFD", "status"]);

        let error = result.expect_err("--fake-replies should require --fake");
        assert_eq!(ErrorKind::MissingRequiredArgument, error.kind());
    }

    #[test]
    fn real_mode_requires_host() {
        let args = Args::try_parse_from(["vento", "status"])
            .expect("status without --host should parse");
        let result = args.into_parts();
        assert_matches!(result, Err(_));
    }

    #[test]
    fn fake_mode_builds_fake_transport_selection() {
        let args = Args::try_parse_from([
            "vento",
            "--fake",
            "--fake-replies",
            "timeout",
            "status",
        ])
        .expect("valid fake arguments should parse");

        let (command, _session, transport) = args
            .into_parts()
            .expect("valid fake arguments should resolve");
        assert_matches!(command, Command::Status);
        assert_matches!(transport, TransportSelection::Fake(_));
    }

    #[test]
    fn real_mode_builds_udp_target_with_defaults() {
        let args = Args::try_parse_from(["vento", "--host", "192.168.1.50", "status"])
            .expect("valid real-mode arguments should parse");

        let (_command, session, transport) = args
            .into_parts()
            .expect("valid real-mode arguments should resolve");
        assert_eq!(&DeviceId::DEFAULT, session.device_id());

        let TransportSelection::Udp(target) = transport else {
            panic!("real mode should select the UDP transport");
        };
        assert_eq!("192.168.1.50", target.host());
        assert_eq!(DEFAULT_PORT, target.port());
        assert_eq!(DEFAULT_RECEIVE_TIMEOUT, target.receive_timeout());
    }

    #[test]
    fn device_id_flag_rejects_oversized_values() {
        let result = Args::try_parse_from([
            "vento",
            "--host",
            "10.0.0.2",
            "--device-id",
            "THIS_ID_IS_MUCH_TOO_LONG",
            "status",
        ]);
        assert_matches!(result, Err(_));
    }
}
