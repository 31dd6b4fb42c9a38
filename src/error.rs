use derive_more::From;
use thiserror::Error;

use crate::handlers::FrameCodecError;
use crate::protocol::EncodingError;

/// Errors returned by UDP transport interaction.
#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("UDP socket operation failed")]
    Socket { source: std::io::Error },
    #[error("fake transport reply script is exhausted")]
    RepliesExhausted,
}

/// Errors returned when parsing fake transport fixtures.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("fixture reply is not valid hexadecimal: `{value}`")]
    InvalidHexPayload { value: String },
}

/// Errors returned when validating runtime CLI options.
#[derive(Debug, Error)]
pub(crate) enum CliConfigError {
    #[error("missing --host while the real UDP transport is selected")]
    MissingHost,
    #[error("missing fake reply script while fake mode is enabled")]
    MissingFakeReplies,
}

/// Errors returned by telemetry initialisation.
#[derive(Debug, Error)]
pub(crate) enum TelemetryError {
    #[error("failed to install tracing subscriber")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Top-level protocol errors wrapping module-specific error types.
#[derive(Debug, Error, From)]
pub enum ProtocolError {
    #[error(transparent)]
    #[from(FrameCodecError, Box<FrameCodecError>)]
    Framing(Box<FrameCodecError>),
    #[error(transparent)]
    #[from(EncodingError, Box<EncodingError>)]
    Encoding(Box<EncodingError>),
    #[error(transparent)]
    #[from(InteractionError, Box<InteractionError>)]
    Interaction(Box<InteractionError>),
    #[error(transparent)]
    #[from(FixtureError, Box<FixtureError>)]
    Fixture(Box<FixtureError>),
}
