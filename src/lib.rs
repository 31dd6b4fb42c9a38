mod app;
mod cli;
mod error;
mod handlers;
mod hw;
mod protocol;
mod telemetry;
mod utils;

pub use app::{fake_transport, run, transport_from_selection, udp_transport};
pub use cli::{
    Args, Command, ControlAction, ControlArgs, FakeArgs, LogLevel, ModeArg, ModeArgs, OutputFormat,
    PowerOnArgs, SetClockArgs, SpeedArg, TransportSelection,
};
pub use error::{FixtureError, InteractionError, ProtocolError};
pub use handlers::{
    ChecksumMode, ClockHandler, FrameCodec, FrameCodecError, MaintenanceHandler, NetworkHandler,
    ParamRecord, ParamStream, PowerHandler, StatusHandler, Value, frame_checksum,
};
pub use hw::{
    AlarmState, DEFAULT_RECEIVE_TIMEOUT, DeviceSession, DeviceState, ExchangeOutcome,
    ExchangeReply, FakeTransport, FilterStatus, OperationMode, ReplyScript, RequestLog,
    SINGLE_FAN_MODEL_ID, SessionConfig, SpeedThreshold, TransportClient, UdpTarget,
    available_modes, available_speed_thresholds,
};
pub use protocol::{
    DEFAULT_DEVICE_ID, DEFAULT_PASSWORD, DEFAULT_PORT, DEVICE_ID_LEN, DeviceId, EncodingError,
    FRAME_MAGIC, MAX_REPLY_LEN, OpCode, ParamId, Password, params,
};
