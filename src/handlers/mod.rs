mod clock;
mod frame_codec;
mod maintenance;
mod network;
mod param_stream;
mod power;
mod status;
pub(crate) mod value_codec;

pub use self::clock::ClockHandler;
pub use self::frame_codec::{ChecksumMode, FrameCodec, FrameCodecError, frame_checksum};
pub use self::maintenance::MaintenanceHandler;
pub use self::network::NetworkHandler;
pub(crate) use self::param_stream::read_request_payload;
pub use self::param_stream::{ParamRecord, ParamStream};
pub use self::power::PowerHandler;
pub use self::status::StatusHandler;
pub use self::value_codec::Value;
