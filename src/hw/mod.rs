mod fake_backend;
mod hardware;
mod model;
mod session;
mod udp_backend;

pub(crate) use self::fake_backend::FakeTransportConfig;
pub use self::fake_backend::{FakeTransport, ReplyScript, RequestLog};
pub use self::hardware::{ExchangeReply, TransportClient};
pub(crate) use self::hardware::{fake_transport_client, udp_transport_client};
pub use self::model::{
    AlarmState, DeviceState, FilterStatus, OperationMode, SINGLE_FAN_MODEL_ID, SpeedThreshold,
    available_modes, available_speed_thresholds,
};
pub use self::session::{DeviceSession, ExchangeOutcome, SessionConfig};
pub use self::udp_backend::{DEFAULT_RECEIVE_TIMEOUT, UdpTarget};
