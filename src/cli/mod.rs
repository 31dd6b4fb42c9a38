pub(crate) mod command;
pub(crate) mod control;
pub(crate) mod status;

pub use self::command::{Args, Command, FakeArgs, LogLevel, OutputFormat, TransportSelection};
pub use self::control::{
    ControlAction, ControlArgs, ModeArg, ModeArgs, PowerOnArgs, SetClockArgs, SpeedArg,
};
