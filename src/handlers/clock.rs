use time::OffsetDateTime;
use tracing::instrument;

use crate::error::ProtocolError;
use crate::hw::{DeviceSession, ExchangeOutcome};
use crate::protocol::{OpCode, params};

use super::param_stream::write_block;

/// Handler for setting the controller's real-time clock.
pub struct ClockHandler;

impl ClockHandler {
    fn payload_for(timestamp: OffsetDateTime) -> Vec<u8> {
        // The RTC year is a single byte offset from 2000.
        let year = u8::try_from(timestamp.year().clamp(2000, 2255) - 2000)
            .expect("clamped year offset always fits in u8");
        let month = timestamp.month() as u8;
        let day = timestamp.day();
        let weekday = timestamp.weekday().number_from_monday();
        let hour = timestamp.hour();
        let minute = timestamp.minute();
        let second = timestamp.second();

        let mut payload = write_block(params::RTC_TIME, &[second, minute, hour]);
        payload.extend(write_block(params::RTC_DATE, &[day, weekday, month, year]));
        payload
    }

    /// Writes the RTC time and date in one write-then-read exchange.
    ///
    /// # Errors
    ///
    /// Returns an error when the reply envelope cannot be decoded.
    #[instrument(
        skip(session),
        level = "debug",
        fields(unix_timestamp = timestamp.unix_timestamp())
    )]
    pub async fn set_clock(
        session: &mut DeviceSession,
        timestamp: OffsetDateTime,
    ) -> Result<ExchangeOutcome, ProtocolError> {
        session
            .exchange(
                OpCode::WriteThenRead,
                Some(0x0000),
                &Self::payload_for(timestamp),
            )
            .await
    }
}
