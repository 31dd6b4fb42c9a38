use pretty_assertions::assert_eq;
use time::{Date, Month, PrimitiveDateTime, Time, UtcOffset};

use vento::{
    ClockHandler, DeviceId, DeviceSession, FakeTransport, FrameCodec, MaintenanceHandler, OpCode,
    OperationMode, Password, PowerHandler, RequestLog, SessionConfig, SpeedThreshold,
    StatusHandler, frame_checksum, params,
};

fn session_with_timeouts(count: usize) -> (DeviceSession, RequestLog) {
    let script = vec!["timeout"; count]
        .join(";")
        .parse()
        .expect("timeout script should parse");
    let transport = FakeTransport::from_script(script);
    let log = transport.request_log();
    let session = DeviceSession::new(SessionConfig::default(), Box::new(transport));
    (session, log)
}

fn expected_frame(command: OpCode, function: Option<u16>, payload: &[u8]) -> Vec<u8> {
    FrameCodec::encode(
        &DeviceId::DEFAULT,
        &Password::default(),
        command,
        function,
        payload,
    )
}

fn reply_frame(payload: &[u8]) -> Vec<u8> {
    let mut body = vec![0x02, 0x10];
    body.extend_from_slice(b"DEFAULT_DEVICEID");
    body.push(0x04);
    body.extend_from_slice(b"1111");
    body.extend_from_slice(payload);

    let checksum = frame_checksum(&body);
    let mut frame = vec![0xFD, 0xFD];
    frame.extend_from_slice(&body);
    frame.extend_from_slice(&checksum);
    frame
}

#[tokio::test]
async fn turn_on_sends_write_blocks_without_function_field() -> anyhow::Result<()> {
    let (mut session, log) = session_with_timeouts(1);

    PowerHandler::turn_on(&mut session, SpeedThreshold::Medium, OperationMode::Ventilation)
        .await?;

    let expected = expected_frame(
        OpCode::WriteThenRead,
        None,
        &[0xFE, 0x03, 0x01, 0x01, 0xFE, 0x03, 0x02, 0x02, 0xFE, 0x03, 0xB7, 0x00],
    );
    assert_eq!(vec![expected], log.snapshot());
    Ok(())
}

#[tokio::test]
async fn turn_off_targets_the_power_parameter() -> anyhow::Result<()> {
    let (mut session, log) = session_with_timeouts(1);

    PowerHandler::turn_off(&mut session).await?;

    let expected = expected_frame(
        OpCode::WriteThenRead,
        Some(params::DEVICE_ON.value()),
        &[0x00],
    );
    assert_eq!(vec![expected], log.snapshot());
    Ok(())
}

#[tokio::test]
async fn set_operation_mode_writes_one_mode_byte() -> anyhow::Result<()> {
    let (mut session, log) = session_with_timeouts(1);

    PowerHandler::set_operation_mode(&mut session, OperationMode::Supply).await?;

    let expected = expected_frame(
        OpCode::WriteThenRead,
        Some(params::OPERATION_MODE.value()),
        &[0x02],
    );
    assert_eq!(vec![expected], log.snapshot());
    Ok(())
}

#[tokio::test]
async fn set_clock_writes_time_and_date_blocks() -> anyhow::Result<()> {
    let (mut session, log) = session_with_timeouts(1);

    // 2024-06-15 is a Saturday (day-of-week 6).
    let timestamp = PrimitiveDateTime::new(
        Date::from_calendar_date(2024, Month::June, 15)?,
        Time::from_hms(22, 30, 5)?,
    )
    .assume_offset(UtcOffset::UTC);
    ClockHandler::set_clock(&mut session, timestamp).await?;

    let expected = expected_frame(
        OpCode::WriteThenRead,
        Some(0x0000),
        &[
            0xFE, 0x03, 0x6F, 5, 30, 22, // time block
            0xFE, 0x03, 0x70, 15, 6, 6, 24, // date block
        ],
    );
    assert_eq!(vec![expected], log.snapshot());
    Ok(())
}

#[tokio::test]
async fn reset_alarm_issues_a_single_write() -> anyhow::Result<()> {
    let (mut session, log) = session_with_timeouts(1);

    MaintenanceHandler::reset_alarm(&mut session).await?;

    let expected = expected_frame(OpCode::Write, Some(params::ALARM_RESET.value()), &[0x01]);
    assert_eq!(vec![expected], log.snapshot());
    Ok(())
}

#[tokio::test]
async fn reset_filter_countdown_writes_then_refreshes_diagnostics() -> anyhow::Result<()> {
    let (mut session, log) = session_with_timeouts(2);

    MaintenanceHandler::reset_filter_countdown(&mut session).await?;

    let requests = log.snapshot();
    assert_eq!(2, requests.len());
    assert_eq!(
        expected_frame(
            OpCode::Write,
            Some(params::FILTER_COUNTDOWN_RESET.value()),
            &[0x00],
        ),
        requests[0]
    );
    // Second exchange is the diagnostics read batch, including fan 2.
    assert_eq!(
        expected_frame(
            OpCode::Read,
            Some(0x0000),
            &[0x24, 0x00, 0x7E, 0x00, 0x88, 0x00, 0x64, 0x00, 0x4A, 0x00, 0x4B, 0x00],
        ),
        requests[1]
    );
    Ok(())
}

#[tokio::test]
async fn diagnostics_skip_fan2_once_model_is_known_single_fan() -> anyhow::Result<()> {
    // First reply reports model id 27; the following diagnostics batch must
    // not ask for the second fan.
    let model_reply = reply_frame(&[0x06, 0xB9, 27, 0x00, 0xFC]);
    let script = format!(
        "{};timeout",
        model_reply
            .iter()
            .map(|byte| format!("{byte:02X}"))
            .collect::<String>()
    )
    .parse()?;
    let transport = FakeTransport::from_script(script);
    let log = transport.request_log();
    let mut session = DeviceSession::new(SessionConfig::default(), Box::new(transport));

    StatusHandler::refresh_identity(&mut session).await?;
    StatusHandler::refresh_diagnostics(&mut session).await?;

    let requests = log.snapshot();
    assert_eq!(
        expected_frame(
            OpCode::Read,
            Some(0x0000),
            &[0x24, 0x00, 0x7E, 0x00, 0x88, 0x00, 0x64, 0x00, 0x4A, 0x00],
        ),
        requests[1]
    );
    Ok(())
}

#[tokio::test]
async fn custom_credentials_are_encoded_into_every_frame() -> anyhow::Result<()> {
    let config = SessionConfig::builder()
        .device_id(DeviceId::new("003A0012AB34CD56")?)
        .password(Password::new("secret42")?)
        .build();
    let transport = FakeTransport::from_script("timeout".parse()?);
    let log = transport.request_log();
    let mut session = DeviceSession::new(config, Box::new(transport));

    PowerHandler::turn_off(&mut session).await?;

    let expected = FrameCodec::encode(
        &DeviceId::new("003A0012AB34CD56")?,
        &Password::new("secret42")?,
        OpCode::WriteThenRead,
        Some(params::DEVICE_ON.value()),
        &[0x00],
    );
    assert_eq!(vec![expected], log.snapshot());
    Ok(())
}
