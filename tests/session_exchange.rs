use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use vento::{
    DeviceSession, ExchangeOutcome, FakeTransport, ProtocolError, ReplyScript, SessionConfig,
    StatusHandler, frame_checksum,
};

/// Builds a controller reply frame around `payload`, using the default
/// device id and password in the authentication header.
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

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02X}")).collect()
}

fn script(replies: &[&[u8]]) -> ReplyScript {
    replies
        .iter()
        .map(|reply| to_hex(reply))
        .collect::<Vec<_>>()
        .join(";")
        .parse()
        .expect("generated reply script should parse")
}

fn session_with_script(script: ReplyScript) -> (DeviceSession, vento::RequestLog) {
    let transport = FakeTransport::from_script(script);
    let log = transport.request_log();
    let session = DeviceSession::new(SessionConfig::default(), Box::new(transport));
    (session, log)
}

// Function id 0x06 mirrors the controller-response command byte that leads
// every reply payload.
const STATUS_REPLY_PAYLOAD: &[u8] = &[
    0x06, // function block
    0x01, 0x01, // device on
    0x02, 0x02, // speed threshold: medium
    0xB7, 0x00, // operation mode: ventilation
    0x83, 0x00, // alarm: OK
    0x25, 0x37, // humidity: 55 %
    0xFC,
];

#[tokio::test]
async fn status_reply_populates_snapshot() -> anyhow::Result<()> {
    let (mut session, _log) = session_with_script(script(&[&reply_frame(STATUS_REPLY_PAYLOAD)]));

    let outcome = StatusHandler::refresh_status(&mut session).await?;

    assert_eq!(ExchangeOutcome::Updated, outcome);
    let state = session.state();
    assert_eq!(Some(true), state.is_on());
    assert_eq!(Some(vento::SpeedThreshold::Medium), state.speed_threshold());
    assert_eq!(Some(vento::OperationMode::Ventilation), state.operation_mode());
    assert_eq!(Some(vento::AlarmState::Ok), state.alarm());
    assert_eq!(Some(55), state.humidity());
    Ok(())
}

#[tokio::test]
async fn timeout_returns_no_update_and_keeps_prior_snapshot() -> anyhow::Result<()> {
    let reply = reply_frame(STATUS_REPLY_PAYLOAD);
    let (mut session, _log) =
        session_with_script(format!("{};timeout", to_hex(&reply)).parse()?);

    StatusHandler::refresh_status(&mut session).await?;
    let before = session.state().clone();

    let outcome = StatusHandler::refresh_status(&mut session).await?;

    assert_eq!(ExchangeOutcome::NoUpdate, outcome);
    assert_eq!(&before, session.state());
    Ok(())
}

#[tokio::test]
async fn transport_error_degrades_to_no_update() -> anyhow::Result<()> {
    // An exhausted script makes the transport fail; the session swallows it.
    let (mut session, log) = session_with_script("timeout".parse()?);

    StatusHandler::refresh_status(&mut session).await?;
    let outcome = StatusHandler::refresh_status(&mut session).await?;

    assert_eq!(ExchangeOutcome::NoUpdate, outcome);
    assert_eq!(2, log.len());
    Ok(())
}

#[tokio::test]
async fn reply_without_magic_is_a_hard_framing_error() -> anyhow::Result<()> {
    let (mut session, _log) = session_with_script("01020304".parse()?);

    let result = StatusHandler::refresh_status(&mut session).await;

    assert_matches!(result, Err(ProtocolError::Framing(_)));
    // Prior (empty) snapshot is retained.
    assert_eq!(None, session.state().is_on());
    Ok(())
}

#[tokio::test]
async fn corrupted_checksum_is_tolerated_by_default() -> anyhow::Result<()> {
    let mut frame = reply_frame(STATUS_REPLY_PAYLOAD);
    let last = frame.len() - 1;
    frame[last] ^= 0xFF;

    let (mut session, _log) = session_with_script(script(&[&frame]));
    let outcome = StatusHandler::refresh_status(&mut session).await?;

    assert_eq!(ExchangeOutcome::Updated, outcome);
    assert_eq!(Some(true), session.state().is_on());
    Ok(())
}

#[tokio::test]
async fn strict_mode_rejects_corrupted_checksum() -> anyhow::Result<()> {
    let mut frame = reply_frame(STATUS_REPLY_PAYLOAD);
    let last = frame.len() - 1;
    frame[last] ^= 0xFF;

    let transport = FakeTransport::from_script(script(&[&frame]));
    let config = SessionConfig::builder().verify_checksums(true).build();
    let mut session = DeviceSession::new(config, Box::new(transport));

    let result = StatusHandler::refresh_status(&mut session).await;

    assert_matches!(result, Err(ProtocolError::Framing(_)));
    assert_eq!(None, session.state().is_on());
    Ok(())
}

#[tokio::test]
async fn firmware_version_is_memoised_per_session() -> anyhow::Result<()> {
    let firmware_payload = [0x06, 0x86, 0x02, 0x05, 0x14, 0x0B, 0xE8, 0x07, 0xFC];
    let (mut session, log) = session_with_script(script(&[&reply_frame(&firmware_payload)]));

    let first = session.firmware_version().await?;
    let second = session.firmware_version().await?;

    assert_eq!(Some("2.5 (2024-11-20)".to_string()), first);
    assert_eq!(first, second);
    // The second call never touched the wire.
    assert_eq!(1, log.len());
    Ok(())
}

#[tokio::test]
async fn unknown_parameters_are_dropped_silently() -> anyhow::Result<()> {
    // Page 0x01 makes parameter 0x0105 unknown; its single default byte is
    // consumed and the following humidity value still decodes.
    let payload = [0x06, 0xFF, 0x01, 0x05, 0xAA, 0xFF, 0x00, 0x25, 0x2A, 0xFC];
    let (mut session, _log) = session_with_script(script(&[&reply_frame(&payload)]));

    let outcome = StatusHandler::refresh_status(&mut session).await?;

    assert_eq!(ExchangeOutcome::Updated, outcome);
    assert_eq!(Some(42), session.state().humidity());
    Ok(())
}
