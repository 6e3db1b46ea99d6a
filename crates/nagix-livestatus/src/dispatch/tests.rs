//! Unit tests for command dispatchers.

use std::fs;
use std::time::Duration;

use mockall::mock;
use nagix_config::{CommandChannel, Config, SocketEndpoint};
use rstest::rstest;

use super::*;
use crate::error::TransportError;
use crate::query::QueryText;
use crate::test_support::{FakeLivestatus, Reply};
use crate::transport::RawResponse;

mock! {
    Channel {}
    impl Transport for Channel {
        fn exchange(&self, request: &QueryText) -> Result<RawResponse, TransportError>;
        fn submit(&self, payload: &str) -> Result<(), TransportError>;
    }
}

fn fixed_clock() -> i64 {
    1_700_000_000
}

fn enable_host_check() -> CommandText {
    crate::command::build_command(
        &crate::catalog::CommandCatalog::nagios(),
        "ENABLE_HOST_CHECK",
        &std::collections::HashMap::from([(String::from("host_name"), String::from("foo"))]),
    )
    .expect("valid command")
}

#[test]
fn livestatus_dispatcher_sends_timestamped_command() {
    let mut transport = MockChannel::new();
    transport
        .expect_submit()
        .withf(|payload| payload == "COMMAND [1700000000] ENABLE_HOST_CHECK;foo\n")
        .times(1)
        .returning(|_| Ok(()));
    transport.expect_exchange().never();

    let dispatcher = LivestatusDispatcher::new(transport).with_clock(fixed_clock);

    dispatcher
        .dispatch(&enable_host_check())
        .expect("dispatch succeeds");
}

#[test]
fn livestatus_dispatcher_wraps_transport_failures() {
    let mut transport = MockChannel::new();
    transport.expect_submit().returning(|_| {
        Err(TransportError::Timeout {
            endpoint: String::from("tcp://127.0.0.1:6557"),
            operation: "connecting",
        })
    });

    let error = LivestatusDispatcher::new(transport)
        .dispatch(&enable_host_check())
        .expect_err("transport fails");

    assert!(matches!(
        error,
        DispatchError::Transport(TransportError::Timeout { .. })
    ));
}

#[test]
fn livestatus_dispatcher_reaches_a_real_socket() {
    let mut server = FakeLivestatus::tcp(Reply::Bytes(Vec::new())).expect("spawn server");
    let transport = SocketTransport::new(server.endpoint(), Duration::from_secs(2));
    let dispatcher = LivestatusDispatcher::new(transport).with_clock(fixed_clock);

    dispatcher
        .dispatch(&enable_host_check())
        .expect("dispatch succeeds");

    assert_eq!(
        server.take_requests().expect("requests"),
        vec![String::from("COMMAND [1700000000] ENABLE_HOST_CHECK;foo\n")]
    );
}

#[test]
fn command_pipe_appends_timestamped_lines() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("nagios.cmd");
    fs::write(&path, "[1] EXISTING\n").expect("seed command file");
    let pipe = CommandPipe::new(path.to_str().expect("utf-8 path")).with_clock(fixed_clock);

    pipe.dispatch(&enable_host_check()).expect("first dispatch");
    pipe.dispatch(&enable_host_check()).expect("second dispatch");

    let written = fs::read_to_string(&path).expect("read command file");
    assert_eq!(
        written,
        concat!(
            "[1] EXISTING\n",
            "[1700000000] ENABLE_HOST_CHECK;foo\n",
            "[1700000000] ENABLE_HOST_CHECK;foo\n",
        )
    );
}

#[test]
fn command_pipe_fails_when_the_file_is_missing() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("absent").join("nagios.cmd");
    let pipe = CommandPipe::new(path.to_str().expect("utf-8 path"));

    let error = pipe
        .dispatch(&enable_host_check())
        .expect_err("no command file");

    match error {
        DispatchError::Open { path: reported, .. } => {
            assert_eq!(reported.as_std_path(), path.as_path());
        }
        other => panic!("expected an open failure, got {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn command_pipe_without_reader_fails_fast() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("nagios.cmd");
    let c_path = std::ffi::CString::new(path.to_str().expect("utf-8 path")).expect("c path");
    // SAFETY: `c_path` is a valid NUL-terminated path inside a fresh temp dir.
    let status = unsafe { libc::mkfifo(c_path.as_ptr(), 0o600) };
    assert_eq!(status, 0, "mkfifo failed");
    let pipe = CommandPipe::new(path.to_str().expect("utf-8 path"));

    let error = pipe
        .dispatch(&enable_host_check())
        .expect_err("no reader attached");

    assert!(matches!(error, DispatchError::Open { .. }));
}

#[rstest]
#[case::livestatus(CommandChannel::Livestatus, false)]
#[case::pipe(CommandChannel::pipe("/var/lib/nagios/rw/nagios.cmd"), true)]
fn configured_dispatcher_follows_channel(
    #[case] channel: CommandChannel,
    #[case] expect_pipe: bool,
) {
    let config = Config {
        livestatus_socket: SocketEndpoint::tcp("127.0.0.1", 6557),
        command_channel: channel,
        ..Config::default()
    };

    let dispatcher = ConfiguredDispatcher::from_config(&config);

    match dispatcher {
        ConfiguredDispatcher::Pipe(pipe) => {
            assert!(expect_pipe);
            assert_eq!(pipe.path(), "/var/lib/nagios/rw/nagios.cmd");
        }
        ConfiguredDispatcher::Livestatus(livestatus) => {
            assert!(!expect_pipe);
            assert_eq!(
                livestatus.transport().endpoint(),
                &SocketEndpoint::tcp("127.0.0.1", 6557)
            );
        }
    }
}
