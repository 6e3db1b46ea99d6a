//! Unit tests for the gateway facade and status lookups.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use mockall::{Sequence, mock};
use nagix_config::ResponseFormat;
use rstest::rstest;
use serde_json::json;

use super::*;
use crate::command::CommandText;
use crate::error::{
    CommandError, DispatchError, FailureKind, ProtocolError, QuerySyntaxError, TransportError,
};
use crate::query::{Filter, QueryText, Table};
use crate::test_support::{FakeLivestatus, Reply, fixed16};
use crate::transport::{RawResponse, SocketTransport};

mock! {
    Livestatus {}
    impl Transport for Livestatus {
        fn exchange(&self, request: &QueryText) -> Result<RawResponse, TransportError>;
        fn submit(&self, payload: &str) -> Result<(), TransportError>;
    }
}

mock! {
    Dispatcher {}
    impl CommandDispatcher for Dispatcher {
        fn dispatch(&self, command: &CommandText) -> Result<(), DispatchError>;
    }
}

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
        .collect()
}

fn idle_transport() -> MockLivestatus {
    let mut transport = MockLivestatus::new();
    transport.expect_exchange().never();
    transport.expect_submit().never();
    transport
}

fn idle_dispatcher() -> MockDispatcher {
    let mut dispatcher = MockDispatcher::new();
    dispatcher.expect_dispatch().never();
    dispatcher
}

fn respond(body: &str) -> Result<RawResponse, TransportError> {
    Ok(RawResponse::from(fixed16(200, body)))
}

fn refused() -> TransportError {
    TransportError::Connect {
        endpoint: String::from("tcp://127.0.0.1:6557"),
        source: Arc::new(io::Error::from(io::ErrorKind::ConnectionRefused)),
    }
}

// ---------------------------------------------------------------------------
// execute
// ---------------------------------------------------------------------------

#[test]
fn execute_dispatches_built_command() {
    let mut dispatcher = MockDispatcher::new();
    dispatcher
        .expect_dispatch()
        .withf(|command| command.as_str() == "ENABLE_HOST_CHECK;foo")
        .times(1)
        .returning(|_| Ok(()));
    let gateway = Gateway::new(idle_transport(), dispatcher, ResponseFormat::Json);

    gateway
        .execute("ENABLE_HOST_CHECK", &params(&[("host_name", "foo")]))
        .expect("command accepted");
}

#[test]
fn execute_reports_first_missing_parameter_without_dispatching() {
    let gateway = Gateway::new(idle_transport(), idle_dispatcher(), ResponseFormat::Json);

    let error = gateway
        .execute("ACKNOWLEDGE_HOST_PROBLEM", &params(&[("host_name", "foo")]))
        .expect_err("parameters missing");

    assert_eq!(error.kind(), FailureKind::Invalid);
    match error {
        ExecutionError::Command(command_error) => {
            assert_eq!(command_error.missing_parameter(), Some("sticky"));
        }
        other => panic!("expected a command error, got {other:?}"),
    }
}

#[test]
fn execute_rejects_unknown_command_without_dispatching() {
    let gateway = Gateway::new(idle_transport(), idle_dispatcher(), ResponseFormat::Json);

    let error = gateway
        .execute("BOGUS_CMD", &params(&[]))
        .expect_err("unknown command");

    assert_eq!(error.kind(), FailureKind::Invalid);
    assert!(matches!(
        error,
        ExecutionError::Command(CommandError::UnknownCommand { ref name }) if name == "BOGUS_CMD"
    ));
    assert_eq!(error.to_string(), "Unknown Nagios External Command BOGUS_CMD");
}

#[test]
fn execute_surfaces_dispatch_failures_as_upstream() {
    let mut dispatcher = MockDispatcher::new();
    dispatcher
        .expect_dispatch()
        .returning(|_| Err(DispatchError::Transport(refused())));
    let gateway = Gateway::new(idle_transport(), dispatcher, ResponseFormat::Json);

    let error = gateway
        .execute("DISABLE_NOTIFICATIONS", &params(&[]))
        .expect_err("dispatch fails");

    assert_eq!(error.kind(), FailureKind::Upstream);
    assert!(matches!(error, ExecutionError::Dispatch(_)));
}

// ---------------------------------------------------------------------------
// query and run
// ---------------------------------------------------------------------------

#[test]
fn run_pairs_csv_header_with_rows() {
    let mut transport = MockLivestatus::new();
    transport
        .expect_exchange()
        .withf(|request| {
            request.as_str().contains(concat!(
                "Filter: name = foo\n",
                "Filter: alias = foo\n",
                "Filter: address = foo\n",
                "Or: 3\n",
            )) && request.as_str().contains("Separators: 10 59 44 124\n")
        })
        .times(1)
        .returning(|_| respond("name;address\nfoo;127.0.0.1\n"));
    let gateway = Gateway::new(transport, idle_dispatcher(), ResponseFormat::Csv);
    let query = Query::builder(Table::Hosts)
        .filter(Filter::any_of(["name", "alias", "address"], "foo"))
        .build()
        .expect("valid query");

    let records = gateway.run(&query).expect("query succeeds");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("name"), Some(&json!("foo")));
    assert_eq!(records[0].get("address"), Some(&json!("127.0.0.1")));
    assert_eq!(records[0].len(), 2);
}

#[test]
fn query_parses_nql_before_touching_the_socket() {
    let mut transport = MockLivestatus::new();
    transport
        .expect_exchange()
        .withf(|request| request.as_str().starts_with("GET services\nColumns: host_name description\n"))
        .times(1)
        .returning(|_| respond("[[\"host_name\",\"description\"],[\"web01\",\"HTTP\"]]\n"));
    let gateway = Gateway::new(transport, idle_dispatcher(), ResponseFormat::Json);

    let records = gateway
        .query("SELECT host_name, description FROM services WHERE state != 0")
        .expect("query succeeds");

    assert_eq!(records[0].get_str("description"), Some("HTTP"));
}

#[test]
fn malformed_query_text_never_reaches_transport() {
    let gateway = Gateway::new(idle_transport(), idle_dispatcher(), ResponseFormat::Json);

    let error = gateway
        .query("SELECT * FROM contacts")
        .expect_err("unknown table");

    assert_eq!(error.kind(), FailureKind::Invalid);
    assert!(matches!(
        error,
        QueryError::Syntax(QuerySyntaxError::UnknownTable(_))
    ));
}

#[test]
fn refused_connection_is_a_transport_failure() {
    let mut transport = MockLivestatus::new();
    transport.expect_exchange().returning(|_| Err(refused()));
    let gateway = Gateway::new(transport, idle_dispatcher(), ResponseFormat::Json);

    let error = gateway.query("SELECT * FROM hosts").expect_err("refused");

    assert_eq!(error.kind(), FailureKind::Upstream);
    assert!(matches!(error, QueryError::Transport(TransportError::Connect { .. })));
    assert!(error.to_string().contains("failed to connect to livestatus"));
}

#[test]
fn short_body_from_closing_peer_is_a_transport_failure() {
    let mut reply = format!("200 {:>11}\n", 100).into_bytes();
    reply.extend_from_slice(b"[[\"name\"],\n[");
    let server = FakeLivestatus::tcp(Reply::Bytes(reply)).expect("spawn server");
    let transport = SocketTransport::new(server.endpoint(), Duration::from_secs(2));
    let gateway = Gateway::new(transport, idle_dispatcher(), ResponseFormat::Json);

    let error = gateway
        .query("SELECT name FROM hosts")
        .expect_err("connection closed early");

    assert_eq!(error.kind(), FailureKind::Upstream);
    assert!(
        matches!(
            error,
            QueryError::Transport(TransportError::Disconnected {
                expected: 100,
                received: 12,
                ..
            })
        ),
        "unexpected error: {error:?}"
    );
}

#[test]
fn malformed_response_is_a_protocol_failure() {
    let mut transport = MockLivestatus::new();
    transport
        .expect_exchange()
        .returning(|_| Ok(RawResponse::from(b"garbage".to_vec())));
    let gateway = Gateway::new(transport, idle_dispatcher(), ResponseFormat::Json);

    let error = gateway.query("SELECT * FROM hosts").expect_err("malformed");

    assert_eq!(error.kind(), FailureKind::Upstream);
    assert!(matches!(error, QueryError::Protocol(ProtocolError::InvalidHeader { .. })));
}

// ---------------------------------------------------------------------------
// lookups
// ---------------------------------------------------------------------------

#[test]
fn host_services_resolves_host_before_listing_services() {
    let mut sequence = Sequence::new();
    let mut transport = MockLivestatus::new();
    transport
        .expect_exchange()
        .withf(|request| {
            request.as_str().starts_with("GET hosts\nColumns: name\n")
                && request.as_str().contains("Filter: alias = www\n")
        })
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_| respond("[[\"name\"],[\"web01\"]]\n"));
    transport
        .expect_exchange()
        .withf(|request| {
            request.as_str().starts_with("GET services\nFilter: host_name = web01\n")
        })
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_| respond("[[\"description\"],[\"HTTP\"],[\"SSH\"]]\n"));
    let gateway = Gateway::new(transport, idle_dispatcher(), ResponseFormat::Json);

    let services = gateway.host_services("www").expect("lookup succeeds");

    let descriptions: Vec<_> = services
        .iter()
        .filter_map(|record| record.get_str("description"))
        .collect();
    assert_eq!(descriptions, ["HTTP", "SSH"]);
}

#[rstest]
#[case::host_services(true)]
#[case::host_service(false)]
fn unknown_host_yields_no_records(#[case] all_services: bool) {
    let mut transport = MockLivestatus::new();
    transport
        .expect_exchange()
        .times(1)
        .returning(|_| respond("[[\"name\"]]\n"));
    let gateway = Gateway::new(transport, idle_dispatcher(), ResponseFormat::Json);

    let records = if all_services {
        gateway.host_services("ghost")
    } else {
        gateway.host_service("ghost", "HTTP")
    }
    .expect("lookup succeeds");

    assert!(records.is_empty());
}

#[test]
fn host_service_filters_by_host_and_description() {
    let mut sequence = Sequence::new();
    let mut transport = MockLivestatus::new();
    transport
        .expect_exchange()
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_| respond("[[\"name\"],[\"web01\"]]\n"));
    transport
        .expect_exchange()
        .withf(|request| {
            request.as_str().contains(concat!(
                "Filter: host_name = web01\n",
                "Filter: description = HTTP\n",
                "And: 2\n",
            ))
        })
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_| respond("[[\"description\",\"state\"],[\"HTTP\",0]]\n"));
    let gateway = Gateway::new(transport, idle_dispatcher(), ResponseFormat::Json);

    let records = gateway.host_service("10.0.0.1", "HTTP").expect("lookup succeeds");

    assert_eq!(records[0].get("state"), Some(&json!(0)));
}

#[test]
fn servicegroup_services_filters_by_group_membership() {
    let mut sequence = Sequence::new();
    let mut transport = MockLivestatus::new();
    transport
        .expect_exchange()
        .withf(|request| {
            request.as_str().starts_with("GET servicegroups\nColumns: name\n")
                && request.as_str().contains("Or: 2\n")
        })
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_| respond("[[\"name\"],[\"web\"]]\n"));
    transport
        .expect_exchange()
        .withf(|request| request.as_str().contains("Filter: groups >= web\n"))
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_| respond("[[\"description\"],[\"HTTP\"]]\n"));
    let gateway = Gateway::new(transport, idle_dispatcher(), ResponseFormat::Json);

    let services = gateway
        .servicegroup_services("Web Services")
        .expect("lookup succeeds");

    assert_eq!(services.len(), 1);
}

#[rstest]
#[case::hostgroups(Table::Hostgroups, "GET hostgroups\n")]
#[case::status(Table::Status, "GET status\n")]
fn listing_queries_request_whole_table(#[case] table: Table, #[case] prefix: &'static str) {
    let mut transport = MockLivestatus::new();
    transport
        .expect_exchange()
        .withf(move |request| request.as_str().starts_with(prefix))
        .times(1)
        .returning(|_| respond("[[\"name\"],[\"x\"]]\n"));
    let gateway = Gateway::new(transport, idle_dispatcher(), ResponseFormat::Json);

    let records = match table {
        Table::Hostgroups => gateway.hostgroups(),
        Table::Status => gateway.program_status(),
        other => gateway.list(other),
    }
    .expect("lookup succeeds");

    assert_eq!(records.len(), 1);
}

#[test]
fn find_servicegroups_matches_name_or_alias() {
    let mut transport = MockLivestatus::new();
    transport
        .expect_exchange()
        .withf(|request| {
            request
                .as_str()
                .contains("Filter: name = web\nFilter: alias = web\nOr: 2\n")
        })
        .times(1)
        .returning(|_| respond("[[\"name\",\"alias\"],[\"web\",\"Web Services\"]]\n"));
    let gateway = Gateway::new(transport, idle_dispatcher(), ResponseFormat::Json);

    let groups = gateway.find_servicegroups("web").expect("lookup succeeds");

    assert_eq!(groups[0].get_str("alias"), Some("Web Services"));
}

#[test]
fn from_config_uses_configured_format() {
    let config = Config {
        response_format: ResponseFormat::Csv,
        ..Config::default()
    };

    let gateway = SocketGateway::from_config(&config);

    assert_eq!(gateway.format(), ResponseFormat::Csv);
    assert_eq!(gateway.catalog().len(), 26);
}
