//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts its own mock server on a random port, then exercises the
//! client over real HTTP, so request building, execution and response
//! mapping are checked together.

mod common;

use std::time::Duration;

use honeycomb_core::{
    ApiError, Board, BoardQuery, BoardStyle, CalculationOp, CalculationSpec, Client, Config, ErrorKind,
    FilterCombination, FilterOp, FilterSpec, MarkerCreateData, QuerySpec, RecipientType, Trigger,
    TriggerRecipient, TriggerThreshold, TriggerThresholdOp,
};

fn slow_requests_trigger(name: &str) -> Trigger {
    Trigger {
        id: None,
        name: name.to_string(),
        description: "Some description".to_string(),
        disabled: true,
        query: Some(QuerySpec {
            calculations: vec![CalculationSpec::on(CalculationOp::P99, "duration_ms")],
            ..Default::default()
        }),
        frequency: Some(300),
        threshold: Some(TriggerThreshold {
            op: TriggerThresholdOp::GreaterThan,
            value: 10000.0,
        }),
        recipients: vec![TriggerRecipient::email("hello@example.com")],
    }
}

// ---------------------------------------------------------------------------
// Markers
// ---------------------------------------------------------------------------

#[test]
fn marker_with_only_message() {
    let client = common::client();

    let data = MarkerCreateData {
        message: Some("deploy #42".to_string()),
        ..Default::default()
    };
    let created = client.markers().create(&data).unwrap();

    assert!(!created.id.is_empty());
    assert_eq!(created.message.as_deref(), Some("deploy #42"));
    assert!(created.created_at <= created.updated_at);
    assert_eq!(created.start_time, None);
    assert_eq!(created.end_time, None);
    assert_eq!(created.marker_type, None);
    assert_eq!(created.url, None);
    assert_eq!(created.color, None);
}

#[test]
fn marker_lifecycle() {
    let client = common::client();

    // Step 1: list, empty dataset is not an error.
    assert!(client.markers().list().unwrap().is_empty());

    // Step 2: create two markers.
    let first = client
        .markers()
        .create(&MarkerCreateData {
            start_time: Some(1_583_316_672),
            end_time: Some(1_583_316_972),
            message: Some("first".to_string()),
            marker_type: Some("deploy".to_string()),
            url: Some("https://ci.example.com/builds/1".to_string()),
        })
        .unwrap();
    let second = client
        .markers()
        .create(&MarkerCreateData {
            message: Some("second".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(first.color.as_deref(), Some("#F96E11"));

    // Step 3: list contains both, equal to what create returned.
    let markers = client.markers().list().unwrap();
    assert_eq!(markers.len(), 2);
    assert!(markers.contains(&first));
    assert!(markers.contains(&second));

    // Step 4: get scans the list.
    assert_eq!(client.markers().get(&first.id).unwrap(), first);
    assert_eq!(client.markers().get(&second.id).unwrap(), second);

    // Step 5: unknown id is the not-found sentinel.
    assert_eq!(client.markers().get("does-not-exist").unwrap_err(), ApiError::NotFound);
}

#[test]
fn dataset_with_reserved_characters_is_escaped() {
    let base_url = common::spawn_server();
    let client = Client::new(Config::new(common::API_KEY, "my dataset/prod").with_api_url(&base_url)).unwrap();
    let plain = Client::new(Config::new(common::API_KEY, "my dataset").with_api_url(&base_url)).unwrap();

    let created = client
        .markers()
        .create(&MarkerCreateData {
            message: Some("spaced".to_string()),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(client.markers().list().unwrap(), vec![created.clone()]);
    assert_eq!(client.markers().get(&created.id).unwrap(), created);
    assert!(plain.markers().list().unwrap().is_empty());
}

#[test]
fn markers_are_scoped_to_the_dataset() {
    let base_url = common::spawn_server();
    let ours = common::client_for(&base_url);
    let theirs = Client::new(Config::new(common::API_KEY, "another-dataset").with_api_url(&base_url)).unwrap();

    let created = ours
        .markers()
        .create(&MarkerCreateData {
            message: Some("only here".to_string()),
            ..Default::default()
        })
        .unwrap();

    assert!(theirs.markers().list().unwrap().is_empty());
    assert!(theirs.markers().get(&created.id).unwrap_err().is_not_found());
}

// ---------------------------------------------------------------------------
// Triggers
// ---------------------------------------------------------------------------

#[test]
fn trigger_lifecycle() {
    let client = common::client();
    let triggers = client.triggers();

    // Create: every supplied field survives, plus a server id.
    let mut data = slow_requests_trigger("Test trigger");
    let created = triggers.create(&data).unwrap();
    let id = created.id.clone().expect("server assigns an id");
    assert!(!id.is_empty());
    data.id = Some(id.clone());
    assert_eq!(created, data);

    // List contains it.
    let listed = triggers.list().unwrap();
    let found = listed.iter().find(|t| t.id.as_deref() == Some(id.as_str()));
    assert_eq!(found, Some(&created));

    // Get returns it.
    assert_eq!(triggers.get(&id).unwrap(), created);

    // Update then get reflects the change.
    let mut changed = created.clone();
    changed.name = "Renamed trigger".to_string();
    changed.disabled = false;
    changed.frequency = Some(900);
    changed.recipients.push(TriggerRecipient {
        id: None,
        recipient_type: RecipientType::Slack,
        target: "#alerts".to_string(),
    });
    let updated = triggers.update(&id, &changed).unwrap();
    assert_eq!(updated, changed);
    assert_eq!(triggers.get(&id).unwrap(), changed);

    // Delete then get is not-found.
    triggers.delete(&id).unwrap();
    assert_eq!(triggers.get(&id).unwrap_err(), ApiError::NotFound);
    assert!(triggers.list().unwrap().is_empty());

    // Deleting or updating again is also not-found.
    assert_eq!(triggers.delete(&id).unwrap_err(), ApiError::NotFound);
    assert_eq!(triggers.update(&id, &changed).unwrap_err(), ApiError::NotFound);
}

#[test]
fn trigger_with_filters_round_trips() {
    let client = common::client();

    let data = Trigger {
        name: "5xx on checkout".to_string(),
        query: Some(QuerySpec {
            breakdowns: vec!["service.name".to_string()],
            calculations: vec![CalculationSpec::count()],
            filters: vec![
                FilterSpec {
                    column: "http.status_code".to_string(),
                    op: FilterOp::GreaterThanOrEqual,
                    value: Some(serde_json::json!(500)),
                },
                FilterSpec {
                    column: "http.route".to_string(),
                    op: FilterOp::StartsWith,
                    value: Some(serde_json::json!("/checkout")),
                },
            ],
            filter_combination: Some(FilterCombination::And),
            ..Default::default()
        }),
        frequency: Some(60),
        threshold: Some(TriggerThreshold {
            op: TriggerThresholdOp::GreaterThanOrEqual,
            value: 1.0,
        }),
        ..Default::default()
    };

    let created = client.triggers().create(&data).unwrap();
    assert_eq!(created.query, data.query);
    assert_eq!(created.threshold, data.threshold);
    assert!(created.recipients.is_empty());
}

#[test]
fn trigger_without_name_is_an_invalid_request() {
    let client = common::client();

    let err = client.triggers().create(&Trigger::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert_eq!(
        err,
        ApiError::InvalidRequest {
            status: 400,
            message: "trigger name must not be empty".to_string()
        }
    );
}

#[test]
fn id_with_query_characters_does_not_reach_another_trigger() {
    let client = common::client();
    let triggers = client.triggers();

    let created = triggers.create(&slow_requests_trigger("Keep me")).unwrap();
    let id = created.id.clone().unwrap();

    for tricky in [format!("{id}?x=1"), format!("{id}#frag"), format!("{id}/")] {
        assert_eq!(triggers.get(&tricky).unwrap_err(), ApiError::NotFound, "{tricky}");
        assert_eq!(triggers.update(&tricky, &created).unwrap_err(), ApiError::NotFound, "{tricky}");
        assert_eq!(triggers.delete(&tricky).unwrap_err(), ApiError::NotFound, "{tricky}");
    }

    assert_eq!(triggers.get(&id).unwrap(), created);
    assert_eq!(triggers.list().unwrap(), vec![created]);
}

#[test]
fn get_unknown_trigger_is_not_found() {
    let client = common::client();
    let err = client.triggers().get("does-not-exist").unwrap_err();
    assert_eq!(err, ApiError::NotFound);
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ---------------------------------------------------------------------------
// Boards
// ---------------------------------------------------------------------------

#[test]
fn board_lifecycle() {
    let client = common::client();
    let boards = client.boards();

    let mut data = Board {
        id: None,
        name: "Service health".to_string(),
        description: "Latency and errors".to_string(),
        style: BoardStyle::Visual,
        queries: vec![BoardQuery {
            caption: Some("p99 latency".to_string()),
            dataset: common::DATASET.to_string(),
            query: QuerySpec {
                calculations: vec![CalculationSpec::on(CalculationOp::P99, "duration_ms")],
                time_range: Some(7200),
                ..Default::default()
            },
        }],
    };

    let created = boards.create(&data).unwrap();
    let id = created.id.clone().unwrap();
    data.id = Some(id.clone());
    assert_eq!(created, data);

    assert_eq!(boards.list().unwrap(), vec![created.clone()]);
    assert_eq!(boards.get(&id).unwrap(), created);

    data.style = BoardStyle::List;
    data.queries.clear();
    assert_eq!(boards.update(&id, &data).unwrap(), data);

    boards.delete(&id).unwrap();
    assert!(boards.get(&id).unwrap_err().is_not_found());
}

// ---------------------------------------------------------------------------
// Failure modes
// ---------------------------------------------------------------------------

#[test]
fn wrong_api_key_is_an_auth_error() {
    let base_url = common::spawn_server();
    let client = Client::new(Config::new("wrong-key", common::DATASET).with_api_url(&base_url)).unwrap();

    let err = client.markers().list().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);
    assert!(matches!(err, ApiError::Unauthorized { status: 401, .. }));
}

#[test]
fn unknown_endpoint_is_not_found() {
    let client = common::client();
    let request = client
        .request(honeycomb_core::HttpMethod::Get, "/1/does-not-exist")
        .unwrap();
    let err = client.send::<serde_json::Value>(request).unwrap_err();
    assert_eq!(err, ApiError::NotFound);
}

#[test]
fn refused_connection_is_a_transport_error() {
    // Bind then drop to get a port with nothing listening.
    let addr = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let client = common::client_for(&format!("http://{addr}"));

    let err = client.triggers().list().unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "{err:?}");
    assert_eq!(err.kind(), ErrorKind::Server);
}

#[test]
fn marker_list_larger_than_ten_mebibytes_is_read() {
    use std::io::{BufRead, BufReader, Write};

    let padding = "x".repeat(256);
    let markers: Vec<String> = (0..45_000)
        .map(|i| {
            format!(
                r#"{{"id":"m{i}","created_at":"2020-03-04T10:11:12Z","updated_at":"2020-03-04T10:11:12Z","message":"{padding}"}}"#
            )
        })
        .collect();
    let body = format!("[{}]", markers.join(","));
    assert!(body.len() > 10 * 1024 * 1024);

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut line = String::new();
        while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
            line.clear();
        }
        let mut stream = stream;
        write!(
            stream,
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
            body.len()
        )
        .unwrap();
        stream.write_all(body.as_bytes()).unwrap();
    });

    let listed = common::client_for(&format!("http://{addr}")).markers().list().unwrap();
    assert_eq!(listed.len(), 45_000);
    assert_eq!(listed[44_999].id, "m44999");
}

#[test]
fn deadline_is_passed_to_the_request() {
    // Accepts connections but never answers.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming().flatten() {
            held.push(stream);
        }
    });

    let client = common::client_for(&format!("http://{addr}")).with_timeout(Duration::from_millis(200));
    let err = client.markers().list().unwrap_err();
    assert_eq!(err, ApiError::Timeout);
}
