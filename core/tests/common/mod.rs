//! Shared harness: start the mock server on a random port and build clients
//! pointed at it.

#![allow(dead_code)]

use std::sync::Once;

use honeycomb_core::{Client, Config};

pub const API_KEY: &str = "integration-key";
pub const DATASET: &str = "integration-dataset";

static TRACING: Once = Once::new();

/// Install a test-writer subscriber honouring `RUST_LOG`, once per binary.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Start a fresh mock server and return its base URL.
pub fn spawn_server() -> String {
    init_tracing();

    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, API_KEY).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

pub fn client_for(base_url: &str) -> Client {
    Client::new(Config::new(API_KEY, DATASET).with_api_url(base_url)).unwrap()
}

/// A client against its own fresh server.
pub fn client() -> Client {
    client_for(&spawn_server())
}
