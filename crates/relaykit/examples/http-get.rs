//! Issue one HTTP GET through a running connector runtime.
//!
//! Run with:
//!   cargo run --example http-get -- https://example.com
//!
//! Expects a runtime listening on the default socket path (or set
//! RELAYKIT_SOCKET_PATH / RELAYKIT_FORCE_TCP / RELAYKIT_TCP_PORT).

use std::time::Duration;

use relaykit::logging::{init_logging, LogFormat};
use relaykit::{ClientConfig, HttpRequest, RuntimeClient};
use tracing::level_filters::LevelFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(LogFormat::Text, LevelFilter::INFO);

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://example.com".to_string());

    let client = RuntimeClient::connect(ClientConfig::from_env()).await?;

    let request = HttpRequest::get(&url).with_timeout(Duration::from_secs(10));
    match client.execute_http(request).await {
        Ok(response) => {
            eprintln!(
                "{} ({} bytes, {}us)",
                response.status_code,
                response.body.len(),
                response.duration_us
            );
            println!("{}", response.body);
        }
        Err(err) => {
            eprintln!("request failed: {err} (retryable: {})", err.is_retryable());
        }
    }

    client.close().await;
    Ok(())
}
