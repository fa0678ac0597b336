//! Analytics ingestion load test.
//!
//! Every virtual user posts the same Amplitude-style event to the ingestion proxy, checks that
//! it was accepted, and pauses for a second before the next iteration.
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, error};
use vuload::prelude::*;

pub mod payload;

pub use payload::{payload, request_template, IngestRequest};

pub const OPTIONS: Options = Options {
    vus: 100,
    duration: Duration::from_secs(30),
};

pub const TARGET_URL: &str = "http://localhost:6191/dump/request";

/// The ingestion proxy rejects bot-like user agents.
pub const USER_AGENT_VALUE: &str = "CARL";

pub const STATUS_CHECK: &str = "is status 200";

/// Pause between iterations, in seconds.
pub const THINK_TIME: f64 = 1.;

pub fn headers() -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(3);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
    headers
}

#[scenario]
pub async fn loadtest() {
    iteration(TARGET_URL).await;
}

/// One unit of work: post the event to `target`, check the status, then pause.
///
/// Transport errors, serialization errors and non-200 responses all end up as a failed
/// check; none of them abort the iteration.
pub async fn iteration(target: &str) {
    let status = match payload() {
        Ok(body) => match post_event(target, body).await {
            Ok(status) => Some(status),
            Err(err) => {
                debug!("Request to {target} failed: {err}");
                None
            }
        },
        Err(err) => {
            error!("Failed to serialize ingestion payload: {err}");
            None
        }
    };

    check!(status, {
        STATUS_CHECK => |status| *status == Some(StatusCode::OK),
    });

    vuload::sleep(THINK_TIME).await;
}

#[transaction]
async fn post_event(target: &str, body: String) -> Result<StatusCode, reqwest::Error> {
    let res = vuload::http::client()
        .post(target)
        .headers(headers())
        .body(body)
        .send()
        .await?;

    let status = res.status();
    // Drain the body so the connection goes back to the pool.
    res.bytes().await?;
    Ok(status)
}
