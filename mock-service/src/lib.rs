//! Stub ingestion endpoint.
//!
//! Answers `POST /dump/request` by echoing the raw request back, the way an httpbin-style dump
//! endpoint does, with a status code and delay that tests can change at runtime. Every request
//! is counted so load runs can be checked against what the server actually saw.
//!
//! Like the ingestion proxy in front of it, the dump endpoint turns away bot user agents with
//! `403 Forbidden` and JSON events with an oversized string field with `400 Bad Request`.
use axum::{
    body::Bytes,
    debug_handler,
    extract::{Path, State},
    http::{header::USER_AGENT, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use isbot::Bots;
use metrics::counter;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicU16, AtomicU64, Ordering},
    Arc, Mutex, OnceLock, PoisonError,
};
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

pub mod validate;

pub use axum::http::StatusCode as MockStatus;
pub use validate::{validate_field_lengths, FieldViolation, MAX_FIELD_LENGTH};

static BOTS: OnceLock<Bots> = OnceLock::new();

/// Whether the proxy would treat the request's user agent as a bot. A missing or non-UTF-8
/// header is not.
pub fn is_bot(headers: &HeaderMap) -> bool {
    headers
        .get(USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .is_some_and(|ua| BOTS.get_or_init(Bots::default).is_bot(ua))
}

/// A request as the stub received it.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Raw HTTP/1.1 rendering of the request.
    pub fn dump(&self) -> String {
        let mut dump = format!("{} {} HTTP/1.1\r\n", self.method, self.uri);
        for (name, value) in &self.headers {
            dump.push_str(&format!(
                "{}: {}\r\n",
                name,
                String::from_utf8_lossy(value.as_bytes())
            ));
        }
        dump.push_str("\r\n");
        dump.push_str(&String::from_utf8_lossy(&self.body));
        dump
    }
}

/// Shared, runtime-adjustable behaviour of the stub.
#[derive(Clone, Debug)]
pub struct MockState {
    requests: Arc<AtomicU64>,
    status: Arc<AtomicU16>,
    delay_ms: Arc<AtomicU64>,
    last_request: Arc<Mutex<Option<RecordedRequest>>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self::new(StatusCode::OK)
    }
}

impl MockState {
    pub fn new(status: StatusCode) -> Self {
        Self {
            requests: Arc::new(AtomicU64::new(0)),
            status: Arc::new(AtomicU16::new(status.as_u16())),
            delay_ms: Arc::new(AtomicU64::new(0)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status.load(Ordering::Relaxed))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn set_status(&self, status: StatusCode) {
        self.status.store(status.as_u16(), Ordering::Relaxed);
    }

    pub fn set_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.delay_ms.store(millis, Ordering::Relaxed);
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn receive(&self, request: RecordedRequest) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        counter!("mock_service_requests").increment(1);

        let delay = self.delay_ms.load(Ordering::Relaxed);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        *self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(request);
    }
}

pub fn router(state: MockState) -> Router {
    Router::new()
        .route("/dump/request", post(dump))
        .route("/status/:code", post(status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(listener: TcpListener, state: MockState) -> std::io::Result<()> {
    info!("Mock ingestion endpoint listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}

pub async fn run(addr: SocketAddr, state: MockState) -> std::io::Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    serve(listener, state).await
}

/// Bind an ephemeral local port and serve in the background. Returns the bound address.
pub async fn spawn(state: MockState) -> std::io::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(err) = serve(listener, state).await {
            tracing::error!("Mock ingestion endpoint stopped: {err}");
        }
    });
    Ok(addr)
}

#[debug_handler]
async fn dump(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = RecordedRequest {
        method,
        uri,
        headers,
        body,
    };
    let dump = request.dump();
    let rejection = reject(&request);
    state.receive(request).await;

    if let Some(rejection) = rejection {
        return rejection;
    }

    let status = state.status();
    debug!("Dumped request, replying {status}");
    (status, dump).into_response()
}

/// The proxy's admission rules. Bodies that are not JSON are passed through unchecked.
fn reject(request: &RecordedRequest) -> Option<Response> {
    if is_bot(&request.headers) {
        debug!(user_agent = ?request.header("user-agent"), "Rejected bot request");
        counter!("mock_service_rejected", "reason" => "bot").increment(1);
        return Some(StatusCode::FORBIDDEN.into_response());
    }

    let event: serde_json::Value = serde_json::from_slice(&request.body).ok()?;
    let violations = validate_field_lengths(&event).err()?;
    debug!("Rejected event with {} oversized field(s)", violations.len());
    counter!("mock_service_rejected", "reason" => "field_length").increment(1);
    Some((StatusCode::BAD_REQUEST, Json(validate::error_body(&violations))).into_response())
}

#[debug_handler]
async fn status(
    State(state): State<MockState>,
    Path(code): Path<u16>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    state
        .receive(RecordedRequest {
            method,
            uri,
            headers,
            body,
        })
        .await;

    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

/** TPS Printer **/

pub async fn tps_measure_task(state: MockState) {
    let mut last = state.requests();
    loop {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let total = state.requests();
        info!("{} TPS", total - last);
        last = total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dump_echoes_request_and_counts() {
        let state = MockState::default();
        let addr = spawn(state.clone()).await.unwrap();

        let res = reqwest::Client::new()
            .post(format!("http://{addr}/dump/request"))
            .header("User-Agent", "CARL")
            .body("{}")
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 200);
        let body = res.text().await.unwrap();
        assert!(body.starts_with("POST /dump/request HTTP/1.1\r\n"));
        assert!(body.ends_with("\r\n\r\n{}"));

        assert_eq!(state.requests(), 1);
        let recorded = state.last_request().unwrap();
        assert_eq!(recorded.header("user-agent"), Some("CARL"));
        assert_eq!(&recorded.body[..], b"{}");
    }

    #[tokio::test]
    async fn configured_status_is_returned() {
        let state = MockState::new(StatusCode::INTERNAL_SERVER_ERROR);
        let addr = spawn(state.clone()).await.unwrap();
        let client = reqwest::Client::new();

        let res = client
            .post(format!("http://{addr}/dump/request"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 500);

        state.set_status(StatusCode::OK);
        let res = client
            .post(format!("http://{addr}/dump/request"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 200);

        let res = client
            .post(format!("http://{addr}/status/503"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 503);
        assert_eq!(state.requests(), 3);
    }

    #[tokio::test]
    async fn bot_user_agents_are_forbidden() {
        let state = MockState::default();
        let addr = spawn(state.clone()).await.unwrap();
        let client = reqwest::Client::new();

        for ua in [
            "Googlebot/2.1 (+http://www.google.com/bot.html)",
            "Mozilla/5.0 (compatible; bingbot/2.0; +http://www.bing.com/bingbot.htm)",
        ] {
            let res = client
                .post(format!("http://{addr}/dump/request"))
                .header("User-Agent", ua)
                .body("{}")
                .send()
                .await
                .unwrap();
            assert_eq!(res.status().as_u16(), 403, "{ua}");
        }

        let res = client
            .post(format!("http://{addr}/dump/request"))
            .header("User-Agent", "CARL")
            .body("{}")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 200);
        // Rejected requests still reached the server.
        assert_eq!(state.requests(), 3);
    }

    #[tokio::test]
    async fn oversized_field_is_a_bad_request() {
        let state = MockState::default();
        let addr = spawn(state.clone()).await.unwrap();

        let event = serde_json::json!({
            "events": [{ "event_type": "x".repeat(MAX_FIELD_LENGTH + 1) }],
        });
        let res = reqwest::Client::new()
            .post(format!("http://{addr}/dump/request"))
            .header("User-Agent", "CARL")
            .body(event.to_string())
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 400);
        let body: serde_json::Value = serde_json::from_slice(&res.bytes().await.unwrap()).unwrap();
        assert_eq!(body["error"], "field_length_exceeded");
        assert_eq!(body["violations"][0]["field"], "events[0].event_type");
        assert_eq!(body["violations"][0]["length"], 501);
    }

    #[test]
    fn missing_user_agent_is_not_a_bot() {
        assert!(!is_bot(&HeaderMap::new()));
    }

    #[test]
    fn huge_delay_saturates() {
        let state = MockState::default();
        state.set_delay(Duration::MAX);
        assert_eq!(state.delay_ms.load(Ordering::Relaxed), u64::MAX);

        state.set_delay(Duration::from_millis(250));
        assert_eq!(state.delay_ms.load(Ordering::Relaxed), 250);
    }
}
