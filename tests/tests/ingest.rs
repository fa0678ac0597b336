mod utils;
use utils::*;

use ingest_loadtest::{headers, iteration, payload, request_template, STATUS_CHECK};
use mock_service::{validate_field_lengths, MockState, MockStatus, MAX_FIELD_LENGTH};
use reqwest::header::{HeaderValue, USER_AGENT};
use std::time::{Duration, Instant};
use vuload::prelude::*;
use vuload::Scenario;

const BOT_USER_AGENT: &str = "Googlebot/2.1 (+http://www.google.com/bot.html)";

/// The scenario's request with one thing changed, so the proxy's admission rules can be seen
/// failing the status check.
#[transaction]
async fn post_variant(
    target: &str,
    user_agent: &str,
    body: String,
) -> Result<u16, reqwest::Error> {
    let mut headers = headers();
    if let Ok(value) = HeaderValue::from_str(user_agent) {
        headers.insert(USER_AGENT, value);
    }

    let res = vuload::http::client()
        .post(target)
        .headers(headers)
        .body(body)
        .send()
        .await?;
    Ok(res.status().as_u16())
}

fn variant_scenario(
    name: &str,
    target: String,
    user_agent: &'static str,
    body: String,
) -> impl ConfigurableScenario<Result<RunStatistics, ConfigError>> {
    Scenario::new(name, move || {
        let target = target.clone();
        let body = body.clone();
        async move {
            let status = post_variant(&target, user_agent, body).await.ok();
            check!(status, { STATUS_CHECK => |s| *s == Some(200) });
            vuload::sleep(0.1).await;
        }
    })
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn ok_endpoint_passes_every_check() {
    let metrics = init();
    let state = MockState::default();
    let target = mock_endpoint(&state).await;

    let stats = ingest_scenario("ingest_ok", target)
        .vus(5)
        .duration(Duration::from_secs(2))
        .await
        .unwrap();

    let check = stats.check(STATUS_CHECK).unwrap();
    assert!(stats.iterations >= 5);
    assert_eq!(stats.interrupted_iterations, 0);
    assert_eq!(check.passes, stats.iterations);
    assert_eq!(check.fails, 0);
    assert_eq!(stats.requests_error, 0);
    assert_eq!(state.requests(), stats.requests());

    let rendered = metrics.render();
    assert!(rendered.contains(r#"vuload_checks{check="is status 200",result="pass"}"#));
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn server_error_fails_every_check_without_aborting() {
    init();
    let state = MockState::new(MockStatus::INTERNAL_SERVER_ERROR);
    let target = mock_endpoint(&state).await;

    let stats = ingest_scenario("ingest_500", target)
        .vus(5)
        .duration(Duration::from_secs(2))
        .await
        .unwrap();

    let check = stats.check(STATUS_CHECK).unwrap();
    assert!(stats.iterations >= 5);
    assert_eq!(check.passes, 0);
    assert_eq!(check.fails, stats.iterations);
    // A 500 is still a completed request; only the check fails.
    assert_eq!(stats.requests_error, 0);
    assert_eq!(state.requests(), stats.requests());
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn unreachable_endpoint_counts_request_errors() {
    init();

    let stats = ingest_scenario("ingest_refused", "http://127.0.0.1:1/dump/request".into())
        .vus(2)
        .duration(Duration::from_secs(1))
        .await
        .unwrap();

    let check = stats.check(STATUS_CHECK).unwrap();
    assert_eq!(check.passes, 0);
    assert_eq!(check.fails, stats.iterations);
    assert_eq!(stats.requests_success, 0);
    assert_eq!(stats.requests_error, stats.iterations);
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn endpoint_receives_fixed_payload_and_headers() {
    init();
    let state = MockState::default();
    let target = mock_endpoint(&state).await;

    iteration(&target).await;

    let request = state.last_request().unwrap();
    assert_eq!(request.method, "POST");
    assert_eq!(request.uri.path(), "/dump/request");
    assert_eq!(request.header("content-type"), Some("application/json"));
    assert_eq!(request.header("accept"), Some("application/json"));
    assert_eq!(request.header("user-agent"), Some("CARL"));
    assert_eq!(request.body, payload().unwrap().into_bytes());

    let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(body["events"][0]["ip"], "$remote");
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn iteration_pauses_one_second() {
    init();
    let state = MockState::default();
    let target = mock_endpoint(&state).await;

    for _ in 0..2 {
        let start = Instant::now();
        iteration(&target).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(1), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(1_500), "{elapsed:?}");
    }
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn request_count_follows_closed_loop_model() {
    init();
    let state = MockState::default();
    state.set_delay(Duration::from_millis(100));
    let target = mock_endpoint(&state).await;

    let vus = 10;
    let duration = Duration::from_secs(3);
    let stats = ingest_scenario("ingest_model", target)
        .vus(vus)
        .duration(duration)
        .await
        .unwrap();

    // vus * duration / (latency + think time)
    let expected = vus as f64 * duration.as_secs_f64() / 1.1;
    let received = state.requests() as f64;
    assert!(
        (received - expected).abs() <= expected * 0.25,
        "expected ~{expected}, received {received}"
    );
    assert_eq!(stats.check(STATUS_CHECK).unwrap().fails, 0);
    assert!(stats.latency_p50 >= Duration::from_millis(90));
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn scenario_request_passes_proxy_admission_rules() {
    init();
    let state = MockState::default();
    let target = mock_endpoint(&state).await;

    iteration(&target).await;

    let request = state.last_request().unwrap();
    assert!(!mock_service::is_bot(&request.headers));
    let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(validate_field_lengths(&body), Ok(()));
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn bot_user_agent_fails_status_check() {
    init();
    let state = MockState::default();
    let target = mock_endpoint(&state).await;

    let stats = variant_scenario("ingest_bot", target, BOT_USER_AGENT, payload().unwrap())
        .vus(2)
        .duration(Duration::from_secs(1))
        .await
        .unwrap();

    let check = stats.check(STATUS_CHECK).unwrap();
    assert!(stats.iterations >= 2);
    assert_eq!(check.passes, 0);
    assert_eq!(check.fails, stats.iterations);
    assert_eq!(state.requests(), stats.requests());
    assert_eq!(
        state.last_request().unwrap().header("user-agent"),
        Some(BOT_USER_AGENT)
    );
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn oversized_field_fails_status_check() {
    init();
    let state = MockState::default();
    let target = mock_endpoint(&state).await;

    let mut event = serde_json::to_value(request_template()).unwrap();
    event["events"][0]["event_properties"]["referrer"] = "x".repeat(MAX_FIELD_LENGTH + 1).into();
    let body = event.to_string();

    let stats = variant_scenario("ingest_oversized", target, "CARL", body)
        .vus(2)
        .duration(Duration::from_secs(1))
        .await
        .unwrap();

    let check = stats.check(STATUS_CHECK).unwrap();
    assert!(stats.iterations >= 2);
    assert_eq!(check.passes, 0);
    assert_eq!(check.fails, stats.iterations);
}
