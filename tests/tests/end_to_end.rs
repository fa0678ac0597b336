mod utils;
#[allow(unused)]
use utils::*;

#[cfg(feature = "integration")]
mod tests {
    use super::*;

    use ingest_loadtest::{loadtest, OPTIONS, STATUS_CHECK};
    use mock_service::MockState;
    use std::net::SocketAddr;
    use std::time::Duration;
    use vuload::prelude::*;

    /// Full configured run against a stub bound on the proxy's own address.
    #[tokio::test(flavor = "multi_thread")]
    #[ntest::timeout(120_000)]
    async fn configured_run_against_stub() {
        init();

        let state = MockState::default();
        let addr: SocketAddr = "127.0.0.1:6191".parse().unwrap();
        tokio::spawn({
            let state = state.clone();
            async move { mock_service::run(addr, state).await }
        });
        tokio::time::sleep(Duration::from_millis(200)).await;

        let stats = loadtest().options(OPTIONS).await.unwrap();

        let expected = OPTIONS.vus as f64 * OPTIONS.duration.as_secs_f64();
        let received = state.requests() as f64;
        assert!(
            received >= expected * 0.9 && received <= expected * 1.1,
            "expected ~{expected}, received {received}"
        );

        let check = stats.check(STATUS_CHECK).unwrap();
        assert_eq!(check.fails, 0);
        assert_eq!(check.passes, stats.iterations);
        assert_eq!(stats.vus, OPTIONS.vus);
        assert!(stats.elapsed >= OPTIONS.duration);
        assert!(stats.elapsed < OPTIONS.duration + Duration::from_secs(5));
    }
}
