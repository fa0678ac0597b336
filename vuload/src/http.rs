//! Shared HTTP client for scenarios. (requires `http` feature)
use reqwest::Client;
use std::sync::OnceLock;
use vuload_core::DEFAULT_HTTP_TIMEOUT;

static CLIENT: OnceLock<Client> = OnceLock::new();

/// Client shared by every virtual user, so connections are pooled across the whole run.
///
/// Requests time out after [`DEFAULT_HTTP_TIMEOUT`].
///
/// # Panics
///
/// If the TLS backend cannot be initialized. Nothing can be sent without it.
pub fn client() -> &'static Client {
    CLIENT.get_or_init(|| {
        Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .expect("failed to build HTTP client; no TLS backend or resolver, cannot run")
    })
}
