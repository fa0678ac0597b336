use std::time::Duration;

/// How long in-flight iterations may keep running once the scenario duration has elapsed.
pub const DEFAULT_GRACEFUL_STOP: Duration = Duration::from_secs(30);

/// Timeout applied to every request made through the shared HTTP client.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Interval between progress reports while a scenario runs.
pub const REPORT_INTERVAL: Duration = Duration::from_secs(1);
