use crate::DEFAULT_GRACEFUL_STOP;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSecondsWithFrac};
use std::time::Duration;
use thiserror::Error;

/// Static execution options of a scenario.
///
/// Intended to be declared as a `const` next to the scenario it drives:
///
/// ```
/// use std::time::Duration;
/// use vuload_core::Options;
///
/// pub const OPTIONS: Options = Options {
///     vus: 10,
///     duration: Duration::from_secs(30),
/// };
/// ```
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Number of virtual users running the scenario concurrently.
    pub vus: usize,
    /// Wall-clock length of the run.
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub duration: Duration,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("scenario `{0}` has no virtual users configured")]
    NoVirtualUsers(String),

    #[error("scenario `{0}` has no duration configured")]
    NoDuration(String),
}

// TODO: Have a separate builder
#[doc(hidden)]
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    pub vus: Option<usize>,
    #[serde_as(as = "Option<DurationSecondsWithFrac<f64>>")]
    pub duration: Option<Duration>,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub graceful_stop: Duration,
}

impl ScenarioConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            vus: None,
            duration: None,
            graceful_stop: DEFAULT_GRACEFUL_STOP,
        }
    }

    pub fn set_options(&mut self, options: Options) {
        self.vus = Some(options.vus);
        self.duration = Some(options.duration);
    }

    /// Resolve the configuration into runnable options, rejecting anything the engine cannot run.
    pub fn validate(&self) -> Result<Options, ConfigError> {
        let vus = match self.vus {
            Some(vus) if vus > 0 => vus,
            _ => return Err(ConfigError::NoVirtualUsers(self.name.clone())),
        };

        let duration = match self.duration {
            Some(duration) if !duration.is_zero() => duration,
            _ => return Err(ConfigError::NoDuration(self.name.clone())),
        };

        Ok(Options { vus, duration })
    }
}

impl std::fmt::Display for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} VUs for {}",
            self.vus,
            humantime::format_duration(self.duration)
        )
    }
}
