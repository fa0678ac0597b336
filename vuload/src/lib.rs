//! A closed-loop virtual-user load engine.
//!
//! A scenario is an `async fn` describing one iteration. The engine runs a fixed number of
//! virtual users, each calling the iteration in a loop for a fixed duration, and collects
//! request, latency and check statistics along the way.
//!
//! ```no_run
//! use vuload::prelude::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let stats = my_scenario()
//!         .vus(10)
//!         .duration(Duration::from_secs(30))
//!         .await
//!         .unwrap();
//!     println!("{stats}");
//! }
//!
//! #[scenario]
//! async fn my_scenario() {
//!     let ok = my_request().await.is_ok();
//!     check!(ok, { "request succeeded" => |ok| *ok });
//!     vuload::sleep(1.).await;
//! }
//!
//! #[transaction]
//! async fn my_request() -> Result<(), ()> {
//!     Ok(())
//! }
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate self as vuload;

pub mod check;
#[cfg(feature = "http")]
pub mod http;
pub mod scenario;
#[doc(hidden)]
pub mod transaction;

mod measurement;
mod sleep;
mod task_atomics;
mod timer;
mod virtual_users;

pub use scenario::Scenario;
pub use sleep::sleep;
pub use vuload_core::{
    generate_labels, CheckSummary, ConfigError, Options, RunStatistics, TransactionLabels,
};
pub use vuload_macros::{scenario, transaction};

pub mod prelude {
    pub use crate::check;
    pub use crate::scenario::ConfigurableScenario;
    pub use vuload_core::{ConfigError, Options, RunStatistics};
    pub use vuload_macros::{scenario, transaction};
}
