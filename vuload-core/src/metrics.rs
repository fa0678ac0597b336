#[derive(Copy, Clone)]
pub struct TransactionLabels {
    pub success: &'static str,
    pub error: &'static str,
    pub latency: &'static str,
}

#[macro_export]
macro_rules! generate_labels {
    ($base_name:expr) => {
        ::vuload::TransactionLabels {
            success: concat!(stringify!($base_name), "_success"),
            error: concat!(stringify!($base_name), "_error"),
            latency: concat!(stringify!($base_name), "_latency"),
        }
    };
}

/// Counter incremented once per evaluated check, labelled with `check` and `result`.
pub const CHECKS_METRIC: &str = "vuload_checks";

/// Counter incremented once per completed iteration.
pub const ITERATIONS_METRIC: &str = "vuload_iterations";

/// Gauge holding the number of running virtual users.
pub const VUS_METRIC: &str = "vuload_vus";
