use lazy_static::lazy_static;
use prometheus::{register_counter, register_counter_vec, Counter, CounterVec};

lazy_static! {
    pub static ref LOGINS_COUNTER: CounterVec = register_counter_vec!(
        "api_logins_total",
        "Login attempts by status",
        &["status"]
    ).unwrap();

    pub static ref REFRESH_COUNTER: CounterVec = register_counter_vec!(
        "api_token_refresh_total",
        "Refresh-token exchanges by outcome",
        &["outcome"]
    ).unwrap();

    pub static ref SILENT_REFRESH_COUNTER: CounterVec = register_counter_vec!(
        "api_silent_refresh_total",
        "Access tokens renewed by the auto-refresh middleware, by outcome",
        &["outcome"]
    ).unwrap();

    pub static ref RECEIPTS_COUNTER: Counter = register_counter!(
        "api_receipts_created_total",
        "Receipts created"
    ).unwrap();
}
