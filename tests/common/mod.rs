#![allow(dead_code)]

use serde_json::{Value, json};
use std::time::Duration;
use stkpoll::application::poller::PollerSettings;

/// Fast timings for tests that talk to a real HTTP server.
pub fn quick_settings(countdown_secs: u32) -> PollerSettings {
    PollerSettings {
        poll_interval: Duration::from_millis(50),
        countdown_secs,
        success_delay: Duration::ZERO,
    }
}

pub fn stk_push_accepted(payment_id: Value) -> Value {
    json!({
        "success": true,
        "message": "Subscription STK push initiated successfully",
        "checkout_request_id": "ws_CO_191220191020363925",
        "subscription_payment_id": payment_id,
    })
}

pub fn payment_status(status: &str) -> Value {
    json!({ "id": 7, "status": status, "amount": "2000.00" })
}
