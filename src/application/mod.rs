//! Application layer orchestrating the domain against a payment gateway.
//!
//! `CheckoutPoller` owns one checkout attempt at a time: it validates input,
//! initiates the STK push and then races status polling against the countdown
//! inside a single `tokio::select!` loop. `SubscriptionMonitor` answers whether
//! the current subscription is still usable.

pub mod poller;
pub mod subscription;
