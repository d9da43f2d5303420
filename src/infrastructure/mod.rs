//! Adapters implementing [`crate::domain::ports::PaymentGateway`].

pub mod http;
pub mod in_memory;
