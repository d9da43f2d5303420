//! Domain layer: the checkout session state machine and the values it works with.
//!
//! Nothing in here performs I/O. The backend is reached only through the
//! [`ports::PaymentGateway`] trait.

pub mod message;
pub mod phone;
pub mod ports;
pub mod session;
pub mod status;
pub mod subscription;
