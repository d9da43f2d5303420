use super::message::user_message;
use super::phone::PhoneNumber;
use super::status::RemoteStatus;
use super::subscription::SubscriptionSnapshot;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Body of the STK push initiation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StkPushRequest {
    pub plan: String,
    pub phone_number: PhoneNumber,
}

/// Reply to the STK push initiation call.
///
/// A rejected initiation may still come back with a 2xx status and
/// `success: false`, so the error fields are kept alongside the ids.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StkPushResponse {
    #[serde(default)]
    pub success: bool,
    pub checkout_request_id: Option<String>,
    #[serde(default, deserialize_with = "opaque_id")]
    pub subscription_payment_id: Option<String>,
    pub error: Option<Value>,
    pub details: Option<Value>,
    pub message: Option<Value>,
}

impl StkPushResponse {
    /// The message to show when this reply does not start a payment.
    pub fn failure_message(&self) -> String {
        let fields = [
            ("error", &self.error),
            ("details", &self.details),
            ("message", &self.message),
        ];
        let body: serde_json::Map<String, Value> = fields
            .into_iter()
            .filter_map(|(key, value)| value.clone().map(|value| (key.to_string(), value)))
            .collect();
        user_message(Some(&Value::Object(body)), None)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentStatusResponse {
    pub status: RemoteStatus,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// The backend answered with an error status.
    #[error("backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    /// The backend could not be reached or its reply could not be read.
    #[error("transport error: {0}")]
    Transport(String),
}

impl GatewayError {
    /// The text a user should see for this error.
    pub fn user_message(&self) -> &str {
        match self {
            GatewayError::Rejected { message, .. } => message,
            GatewayError::Transport(message) => message,
        }
    }
}

/// The backend collaborator that owns payments and subscriptions.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initiate_stk_push(
        &self,
        request: &StkPushRequest,
    ) -> Result<StkPushResponse, GatewayError>;

    async fn payment_status(&self, payment_id: &str)
    -> Result<PaymentStatusResponse, GatewayError>;

    async fn subscription_status(&self) -> Result<SubscriptionSnapshot, GatewayError>;
}

pub type PaymentGatewayBox = Box<dyn PaymentGateway>;

/// Accepts an id sent either as a JSON string or a JSON number.
fn opaque_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(id)) if !id.is_empty() => Some(id),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    })
}
