use crate::config::CheckoutConfig;
use crate::domain::message::user_message;
use crate::domain::ports::{
    GatewayError, PaymentGateway, PaymentStatusResponse, StkPushRequest, StkPushResponse,
};
use crate::domain::subscription::SubscriptionSnapshot;
use crate::error::{self, CheckoutError};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

const STK_PUSH_PATH: &str = "payments/stk-push-subscription/";
const SUBSCRIPTION_STATUS_PATH: &str = "accounts/subscription/status/";

/// [`PaymentGateway`] backed by the rental platform's REST API.
pub struct HttpPaymentGateway {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpPaymentGateway {
    pub fn new(config: &CheckoutConfig) -> error::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| CheckoutError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let builder = self.client.request(method, url);
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, GatewayError> {
        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        let url = response.url().clone();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        debug!(%url, status = status.as_u16(), "Backend response");

        if !status.is_success() {
            // Only JSON bodies are shown; HTML error pages can carry stack traces.
            let body = serde_json::from_str::<Value>(&text).ok();
            let fallback = match &body {
                Some(value) => value.to_string(),
                None => format!("Request failed with status code {}", status.as_u16()),
            };
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message: user_message(body.as_ref(), Some(&fallback)),
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| GatewayError::Transport(format!("Invalid response from {url}: {e}")))
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn initiate_stk_push(
        &self,
        request: &StkPushRequest,
    ) -> Result<StkPushResponse, GatewayError> {
        self.send(self.request(Method::POST, STK_PUSH_PATH).json(request))
            .await
    }

    async fn payment_status(
        &self,
        payment_id: &str,
    ) -> Result<PaymentStatusResponse, GatewayError> {
        let path = format!("payments/subscription-payment-status/{payment_id}/");
        self.send(self.request(Method::GET, &path)).await
    }

    async fn subscription_status(&self) -> Result<SubscriptionSnapshot, GatewayError> {
        self.send(self.request(Method::GET, SUBSCRIPTION_STATUS_PATH))
            .await
    }
}
