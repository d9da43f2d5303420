use crate::domain::ports::{
    GatewayError, PaymentGateway, PaymentStatusResponse, StkPushRequest, StkPushResponse,
};
use crate::domain::status::RemoteStatus;
use crate::domain::subscription::SubscriptionSnapshot;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

type Reply<T> = Result<T, GatewayError>;

/// Canned backend replies, consumed in order.
///
/// Once the status replies run out the payment stays `Pending`.
#[derive(Debug, Default)]
pub struct Script {
    initiations: VecDeque<Reply<StkPushResponse>>,
    statuses: VecDeque<Reply<PaymentStatusResponse>>,
    subscription: Option<Reply<SubscriptionSnapshot>>,
}

impl Script {
    /// Queues a successful initiation returning `payment_id`.
    pub fn accepting(mut self, payment_id: &str) -> Self {
        self.initiations.push_back(Ok(StkPushResponse {
            success: true,
            checkout_request_id: Some(format!("ws_CO_{payment_id}")),
            subscription_payment_id: Some(payment_id.to_string()),
            ..Default::default()
        }));
        self
    }

    /// Queues an initiation answered with `success: false` and `error`.
    pub fn rejecting(mut self, error: &str) -> Self {
        self.initiations.push_back(Ok(StkPushResponse {
            success: false,
            error: Some(Value::String(error.to_string())),
            ..Default::default()
        }));
        self
    }

    pub fn initiation_error(mut self, error: GatewayError) -> Self {
        self.initiations.push_back(Err(error));
        self
    }

    pub fn statuses<'a>(mut self, statuses: impl IntoIterator<Item = &'a str>) -> Self {
        self.statuses.extend(statuses.into_iter().map(|status| {
            Ok(PaymentStatusResponse {
                status: RemoteStatus::from(status),
            })
        }));
        self
    }

    pub fn status_error(mut self, error: GatewayError) -> Self {
        self.statuses.push_back(Err(error));
        self
    }

    pub fn subscription(mut self, reply: Reply<SubscriptionSnapshot>) -> Self {
        self.subscription = Some(reply);
        self
    }
}

#[derive(Debug, Default)]
struct CallLog {
    initiations: Vec<StkPushRequest>,
    status_checks: Vec<String>,
}

/// An in-process [`PaymentGateway`] that plays back a [`Script`].
///
/// Clones share the script and the call log, so a test can hand one clone to
/// the poller and inspect the calls through another. Also backs `--simulate`.
#[derive(Clone)]
pub struct ScriptedGateway {
    script: Arc<Mutex<Script>>,
    calls: Arc<Mutex<CallLog>>,
    poll_delay: Duration,
    polls_in_flight: Arc<AtomicUsize>,
    max_polls_in_flight: Arc<AtomicUsize>,
}

impl ScriptedGateway {
    pub fn new(script: Script) -> Self {
        Self {
            script: Arc::new(Mutex::new(script)),
            calls: Arc::default(),
            poll_delay: Duration::ZERO,
            polls_in_flight: Arc::default(),
            max_polls_in_flight: Arc::default(),
        }
    }

    /// A sandbox backend: accepts the push, confirms it on the third status
    /// check and reports a starter subscription with 30 days left.
    pub fn simulated() -> Self {
        let subscription = SubscriptionSnapshot {
            plan: Some("starter".to_string()),
            is_active: true,
            expiry_date: Some(Utc::now() + ChronoDuration::days(30)),
            status: Some("Subscribed".to_string()),
        };
        Self::new(
            Script::default()
                .accepting("SIM-1")
                .statuses(["Pending", "Pending", "Success"])
                .subscription(Ok(subscription)),
        )
    }

    /// Delays every status reply by `delay`.
    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    pub async fn initiate_calls(&self) -> usize {
        self.calls.lock().await.initiations.len()
    }

    pub async fn initiation_requests(&self) -> Vec<StkPushRequest> {
        self.calls.lock().await.initiations.clone()
    }

    pub async fn status_calls(&self) -> usize {
        self.calls.lock().await.status_checks.len()
    }

    /// Highest number of status requests that were ever running at once.
    pub fn max_concurrent_polls(&self) -> usize {
        self.max_polls_in_flight.load(Ordering::SeqCst)
    }
}

/// Counts a status request as running until dropped.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>, max: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(now, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn initiate_stk_push(&self, request: &StkPushRequest) -> Reply<StkPushResponse> {
        self.calls.lock().await.initiations.push(request.clone());
        self.script
            .lock()
            .await
            .initiations
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::Transport("no initiation scripted".to_string())))
    }

    async fn payment_status(&self, payment_id: &str) -> Reply<PaymentStatusResponse> {
        let _in_flight = InFlight::enter(&self.polls_in_flight, &self.max_polls_in_flight);
        self.calls
            .lock()
            .await
            .status_checks
            .push(payment_id.to_string());

        if !self.poll_delay.is_zero() {
            tokio::time::sleep(self.poll_delay).await;
        }

        self.script.lock().await.statuses.pop_front().unwrap_or_else(|| {
            Ok(PaymentStatusResponse {
                status: RemoteStatus::Pending("Pending".to_string()),
            })
        })
    }

    async fn subscription_status(&self) -> Reply<SubscriptionSnapshot> {
        self.script
            .lock()
            .await
            .subscription
            .clone()
            .unwrap_or_else(|| Err(GatewayError::Transport("no subscription scripted".to_string())))
    }
}
