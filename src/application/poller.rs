use crate::domain::message::FALLBACK_MESSAGE;
use crate::domain::phone::PhoneNumber;
use crate::domain::ports::{
    GatewayError, PaymentGateway, PaymentGatewayBox, PaymentStatusResponse, StkPushRequest,
    StkPushResponse,
};
use crate::domain::session::{DEFAULT_COUNTDOWN_SECS, PaymentSession, SessionEvent, SessionStatus};
use crate::error::{CheckoutError, Result};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

const TICK: Duration = Duration::from_secs(1);

type PollFuture<'a> =
    Pin<Box<dyn Future<Output = std::result::Result<PaymentStatusResponse, GatewayError>> + Send + 'a>>;

/// Timing of one checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerSettings {
    /// Gap between a status response and the next status request.
    pub poll_interval: Duration,
    /// Countdown budget in seconds.
    pub countdown_secs: u32,
    /// How long a success stays on screen before `run` hands it back.
    pub success_delay: Duration,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            success_delay: Duration::from_secs(3),
        }
    }
}

/// Holds the session and publishes every change to it.
struct SessionCell {
    session: PaymentSession,
    updates: watch::Sender<PaymentSession>,
}

impl SessionCell {
    fn apply(&mut self, event: SessionEvent) -> Option<SessionStatus> {
        let changed = self.session.apply(event);
        if let Some(status) = changed {
            info!(
                status = ?status,
                payment_id = self.session.payment_id.as_deref().unwrap_or("-"),
                countdown = self.session.countdown_seconds,
                "Payment session transition"
            );
        }
        let session = &self.session;
        self.updates.send_if_modified(|current| {
            if current != session {
                *current = session.clone();
                true
            } else {
                false
            }
        });
        changed
    }
}

/// Drives one subscription checkout: STK push initiation, then status polling
/// raced against a countdown.
///
/// Both timers live inside [`CheckoutPoller::run`]. They stop when the session
/// leaves `pending` or when the `run` future is dropped, so nothing keeps polling
/// after the caller has stopped listening.
pub struct CheckoutPoller {
    gateway: PaymentGatewayBox,
    settings: PollerSettings,
    cell: SessionCell,
}

impl CheckoutPoller {
    pub fn new(gateway: PaymentGatewayBox, settings: PollerSettings) -> Self {
        let session = PaymentSession::new(settings.countdown_secs);
        let (updates, _) = watch::channel(session.clone());
        Self {
            gateway,
            settings,
            cell: SessionCell { session, updates },
        }
    }

    pub fn session(&self) -> &PaymentSession {
        &self.cell.session
    }

    /// Receives a copy of the session every time it changes.
    pub fn subscribe(&self) -> watch::Receiver<PaymentSession> {
        self.cell.updates.subscribe()
    }

    /// Validates the input and asks the backend to push the payment prompt.
    ///
    /// Invalid input is rejected before any request is made and leaves the
    /// current session untouched. Otherwise the previous session is discarded.
    /// On success the session is `pending` and [`run`](Self::run) can start
    /// polling; on failure it is `failed` and the error carries the message to
    /// show the user.
    pub async fn initiate(&mut self, plan_id: &str, phone_number: &str) -> Result<&PaymentSession> {
        let plan_id = plan_id.trim();
        if plan_id.is_empty() {
            return Err(CheckoutError::Validation(
                "Please select a subscription plan first".to_string(),
            ));
        }
        let phone_number = PhoneNumber::parse(phone_number)?;

        self.cell.apply(SessionEvent::Retry);

        let request = StkPushRequest {
            plan: plan_id.to_string(),
            phone_number: phone_number.clone(),
        };
        info!(plan = plan_id, phone = %phone_number, "Initiating subscription STK push");

        let outcome = self.gateway.initiate_stk_push(&request).await;
        let event = match outcome {
            Ok(StkPushResponse {
                success: true,
                subscription_payment_id: Some(payment_id),
                checkout_request_id,
                ..
            }) => SessionEvent::Initiated {
                plan_id: request.plan,
                phone_number,
                payment_id,
                checkout_request_id,
            },
            Ok(response) => SessionEvent::InitiationFailed {
                plan_id: request.plan,
                phone_number,
                message: response.failure_message(),
            },
            Err(err) => {
                warn!(error = %err, "STK push initiation failed");
                SessionEvent::InitiationFailed {
                    plan_id: request.plan,
                    phone_number,
                    message: err.user_message().to_string(),
                }
            }
        };
        self.cell.apply(event);

        if self.cell.session.status == SessionStatus::Pending {
            Ok(&self.cell.session)
        } else {
            let message = self
                .cell
                .session
                .error_message
                .clone()
                .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
            Err(CheckoutError::Initiation(message))
        }
    }

    /// Polls until the session reaches a terminal state and returns it.
    ///
    /// Returns immediately, without any request, unless the session is `pending`.
    /// A status request is only sent once the previous one has resolved, so slow
    /// responses never stack up. Errors while polling are logged and never end
    /// the session; only an explicit remote status or the countdown does.
    pub async fn run(&mut self) -> SessionStatus {
        let payment_id = match (&self.cell.session.status, &self.cell.session.payment_id) {
            (SessionStatus::Pending, Some(payment_id)) => payment_id.clone(),
            (status, _) => return *status,
        };

        let gateway: &dyn PaymentGateway = self.gateway.as_ref();
        let settings = &self.settings;
        let cell = &mut self.cell;

        let start = Instant::now();
        let mut countdown = time::interval_at(start + TICK, TICK);
        let next_poll = time::sleep_until(start + settings.poll_interval);
        tokio::pin!(next_poll);
        let mut in_flight: Option<PollFuture<'_>> = None;

        while cell.session.status == SessionStatus::Pending {
            tokio::select! {
                _ = countdown.tick() => {
                    cell.apply(SessionEvent::Tick);
                    debug!(countdown = cell.session.countdown_seconds, "Countdown tick");
                }
                () = &mut next_poll, if in_flight.is_none() => {
                    debug!(payment_id = %payment_id, "Checking payment status");
                    in_flight = Some(gateway.payment_status(&payment_id));
                }
                result = in_flight_result(&mut in_flight), if in_flight.is_some() => {
                    in_flight = None;
                    match result {
                        Ok(response) => {
                            debug!(payment_id = %payment_id, status = ?response.status, "Payment status received");
                            cell.apply(SessionEvent::PollResult(response.status));
                        }
                        Err(err) => {
                            warn!(payment_id = %payment_id, error = %err, "Error checking payment status");
                        }
                    }
                    next_poll.as_mut().reset(Instant::now() + settings.poll_interval);
                }
            }
        }
        drop(in_flight);

        let status = cell.session.status;
        match status {
            SessionStatus::Success => {
                info!(payment_id = %payment_id, "Subscription payment successful");
                time::sleep(settings.success_delay).await;
            }
            SessionStatus::Failed => {
                warn!(payment_id = %payment_id, "Subscription payment failed");
            }
            SessionStatus::Timeout => {
                warn!(payment_id = %payment_id, "Gave up waiting for payment confirmation");
            }
            SessionStatus::Idle | SessionStatus::Pending => {}
        }
        status
    }

    /// Discards the session so a fresh [`initiate`](Self::initiate) can follow.
    pub fn retry(&mut self) -> &PaymentSession {
        self.cell.apply(SessionEvent::Retry);
        &self.cell.session
    }

    /// Stops observing the current attempt, e.g. when the user leaves checkout.
    ///
    /// The payment already requested from the provider is not affected. A session
    /// that already reached its outcome keeps it.
    pub fn abandon(&mut self) {
        if self.cell.session.status.is_terminal() {
            return;
        }
        if let Some(payment_id) = self.cell.session.payment_id.as_deref() {
            info!(payment_id, "Abandoning payment session");
        }
        self.cell.apply(SessionEvent::Retry);
    }
}

async fn in_flight_result(
    in_flight: &mut Option<PollFuture<'_>>,
) -> std::result::Result<PaymentStatusResponse, GatewayError> {
    match in_flight {
        Some(request) => request.await,
        None => std::future::pending().await,
    }
}
