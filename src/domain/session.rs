use super::phone::PhoneNumber;
use super::status::RemoteStatus;
use serde::Serialize;

/// Seconds the user gets to approve the STK prompt before the client gives up.
pub const DEFAULT_COUNTDOWN_SECS: u32 = 180;

/// Message surfaced when the backend reports the payment as failed.
pub const REMOTE_FAILURE_MESSAGE: &str = "Payment failed. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Failed,
    Timeout,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionStatus::Success | SessionStatus::Failed | SessionStatus::Timeout
        )
    }
}

/// Everything that can change a [`PaymentSession`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Initiated {
        plan_id: String,
        phone_number: PhoneNumber,
        payment_id: String,
        checkout_request_id: Option<String>,
    },
    InitiationFailed {
        plan_id: String,
        phone_number: PhoneNumber,
        message: String,
    },
    PollResult(RemoteStatus),
    Tick,
    Retry,
}

/// Client-side record of one checkout attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentSession {
    pub plan_id: Option<String>,
    pub phone_number: Option<PhoneNumber>,
    pub payment_id: Option<String>,
    pub checkout_request_id: Option<String>,
    pub status: SessionStatus,
    pub countdown_seconds: u32,
    pub error_message: Option<String>,
    #[serde(skip)]
    budget_seconds: u32,
}

impl PaymentSession {
    /// Creates an idle session whose countdown starts at `budget_seconds`.
    pub fn new(budget_seconds: u32) -> Self {
        Self {
            plan_id: None,
            phone_number: None,
            payment_id: None,
            checkout_request_id: None,
            status: SessionStatus::Idle,
            countdown_seconds: budget_seconds,
            error_message: None,
            budget_seconds,
        }
    }

    pub fn budget_seconds(&self) -> u32 {
        self.budget_seconds
    }

    /// Applies `event` and returns the new status if the status changed.
    ///
    /// Terminal states only accept `Retry`. Initiation events only apply to an idle
    /// session, and poll results and ticks only to a pending one, so whichever of a
    /// poll result or the final tick arrives first claims the terminal state and the
    /// other is ignored.
    pub fn apply(&mut self, event: SessionEvent) -> Option<SessionStatus> {
        match event {
            SessionEvent::Retry => {
                let previous = self.status;
                *self = Self::new(self.budget_seconds);
                (previous != SessionStatus::Idle).then_some(SessionStatus::Idle)
            }
            SessionEvent::Initiated {
                plan_id,
                phone_number,
                payment_id,
                checkout_request_id,
            } => {
                if self.status != SessionStatus::Idle {
                    return None;
                }
                self.plan_id = Some(plan_id);
                self.phone_number = Some(phone_number);
                self.payment_id = Some(payment_id);
                self.checkout_request_id = checkout_request_id;
                self.countdown_seconds = self.budget_seconds;
                self.error_message = None;
                self.transition(SessionStatus::Pending)
            }
            SessionEvent::InitiationFailed {
                plan_id,
                phone_number,
                message,
            } => {
                if self.status != SessionStatus::Idle {
                    return None;
                }
                self.plan_id = Some(plan_id);
                self.phone_number = Some(phone_number);
                self.error_message = Some(message);
                self.transition(SessionStatus::Failed)
            }
            SessionEvent::PollResult(remote) => {
                if self.status != SessionStatus::Pending || !remote.is_terminal() {
                    return None;
                }
                if remote == RemoteStatus::Success {
                    self.transition(SessionStatus::Success)
                } else {
                    self.error_message = Some(REMOTE_FAILURE_MESSAGE.to_string());
                    self.transition(SessionStatus::Failed)
                }
            }
            SessionEvent::Tick => {
                if self.status != SessionStatus::Pending {
                    return None;
                }
                self.countdown_seconds = self.countdown_seconds.saturating_sub(1);
                if self.countdown_seconds == 0 {
                    self.transition(SessionStatus::Timeout)
                } else {
                    None
                }
            }
        }
    }

    fn transition(&mut self, next: SessionStatus) -> Option<SessionStatus> {
        self.status = next;
        Some(next)
    }
}

impl Default for PaymentSession {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTDOWN_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone() -> PhoneNumber {
        PhoneNumber::parse("0712345678").unwrap()
    }

    fn pending_session(budget: u32) -> PaymentSession {
        let mut session = PaymentSession::new(budget);
        session.apply(SessionEvent::Initiated {
            plan_id: "tier1".to_string(),
            phone_number: phone(),
            payment_id: "SP1".to_string(),
            checkout_request_id: Some("ws_CO_1".to_string()),
        });
        session
    }

    #[test]
    fn test_initiated_enters_pending_with_full_budget() {
        let session = pending_session(180);
        assert_eq!(session.status, SessionStatus::Pending);
        assert_eq!(session.countdown_seconds, 180);
        assert_eq!(session.payment_id.as_deref(), Some("SP1"));
    }

    #[test]
    fn test_pending_poll_keeps_pending() {
        let mut session = pending_session(180);
        let changed = session.apply(SessionEvent::PollResult(RemoteStatus::from("Pending")));
        assert_eq!(changed, None);
        assert_eq!(session.status, SessionStatus::Pending);
    }

    #[test]
    fn test_remote_failure_sets_message() {
        let mut session = pending_session(180);
        let changed = session.apply(SessionEvent::PollResult(RemoteStatus::Failed));
        assert_eq!(changed, Some(SessionStatus::Failed));
        assert_eq!(
            session.error_message.as_deref(),
            Some(REMOTE_FAILURE_MESSAGE)
        );
    }

    #[test]
    fn test_countdown_reaches_zero_times_out() {
        let mut session = pending_session(3);
        assert_eq!(session.apply(SessionEvent::Tick), None);
        assert_eq!(session.apply(SessionEvent::Tick), None);
        assert_eq!(
            session.apply(SessionEvent::Tick),
            Some(SessionStatus::Timeout)
        );
        assert_eq!(session.countdown_seconds, 0);
    }

    #[test]
    fn test_first_terminal_claim_wins() {
        // Timeout claimed first: a late success is ignored.
        let mut session = pending_session(1);
        assert_eq!(
            session.apply(SessionEvent::Tick),
            Some(SessionStatus::Timeout)
        );
        assert_eq!(
            session.apply(SessionEvent::PollResult(RemoteStatus::Success)),
            None
        );
        assert_eq!(session.status, SessionStatus::Timeout);

        // Success claimed first: the final tick is ignored.
        let mut session = pending_session(1);
        assert_eq!(
            session.apply(SessionEvent::PollResult(RemoteStatus::Success)),
            Some(SessionStatus::Success)
        );
        assert_eq!(session.apply(SessionEvent::Tick), None);
        assert_eq!(session.status, SessionStatus::Success);
        assert_eq!(session.countdown_seconds, 1);
    }

    #[test]
    fn test_terminal_states_ignore_initiation() {
        let mut session = pending_session(180);
        session.apply(SessionEvent::PollResult(RemoteStatus::Failed));

        let changed = session.apply(SessionEvent::Initiated {
            plan_id: "tier2".to_string(),
            phone_number: phone(),
            payment_id: "SP2".to_string(),
            checkout_request_id: None,
        });
        assert_eq!(changed, None);
        assert_eq!(session.payment_id.as_deref(), Some("SP1"));
    }

    #[test]
    fn test_retry_resets_to_fresh_idle() {
        let mut session = pending_session(180);
        session.apply(SessionEvent::Tick);
        session.apply(SessionEvent::PollResult(RemoteStatus::Failed));

        assert_eq!(
            session.apply(SessionEvent::Retry),
            Some(SessionStatus::Idle)
        );
        assert_eq!(session, PaymentSession::new(180));
        assert_eq!(session.countdown_seconds, session.budget_seconds());
    }

    #[test]
    fn test_initiation_failure_from_idle() {
        let mut session = PaymentSession::default();
        let changed = session.apply(SessionEvent::InitiationFailed {
            plan_id: "tier1".to_string(),
            phone_number: phone(),
            message: "Insufficient balance".to_string(),
        });
        assert_eq!(changed, Some(SessionStatus::Failed));
        assert_eq!(session.payment_id, None);
        assert_eq!(session.error_message.as_deref(), Some("Insufficient balance"));
    }
}
