use crate::domain::ports::PaymentGatewayBox;
use crate::domain::subscription::SubscriptionHealth;
use chrono::{DateTime, Utc};
use tracing::warn;

/// Reports whether the landlord's subscription is still usable.
pub struct SubscriptionMonitor {
    gateway: PaymentGatewayBox,
}

impl SubscriptionMonitor {
    pub fn new(gateway: PaymentGatewayBox) -> Self {
        Self { gateway }
    }

    pub async fn check(&self) -> SubscriptionHealth {
        self.check_at(Utc::now()).await
    }

    /// Never fails: if the backend cannot be reached the subscription is
    /// reported active with the error attached.
    pub async fn check_at(&self, now: DateTime<Utc>) -> SubscriptionHealth {
        match self.gateway.subscription_status().await {
            Ok(snapshot) => snapshot.evaluate(now),
            Err(err) => {
                warn!(error = %err, "Error checking subscription");
                SubscriptionHealth::unknown(err.user_message().to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::GatewayError;
    use crate::domain::subscription::SubscriptionSnapshot;
    use crate::infrastructure::in_memory::{Script, ScriptedGateway};
    use chrono::{Duration, TimeZone};

    #[tokio::test]
    async fn test_expiring_subscription() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let snapshot = SubscriptionSnapshot {
            plan: Some("professional".to_string()),
            is_active: true,
            expiry_date: Some(now + Duration::days(5)),
            status: Some("Subscribed".to_string()),
        };
        let monitor = SubscriptionMonitor::new(Box::new(ScriptedGateway::new(
            Script::default().subscription(Ok(snapshot)),
        )));

        let health = monitor.check_at(now).await;
        assert_eq!(health.plan.as_deref(), Some("professional"));
        assert_eq!(health.days_until_expiry, Some(5));
        assert!(health.is_active);
    }

    #[tokio::test]
    async fn test_unreachable_backend_fails_open() {
        let monitor = SubscriptionMonitor::new(Box::new(ScriptedGateway::new(
            Script::default().subscription(Err(GatewayError::Transport("timed out".to_string()))),
        )));

        let health = monitor.check().await;
        assert!(health.is_active);
        assert!(!health.is_expired);
        assert_eq!(health.error.as_deref(), Some("timed out"));
    }
}
