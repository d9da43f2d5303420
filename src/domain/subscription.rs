use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Subscription record as returned by the backend.
///
/// Landlords without a subscription only get a `status` string back.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SubscriptionSnapshot {
    pub plan: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    pub expiry_date: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionHealth {
    pub plan: Option<String>,
    pub is_active: bool,
    pub is_expired: bool,
    pub days_until_expiry: Option<i64>,
    pub error: Option<String>,
}

impl SubscriptionHealth {
    /// Health reported when the backend could not be reached. Treated as active.
    pub fn unknown(error: String) -> Self {
        Self {
            plan: None,
            is_active: true,
            is_expired: false,
            days_until_expiry: None,
            error: Some(error),
        }
    }
}

impl SubscriptionSnapshot {
    pub fn evaluate(&self, now: DateTime<Utc>) -> SubscriptionHealth {
        match self.expiry_date {
            Some(expiry) => {
                let days = days_until(expiry, now);
                SubscriptionHealth {
                    plan: self.plan.clone(),
                    is_active: self.is_active && days > 0,
                    is_expired: days <= 0,
                    days_until_expiry: Some(days),
                    error: None,
                }
            }
            None => SubscriptionHealth {
                plan: self.plan.clone(),
                is_active: false,
                is_expired: true,
                days_until_expiry: None,
                error: None,
            },
        }
    }
}

/// Whole days left, rounded up: anything remaining of a day counts as a day.
fn days_until(expiry: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (expiry - now).num_milliseconds();
    millis.div_euclid(MILLIS_PER_DAY) + i64::from(millis.rem_euclid(MILLIS_PER_DAY) != 0)
}
