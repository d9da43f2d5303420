use serde::{Deserialize, Deserializer};

/// Payment status as reported by the backend status endpoint.
///
/// Only an explicit success or failure is terminal. Any other string, including
/// ones this client has never seen, means the payment is still in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    Success,
    Failed,
    Pending(String),
}

impl RemoteStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RemoteStatus::Pending(_))
    }
}

impl From<&str> for RemoteStatus {
    fn from(raw: &str) -> Self {
        // Rent and deposit payments are written in lowercase by the backend.
        match raw {
            "Success" | "success" | "completed" => RemoteStatus::Success,
            "Failed" | "failed" => RemoteStatus::Failed,
            other => RemoteStatus::Pending(other.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for RemoteStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(RemoteStatus::from).unwrap_or_else(|| {
            RemoteStatus::Pending(String::new())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert_eq!(RemoteStatus::from("Success"), RemoteStatus::Success);
        assert_eq!(RemoteStatus::from("completed"), RemoteStatus::Success);
        assert_eq!(RemoteStatus::from("Failed"), RemoteStatus::Failed);
        assert_eq!(RemoteStatus::from("failed"), RemoteStatus::Failed);
    }

    #[test]
    fn test_unknown_status_is_not_terminal() {
        for raw in ["Pending", "Processing", "", "SUCCESS"] {
            let status = RemoteStatus::from(raw);
            assert!(!status.is_terminal(), "{raw:?}");
        }
    }

    #[test]
    fn test_null_status_deserializes_as_pending() {
        let status: RemoteStatus = serde_json::from_str("null").unwrap();
        assert!(!status.is_terminal());
    }
}
