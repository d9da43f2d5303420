use crate::error::CheckoutError;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

static KENYAN_MOBILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\+254|254|0)([17]\d{8})$").expect("kenyan mobile pattern is valid")
});

/// A validated Kenyan mobile number.
///
/// Accepts the local `07XXXXXXXX`/`01XXXXXXXX` form as well as the `254` and `+254`
/// international forms. Spaces and dashes are ignored. The number is held in the
/// `254XXXXXXXXX` form the payment backend expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(raw: &str) -> Result<Self, CheckoutError> {
        let cleaned: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();

        KENYAN_MOBILE
            .captures(&cleaned)
            .and_then(|caps| caps.get(1))
            .map(|subscriber| Self(format!("254{}", subscriber.as_str())))
            .ok_or_else(|| {
                CheckoutError::Validation(
                    "Please enter a valid Kenyan phone number (e.g. 0712345678 or +254712345678)"
                        .to_string(),
                )
            })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
