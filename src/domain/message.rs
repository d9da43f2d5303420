use serde_json::Value;

/// Shown when neither the response body nor the transport gave anything usable.
pub const FALLBACK_MESSAGE: &str = "Failed to initiate payment";

const MESSAGE_FIELDS: [&str; 3] = ["error", "details", "message"];

/// Picks the message to show the user for a failed initiation.
///
/// Priority: the first usable `error`, `details` or `message` field of a structured
/// body, then the raw error text, then [`FALLBACK_MESSAGE`].
pub fn user_message(body: Option<&Value>, raw: Option<&str>) -> String {
    body.and_then(structured_message)
        .or_else(|| {
            raw.map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string())
}

fn structured_message(body: &Value) -> Option<String> {
    let object = body.as_object()?;
    MESSAGE_FIELDS.iter().find_map(|field| match object.get(*field)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => Some(text.trim().to_string()),
        // DRF field errors arrive as objects or lists
        other => Some(other.to_string()),
    })
}
