use crate::domain::session::{PaymentSession, SessionStatus};
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// Writes one JSON document per line to any `Write` sink (e.g. stdout).
pub struct JsonLineWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonLineWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write<T: Serialize>(&mut self, value: &T) -> Result<()> {
        serde_json::to_writer(&mut self.writer, value)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// One-line, human-readable description of where a checkout stands.
pub fn describe(session: &PaymentSession) -> String {
    match session.status {
        SessionStatus::Idle => "Waiting for payment details".to_string(),
        SessionStatus::Pending => format!(
            "Check your phone and enter your M-Pesa PIN ({:02}:{:02} left)",
            session.countdown_seconds / 60,
            session.countdown_seconds % 60
        ),
        SessionStatus::Success => {
            "Payment successful! Your subscription has been activated.".to_string()
        }
        SessionStatus::Failed => format!(
            "Payment failed: {}",
            session
                .error_message
                .as_deref()
                .unwrap_or("The payment could not be processed")
        ),
        SessionStatus::Timeout => {
            "Payment confirmation timed out. Please try again.".to_string()
        }
    }
}
