//! Notifier that records visit invites in the log
//!
//! Stands in for the mail transport: the invite is emitted as a structured
//! tracing event that the delivery pipeline can pick up.

use async_trait::async_trait;
use booking_core::{traits::Notifier, AppResult};
use chrono::{DateTime, Utc};
use tracing::info;

/// Log-backed notifier
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_visit_invite(
        &self,
        consumer_email: &str,
        consumer_name: &str,
        when: DateTime<Utc>,
        address: &str,
    ) -> AppResult<()> {
        info!(
            target: "booking::notifications",
            email = consumer_email,
            name = consumer_name,
            when = %when.to_rfc3339(),
            address,
            "Visit invite queued"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        let notifier = LogNotifier::new();
        let result = notifier
            .send_visit_invite("jan@example.com", "Jan", Utc::now(), "")
            .await;
        assert!(result.is_ok());
    }
}
