use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use tokio::time::timeout;

use crate::entities::notification_log::{self, Channel};
use crate::error::{AppError, AppResult};

/// Outbound notification: recipient, channel, content, and the audit line
/// recorded once delivery succeeds.
#[derive(Debug, Clone)]
pub struct Message {
    pub channel: Channel,
    pub to: String,
    pub from: String,
    pub title: String,
    pub body: String,
    pub audit: String,
}

/// Delivery capability for a single channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, message: &Message) -> AppResult<()>;
}

pub struct SmsNotifier;

#[async_trait]
impl Notifier for SmsNotifier {
    async fn deliver(&self, message: &Message) -> AppResult<()> {
        tracing::info!(
            to = %message.to,
            from = %message.from,
            title = %message.title,
            "SMS sent"
        );
        Ok(())
    }
}

pub struct EmailNotifier;

#[async_trait]
impl Notifier for EmailNotifier {
    async fn deliver(&self, message: &Message) -> AppResult<()> {
        tracing::info!(
            to = %message.to,
            from = %message.from,
            title = %message.title,
            "Email sent"
        );
        Ok(())
    }
}

/// Routes messages to the channel implementation and appends one audit-log
/// row per successful delivery.
pub struct NotificationDispatcher {
    db: DatabaseConnection,
    channels: HashMap<Channel, Box<dyn Notifier>>,
    call_timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(db: DatabaseConnection, call_timeout: Duration) -> Self {
        let mut channels: HashMap<Channel, Box<dyn Notifier>> = HashMap::new();
        channels.insert(Channel::Sms, Box::new(SmsNotifier));
        channels.insert(Channel::Email, Box::new(EmailNotifier));
        Self::with_channels(db, channels, call_timeout)
    }

    pub fn with_channels(
        db: DatabaseConnection,
        channels: HashMap<Channel, Box<dyn Notifier>>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            db,
            channels,
            call_timeout,
        }
    }

    pub async fn send(&self, message: &Message) -> AppResult<()> {
        let notifier = self.channels.get(&message.channel).ok_or_else(|| {
            AppError::Internal(format!("No notifier for channel {:?}", message.channel))
        })?;

        timeout(self.call_timeout, notifier.deliver(message))
            .await
            .map_err(|_| AppError::Delivery("delivery timed out".to_string()))?
            .map_err(|e| AppError::Delivery(e.to_string()))?;

        // The audit row is written only after the channel accepted the message.
        notification_log::ActiveModel {
            channel: Set(message.channel.clone()),
            message: Set(message.audit.clone()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    use super::*;

    struct RecordingNotifier {
        sent: Arc<Mutex<Vec<Message>>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn deliver(&self, message: &Message) -> AppResult<()> {
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn deliver(&self, _message: &Message) -> AppResult<()> {
            Err(AppError::Internal("channel unavailable".to_string()))
        }
    }

    fn message(channel: Channel) -> Message {
        Message {
            channel,
            to: "+905551234567".to_string(),
            from: "company ticket".to_string(),
            title: "Purchase Detail".to_string(),
            body: "details".to_string(),
            audit: "user dilara purchased 1 ticket(s)".to_string(),
        }
    }

    fn log_row() -> notification_log::Model {
        notification_log::Model {
            id: 1,
            channel: Channel::Sms,
            message: "user dilara purchased 1 ticket(s)".to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_send_routes_by_channel_and_logs() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![log_row()]])
            .into_connection();

        let sms_sent = Arc::new(Mutex::new(Vec::new()));
        let email_sent = Arc::new(Mutex::new(Vec::new()));

        let mut channels: HashMap<Channel, Box<dyn Notifier>> = HashMap::new();
        channels.insert(
            Channel::Sms,
            Box::new(RecordingNotifier {
                sent: sms_sent.clone(),
            }),
        );
        channels.insert(
            Channel::Email,
            Box::new(RecordingNotifier {
                sent: email_sent.clone(),
            }),
        );

        let dispatcher =
            NotificationDispatcher::with_channels(db, channels, Duration::from_secs(3));

        dispatcher.send(&message(Channel::Sms)).await.unwrap();

        assert_eq!(sms_sent.lock().unwrap().len(), 1);
        assert!(email_sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_skips_audit_log() {
        // No query results appended: an attempted log insert would error out
        // with a mock exhaustion failure instead of the expected Delivery.
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let mut channels: HashMap<Channel, Box<dyn Notifier>> = HashMap::new();
        channels.insert(Channel::Sms, Box::new(FailingNotifier));

        let dispatcher =
            NotificationDispatcher::with_channels(db, channels, Duration::from_secs(3));

        let err = dispatcher.send(&message(Channel::Sms)).await.unwrap_err();
        assert!(matches!(err, AppError::Delivery(_)));
    }
}
