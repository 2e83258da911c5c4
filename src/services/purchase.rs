use std::sync::Arc;
use std::time::Duration;

use sea_orm::{ActiveModelTrait, DatabaseConnection, DatabaseTransaction, Set, TransactionTrait};
use serde::Deserialize;
use tokio::time::timeout;
use uuid::Uuid;

use crate::entities::notification_log::Channel;
use crate::entities::ticket::{self, Gender};
use crate::entities::trip;
use crate::error::{AppError, AppResult};
use crate::services::catalog;
use crate::services::notification::{Message, NotificationDispatcher};
use crate::services::payment::PaymentGateway;
use crate::utils::jwt::Claims;
use crate::utils::validate;

pub const CORPORATE_BATCH_LIMIT: usize = 20;
pub const INDIVIDUAL_BATCH_LIMIT: usize = 5;
pub const INDIVIDUAL_MALE_QUOTA: usize = 2;

const NOTIFICATION_SENDER: &str = "company ticket";
const NOTIFICATION_TITLE: &str = "Purchase Detail";

/// One passenger entry of a purchase batch. Fields arrive as plain strings
/// so that missing and malformed values produce the same field-level
/// validation errors instead of a deserialization rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct PassengerRequest {
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl PassengerRequest {
    fn validate(&self) -> AppResult<Gender> {
        if self.gender.trim().is_empty()
            || self.full_name.trim().is_empty()
            || self.email.trim().is_empty()
            || self.phone.trim().is_empty()
        {
            return Err(AppError::Validation("You should fill empty fields".to_string()));
        }

        let gender = Gender::parse(&self.gender)
            .ok_or_else(|| AppError::Validation("Please enter valid gender".to_string()))?;

        if !validate::is_valid_email(&self.email) {
            return Err(AppError::Validation("Please enter valid email".to_string()));
        }

        if !validate::is_valid_phone(&self.phone) {
            return Err(AppError::Validation("Please enter valid phone number".to_string()));
        }

        Ok(gender)
    }
}

/// The purchase workflow. Validates a batch of ticket requests against the
/// business rules, then reserves seats, persists tickets and charges payment
/// inside one transaction; confirmation notifications go out after commit.
pub struct PurchaseService {
    db: DatabaseConnection,
    payment: Arc<dyn PaymentGateway>,
    dispatcher: Arc<NotificationDispatcher>,
    call_timeout: Duration,
}

impl PurchaseService {
    pub fn new(
        db: DatabaseConnection,
        payment: Arc<dyn PaymentGateway>,
        dispatcher: Arc<NotificationDispatcher>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            db,
            payment,
            dispatcher,
            call_timeout,
        }
    }

    /// Validation order is fail-fast, first violation wins; nothing is
    /// mutated before the transaction opens.
    pub async fn purchase(
        &self,
        trip_id: Uuid,
        passengers: &[PassengerRequest],
        claims: &Claims,
    ) -> AppResult<()> {
        let genders = validate_batch(passengers)?;
        check_batch_limit(claims, passengers.len())?;
        check_male_quota(claims, &genders)?;

        let txn = self.db.begin().await?;

        let messages = match self
            .execute_batch(&txn, trip_id, passengers, &genders, claims)
            .await
        {
            Ok(messages) => {
                txn.commit().await?;
                messages
            }
            Err(err) => {
                // A failed payment must not leave seats wrongly held.
                txn.rollback().await?;
                return Err(err);
            }
        };

        // At-least-once: a failed send aborts the remaining dispatches but
        // notifications already sent are not retracted.
        for message in &messages {
            self.dispatcher.send(message).await?;
        }

        Ok(())
    }

    async fn execute_batch(
        &self,
        txn: &DatabaseTransaction,
        trip_id: Uuid,
        passengers: &[PassengerRequest],
        genders: &[Gender],
        claims: &Claims,
    ) -> AppResult<Vec<Message>> {
        let trip = catalog::find_by_id(txn, trip_id).await?;

        // The whole batch targets one trip, so availability is checked once
        // against the batch size rather than seat by seat.
        catalog::reserve_seats(txn, trip.id, passengers.len() as i32).await?;

        for (passenger, gender) in passengers.iter().zip(genders) {
            ticket::ActiveModel {
                id: Set(Uuid::new_v4()),
                trip_id: Set(trip.id),
                user_id: Set(claims.sub),
                gender: Set(gender.clone()),
                full_name: Set(passenger.full_name.clone()),
                email: Set(passenger.email.clone()),
                phone: Set(passenger.phone.clone()),
                ..Default::default()
            }
            .insert(txn)
            .await?;
        }

        let amount = trip.price * passengers.len() as f64;
        timeout(self.call_timeout, self.payment.charge(amount))
            .await
            .map_err(|_| AppError::Payment("payment call timed out".to_string()))??;

        Ok(build_messages(&trip, passengers, claims))
    }
}

fn validate_batch(passengers: &[PassengerRequest]) -> AppResult<Vec<Gender>> {
    if passengers.is_empty() {
        return Err(AppError::Validation(
            "At least one passenger is required".to_string(),
        ));
    }

    passengers.iter().map(|p| p.validate()).collect()
}

fn check_batch_limit(claims: &Claims, batch_size: usize) -> AppResult<()> {
    if claims.is_corporate() && batch_size > CORPORATE_BATCH_LIMIT {
        return Err(AppError::LimitExceeded(CORPORATE_BATCH_LIMIT));
    }

    if claims.is_individual() && batch_size > INDIVIDUAL_BATCH_LIMIT {
        return Err(AppError::LimitExceeded(INDIVIDUAL_BATCH_LIMIT));
    }

    Ok(())
}

fn check_male_quota(claims: &Claims, genders: &[Gender]) -> AppResult<()> {
    let males = genders.iter().filter(|g| **g == Gender::Male).count();

    if claims.is_individual() && males > INDIVIDUAL_MALE_QUOTA {
        return Err(AppError::MaleQuotaExceeded);
    }

    Ok(())
}

/// One SMS per passenger; the body lists every passenger in the batch.
fn build_messages(
    trip: &trip::Model,
    passengers: &[PassengerRequest],
    claims: &Claims,
) -> Vec<Message> {
    let names = passengers
        .iter()
        .map(|p| p.full_name.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let body = format!(
        "Congrats! Your transaction is successful. Here are your ticket details:\n\
         Route: {}-{}\nDate: {}\nVehicle: {}\nPassengers:\n{}",
        trip.origin, trip.destination, trip.departure_at, trip.vehicle, names
    );

    let audit = format!(
        "The user {} with id {} purchased {} ticket(s)",
        claims.username,
        claims.sub,
        passengers.len()
    );

    passengers
        .iter()
        .map(|passenger| Message {
            channel: Channel::Sms,
            to: passenger.phone.clone(),
            from: NOTIFICATION_SENDER.to_string(),
            title: NOTIFICATION_TITLE.to_string(),
            body: body.clone(),
            audit: audit.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    use crate::entities::trip::Vehicle;
    use crate::entities::user::UserRole;
    use crate::services::notification::Notifier;
    use crate::services::payment::StubPaymentGateway;

    use super::*;

    struct FailingPaymentGateway;

    #[async_trait]
    impl PaymentGateway for FailingPaymentGateway {
        async fn charge(&self, _amount: f64) -> AppResult<()> {
            Err(AppError::Payment("transfer declined".to_string()))
        }
    }

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

    fn claims(role: UserRole) -> Claims {
        Claims {
            sub: Uuid::new_v4(),
            username: "dilara".to_string(),
            role,
            exp: Utc::now().timestamp() + 3600,
            iat: Utc::now().timestamp(),
        }
    }

    fn passenger(gender: &str, name: &str) -> PassengerRequest {
        PassengerRequest {
            gender: gender.to_string(),
            full_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            phone: "+905551234567".to_string(),
        }
    }

    fn trip_row(trip_id: Uuid, available_seats: i32) -> trip::Model {
        trip::Model {
            id: trip_id,
            origin: "Ankara".to_string(),
            destination: "Istanbul".to_string(),
            vehicle: Vehicle::Bus,
            departure_at: Utc::now().into(),
            capacity: 45,
            available_seats,
            price: 100.0,
            created_at: Utc::now().into(),
            deleted_at: None,
        }
    }

    fn ticket_row(trip_id: Uuid, user_id: Uuid, name: &str) -> ticket::Model {
        ticket::Model {
            id: Uuid::new_v4(),
            trip_id,
            user_id,
            gender: Gender::Female,
            full_name: name.to_string(),
            email: "passenger@example.com".to_string(),
            phone: "+905551234567".to_string(),
            created_at: Utc::now().into(),
            deleted_at: None,
        }
    }

    fn service_with(
        db: sea_orm::DatabaseConnection,
        payment: Arc<dyn PaymentGateway>,
        dispatcher_db: sea_orm::DatabaseConnection,
        sent: Arc<Mutex<Vec<Message>>>,
    ) -> PurchaseService {
        let mut channels: HashMap<Channel, Box<dyn Notifier>> = HashMap::new();
        channels.insert(Channel::Sms, Box::new(RecordingNotifier { sent }));

        let dispatcher = Arc::new(NotificationDispatcher::with_channels(
            dispatcher_db,
            channels,
            Duration::from_secs(3),
        ));

        PurchaseService::new(db, payment, dispatcher, Duration::from_secs(3))
    }

    fn empty_db() -> sea_orm::DatabaseConnection {
        MockDatabase::new(DatabaseBackend::Postgres).into_connection()
    }

    #[tokio::test]
    async fn test_individual_batch_limit_rejected_before_any_lookup() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let service = service_with(empty_db(), Arc::new(StubPaymentGateway), empty_db(), sent);

        let passengers: Vec<_> = (0..6).map(|i| passenger("Female", &format!("P {}", i))).collect();
        let err = service
            .purchase(Uuid::new_v4(), &passengers, &claims(UserRole::Individual))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::LimitExceeded(limit) if limit == INDIVIDUAL_BATCH_LIMIT));
    }

    #[tokio::test]
    async fn test_corporate_batch_limit() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let service = service_with(empty_db(), Arc::new(StubPaymentGateway), empty_db(), sent);

        let passengers: Vec<_> = (0..21).map(|i| passenger("Female", &format!("P {}", i))).collect();
        let err = service
            .purchase(Uuid::new_v4(), &passengers, &claims(UserRole::Corporate))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::LimitExceeded(limit) if limit == CORPORATE_BATCH_LIMIT));
    }

    #[tokio::test]
    async fn test_individual_male_quota_rejected_before_persistence() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let service = service_with(empty_db(), Arc::new(StubPaymentGateway), empty_db(), sent);

        let passengers = vec![
            passenger("Male", "A B"),
            passenger("Male", "C D"),
            passenger("Male", "E F"),
            passenger("Female", "G H"),
        ];
        let err = service
            .purchase(Uuid::new_v4(), &passengers, &claims(UserRole::Individual))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::MaleQuotaExceeded));
    }

    #[test]
    fn test_corporate_caller_is_exempt_from_male_quota() {
        let genders = vec![Gender::Male, Gender::Male, Gender::Male];
        assert!(check_male_quota(&claims(UserRole::Corporate), &genders).is_ok());
        assert!(check_male_quota(&claims(UserRole::Individual), &genders).is_err());
    }

    #[test]
    fn test_batch_limits_per_role() {
        assert!(check_batch_limit(&claims(UserRole::Individual), 5).is_ok());
        assert!(check_batch_limit(&claims(UserRole::Individual), 6).is_err());
        assert!(check_batch_limit(&claims(UserRole::Corporate), 20).is_ok());
        assert!(check_batch_limit(&claims(UserRole::Corporate), 21).is_err());
        assert!(check_batch_limit(&claims(UserRole::Admin), 100).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_passenger_email_rejected() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let service = service_with(empty_db(), Arc::new(StubPaymentGateway), empty_db(), sent);

        let mut invalid = passenger("Female", "A B");
        invalid.email = "not-an-email".to_string();

        let err = service
            .purchase(Uuid::new_v4(), &[invalid], &claims(UserRole::Individual))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_empty_batch_rejected() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let service = service_with(empty_db(), Arc::new(StubPaymentGateway), empty_db(), sent);

        let err = service
            .purchase(Uuid::new_v4(), &[], &claims(UserRole::Individual))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_insufficient_capacity_fails_whole_batch() {
        let trip_id = Uuid::new_v4();
        // Trip resolves, but the conditional decrement matches no row.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![trip_row(trip_id, 1)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let sent = Arc::new(Mutex::new(Vec::new()));
        let service = service_with(db, Arc::new(StubPaymentGateway), empty_db(), sent.clone());

        let passengers = vec![passenger("Female", "A B"), passenger("Female", "C D")];
        let err = service
            .purchase(trip_id, &passengers, &claims(UserRole::Individual))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Capacity));
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_payment_failure_aborts_without_notifications() {
        let trip_id = Uuid::new_v4();
        let user = claims(UserRole::Individual);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![trip_row(trip_id, 10)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([vec![ticket_row(trip_id, user.sub, "A B")]])
            .into_connection();

        let sent = Arc::new(Mutex::new(Vec::new()));
        let service = service_with(db, Arc::new(FailingPaymentGateway), empty_db(), sent.clone());

        let err = service
            .purchase(trip_id, &[passenger("Female", "A B")], &user)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Payment(_)));
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_successful_purchase_sends_one_notification_per_passenger() {
        let trip_id = Uuid::new_v4();
        let user = claims(UserRole::Individual);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![trip_row(trip_id, 10)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([
                vec![ticket_row(trip_id, user.sub, "A B")],
                vec![ticket_row(trip_id, user.sub, "C D")],
            ])
            .into_connection();

        let dispatcher_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![crate::entities::notification_log::Model {
                    id: 1,
                    channel: Channel::Sms,
                    message: "audit".to_string(),
                    created_at: Utc::now().into(),
                }],
                vec![crate::entities::notification_log::Model {
                    id: 2,
                    channel: Channel::Sms,
                    message: "audit".to_string(),
                    created_at: Utc::now().into(),
                }],
            ])
            .into_connection();

        let sent = Arc::new(Mutex::new(Vec::new()));
        let service = service_with(db, Arc::new(StubPaymentGateway), dispatcher_db, sent.clone());

        let passengers = vec![passenger("Female", "A B"), passenger("Male", "C D")];
        service
            .purchase(trip_id, &passengers, &user)
            .await
            .unwrap();

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "+905551234567");
        assert_eq!(sent[0].title, "Purchase Detail");
        assert_eq!(sent[0].from, "company ticket");
        // Every message body lists the whole batch.
        for message in sent.iter() {
            assert!(message.body.contains("A B"));
            assert!(message.body.contains("C D"));
            assert!(message.body.contains("Ankara-Istanbul"));
        }
    }
}
