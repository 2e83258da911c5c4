use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::trip::{self, Vehicle};
use crate::error::{AppError, AppResult};
use crate::services::catalog::{self, TripFilter};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TripQuery {
    #[serde(alias = "from")]
    pub origin: Option<String>,
    #[serde(alias = "to")]
    pub destination: Option<String>,
    pub vehicle: Option<String>,
    #[serde(alias = "date")]
    pub departure_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TripResponse {
    pub id: Uuid,
    pub origin: String,
    pub destination: String,
    pub vehicle: Vehicle,
    pub departure_at: DateTime<Utc>,
    pub capacity: i32,
    pub available_seats: i32,
    pub price: f64,
}

impl From<trip::Model> for TripResponse {
    fn from(model: trip::Model) -> Self {
        Self {
            id: model.id,
            origin: model.origin,
            destination: model.destination,
            vehicle: model.vehicle,
            departure_at: model.departure_at.with_timezone(&Utc),
            capacity: model.capacity,
            available_seats: model.available_seats,
            price: model.price,
        }
    }
}

fn none_if_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Search trips; empty query fields act as wildcards
pub async fn search_trips(
    State(state): State<AppState>,
    Query(query): Query<TripQuery>,
) -> AppResult<Json<Vec<TripResponse>>> {
    let vehicle = match none_if_empty(query.vehicle) {
        Some(raw) => Some(
            Vehicle::parse(&raw)
                .ok_or_else(|| AppError::Validation("Please enter valid vehicle type".to_string()))?,
        ),
        None => None,
    };

    let departure_at = match none_if_empty(query.departure_at) {
        Some(raw) => Some(
            DateTime::parse_from_rfc3339(&raw)
                .map_err(|_| AppError::Validation("Please enter valid departure time".to_string()))?
                .with_timezone(&Utc),
        ),
        None => None,
    };

    let filter = TripFilter {
        origin: none_if_empty(query.origin),
        destination: none_if_empty(query.destination),
        vehicle,
        departure_at,
    };

    let trips = catalog::search(&state.db, filter).await?;

    Ok(Json(trips.into_iter().map(TripResponse::from).collect()))
}
