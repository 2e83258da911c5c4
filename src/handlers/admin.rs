use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::trips::TripResponse;
use crate::services::catalog::{self, NewTrip};
use crate::entities::trip::Vehicle;
use crate::AppState;

// ============ Trip Management ============

#[derive(Debug, Deserialize)]
pub struct CreateTripRequest {
    #[serde(default, alias = "from")]
    pub origin: String,
    #[serde(default, alias = "to")]
    pub destination: String,
    #[serde(default)]
    pub vehicle: String,
    #[serde(alias = "date")]
    pub departure_at: Option<DateTime<Utc>>,
    pub price: Option<f64>,
}

/// Create a new trip (admin)
pub async fn create_trip(
    State(state): State<AppState>,
    Json(payload): Json<CreateTripRequest>,
) -> AppResult<(StatusCode, Json<TripResponse>)> {
    if payload.origin.trim().is_empty() || payload.destination.trim().is_empty() {
        return Err(AppError::Validation("Please fill required fields".to_string()));
    }

    let departure_at = payload
        .departure_at
        .ok_or_else(|| AppError::Validation("Please fill required fields".to_string()))?;

    let vehicle = Vehicle::parse(&payload.vehicle)
        .ok_or_else(|| AppError::Validation("Please enter valid vehicle type".to_string()))?;

    let price = payload
        .price
        .filter(|p| *p >= 0.0)
        .ok_or_else(|| AppError::Validation("Please enter valid price".to_string()))?;

    let trip = catalog::create_trip(
        &state.db,
        NewTrip {
            origin: payload.origin,
            destination: payload.destination,
            vehicle,
            departure_at,
            price,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(TripResponse::from(trip))))
}

/// Cancel (soft-delete) a trip (admin)
pub async fn cancel_trip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    catalog::cancel_trip(&state.db, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============ Sales Reporting ============

/// Number of sold tickets for a trip (admin)
pub async fn sold_tickets(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let sold = catalog::count_sold_tickets(&state.db, id).await?;

    Ok(Json(serde_json::json!({ "trip_id": id, "sold_tickets": sold })))
}

/// Total revenue for a trip (admin)
pub async fn trip_revenue(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let revenue = catalog::trip_revenue(&state.db, id).await?;

    Ok(Json(serde_json::json!({ "trip_id": id, "revenue": revenue })))
}
