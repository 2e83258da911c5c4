use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::purchase::PassengerRequest;
use crate::utils::jwt::Claims;
use crate::AppState;

/// Purchase tickets for every passenger in the batch against one trip
pub async fn purchase(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(trip_id): Path<Uuid>,
    Json(passengers): Json<Vec<PassengerRequest>>,
) -> AppResult<String> {
    state.purchase.purchase(trip_id, &passengers, &claims).await?;

    Ok("Ticket was successfully purchased".to_string())
}
