use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    Set, SqlErr,
};
use uuid::Uuid;

use crate::entities::ticket;
use crate::entities::trip::{self, Vehicle};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct NewTrip {
    pub origin: String,
    pub destination: String,
    pub vehicle: Vehicle,
    pub departure_at: DateTime<Utc>,
    pub price: f64,
}

/// Unset fields act as wildcards.
#[derive(Debug, Clone, Default)]
pub struct TripFilter {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub vehicle: Option<Vehicle>,
    pub departure_at: Option<DateTime<Utc>>,
}

/// Create a trip. Capacity and available seats are assigned from the vehicle
/// type; a trip with the same (origin, destination, vehicle, departure) is
/// rejected.
pub async fn create_trip<C: ConnectionTrait>(conn: &C, new_trip: NewTrip) -> AppResult<trip::Model> {
    if new_trip.origin.trim().is_empty() || new_trip.destination.trim().is_empty() {
        return Err(AppError::Validation("Please fill required fields".to_string()));
    }

    if new_trip.price < 0.0 {
        return Err(AppError::Validation("Please enter valid price".to_string()));
    }

    let existing = trip::Entity::find()
        .filter(trip::Column::Origin.eq(&new_trip.origin))
        .filter(trip::Column::Destination.eq(&new_trip.destination))
        .filter(trip::Column::Vehicle.eq(new_trip.vehicle.clone()))
        .filter(trip::Column::DepartureAt.eq(new_trip.departure_at))
        .filter(trip::Column::DeletedAt.is_null())
        .one(conn)
        .await?;

    if existing.is_some() {
        return Err(AppError::Duplicate(
            "This trip is already created. Please create another trip.".to_string(),
        ));
    }

    let capacity = new_trip.vehicle.capacity();

    trip::ActiveModel {
        id: Set(Uuid::new_v4()),
        origin: Set(new_trip.origin),
        destination: Set(new_trip.destination),
        vehicle: Set(new_trip.vehicle),
        departure_at: Set(new_trip.departure_at.into()),
        capacity: Set(capacity),
        available_seats: Set(capacity),
        price: Set(new_trip.price),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(|err| match err.sql_err() {
        // The composite unique index is the backstop for racing creates.
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Duplicate(
            "This trip is already created. Please create another trip.".to_string(),
        ),
        _ => AppError::Database(err),
    })
}

/// Soft-delete a trip.
pub async fn cancel_trip<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<()> {
    let result = trip::Entity::update_many()
        .col_expr(trip::Column::DeletedAt, Expr::value(Utc::now()))
        .filter(trip::Column::Id.eq(id))
        .filter(trip::Column::DeletedAt.is_null())
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::TripNotFound);
    }

    Ok(())
}

pub async fn find_by_id<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<trip::Model> {
    trip::Entity::find()
        .filter(trip::Column::Id.eq(id))
        .filter(trip::Column::DeletedAt.is_null())
        .one(conn)
        .await?
        .ok_or(AppError::TripNotFound)
}

/// List trips matching the filter; finding nothing is reported as an error
/// so callers can tell the user to loosen the search.
pub async fn search<C: ConnectionTrait>(conn: &C, filter: TripFilter) -> AppResult<Vec<trip::Model>> {
    let mut query = trip::Entity::find().filter(trip::Column::DeletedAt.is_null());

    if let Some(origin) = filter.origin {
        query = query.filter(trip::Column::Origin.eq(origin));
    }
    if let Some(destination) = filter.destination {
        query = query.filter(trip::Column::Destination.eq(destination));
    }
    if let Some(vehicle) = filter.vehicle {
        query = query.filter(trip::Column::Vehicle.eq(vehicle));
    }
    if let Some(departure_at) = filter.departure_at {
        query = query.filter(trip::Column::DepartureAt.eq(departure_at));
    }

    let trips = query.all(conn).await?;

    if trips.is_empty() {
        return Err(AppError::Validation(
            "There is no trip which meets these conditions".to_string(),
        ));
    }

    Ok(trips)
}

/// Atomically take `count` seats from a trip. The availability check and the
/// decrement are one conditional UPDATE, so two concurrent purchases can
/// never both pass a check against stale data and jointly oversell.
pub async fn reserve_seats<C: ConnectionTrait>(conn: &C, id: Uuid, count: i32) -> AppResult<()> {
    let result = trip::Entity::update_many()
        .col_expr(
            trip::Column::AvailableSeats,
            Expr::col(trip::Column::AvailableSeats).sub(count),
        )
        .filter(trip::Column::Id.eq(id))
        .filter(trip::Column::DeletedAt.is_null())
        .filter(trip::Column::AvailableSeats.gte(count))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::Capacity);
    }

    Ok(())
}

pub async fn count_sold_tickets<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<u64> {
    let count = ticket::Entity::find()
        .filter(ticket::Column::TripId.eq(id))
        .filter(ticket::Column::DeletedAt.is_null())
        .count(conn)
        .await?;

    Ok(count)
}

pub async fn trip_revenue<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<f64> {
    let trip = find_by_id(conn, id).await?;
    let sold = count_sold_tickets(conn, id).await?;

    Ok(trip.price * sold as f64)
}
