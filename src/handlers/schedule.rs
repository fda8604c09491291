use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};
use serde::{Deserialize, Serialize};

use crate::entities::booking::{self, BookingStatus};
use crate::entities::{bus, route, schedule};
use crate::error::{AppError, AppResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub id: i32,
    pub route_id: i32,
    pub departure_city: String,
    pub arrival_city: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub price: sea_orm::prelude::Decimal,
    pub available_days: String,
    pub bus_plate_number: String,
    pub bus_type: String,
    pub total_seats: i32,
}

/// List all active schedules
pub async fn list_schedules(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ScheduleResponse>>> {
    let schedules = schedule::Entity::find()
        .filter(schedule::Column::IsActive.eq(true))
        .all(&state.db)
        .await?;

    build_schedule_responses(&state.db, schedules).await.map(Json)
}

/// Get schedule details
pub async fn get_schedule(
    State(state): State<AppState>,
    Path(schedule_id): Path<i32>,
) -> AppResult<Json<ScheduleResponse>> {
    let schedule = schedule::Entity::find_by_id(schedule_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Schedule not found".to_string()))?;

    let mut responses = build_schedule_responses(&state.db, vec![schedule]).await?;
    responses
        .pop()
        .map(Json)
        .ok_or_else(|| AppError::Internal("Schedule lookup lost its row".to_string()))
}

/// List active schedules serving a route
pub async fn list_by_route(
    State(state): State<AppState>,
    Path(route_id): Path<i32>,
) -> AppResult<Json<Vec<ScheduleResponse>>> {
    let schedules = schedule::Entity::find()
        .filter(schedule::Column::RouteId.eq(route_id))
        .filter(schedule::Column::IsActive.eq(true))
        .all(&state.db)
        .await?;

    build_schedule_responses(&state.db, schedules).await.map(Json)
}

async fn build_schedule_responses(
    db: &DatabaseConnection,
    schedules: Vec<schedule::Model>,
) -> AppResult<Vec<ScheduleResponse>> {
    let routes = route::Entity::find().all(db).await?;
    let buses = bus::Entity::find().all(db).await?;

    let responses = schedules
        .into_iter()
        .filter_map(|s| {
            let route = routes.iter().find(|r| r.id == s.route_id)?;
            let bus = buses.iter().find(|b| b.id == s.bus_id)?;

            Some(ScheduleResponse {
                id: s.id,
                route_id: s.route_id,
                departure_city: route.departure_city.clone(),
                arrival_city: route.arrival_city.clone(),
                departure_time: s.departure_time.format("%H:%M:%S").to_string(),
                arrival_time: s.arrival_time.format("%H:%M:%S").to_string(),
                price: s.price,
                available_days: s.available_days,
                bus_plate_number: bus.plate_number.clone(),
                bus_type: bus.bus_type.clone(),
                total_seats: bus.total_seats,
            })
        })
        .collect();

    Ok(responses)
}

// ============ Seat Availability ============

#[derive(Debug, Deserialize)]
pub struct AvailableSeatsQuery {
    pub travel_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct SeatAvailabilityResponse {
    pub schedule_id: i32,
    pub travel_date: NaiveDate,
    pub available_seats: Vec<i32>,
    pub total_available: usize,
}

/// Free seats for a schedule on a travel date
///
/// Advisory only: the caller may still lose the seat between reading this and
/// booking. Exclusivity is enforced by the confirmed-seat unique index at
/// write time.
pub async fn available_seats(
    State(state): State<AppState>,
    Path(schedule_id): Path<i32>,
    Query(query): Query<AvailableSeatsQuery>,
) -> AppResult<Json<SeatAvailabilityResponse>> {
    let availability = resolve_available_seats(&state.db, schedule_id, query.travel_date).await?;
    Ok(Json(availability))
}

/// Compute the set of unreserved seat numbers for (schedule, travel date).
///
/// Shared with the booking handlers, which republish availability to schedule
/// watchers after every committed state change.
pub async fn resolve_available_seats(
    db: &DatabaseConnection,
    schedule_id: i32,
    travel_date: NaiveDate,
) -> AppResult<SeatAvailabilityResponse> {
    let schedule = schedule::Entity::find_by_id(schedule_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Schedule not found".to_string()))?;

    let bus = bus::Entity::find_by_id(schedule.bus_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal("Bus missing for schedule".to_string()))?;

    let booked: Vec<i32> = booking::Entity::find()
        .select_only()
        .column(booking::Column::SeatNumber)
        .filter(booking::Column::ScheduleId.eq(schedule_id))
        .filter(booking::Column::TravelDate.eq(travel_date))
        .filter(booking::Column::Status.eq(BookingStatus::Confirmed))
        .into_tuple()
        .all(db)
        .await?;

    let available_seats = free_seats(bus.total_seats, &booked);

    Ok(SeatAvailabilityResponse {
        schedule_id,
        travel_date,
        total_available: available_seats.len(),
        available_seats,
    })
}

/// The full seat range minus the seats already taken.
fn free_seats(total_seats: i32, booked: &[i32]) -> Vec<i32> {
    (1..=total_seats).filter(|seat| !booked.contains(seat)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bus_is_fully_available() {
        assert_eq!(free_seats(30, &[]), (1..=30).collect::<Vec<_>>());
    }

    #[test]
    fn booked_seats_are_excluded() {
        let available = free_seats(30, &[15]);

        assert_eq!(available.len(), 29);
        assert!(!available.contains(&15));
        assert!(available.contains(&1));
        assert!(available.contains(&30));
    }

    #[test]
    fn available_and_booked_partition_the_seat_range() {
        let booked = vec![3, 7, 21];
        let available = free_seats(30, &booked);

        // Disjoint
        assert!(available.iter().all(|s| !booked.contains(s)));

        // Union covers the full range
        let mut union: Vec<i32> = available.iter().chain(booked.iter()).copied().collect();
        union.sort();
        assert_eq!(union, (1..=30).collect::<Vec<_>>());
    }

    #[test]
    fn fully_booked_bus_has_no_seats() {
        let booked: Vec<i32> = (1..=12).collect();
        assert!(free_seats(12, &booked).is_empty());
    }
}
