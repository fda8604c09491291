use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveTime, Utc};
use sea_orm::{
    prelude::Decimal, ActiveModelTrait, EntityTrait, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::booking::{self, BookingStatus};
use crate::entities::bus::{self, BusStatus};
use crate::entities::{route, schedule, user};
use crate::error::{AppError, AppResult};
use crate::handlers::booking::BookingDetails;
use crate::notifier::{AnnouncementPriority, Change, ScheduleChanges};
use crate::AppState;

// ============ Route Management ============

#[derive(Debug, Deserialize)]
pub struct CreateRouteRequest {
    pub departure_city: String,
    pub arrival_city: String,
    pub distance_km: Option<f64>,
    pub estimated_duration_minutes: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRouteRequest {
    pub departure_city: Option<String>,
    pub arrival_city: Option<String>,
    pub distance_km: Option<f64>,
    pub estimated_duration_minutes: Option<i32>,
}

/// Create a route (admin)
pub async fn create_route(
    State(state): State<AppState>,
    Json(payload): Json<CreateRouteRequest>,
) -> AppResult<(StatusCode, Json<route::Model>)> {
    if payload.departure_city == payload.arrival_city {
        return Err(AppError::Validation(
            "Departure and arrival city must be different".to_string(),
        ));
    }

    let new_route = route::ActiveModel {
        departure_city: Set(payload.departure_city),
        arrival_city: Set(payload.arrival_city),
        distance_km: Set(payload.distance_km),
        estimated_duration_minutes: Set(payload.estimated_duration_minutes),
        ..Default::default()
    };

    let created = new_route.insert(&state.db).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a route (admin); watchers of the route topic are notified
pub async fn update_route(
    State(state): State<AppState>,
    Path(route_id): Path<i32>,
    Json(payload): Json<UpdateRouteRequest>,
) -> AppResult<Json<route::Model>> {
    let route = route::Entity::find_by_id(route_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Route not found".to_string()))?;

    let mut active: route::ActiveModel = route.into();

    if let Some(city) = payload.departure_city {
        active.departure_city = Set(city);
    }
    if let Some(city) = payload.arrival_city {
        active.arrival_city = Set(city);
    }
    if let Some(distance) = payload.distance_km {
        active.distance_km = Set(Some(distance));
    }
    if let Some(duration) = payload.estimated_duration_minutes {
        active.estimated_duration_minutes = Set(Some(duration));
    }

    let updated = active.update(&state.db).await?;

    state.notifier.route_updated(
        updated.id,
        updated.departure_city.clone(),
        updated.arrival_city.clone(),
    );

    Ok(Json(updated))
}

/// Delete a route (admin)
pub async fn delete_route(
    State(state): State<AppState>,
    Path(route_id): Path<i32>,
) -> AppResult<Json<serde_json::Value>> {
    let result = route::Entity::delete_by_id(route_id).exec(&state.db).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Route not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Route deleted successfully" })))
}

// ============ Bus Management ============

#[derive(Debug, Deserialize)]
pub struct CreateBusRequest {
    pub plate_number: String,
    pub bus_type: String,
    pub total_seats: i32,
}

/// Register a bus (admin)
pub async fn create_bus(
    State(state): State<AppState>,
    Json(payload): Json<CreateBusRequest>,
) -> AppResult<(StatusCode, Json<bus::Model>)> {
    if payload.total_seats < 1 {
        return Err(AppError::Validation(
            "Bus must have at least one seat".to_string(),
        ));
    }

    let new_bus = bus::ActiveModel {
        plate_number: Set(payload.plate_number),
        bus_type: Set(payload.bus_type),
        total_seats: Set(payload.total_seats),
        status: Set(BusStatus::Active),
        ..Default::default()
    };

    let created = new_bus.insert(&state.db).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// ============ Schedule Management ============

#[derive(Debug, Deserialize)]
pub struct CreateScheduleRequest {
    pub bus_id: i32,
    pub route_id: i32,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
    pub price: Decimal,
    pub available_days: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateScheduleRequest {
    pub departure_time: Option<NaiveTime>,
    pub arrival_time: Option<NaiveTime>,
    pub price: Option<Decimal>,
    pub available_days: Option<String>,
    pub is_active: Option<bool>,
}

/// Create a schedule (admin)
pub async fn create_schedule(
    State(state): State<AppState>,
    Json(payload): Json<CreateScheduleRequest>,
) -> AppResult<(StatusCode, Json<schedule::Model>)> {
    bus::Entity::find_by_id(payload.bus_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Validation("Invalid bus".to_string()))?;

    route::Entity::find_by_id(payload.route_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Validation("Invalid route".to_string()))?;

    let mut new_schedule = schedule::ActiveModel {
        bus_id: Set(payload.bus_id),
        route_id: Set(payload.route_id),
        departure_time: Set(payload.departure_time),
        arrival_time: Set(payload.arrival_time),
        price: Set(payload.price),
        is_active: Set(true),
        ..Default::default()
    };

    if let Some(days) = payload.available_days {
        new_schedule.available_days = Set(days);
    }

    let created = new_schedule.insert(&state.db).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a schedule (admin)
///
/// Watchers of the schedule and its route get a broadcast carrying
/// before/after values for any time or price change.
pub async fn update_schedule(
    State(state): State<AppState>,
    Path(schedule_id): Path<i32>,
    Json(payload): Json<UpdateScheduleRequest>,
) -> AppResult<Json<schedule::Model>> {
    let schedule = schedule::Entity::find_by_id(schedule_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Schedule not found".to_string()))?;

    let mut changes = ScheduleChanges::default();
    let mut active: schedule::ActiveModel = schedule.clone().into();

    if let Some(time) = payload.departure_time {
        if time != schedule.departure_time {
            changes.departure_time = Some(Change {
                from: schedule.departure_time.format("%H:%M:%S").to_string(),
                to: time.format("%H:%M:%S").to_string(),
            });
        }
        active.departure_time = Set(time);
    }

    if let Some(time) = payload.arrival_time {
        if time != schedule.arrival_time {
            changes.arrival_time = Some(Change {
                from: schedule.arrival_time.format("%H:%M:%S").to_string(),
                to: time.format("%H:%M:%S").to_string(),
            });
        }
        active.arrival_time = Set(time);
    }

    if let Some(price) = payload.price {
        if price != schedule.price {
            changes.price = Some(Change {
                from: schedule.price,
                to: price,
            });
        }
        active.price = Set(price);
    }

    if let Some(days) = payload.available_days {
        active.available_days = Set(days);
    }

    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }

    let updated = active.update(&state.db).await?;

    if !changes.is_empty() {
        state
            .notifier
            .schedule_updated(updated.id, updated.route_id, changes);
    }

    Ok(Json(updated))
}

/// Delete a schedule (admin)
pub async fn delete_schedule(
    State(state): State<AppState>,
    Path(schedule_id): Path<i32>,
) -> AppResult<Json<serde_json::Value>> {
    let result = schedule::Entity::delete_by_id(schedule_id)
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Schedule not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Schedule deleted successfully" })))
}

// ============ Booking Management ============

#[derive(Debug, Serialize)]
pub struct AdminBookingResponse {
    #[serde(flatten)]
    pub details: BookingDetails,
    pub user_full_name: String,
    pub user_email: String,
}

/// List all bookings, newest first (admin)
pub async fn list_all_bookings(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<AdminBookingResponse>>> {
    let bookings = booking::Entity::find()
        .order_by_desc(booking::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let users = user::Entity::find().all(&state.db).await?;
    let owners: Vec<(String, String)> = bookings
        .iter()
        .map(|b| {
            users
                .iter()
                .find(|u| u.id == b.user_id)
                .map(|u| (u.full_name.clone(), u.email.clone()))
                .unwrap_or_default()
        })
        .collect();

    let details = crate::handlers::booking::into_details(&state.db, bookings).await?;

    let responses = details
        .into_iter()
        .zip(owners)
        .map(|(details, (user_full_name, user_email))| AdminBookingResponse {
            details,
            user_full_name,
            user_email,
        })
        .collect();

    Ok(Json(responses))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
}

/// Set a booking's status directly (admin). No transition checks: any status
/// can be assigned over any other.
pub async fn update_booking_status(
    State(state): State<AppState>,
    Path(booking_id): Path<i32>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<booking::Model>> {
    let found = booking::Entity::find_by_id(booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    let schedule_id = found.schedule_id;
    let travel_date = found.travel_date;

    let mut active: booking::ActiveModel = found.into();
    active.status = Set(payload.status);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.db).await?;

    // Status flips change the confirmed-seat set; let watchers know
    match crate::handlers::schedule::resolve_available_seats(&state.db, schedule_id, travel_date)
        .await
    {
        Ok(snapshot) => {
            state
                .notifier
                .seat_snapshot(schedule_id, travel_date, snapshot.available_seats);
        }
        Err(err) => {
            tracing::warn!(schedule_id, error = %err, "failed to publish availability after status update");
        }
    }

    Ok(Json(updated))
}

// ============ Announcements ============

#[derive(Debug, Deserialize)]
pub struct AnnounceRequest {
    pub message: String,
    pub priority: Option<AnnouncementPriority>,
}

/// Broadcast a system-wide announcement to every connected client (admin)
pub async fn announce(
    State(state): State<AppState>,
    Json(payload): Json<AnnounceRequest>,
) -> AppResult<Json<serde_json::Value>> {
    state.notifier.announce(
        payload.message,
        payload.priority.unwrap_or(AnnouncementPriority::Medium),
    );

    Ok(Json(serde_json::json!({ "message": "Announcement broadcasted" })))
}
