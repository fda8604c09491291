use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    prelude::Decimal, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbBackend, DbErr, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
    Statement, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::entities::booking::{self, BookingStatus, BookingType};
use crate::entities::{bus, route, schedule, user};
use crate::error::{AppError, AppResult};
use crate::handlers::schedule::resolve_available_seats;
use crate::notifier::LegSummary;
use crate::utils::booking_code::{booking_code, multi_city_leg_code, return_leg_code};
use crate::utils::jwt::Claims;
use crate::utils::mailer::{cancellation_email, confirmation_email};
use crate::AppState;

pub const MULTI_CITY_MIN_LEGS: usize = 2;
pub const MULTI_CITY_MAX_LEGS: usize = 5;

// ============ Request / Response Types ============

#[derive(Debug, Clone, Deserialize)]
pub struct LegRequest {
    pub schedule_id: i32,
    pub travel_date: NaiveDate,
    pub seat_number: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub schedule_id: i32,
    pub travel_date: NaiveDate,
    pub seat_number: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoundTripRequest {
    pub outbound: LegRequest,
    #[serde(rename = "return")]
    pub return_leg: LegRequest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MultiCityLegRequest {
    pub schedule_id: i32,
    pub travel_date: NaiveDate,
    pub seat_number: i32,
    pub sequence: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateMultiCityRequest {
    pub legs: Vec<MultiCityLegRequest>,
}

#[derive(Debug, Serialize)]
pub struct BookingDetails {
    pub id: i32,
    pub booking_code: String,
    pub schedule_id: i32,
    pub travel_date: NaiveDate,
    pub seat_number: i32,
    pub status: BookingStatus,
    pub booking_type: BookingType,
    pub leg_sequence: Option<i32>,
    pub return_travel_date: Option<NaiveDate>,
    pub departure_city: String,
    pub arrival_city: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub price: Decimal,
    pub bus_plate_number: String,
}

#[derive(Debug, Serialize)]
pub struct CreateBookingResponse {
    pub message: String,
    pub booking: BookingDetails,
}

#[derive(Debug, Serialize)]
pub struct RoundTripResponse {
    pub message: String,
    pub booking_code: String,
    pub booking_type: BookingType,
    pub outbound: BookingDetails,
    #[serde(rename = "return")]
    pub return_leg: BookingDetails,
    pub total_price: Decimal,
}

#[derive(Debug, Serialize)]
pub struct MultiCityResponse {
    pub message: String,
    pub booking_code: String,
    pub booking_type: BookingType,
    pub legs: Vec<BookingDetails>,
    pub total_price: Decimal,
}

// ============ Booking Creation ============

/// Create a one-way booking
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<CreateBookingResponse>)> {
    let (schedule, bus) = load_schedule_with_bus(&state.db, payload.schedule_id).await?;

    ensure_future_date(payload.travel_date, Utc::now().date_naive())?;
    ensure_seat_in_range(payload.seat_number, bus.total_seats)?;

    let txn = state.db.begin().await?;

    ensure_seat_free(&txn, payload.schedule_id, payload.travel_date, payload.seat_number).await?;

    let id = next_booking_id(&txn).await?;
    let code = booking_code(id, Utc::now());

    let new_booking = booking::ActiveModel {
        id: Set(id),
        booking_code: Set(code),
        user_id: Set(claims.sub),
        schedule_id: Set(payload.schedule_id),
        travel_date: Set(payload.travel_date),
        seat_number: Set(payload.seat_number),
        status: Set(BookingStatus::Confirmed),
        booking_type: Set(BookingType::OneWay),
        parent_booking_id: Set(None),
        leg_sequence: Set(None),
        return_travel_date: Set(None),
        ..Default::default()
    };

    let created = new_booking.insert(&txn).await.map_err(map_seat_conflict)?;
    txn.commit().await?;

    tracing::info!(
        booking_code = %created.booking_code,
        user_id = claims.sub,
        schedule_id = created.schedule_id,
        "one-way booking confirmed"
    );

    publish_group_confirmed(&state, claims.sub, std::slice::from_ref(&created), schedule.price).await;

    let booking = into_single_details(&state.db, created).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            message: "Booking created successfully".to_string(),
            booking,
        }),
    ))
}

/// Create a round-trip booking: outbound parent plus linked return leg
pub async fn create_round_trip(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateRoundTripRequest>,
) -> AppResult<(StatusCode, Json<RoundTripResponse>)> {
    ensure_future_date(payload.outbound.travel_date, Utc::now().date_naive())?;
    ensure_return_after_outbound(payload.outbound.travel_date, payload.return_leg.travel_date)?;

    let (outbound_schedule, outbound_bus) =
        load_schedule_with_bus(&state.db, payload.outbound.schedule_id).await?;
    let (return_schedule, return_bus) =
        load_schedule_with_bus(&state.db, payload.return_leg.schedule_id).await?;

    ensure_seat_in_range(payload.outbound.seat_number, outbound_bus.total_seats)?;
    ensure_seat_in_range(payload.return_leg.seat_number, return_bus.total_seats)?;

    let txn = state.db.begin().await?;

    // Both legs must be free before anything is written
    ensure_seat_free(
        &txn,
        payload.outbound.schedule_id,
        payload.outbound.travel_date,
        payload.outbound.seat_number,
    )
    .await?;
    ensure_seat_free(
        &txn,
        payload.return_leg.schedule_id,
        payload.return_leg.travel_date,
        payload.return_leg.seat_number,
    )
    .await?;

    let parent_id = next_booking_id(&txn).await?;
    let parent_code = booking_code(parent_id, Utc::now());

    let outbound_model = booking::ActiveModel {
        id: Set(parent_id),
        booking_code: Set(parent_code.clone()),
        user_id: Set(claims.sub),
        schedule_id: Set(payload.outbound.schedule_id),
        travel_date: Set(payload.outbound.travel_date),
        seat_number: Set(payload.outbound.seat_number),
        status: Set(BookingStatus::Confirmed),
        booking_type: Set(BookingType::RoundTrip),
        parent_booking_id: Set(None),
        leg_sequence: Set(None),
        return_travel_date: Set(Some(payload.return_leg.travel_date)),
        ..Default::default()
    };
    let outbound = outbound_model.insert(&txn).await.map_err(map_seat_conflict)?;

    let return_id = next_booking_id(&txn).await?;
    let return_model = booking::ActiveModel {
        id: Set(return_id),
        booking_code: Set(return_leg_code(&parent_code)),
        user_id: Set(claims.sub),
        schedule_id: Set(payload.return_leg.schedule_id),
        travel_date: Set(payload.return_leg.travel_date),
        seat_number: Set(payload.return_leg.seat_number),
        status: Set(BookingStatus::Confirmed),
        booking_type: Set(BookingType::RoundTrip),
        parent_booking_id: Set(Some(parent_id)),
        leg_sequence: Set(None),
        return_travel_date: Set(None),
        ..Default::default()
    };
    let return_booking = return_model.insert(&txn).await.map_err(map_seat_conflict)?;

    txn.commit().await?;

    let total_price = outbound_schedule.price + return_schedule.price;
    tracing::info!(
        booking_code = %parent_code,
        user_id = claims.sub,
        "round-trip booking confirmed"
    );

    let members = vec![outbound.clone(), return_booking.clone()];
    publish_group_confirmed(&state, claims.sub, &members, total_price).await;

    let outbound_details = into_single_details(&state.db, outbound).await?;
    let return_details = into_single_details(&state.db, return_booking).await?;

    Ok((
        StatusCode::CREATED,
        Json(RoundTripResponse {
            message: "Round-trip booking created successfully".to_string(),
            booking_code: parent_code,
            booking_type: BookingType::RoundTrip,
            outbound: outbound_details,
            return_leg: return_details,
            total_price,
        }),
    ))
}

/// Create a multi-city booking of 2-5 legs, all-or-nothing
pub async fn create_multi_city(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateMultiCityRequest>,
) -> AppResult<(StatusCode, Json<MultiCityResponse>)> {
    let legs = order_multi_city_legs(payload.legs)?;
    ensure_future_date(legs[0].travel_date, Utc::now().date_naive())?;

    // Resolve every schedule up front; NotFound beats Conflict
    let mut schedules = Vec::with_capacity(legs.len());
    for leg in &legs {
        let (schedule, bus) = load_schedule_with_bus(&state.db, leg.schedule_id).await?;
        ensure_seat_in_range(leg.seat_number, bus.total_seats)?;
        schedules.push(schedule);
    }

    let txn = state.db.begin().await?;

    // Check every leg before writing any; one taken seat aborts the group
    for leg in &legs {
        ensure_seat_free(&txn, leg.schedule_id, leg.travel_date, leg.seat_number).await?;
    }

    let parent_id = next_booking_id(&txn).await?;
    let parent_code = booking_code(parent_id, Utc::now());
    let mut members = Vec::with_capacity(legs.len());

    for (index, leg) in legs.iter().enumerate() {
        let sequence = (index + 1) as i32;
        let (id, code, parent) = if index == 0 {
            (parent_id, parent_code.clone(), None)
        } else {
            (
                next_booking_id(&txn).await?,
                multi_city_leg_code(&parent_code, sequence),
                Some(parent_id),
            )
        };

        let model = booking::ActiveModel {
            id: Set(id),
            booking_code: Set(code),
            user_id: Set(claims.sub),
            schedule_id: Set(leg.schedule_id),
            travel_date: Set(leg.travel_date),
            seat_number: Set(leg.seat_number),
            status: Set(BookingStatus::Confirmed),
            booking_type: Set(BookingType::MultiCity),
            parent_booking_id: Set(parent),
            leg_sequence: Set(Some(sequence)),
            return_travel_date: Set(None),
            ..Default::default()
        };

        members.push(model.insert(&txn).await.map_err(map_seat_conflict)?);
    }

    txn.commit().await?;

    let total_price: Decimal = schedules.iter().map(|s| s.price).sum();
    tracing::info!(
        booking_code = %parent_code,
        user_id = claims.sub,
        legs = members.len(),
        "multi-city booking confirmed"
    );

    publish_group_confirmed(&state, claims.sub, &members, total_price).await;

    let leg_details = into_details(&state.db, members).await?;

    Ok((
        StatusCode::CREATED,
        Json(MultiCityResponse {
            message: "Multi-city booking created successfully".to_string(),
            booking_code: parent_code,
            booking_type: BookingType::MultiCity,
            legs: leg_details,
            total_price,
        }),
    ))
}

// ============ Booking Queries ============

/// List the caller's bookings, most recent travel first
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<BookingDetails>>> {
    let bookings = booking::Entity::find()
        .filter(booking::Column::UserId.eq(claims.sub))
        .order_by_desc(booking::Column::TravelDate)
        .order_by_desc(booking::Column::CreatedAt)
        .all(&state.db)
        .await?;

    into_details(&state.db, bookings).await.map(Json)
}

#[derive(Debug, Serialize)]
pub struct BookingGroupResponse {
    pub booking: BookingDetails,
    pub child_bookings: Vec<BookingDetails>,
}

/// Look a booking up by its code, with any linked group members
pub async fn get_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<BookingGroupResponse>> {
    let found = booking::Entity::find()
        .filter(booking::Column::BookingCode.eq(&code))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    let children = booking::Entity::find()
        .filter(booking::Column::ParentBookingId.eq(found.id))
        .order_by_asc(booking::Column::LegSequence)
        .all(&state.db)
        .await?;

    let booking = into_single_details(&state.db, found).await?;
    let child_bookings = into_details(&state.db, children).await?;

    Ok(Json(BookingGroupResponse {
        booking,
        child_bookings,
    }))
}

// ============ Cancellation ============

/// Cancel a single confirmed booking owned by the caller
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(code): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let found = booking::Entity::find()
        .filter(booking::Column::BookingCode.eq(&code))
        .filter(booking::Column::UserId.eq(claims.sub))
        .filter(booking::Column::Status.eq(BookingStatus::Confirmed))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found or already cancelled".to_string()))?;

    let schedule_id = found.schedule_id;
    let travel_date = found.travel_date;
    let booking_code = found.booking_code.clone();

    let mut active: booking::ActiveModel = found.into();
    active.status = Set(BookingStatus::Cancelled);
    active.updated_at = Set(Utc::now().into());
    active.update(&state.db).await?;

    tracing::info!(booking_code = %booking_code, user_id = claims.sub, "booking cancelled");

    publish_availability(&state, &[(schedule_id, travel_date)]).await;
    state
        .notifier
        .booking_cancelled(claims.sub, booking_code.clone(), 1);
    send_cancellation_email(&state, claims.sub, &booking_code, 1).await;

    Ok(Json(serde_json::json!({
        "message": "Booking cancelled successfully"
    })))
}

/// Cancel a round-trip or multi-city group: every member flips as a unit
pub async fn cancel_complex_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(code): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let parent = booking::Entity::find()
        .filter(booking::Column::BookingCode.eq(&code))
        .filter(booking::Column::UserId.eq(claims.sub))
        .filter(booking::Column::Status.eq(BookingStatus::Confirmed))
        .filter(booking::Column::BookingType.is_in([BookingType::RoundTrip, BookingType::MultiCity]))
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            AppError::NotFound("Complex booking not found or already cancelled".to_string())
        })?;

    let children = booking::Entity::find()
        .filter(booking::Column::ParentBookingId.eq(parent.id))
        .filter(booking::Column::Status.eq(BookingStatus::Confirmed))
        .all(&state.db)
        .await?;

    let booking_code = parent.booking_code.clone();
    let mut touched: Vec<(i32, NaiveDate)> = Vec::new();
    let members: Vec<booking::Model> = std::iter::once(parent).chain(children).collect();
    let cancelled_legs = members.len();

    let txn = state.db.begin().await?;
    let now = Utc::now();

    for member in members {
        touched.push((member.schedule_id, member.travel_date));

        let mut active: booking::ActiveModel = member.into();
        active.status = Set(BookingStatus::Cancelled);
        active.updated_at = Set(now.into());
        active.update(&txn).await?;
    }

    txn.commit().await?;

    tracing::info!(
        booking_code = %booking_code,
        user_id = claims.sub,
        cancelled_legs,
        "booking group cancelled"
    );

    touched.sort();
    touched.dedup();
    publish_availability(&state, &touched).await;
    state
        .notifier
        .booking_cancelled(claims.sub, booking_code.clone(), cancelled_legs);
    send_cancellation_email(&state, claims.sub, &booking_code, cancelled_legs).await;

    Ok(Json(serde_json::json!({
        "message": "All legs of your booking have been cancelled successfully",
        "cancelled_legs": cancelled_legs,
    })))
}

// ============ Validation ============

fn ensure_future_date(travel_date: NaiveDate, today: NaiveDate) -> AppResult<()> {
    if travel_date < today {
        return Err(AppError::Validation(
            "Travel date cannot be in the past".to_string(),
        ));
    }
    Ok(())
}

fn ensure_return_after_outbound(outbound: NaiveDate, return_date: NaiveDate) -> AppResult<()> {
    if return_date <= outbound {
        return Err(AppError::Validation(
            "Return date must be after outbound date".to_string(),
        ));
    }
    Ok(())
}

fn ensure_seat_in_range(seat_number: i32, total_seats: i32) -> AppResult<()> {
    if seat_number < 1 || seat_number > total_seats {
        return Err(AppError::Validation(format!(
            "Seat number must be between 1 and {}",
            total_seats
        )));
    }
    Ok(())
}

/// Validate leg count and chronology, returning legs sorted by sequence
fn order_multi_city_legs(
    mut legs: Vec<MultiCityLegRequest>,
) -> AppResult<Vec<MultiCityLegRequest>> {
    if legs.len() < MULTI_CITY_MIN_LEGS || legs.len() > MULTI_CITY_MAX_LEGS {
        return Err(AppError::Validation(
            "Multi-city booking requires 2-5 legs".to_string(),
        ));
    }

    legs.sort_by_key(|leg| leg.sequence);

    for pair in legs.windows(2) {
        if pair[1].travel_date < pair[0].travel_date {
            return Err(AppError::Validation(
                "Travel dates must be in chronological order".to_string(),
            ));
        }
    }

    Ok(legs)
}

// ============ Transactional Helpers ============

/// Reserve the next booking id so the final code can be written in one insert
async fn next_booking_id(txn: &DatabaseTransaction) -> AppResult<i32> {
    let row = txn
        .query_one(Statement::from_string(
            DbBackend::Postgres,
            "SELECT nextval(pg_get_serial_sequence('booking', 'id')) AS id",
        ))
        .await?
        .ok_or_else(|| AppError::Internal("Failed to reserve booking id".to_string()))?;

    let id: i64 = row.try_get("", "id")?;
    Ok(id as i32)
}

/// Fast-path rejection for a taken seat. Advisory only: two transactions can
/// both pass this check, and the second insert then trips the confirmed-seat
/// unique index instead.
async fn ensure_seat_free(
    txn: &DatabaseTransaction,
    schedule_id: i32,
    travel_date: NaiveDate,
    seat_number: i32,
) -> AppResult<()> {
    let existing = booking::Entity::find()
        .filter(booking::Column::ScheduleId.eq(schedule_id))
        .filter(booking::Column::TravelDate.eq(travel_date))
        .filter(booking::Column::SeatNumber.eq(seat_number))
        .filter(booking::Column::Status.eq(BookingStatus::Confirmed))
        .one(txn)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict("Seat is not available".to_string()));
    }

    Ok(())
}

/// Translate a lost insert race into the same Conflict the pre-check produces
fn map_seat_conflict(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Seat is not available".to_string())
        }
        _ => AppError::from(err),
    }
}

async fn load_schedule_with_bus(
    db: &DatabaseConnection,
    schedule_id: i32,
) -> AppResult<(schedule::Model, bus::Model)> {
    let schedule = schedule::Entity::find_by_id(schedule_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Schedule not found".to_string()))?;

    let bus = bus::Entity::find_by_id(schedule.bus_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal("Bus missing for schedule".to_string()))?;

    Ok((schedule, bus))
}

// ============ Post-Commit Side Effects ============

/// Recompute and publish availability for every (schedule, date) touched.
/// Runs after commit; failures are logged and never surfaced.
async fn publish_availability(state: &AppState, touched: &[(i32, NaiveDate)]) {
    for &(schedule_id, travel_date) in touched {
        match resolve_available_seats(&state.db, schedule_id, travel_date).await {
            Ok(snapshot) => {
                state
                    .notifier
                    .seat_snapshot(schedule_id, travel_date, snapshot.available_seats);
            }
            Err(err) => {
                tracing::warn!(
                    schedule_id,
                    %travel_date,
                    error = %err,
                    "failed to recompute availability after commit"
                );
            }
        }
    }
}

async fn publish_group_confirmed(
    state: &AppState,
    user_id: i32,
    members: &[booking::Model],
    total_price: Decimal,
) {
    let mut touched: Vec<(i32, NaiveDate)> = members
        .iter()
        .map(|b| (b.schedule_id, b.travel_date))
        .collect();
    touched.sort();
    touched.dedup();
    publish_availability(state, &touched).await;

    let parent = &members[0];
    let legs: Vec<LegSummary> = members
        .iter()
        .map(|b| LegSummary {
            booking_code: b.booking_code.clone(),
            schedule_id: b.schedule_id,
            travel_date: b.travel_date,
            seat_number: b.seat_number,
        })
        .collect();

    state.notifier.booking_confirmed(
        user_id,
        parent.booking_code.clone(),
        parent.booking_type.clone(),
        legs,
        total_price,
    );

    match user::Entity::find_by_id(user_id).one(&state.db).await {
        Ok(Some(owner)) => {
            state.mailer.send_in_background(confirmation_email(
                &owner.email,
                &owner.full_name,
                &parent.booking_code,
                members.len(),
                &format!("RWF {}", total_price),
            ));
        }
        Ok(None) => {}
        Err(err) => {
            tracing::warn!(user_id, error = %err, "failed to load user for confirmation email");
        }
    }
}

async fn send_cancellation_email(
    state: &AppState,
    user_id: i32,
    booking_code: &str,
    cancelled_legs: usize,
) {
    match user::Entity::find_by_id(user_id).one(&state.db).await {
        Ok(Some(owner)) => {
            state.mailer.send_in_background(cancellation_email(
                &owner.email,
                &owner.full_name,
                booking_code,
                cancelled_legs,
            ));
        }
        Ok(None) => {}
        Err(err) => {
            tracing::warn!(user_id, error = %err, "failed to load user for cancellation email");
        }
    }
}

// ============ Detail Assembly ============

async fn into_single_details(
    db: &DatabaseConnection,
    booking: booking::Model,
) -> AppResult<BookingDetails> {
    let mut details = into_details(db, vec![booking]).await?;
    details
        .pop()
        .ok_or_else(|| AppError::Internal("Booking lost its schedule details".to_string()))
}

pub(crate) async fn into_details(
    db: &DatabaseConnection,
    bookings: Vec<booking::Model>,
) -> AppResult<Vec<BookingDetails>> {
    let schedules = schedule::Entity::find().all(db).await?;
    let routes = route::Entity::find().all(db).await?;
    let buses = bus::Entity::find().all(db).await?;

    let details = bookings
        .into_iter()
        .filter_map(|b| {
            let schedule = schedules.iter().find(|s| s.id == b.schedule_id)?;
            let route = routes.iter().find(|r| r.id == schedule.route_id)?;
            let bus = buses.iter().find(|bu| bu.id == schedule.bus_id)?;

            Some(BookingDetails {
                id: b.id,
                booking_code: b.booking_code,
                schedule_id: b.schedule_id,
                travel_date: b.travel_date,
                seat_number: b.seat_number,
                status: b.status,
                booking_type: b.booking_type,
                leg_sequence: b.leg_sequence,
                return_travel_date: b.return_travel_date,
                departure_city: route.departure_city.clone(),
                arrival_city: route.arrival_city.clone(),
                departure_time: schedule.departure_time.format("%H:%M:%S").to_string(),
                arrival_time: schedule.arrival_time.format("%H:%M:%S").to_string(),
                price: schedule.price,
                bus_plate_number: bus.plate_number.clone(),
            })
        })
        .collect();

    Ok(details)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn leg(sequence: i32, travel_date: NaiveDate) -> MultiCityLegRequest {
        MultiCityLegRequest {
            schedule_id: sequence,
            travel_date,
            seat_number: 1,
            sequence,
        }
    }

    #[test]
    fn past_travel_dates_are_rejected() {
        let today = date(2025, 12, 1);

        assert!(ensure_future_date(date(2025, 11, 30), today).is_err());
        assert!(ensure_future_date(today, today).is_ok());
        assert!(ensure_future_date(date(2025, 12, 2), today).is_ok());
    }

    #[test]
    fn return_date_must_be_strictly_after_outbound() {
        let outbound = date(2025, 12, 1);

        assert!(ensure_return_after_outbound(outbound, date(2025, 12, 5)).is_ok());
        assert!(ensure_return_after_outbound(outbound, outbound).is_err());
        assert!(ensure_return_after_outbound(outbound, date(2025, 11, 28)).is_err());
    }

    #[test]
    fn seat_numbers_outside_the_bus_are_rejected() {
        assert!(ensure_seat_in_range(1, 30).is_ok());
        assert!(ensure_seat_in_range(30, 30).is_ok());
        assert!(ensure_seat_in_range(0, 30).is_err());
        assert!(ensure_seat_in_range(31, 30).is_err());
    }

    #[test]
    fn multi_city_leg_count_is_bounded() {
        let one = vec![leg(1, date(2025, 12, 1))];
        assert!(order_multi_city_legs(one).is_err());

        let six: Vec<_> = (1..=6).map(|i| leg(i, date(2025, 12, i as u32))).collect();
        assert!(order_multi_city_legs(six).is_err());

        let five: Vec<_> = (1..=5).map(|i| leg(i, date(2025, 12, i as u32))).collect();
        assert!(order_multi_city_legs(five).is_ok());
    }

    #[test]
    fn legs_are_sorted_by_sequence_before_the_date_check() {
        let shuffled = vec![
            leg(3, date(2025, 12, 10)),
            leg(1, date(2025, 12, 1)),
            leg(2, date(2025, 12, 5)),
        ];

        let ordered = order_multi_city_legs(shuffled).unwrap();
        let sequences: Vec<i32> = ordered.iter().map(|l| l.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[test]
    fn non_chronological_legs_are_rejected() {
        let legs = vec![
            leg(1, date(2025, 12, 10)),
            leg(2, date(2025, 12, 5)),
            leg(3, date(2025, 12, 20)),
        ];

        let err = order_multi_city_legs(legs).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn same_day_connections_are_allowed() {
        let legs = vec![leg(1, date(2025, 12, 5)), leg(2, date(2025, 12, 5))];
        assert!(order_multi_city_legs(legs).is_ok());
    }
}
