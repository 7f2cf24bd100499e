// libs/scheduling-cell/src/handlers.rs
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{BookingError, ReserveBookingRequest};
use crate::state::AppState;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsQuery {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingsQuery {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
}

fn into_app_error(err: BookingError) -> AppError {
    match err {
        BookingError::InvalidDate(msg) => AppError::BadRequest(msg),
        BookingError::InvalidSlot(msg) => AppError::BadRequest(msg),
        BookingError::SlotConflict => {
            AppError::Conflict("Slot already has an active booking".to_string())
        }
        BookingError::NotFound => AppError::NotFound("Booking not found".to_string()),
        BookingError::Forbidden => {
            AppError::Forbidden("Not authorized for this booking".to_string())
        }
        BookingError::Database(msg) => AppError::Database(msg),
    }
}

// ==============================================================================
// SLOT AVAILABILITY HANDLERS
// ==============================================================================

/// Occupied marks of a doctor's day. Callers derive free slots by
/// set-difference against the canonical mark list.
#[axum::debug_handler]
pub async fn list_slots(
    State(state): State<AppState>,
    Query(params): Query<SlotsQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = state.booking_service();

    let schedule = service
        .calendar()
        .day_schedule(params.doctor_id, params.date, auth.token())
        .await
        .map_err(into_app_error)?;

    let occupied_times: Vec<String> = schedule
        .iter()
        .filter(|slot| slot.occupied)
        .map(|slot| slot.time.to_string())
        .collect();

    Ok(Json(json!({
        "occupiedTimes": occupied_times
    })))
}

// ==============================================================================
// BOOKING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn reserve_booking(
    State(state): State<AppState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<ReserveBookingRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    // Only the patient themselves or an admin may place the booking.
    let is_patient = request.patient_id.to_string() == user.id;
    if !is_patient && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Not authorized to book for this patient".to_string(),
        ));
    }

    let service = state.booking_service();
    let booking = service
        .reserve(request, auth.token())
        .await
        .map_err(into_app_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "booking": booking
        })),
    ))
}

#[axum::debug_handler]
pub async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = state.booking_service();

    let booking = service
        .get(booking_id, auth.token())
        .await
        .map_err(into_app_error)?;

    let is_patient = booking.patient_id.to_string() == user.id;
    let is_doctor = booking.doctor_id.to_string() == user.id;
    if !is_patient && !is_doctor && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Not authorized to view this booking".to_string(),
        ));
    }

    Ok(Json(json!({
        "booking": booking
    })))
}

#[axum::debug_handler]
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<StatusCode, AppError> {
    let service = state.booking_service();

    service
        .cancel(booking_id, &user, auth.token())
        .await
        .map_err(into_app_error)?;

    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(params): Query<BookingsQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = state.booking_service();

    let bookings = match (params.patient_id, params.doctor_id) {
        (Some(patient_id), None) => {
            let is_own = patient_id.to_string() == user.id;
            if !is_own && !user.is_admin() {
                return Err(AppError::Forbidden(
                    "Not authorized to view bookings for this patient".to_string(),
                ));
            }
            service
                .list_by_patient(patient_id, auth.token())
                .await
                .map_err(into_app_error)?
        }
        (None, Some(doctor_id)) => {
            let date = params.date.ok_or_else(|| {
                AppError::BadRequest("date is required when filtering by doctorId".to_string())
            })?;
            let is_own = doctor_id.to_string() == user.id;
            if !is_own && !user.is_admin() {
                return Err(AppError::Forbidden(
                    "Not authorized to view bookings for this doctor".to_string(),
                ));
            }
            service
                .list_by_doctor(doctor_id, date, auth.token())
                .await
                .map_err(into_app_error)?
        }
        _ => {
            return Err(AppError::BadRequest(
                "Specify exactly one of patientId or doctorId".to_string(),
            ))
        }
    };

    Ok(Json(json!({
        "bookings": bookings,
        "total": bookings.len()
    })))
}
