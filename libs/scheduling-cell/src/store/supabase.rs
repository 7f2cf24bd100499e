// libs/scheduling-cell/src/store/supabase.rs
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{SupabaseClient, SupabaseError};

use crate::models::{Booking, BookingStatus, NewBooking, SlotTime};
use crate::store::{BookingStore, StoreError};

/// Booking store over the `bookings` table.
///
/// The table carries a partial unique index,
/// `bookings_active_slot_key (doctor_id, date, time) where status = 'active'`,
/// so the insert itself is the atomic check-and-create: a second active
/// booking for the same triple comes back as 409 and is reported as
/// [`StoreError::SlotTaken`]. No in-process locking is involved.
pub struct SupabaseBookingStore {
    supabase: SupabaseClient,
}

/// Row shape of the `bookings` table. Columns are snake_case and `time` is a
/// SQL time (`"09:00:00"`); conversion to the wire model happens here.
#[derive(Debug, Deserialize)]
struct BookingRow {
    id: Uuid,
    doctor_id: Uuid,
    patient_id: Uuid,
    date: NaiveDate,
    time: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_booking(self) -> Result<Booking, StoreError> {
        let time = NaiveTime::parse_from_str(&self.time, "%H:%M:%S")
            .map(SlotTime::from_naive_time)
            .map_err(|e| StoreError::Unavailable(format!("bad time column {:?}: {e}", self.time)))?;

        let status: BookingStatus = self
            .status
            .parse()
            .map_err(|e: String| StoreError::Unavailable(e))?;

        Ok(Booking {
            id: self.id,
            doctor_id: self.doctor_id,
            patient_id: self.patient_id,
            date: self.date,
            time,
            status,
            created_at: self.created_at,
        })
    }
}

fn sql_time(time: SlotTime) -> String {
    format!("{:02}:{:02}:00", time.hour(), time.minute())
}

fn representation_headers() -> reqwest::header::HeaderMap {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        "Prefer",
        reqwest::header::HeaderValue::from_static("return=representation"),
    );
    headers
}

impl SupabaseBookingStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    fn rows_to_bookings(rows: Vec<BookingRow>) -> Result<Vec<Booking>, StoreError> {
        rows.into_iter().map(BookingRow::into_booking).collect()
    }
}

#[async_trait]
impl BookingStore for SupabaseBookingStore {
    async fn insert_active(
        &self,
        new: NewBooking,
        auth_token: &str,
    ) -> Result<Booking, StoreError> {
        debug!(
            "Inserting active booking for doctor {} on {} at {}",
            new.doctor_id, new.date, new.time
        );

        let booking_data = json!({
            "doctor_id": new.doctor_id,
            "patient_id": new.patient_id,
            "date": new.date,
            "time": sql_time(new.time),
            "status": BookingStatus::Active.to_string(),
            "created_at": Utc::now().to_rfc3339(),
        });

        let result: Vec<BookingRow> = match self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/bookings",
                Some(auth_token),
                Some(booking_data),
                Some(representation_headers()),
            )
            .await
        {
            Ok(rows) => rows,
            Err(SupabaseError::Conflict(detail)) => {
                debug!("Unique index rejected booking insert: {}", detail);
                return Err(StoreError::SlotTaken);
            }
            Err(e) => return Err(StoreError::Unavailable(e.to_string())),
        };

        result
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Unavailable("insert returned no row".to_string()))?
            .into_booking()
    }

    async fn get(&self, id: Uuid, auth_token: &str) -> Result<Option<Booking>, StoreError> {
        let path = format!("/rest/v1/bookings?id=eq.{}", id);
        let result: Vec<BookingRow> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        result.into_iter().next().map(BookingRow::into_booking).transpose()
    }

    async fn cancel_active(&self, id: Uuid, auth_token: &str) -> Result<Booking, StoreError> {
        // Filtered on status so a cancel that lost the race (or a repeat
        // cancel) matches zero rows instead of rewriting a terminal state.
        let path = format!("/rest/v1/bookings?id=eq.{}&status=eq.active", id);
        let update = json!({
            "status": BookingStatus::Cancelled.to_string(),
        });

        let result: Vec<BookingRow> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(update),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        match result.into_iter().next() {
            Some(row) => row.into_booking(),
            None => {
                warn!("Cancel matched no active booking for {}", id);
                Err(StoreError::NoActiveBooking)
            }
        }
    }

    async fn list_by_patient(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Booking>, StoreError> {
        let path = format!(
            "/rest/v1/bookings?patient_id=eq.{}&order=date.asc,time.asc",
            patient_id
        );
        let result: Vec<BookingRow> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Self::rows_to_bookings(result)
    }

    async fn list_for_day(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Booking>, StoreError> {
        let path = format!(
            "/rest/v1/bookings?doctor_id=eq.{}&date=eq.{}&order=time.asc",
            doctor_id, date
        );
        let result: Vec<BookingRow> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Self::rows_to_bookings(result)
    }
}
