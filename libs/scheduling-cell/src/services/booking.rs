// libs/scheduling-cell/src/services/booking.rs
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use chrono::NaiveDate;
use shared_config::AppConfig;
use shared_models::auth::User;

use crate::models::{Booking, BookingError, NewBooking, ReserveBookingRequest};
use crate::services::calendar::SlotCalendar;
use crate::store::{BookingStore, StoreError};

/// Orchestrates reservations and the booking lifecycle.
///
/// Validation happens up front; the slot-uniqueness decision itself is
/// delegated to the store, whose insert is atomic. Nothing is retried here:
/// a conflict means the caller re-fetches availability and picks again.
pub struct BookingService {
    store: Arc<dyn BookingStore>,
    calendar: SlotCalendar,
}

impl BookingService {
    pub fn new(config: &AppConfig, store: Arc<dyn BookingStore>) -> Self {
        let calendar = SlotCalendar::new(config, Arc::clone(&store));
        Self { store, calendar }
    }

    pub fn calendar(&self) -> &SlotCalendar {
        &self.calendar
    }

    /// Reserve a slot for a patient.
    ///
    /// Succeeds with the new active booking, or fails with `InvalidDate`,
    /// `InvalidSlot` or `SlotConflict`. On conflict nothing was written.
    pub async fn reserve(
        &self,
        request: ReserveBookingRequest,
        auth_token: &str,
    ) -> Result<Booking, BookingError> {
        debug!(
            "Reserving {} {} with doctor {} for patient {}",
            request.date, request.time, request.doctor_id, request.patient_id
        );

        self.calendar.ensure_bookable_date(request.date)?;

        if !self.calendar.is_canonical(request.time) {
            return Err(BookingError::InvalidSlot(format!(
                "{} is not a bookable time mark",
                request.time
            )));
        }

        let new = NewBooking {
            doctor_id: request.doctor_id,
            patient_id: request.patient_id,
            date: request.date,
            time: request.time,
        };

        match self.store.insert_active(new, auth_token).await {
            Ok(booking) => {
                info!(
                    "Booking {} created: doctor {} on {} at {}",
                    booking.id, booking.doctor_id, booking.date, booking.time
                );
                Ok(booking)
            }
            Err(StoreError::SlotTaken) => {
                warn!(
                    "Reservation conflict for doctor {} on {} at {}",
                    request.doctor_id, request.date, request.time
                );
                Err(BookingError::SlotConflict)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Cancel an active booking on behalf of its owning patient or an admin.
    ///
    /// Cancelling a booking that is already cancelled fails with `NotFound`:
    /// there is no active booking by that id left to cancel.
    pub async fn cancel(
        &self,
        booking_id: Uuid,
        requester: &User,
        auth_token: &str,
    ) -> Result<(), BookingError> {
        let booking = self
            .store
            .get(booking_id, auth_token)
            .await?
            .ok_or(BookingError::NotFound)?;

        let is_owner = requester.id == booking.patient_id.to_string();
        if !is_owner && !requester.is_admin() {
            return Err(BookingError::Forbidden);
        }

        match self.store.cancel_active(booking_id, auth_token).await {
            Ok(_) => {
                info!("Booking {} cancelled by {}", booking_id, requester.id);
                Ok(())
            }
            Err(StoreError::NoActiveBooking) => Err(BookingError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get(&self, booking_id: Uuid, auth_token: &str) -> Result<Booking, BookingError> {
        self.store
            .get(booking_id, auth_token)
            .await?
            .ok_or(BookingError::NotFound)
    }

    /// Every booking the patient ever made, cancelled ones included, ordered
    /// by date then time.
    pub async fn list_by_patient(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Booking>, BookingError> {
        let mut bookings = self.store.list_by_patient(patient_id, auth_token).await?;
        bookings.sort_by_key(|b| (b.date, b.time));
        Ok(bookings)
    }

    /// A doctor's bookings for one day, ordered by time.
    pub async fn list_by_doctor(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Booking>, BookingError> {
        let mut bookings = self.store.list_for_day(doctor_id, date, auth_token).await?;
        bookings.sort_by_key(|b| (b.date, b.time));
        Ok(bookings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingStatus, SlotTime};
    use crate::store::MemoryBookingStore;
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};
    use shared_utils::test_utils::{TestConfig, TestUser};

    fn service() -> BookingService {
        let config = TestConfig::default().to_app_config();
        BookingService::new(&config, Arc::new(MemoryBookingStore::new()))
    }

    fn request(doctor_id: Uuid, patient_id: Uuid, time: &str) -> ReserveBookingRequest {
        ReserveBookingRequest {
            doctor_id,
            patient_id,
            date: Utc::now().date_naive() + Duration::days(7),
            time: time.parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn reserve_creates_active_booking() {
        let service = service();
        let doctor = Uuid::new_v4();
        let patient = Uuid::new_v4();

        let booking = service.reserve(request(doctor, patient, "9:00"), "").await.unwrap();

        assert_eq!(booking.status, BookingStatus::Active);
        assert_eq!(booking.doctor_id, doctor);
        assert_eq!(booking.patient_id, patient);
        assert_eq!(booking.time, SlotTime::from_hm(9, 0).unwrap());
    }

    #[tokio::test]
    async fn second_reserve_for_same_slot_conflicts() {
        let service = service();
        let doctor = Uuid::new_v4();

        service
            .reserve(request(doctor, Uuid::new_v4(), "9:00"), "")
            .await
            .unwrap();
        let err = service
            .reserve(request(doctor, Uuid::new_v4(), "9:00"), "")
            .await
            .unwrap_err();

        assert_matches!(err, BookingError::SlotConflict);
    }

    #[tokio::test]
    async fn concurrent_reserves_have_one_winner() {
        let service = Arc::new(service());
        let doctor = Uuid::new_v4();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service.reserve(request(doctor, Uuid::new_v4(), "11:30"), "").await
            }));
        }

        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap());
        }

        assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .filter(|o| o.is_err())
            .all(|o| matches!(o, Err(BookingError::SlotConflict))));
    }

    #[tokio::test]
    async fn off_grid_time_is_rejected() {
        let service = service();

        let err = service
            .reserve(request(Uuid::new_v4(), Uuid::new_v4(), "9:15"), "")
            .await
            .unwrap_err();

        assert_matches!(err, BookingError::InvalidSlot(_));
    }

    #[tokio::test]
    async fn past_date_is_rejected() {
        let service = service();
        let mut req = request(Uuid::new_v4(), Uuid::new_v4(), "9:00");
        req.date = Utc::now().date_naive() - Duration::days(1);

        assert_matches!(
            service.reserve(req, "").await.unwrap_err(),
            BookingError::InvalidDate(_)
        );
    }

    #[tokio::test]
    async fn cancel_requires_owner_or_admin() {
        let service = service();
        let patient = TestUser::patient("owner@example.com");
        let booking = service
            .reserve(request(Uuid::new_v4(), patient.uuid(), "10:00"), "")
            .await
            .unwrap();

        let stranger = TestUser::patient("other@example.com").to_user();
        assert_matches!(
            service.cancel(booking.id, &stranger, "").await.unwrap_err(),
            BookingError::Forbidden
        );

        let admin = TestUser::admin("admin@example.com").to_user();
        service.cancel(booking.id, &admin, "").await.unwrap();
    }

    #[tokio::test]
    async fn cancel_frees_slot_and_repeat_cancel_errors() {
        let service = service();
        let doctor = Uuid::new_v4();
        let patient = TestUser::patient("p@example.com");

        let booking = service
            .reserve(request(doctor, patient.uuid(), "9:00"), "")
            .await
            .unwrap();

        let owner = patient.to_user();
        service.cancel(booking.id, &owner, "").await.unwrap();

        // Slot is free again for a different patient.
        let rebooked = service
            .reserve(request(doctor, Uuid::new_v4(), "9:00"), "")
            .await
            .unwrap();
        assert_eq!(rebooked.status, BookingStatus::Active);

        // A second cancel of the first booking is an error, not a no-op.
        assert_matches!(
            service.cancel(booking.id, &owner, "").await.unwrap_err(),
            BookingError::NotFound
        );
    }

    #[tokio::test]
    async fn cancelled_bookings_stay_visible_in_history() {
        let service = service();
        let doctor = Uuid::new_v4();
        let patient = TestUser::patient("p@example.com");

        let first = service
            .reserve(request(doctor, patient.uuid(), "9:30"), "")
            .await
            .unwrap();
        service
            .reserve(request(doctor, patient.uuid(), "9:00"), "")
            .await
            .unwrap();

        service.cancel(first.id, &patient.to_user(), "").await.unwrap();

        let history = service.list_by_patient(patient.uuid(), "").await.unwrap();
        assert_eq!(history.len(), 2);
        // Ordered by time, cancelled entry included.
        assert_eq!(history[0].time.to_string(), "9:00");
        assert_eq!(history[1].time.to_string(), "9:30");
        assert_eq!(history[1].status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn reserved_booking_shows_in_both_listings_and_day_schedule() {
        let service = service();
        let doctor = Uuid::new_v4();
        let patient = Uuid::new_v4();
        let req = request(doctor, patient, "14:00");
        let date = req.date;

        let booking = service.reserve(req, "").await.unwrap();

        let by_patient = service.list_by_patient(patient, "").await.unwrap();
        assert_eq!(by_patient.len(), 1);
        assert_eq!(by_patient[0].id, booking.id);

        let by_doctor = service.list_by_doctor(doctor, date, "").await.unwrap();
        assert_eq!(by_doctor.len(), 1);
        assert_eq!(by_doctor[0].id, booking.id);

        let schedule = service.calendar().day_schedule(doctor, date, "").await.unwrap();
        let occupied: Vec<String> = schedule
            .iter()
            .filter(|s| s.occupied)
            .map(|s| s.time.to_string())
            .collect();
        assert_eq!(occupied, vec!["14:00".to_string()]);

        // No mutation in between: a repeat query returns the same view.
        let again = service.calendar().day_schedule(doctor, date, "").await.unwrap();
        assert_eq!(schedule, again);
    }
}
