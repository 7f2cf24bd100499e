// libs/scheduling-cell/src/store/memory.rs
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::models::{Booking, BookingStatus, NewBooking, SlotTime};
use crate::store::{BookingStore, StoreError};

/// In-memory booking store. The occupancy set plays the role the partial
/// unique index plays in the database backend: one entry per actively booked
/// `(doctor, date, time)` triple. Both maps sit behind a single mutex held
/// across the check-and-insert, so a slot can never be handed out twice.
#[derive(Default)]
pub struct MemoryBookingStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    bookings: HashMap<Uuid, Booking>,
    occupied: HashSet<(Uuid, NaiveDate, SlotTime)>,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("booking store mutex poisoned".to_string()))
    }
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn insert_active(
        &self,
        new: NewBooking,
        _auth_token: &str,
    ) -> Result<Booking, StoreError> {
        let mut inner = self.lock()?;

        let key = (new.doctor_id, new.date, new.time);
        if inner.occupied.contains(&key) {
            debug!(
                "Slot {} {} already taken for doctor {}",
                new.date, new.time, new.doctor_id
            );
            return Err(StoreError::SlotTaken);
        }

        let booking = Booking {
            id: Uuid::new_v4(),
            doctor_id: new.doctor_id,
            patient_id: new.patient_id,
            date: new.date,
            time: new.time,
            status: BookingStatus::Active,
            created_at: Utc::now(),
        };

        inner.occupied.insert(key);
        inner.bookings.insert(booking.id, booking.clone());

        Ok(booking)
    }

    async fn get(&self, id: Uuid, _auth_token: &str) -> Result<Option<Booking>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.bookings.get(&id).cloned())
    }

    async fn cancel_active(&self, id: Uuid, _auth_token: &str) -> Result<Booking, StoreError> {
        let mut inner = self.lock()?;

        let Some(booking) = inner.bookings.get(&id) else {
            return Err(StoreError::NoActiveBooking);
        };
        if booking.status != BookingStatus::Active {
            return Err(StoreError::NoActiveBooking);
        }

        let key = (booking.doctor_id, booking.date, booking.time);
        inner.occupied.remove(&key);

        let booking = inner
            .bookings
            .get_mut(&id)
            .expect("booking present under lock");
        booking.status = BookingStatus::Cancelled;

        Ok(booking.clone())
    }

    async fn list_by_patient(
        &self,
        patient_id: Uuid,
        _auth_token: &str,
    ) -> Result<Vec<Booking>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .bookings
            .values()
            .filter(|b| b.patient_id == patient_id)
            .cloned()
            .collect())
    }

    async fn list_for_day(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        _auth_token: &str,
    ) -> Result<Vec<Booking>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .bookings
            .values()
            .filter(|b| b.doctor_id == doctor_id && b.date == date)
            .cloned()
            .collect())
    }
}
