// libs/scheduling-cell/src/store/mod.rs
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{Booking, BookingError, NewBooking};

pub mod memory;
pub mod supabase;

pub use memory::MemoryBookingStore;
pub use supabase::SupabaseBookingStore;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The slot already carries an active booking. This is the storage-level
    /// face of a reservation race: two writers, one winner.
    #[error("slot already has an active booking")]
    SlotTaken,

    /// No active booking matched the conditional cancel. Either the id is
    /// unknown or the booking was already cancelled.
    #[error("no active booking to cancel")]
    NoActiveBooking,

    #[error("storage failure: {0}")]
    Unavailable(String),
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SlotTaken => BookingError::SlotConflict,
            StoreError::NoActiveBooking => BookingError::NotFound,
            StoreError::Unavailable(msg) => BookingError::Database(msg),
        }
    }
}

/// The booking collection — the only shared mutable resource in the service.
///
/// `insert_active` must perform the no-active-booking check and the insert as
/// one indivisible step; every other correctness property of the scheduler
/// rests on that.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Atomically create an active booking for the requested slot.
    /// Fails with [`StoreError::SlotTaken`] if an active booking already
    /// references the `(doctor, date, time)` triple.
    async fn insert_active(
        &self,
        new: NewBooking,
        auth_token: &str,
    ) -> Result<Booking, StoreError>;

    async fn get(&self, id: Uuid, auth_token: &str) -> Result<Option<Booking>, StoreError>;

    /// Cancel the booking iff it is still active, returning the updated row.
    /// Conditional on status so that two racing cancels cannot both succeed.
    async fn cancel_active(&self, id: Uuid, auth_token: &str) -> Result<Booking, StoreError>;

    async fn list_by_patient(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Booking>, StoreError>;

    /// All bookings (any status) for one doctor-day.
    async fn list_for_day(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Booking>, StoreError>;
}
