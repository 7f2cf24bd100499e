// libs/scheduling-cell/src/services/calendar.rs
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;

use crate::models::{BookingError, SchedulePolicy, SlotStatus, SlotTime, SLOT_INTERVAL_MINUTES};
use crate::store::BookingStore;

/// The bookable time marks of a clinic day, and the occupancy view over them.
///
/// Marks are generated, never stored: `open + k*30` for every `k` that fits
/// before closing. Occupancy is equally derived — a mark is occupied exactly
/// when an active booking references it, so the calendar carries no state of
/// its own and two calls with no mutation in between agree.
#[derive(Clone)]
pub struct SlotCalendar {
    store: Arc<dyn BookingStore>,
    open_minutes: u16,
    close_minutes: u16,
    policy: SchedulePolicy,
}

impl SlotCalendar {
    pub fn new(config: &AppConfig, store: Arc<dyn BookingStore>) -> Self {
        Self::with_hours(store, config.clinic_open_hour, config.clinic_close_hour)
    }

    pub fn with_hours(store: Arc<dyn BookingStore>, open_hour: u32, close_hour: u32) -> Self {
        Self {
            store,
            open_minutes: (open_hour * 60) as u16,
            close_minutes: (close_hour * 60) as u16,
            policy: SchedulePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SchedulePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The canonical ordered sequence of marks for any day.
    pub fn marks(&self) -> Vec<SlotTime> {
        let count = (self.close_minutes - self.open_minutes) / SLOT_INTERVAL_MINUTES;
        (0..count)
            .map(|k| {
                SlotTime::from_minutes(self.open_minutes + k * SLOT_INTERVAL_MINUTES)
                    .expect("marks stay within the clock")
            })
            .collect()
    }

    pub fn is_canonical(&self, time: SlotTime) -> bool {
        let minutes = time.minutes();
        minutes >= self.open_minutes
            && minutes < self.close_minutes
            && (minutes - self.open_minutes) % SLOT_INTERVAL_MINUTES == 0
    }

    /// Date policy: strictly-past dates are rejected, today is bookable, and
    /// so is anything up to `max_advance_days` ahead.
    pub fn ensure_bookable_date(&self, date: NaiveDate) -> Result<(), BookingError> {
        let today = Utc::now().date_naive();

        if date < today {
            return Err(BookingError::InvalidDate(format!(
                "{} is in the past",
                date
            )));
        }
        if date > today + Duration::days(self.policy.max_advance_days) {
            return Err(BookingError::InvalidDate(format!(
                "{} is more than {} days ahead",
                date, self.policy.max_advance_days
            )));
        }

        Ok(())
    }

    /// Occupancy of every mark of a doctor's day, in calendar order.
    pub async fn day_schedule(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<SlotStatus>, BookingError> {
        self.ensure_bookable_date(date)?;

        let bookings = self.store.list_for_day(doctor_id, date, auth_token).await?;
        let occupied: HashSet<SlotTime> = bookings
            .iter()
            .filter(|b| b.is_active())
            .map(|b| b.time)
            .collect();

        debug!(
            "Doctor {} has {} occupied marks on {}",
            doctor_id,
            occupied.len(),
            date
        );

        Ok(self
            .marks()
            .into_iter()
            .map(|time| SlotStatus {
                time,
                occupied: occupied.contains(&time),
            })
            .collect())
    }
}
