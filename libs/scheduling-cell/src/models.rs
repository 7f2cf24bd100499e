// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Length of a bookable slot. Every mark on the clinic calendar is this far
/// from the next one.
pub const SLOT_INTERVAL_MINUTES: u16 = 30;

// ==============================================================================
// SLOT TIME
// ==============================================================================

/// A time-of-day mark on the clinic calendar, stored as minutes from midnight.
///
/// Rendered as `"H:MM"` with no leading zero on the hour (`"9:00"`, `"16:30"`).
/// Whether a given mark is actually bookable depends on the calendar's opening
/// hours; this type only carries the clock value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotTime(u16);

impl SlotTime {
    pub fn from_minutes(minutes: u16) -> Option<Self> {
        if minutes < 24 * 60 {
            Some(Self(minutes))
        } else {
            None
        }
    }

    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self(hour * 60 + minute))
        } else {
            None
        }
    }

    pub fn minutes(&self) -> u16 {
        self.0
    }

    pub fn hour(&self) -> u16 {
        self.0 / 60
    }

    pub fn minute(&self) -> u16 {
        self.0 % 60
    }

    pub fn to_naive_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(u32::from(self.hour()), u32::from(self.minute()), 0)
            .expect("slot time is always a valid clock time")
    }

    pub fn from_naive_time(time: NaiveTime) -> Self {
        use chrono::Timelike;
        Self((time.hour() * 60 + time.minute()) as u16)
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.hour(), self.minute())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time mark: {0:?}")]
pub struct ParseSlotTimeError(pub String);

impl FromStr for SlotTime {
    type Err = ParseSlotTimeError;

    /// Accepts `"H:MM"` and `"HH:MM"`; minutes must be two digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((hour_part, minute_part)) = s.split_once(':') else {
            return Err(ParseSlotTimeError(s.to_string()));
        };
        if minute_part.len() != 2 || hour_part.is_empty() || hour_part.len() > 2 {
            return Err(ParseSlotTimeError(s.to_string()));
        }

        let (Ok(hour), Ok(minute)) = (hour_part.parse::<u16>(), minute_part.parse::<u16>())
        else {
            return Err(ParseSlotTimeError(s.to_string()));
        };

        Self::from_hm(hour, minute).ok_or_else(|| ParseSlotTimeError(s.to_string()))
    }
}

impl Serialize for SlotTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ==============================================================================
// CORE BOOKING MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub date: NaiveDate,
    pub time: SlotTime,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_active(&self) -> bool {
        self.status == BookingStatus::Active
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Active,
    Cancelled,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Active => write!(f, "active"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(BookingStatus::Active),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status: {other:?}")),
        }
    }
}

/// Fields the caller supplies for a reservation; id, status and timestamps
/// are assigned by the store at insert time.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub date: NaiveDate,
    pub time: SlotTime,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveBookingRequest {
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub date: NaiveDate,
    pub time: SlotTime,
}

/// One mark of a doctor's day as reported by the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotStatus {
    pub time: SlotTime,
    pub occupied: bool,
}

// ==============================================================================
// SCHEDULING POLICY
// ==============================================================================

#[derive(Debug, Clone)]
pub struct SchedulePolicy {
    /// Bookings may be placed at most this many days ahead of today.
    pub max_advance_days: i64,
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        Self {
            max_advance_days: 90,
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid slot time: {0}")]
    InvalidSlot(String),

    #[error("Slot already has an active booking")]
    SlotConflict,

    #[error("Booking not found")]
    NotFound,

    #[error("Not authorized for this booking")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_time_renders_without_leading_zero() {
        let nine = SlotTime::from_hm(9, 0).unwrap();
        let half_past_four = SlotTime::from_hm(16, 30).unwrap();

        assert_eq!(nine.to_string(), "9:00");
        assert_eq!(half_past_four.to_string(), "16:30");
    }

    #[test]
    fn slot_time_parses_padded_and_unpadded_hours() {
        assert_eq!("9:00".parse::<SlotTime>().unwrap(), SlotTime::from_hm(9, 0).unwrap());
        assert_eq!("09:00".parse::<SlotTime>().unwrap(), SlotTime::from_hm(9, 0).unwrap());
        assert_eq!("16:30".parse::<SlotTime>().unwrap(), SlotTime::from_hm(16, 30).unwrap());
    }

    #[test]
    fn slot_time_rejects_garbage() {
        assert!("".parse::<SlotTime>().is_err());
        assert!("9".parse::<SlotTime>().is_err());
        assert!("9:0".parse::<SlotTime>().is_err());
        assert!("9:000".parse::<SlotTime>().is_err());
        assert!("25:00".parse::<SlotTime>().is_err());
        assert!("9:60".parse::<SlotTime>().is_err());
        assert!("nine:00".parse::<SlotTime>().is_err());
    }

    #[test]
    fn slot_time_serde_round_trips_as_string() {
        let time = SlotTime::from_hm(9, 30).unwrap();
        let json = serde_json::to_string(&time).unwrap();
        assert_eq!(json, "\"9:30\"");

        let back: SlotTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, time);
    }

    #[test]
    fn booking_serializes_camel_case() {
        let booking = Booking {
            id: Uuid::nil(),
            doctor_id: Uuid::nil(),
            patient_id: Uuid::nil(),
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            time: SlotTime::from_hm(9, 0).unwrap(),
            status: BookingStatus::Active,
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&booking).unwrap();
        assert!(value.get("doctorId").is_some());
        assert!(value.get("patientId").is_some());
        assert!(value.get("createdAt").is_some());
        assert_eq!(value["date"], "2025-03-10");
        assert_eq!(value["time"], "9:00");
        assert_eq!(value["status"], "active");
    }

    #[test]
    fn status_display_matches_wire_form() {
        assert_eq!(BookingStatus::Active.to_string(), "active");
        assert_eq!(BookingStatus::Cancelled.to_string(), "cancelled");
        assert_eq!("cancelled".parse::<BookingStatus>().unwrap(), BookingStatus::Cancelled);
        assert!("pending".parse::<BookingStatus>().is_err());
    }
}
