// libs/appointment-cell/src/models.rs
use serde::{Deserialize, Serialize};
use serde::de::{self, Visitor};
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveDate, NaiveDateTime};
use std::fmt;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub patient_id: Uuid,
    pub office_id: Option<Uuid>,
    pub appointment_date: NaiveDateTime,
    pub duration: DurationMinutes,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub amount: Option<f64>,
    pub created_by: Option<Uuid>,
    pub confirmed_at: Option<NaiveDateTime>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Scheduled end derived from start plus duration.
    pub fn end_time(&self) -> NaiveDateTime {
        self.appointment_date + self.duration.to_chrono()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Attended,
    Cancelled,
    Absent,
}

impl AppointmentStatus {
    /// Only active bookings participate in conflict and availability checks.
    pub fn blocks_scheduling(&self) -> bool {
        matches!(self, AppointmentStatus::Scheduled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Attended => write!(f, "attended"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Absent => write!(f, "absent"),
        }
    }
}

// ==============================================================================
// DURATION VALUE TYPE
// ==============================================================================

/// Appointment length as a positive count of minutes.
///
/// Stored rows carry the duration either as an `HH:MM:SS` time string
/// (older rows) or as a raw integer minute count; both forms normalize to
/// this type at deserialization and only the minute count exists past that
/// boundary. Serializes as the integer form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DurationMinutes(i64);

impl DurationMinutes {
    pub fn new(minutes: i64) -> Result<Self, String> {
        if minutes <= 0 {
            return Err(format!("duration must be a positive number of minutes, got {}", minutes));
        }
        Ok(Self(minutes))
    }

    /// Parses either a bare minute count ("90") or an `HH:MM:SS` / `HH:MM`
    /// time string ("01:30:00").
    pub fn parse(input: &str) -> Result<Self, String> {
        let trimmed = input.trim();

        if !trimmed.contains(':') {
            let minutes: i64 = trimmed.parse()
                .map_err(|_| format!("invalid duration: {}", input))?;
            return Self::new(minutes);
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        if parts.len() != 2 && parts.len() != 3 {
            return Err(format!("invalid duration: {}", input));
        }

        let hours: i64 = parts[0].parse()
            .map_err(|_| format!("invalid duration: {}", input))?;
        let minutes: i64 = parts[1].parse()
            .map_err(|_| format!("invalid duration: {}", input))?;
        if minutes >= 60 {
            return Err(format!("invalid duration: {}", input));
        }
        if parts.len() == 3 {
            let seconds: i64 = parts[2].parse()
                .map_err(|_| format!("invalid duration: {}", input))?;
            if seconds != 0 {
                return Err(format!("duration seconds must be zero: {}", input));
            }
        }

        Self::new(hours * 60 + minutes)
    }

    pub fn minutes(&self) -> i64 {
        self.0
    }

    pub fn to_chrono(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.0)
    }
}

impl fmt::Display for DurationMinutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min", self.0)
    }
}

impl Serialize for DurationMinutes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where S: serde::Serializer {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for DurationMinutes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: serde::Deserializer<'de> {
        struct DurationVisitor;

        impl<'de> Visitor<'de> for DurationVisitor {
            type Value = DurationMinutes;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a positive minute count or an HH:MM:SS string")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where E: de::Error {
                DurationMinutes::new(value).map_err(E::custom)
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where E: de::Error {
                DurationMinutes::new(value as i64).map_err(E::custom)
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where E: de::Error {
                DurationMinutes::parse(value).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(DurationVisitor)
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub professional_id: Uuid,
    pub patient_id: Uuid,
    pub office_id: Option<Uuid>,
    pub appointment_date: NaiveDateTime,
    pub duration: DurationMinutes,
    pub notes: Option<String>,
    pub amount: Option<f64>,
}

/// Full update of an appointment. Scheduling is only re-validated when the
/// start time, duration or professional actually changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub professional_id: Uuid,
    pub patient_id: Uuid,
    pub office_id: Option<Uuid>,
    pub appointment_date: NaiveDateTime,
    pub duration: DurationMinutes,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAppointmentStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentSearchQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub professional_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Professional not found")]
    ProfessionalNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("The professional already has an appointment in that time range")]
    ConflictDetected,

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidStatusTransition(AppointmentStatus),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
