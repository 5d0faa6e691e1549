use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveDate, NaiveDateTime};
use std::fmt;

// ==============================================================================
// CONSULTATION MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub professional_id: Uuid,
    pub patient_id: Uuid,
    pub consultation_date: NaiveDateTime,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub notes: Option<String>,
    /// Amounts arrive pre-computed from the front desk; no split arithmetic
    /// happens in this service.
    pub amount_charged: f64,
    pub professional_commission: f64,
    pub clinic_amount: f64,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Partial,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Partial => write!(f, "partial"),
        }
    }
}

// ==============================================================================
// PAYMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub consultation_id: Uuid,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub receipt_number: Option<String>,
    pub notes: Option<String>,
    pub payment_date: NaiveDateTime,
    pub registered_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Check,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConsultationRequest {
    pub appointment_id: Uuid,
    pub consultation_date: NaiveDateTime,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub notes: Option<String>,
    pub amount_charged: f64,
    pub professional_commission: f64,
    pub clinic_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePaymentStatusRequest {
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPaymentRequest {
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub receipt_number: Option<String>,
    pub notes: Option<String>,
    pub payment_date: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultationSearchQuery {
    pub date: Option<NaiveDate>,
    pub professional_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub payment_status: Option<PaymentStatus>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum ConsultationError {
    #[error("Consultation not found")]
    NotFound,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Consultation requires an attended appointment")]
    AppointmentNotAttended,

    #[error("Appointment already has a consultation")]
    ConsultationAlreadyExists,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
