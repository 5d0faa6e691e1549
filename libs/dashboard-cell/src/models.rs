use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::NaiveDate;

/// Front-desk snapshot for one day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub date: NaiveDate,
    pub appointments: AppointmentCounts,
    pub income: IncomeSummary,
    pub professionals: ProfessionalActivity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentCounts {
    pub total: usize,
    pub scheduled: usize,
    pub attended: usize,
    pub cancelled: usize,
    pub absent: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeSummary {
    /// Sum of amount_charged over the day's paid consultations.
    pub total_collected: f64,
    pub per_professional: Vec<ProfessionalIncome>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfessionalIncome {
    pub professional_id: Uuid,
    pub professional_name: String,
    /// Share kept by the clinic, as stored on the consultations.
    pub clinic_total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfessionalActivity {
    /// Active professionals with at least one booking that day.
    pub with_appointments: usize,
    /// Of those, how many have an attended appointment in progress.
    pub in_consultation: usize,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DashboardError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}
