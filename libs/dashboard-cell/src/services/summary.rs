use std::collections::{BTreeMap, HashSet};

use chrono::{Duration, NaiveDate};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use appointment_cell::models::{Appointment, AppointmentStatus};
use consultation_cell::models::{Consultation, PaymentStatus};
use professional_cell::models::Professional;

use crate::models::{
    AppointmentCounts, DashboardError, DashboardSummary, IncomeSummary,
    ProfessionalActivity, ProfessionalIncome,
};

/// Read-only aggregates for the front-desk dashboard. Sums are computed
/// over the day's fetched rows; nothing here mutates records.
pub struct DashboardService {
    supabase: SupabaseClient,
}

impl DashboardService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn daily_summary(
        &self,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<DashboardSummary, DashboardError> {
        debug!("Building dashboard summary for {}", date);

        let appointments = self.appointments_for_day(date, auth_token).await?;
        let consultations = self.paid_consultations_for_day(date, auth_token).await?;
        let professionals = self.active_professionals(auth_token).await?;

        let counts = AppointmentCounts {
            total: appointments.len(),
            scheduled: count_status(&appointments, AppointmentStatus::Scheduled),
            attended: count_status(&appointments, AppointmentStatus::Attended),
            cancelled: count_status(&appointments, AppointmentStatus::Cancelled),
            absent: count_status(&appointments, AppointmentStatus::Absent),
        };

        let income = build_income_summary(&consultations, &professionals);
        let activity = build_activity(&appointments, &professionals);

        Ok(DashboardSummary {
            date,
            appointments: counts,
            income,
            professionals: activity,
        })
    }

    async fn appointments_for_day(
        &self,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, DashboardError> {
        let day_start = date.and_hms_opt(0, 0, 0).unwrap();
        let day_end = day_start + Duration::days(1);

        let path = format!(
            "/rest/v1/appointments?appointment_date=gte.{}&appointment_date=lt.{}&order=appointment_date.asc",
            urlencoding::encode(&day_start.format("%Y-%m-%dT%H:%M:%S").to_string()),
            urlencoding::encode(&day_end.format("%Y-%m-%dT%H:%M:%S").to_string()),
        );

        let result: Vec<Value> = self.fetch(&path, auth_token).await?;
        result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| DashboardError::DatabaseError(format!("Failed to parse appointments: {}", e)))
    }

    async fn paid_consultations_for_day(
        &self,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Consultation>, DashboardError> {
        let day_start = date.and_hms_opt(0, 0, 0).unwrap();
        let day_end = day_start + Duration::days(1);

        let path = format!(
            "/rest/v1/consultations?consultation_date=gte.{}&consultation_date=lt.{}&payment_status=eq.{}",
            urlencoding::encode(&day_start.format("%Y-%m-%dT%H:%M:%S").to_string()),
            urlencoding::encode(&day_end.format("%Y-%m-%dT%H:%M:%S").to_string()),
            PaymentStatus::Paid,
        );

        let result: Vec<Value> = self.fetch(&path, auth_token).await?;
        result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Consultation>, _>>()
            .map_err(|e| DashboardError::DatabaseError(format!("Failed to parse consultations: {}", e)))
    }

    async fn active_professionals(
        &self,
        auth_token: &str,
    ) -> Result<Vec<Professional>, DashboardError> {
        let path = "/rest/v1/professionals?is_active=eq.true";
        let result: Vec<Value> = self.fetch(path, auth_token).await?;
        result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Professional>, _>>()
            .map_err(|e| DashboardError::DatabaseError(format!("Failed to parse professionals: {}", e)))
    }

    async fn fetch(&self, path: &str, auth_token: &str) -> Result<Vec<Value>, DashboardError> {
        self.supabase.request(
            Method::GET,
            path,
            Some(auth_token),
            None,
        ).await.map_err(|e| DashboardError::DatabaseError(e.to_string()))
    }
}

fn count_status(appointments: &[Appointment], status: AppointmentStatus) -> usize {
    appointments.iter().filter(|apt| apt.status == status).count()
}

fn build_income_summary(
    consultations: &[Consultation],
    professionals: &[Professional],
) -> IncomeSummary {
    let total_collected = consultations.iter().map(|c| c.amount_charged).sum();

    let mut clinic_totals: BTreeMap<Uuid, f64> = BTreeMap::new();
    for consultation in consultations {
        *clinic_totals.entry(consultation.professional_id).or_insert(0.0) += consultation.clinic_amount;
    }

    let per_professional = clinic_totals.into_iter()
        .map(|(professional_id, clinic_total)| {
            let professional_name = professionals.iter()
                .find(|p| p.id == professional_id)
                .map(|p| p.full_name())
                .unwrap_or_else(|| professional_id.to_string());

            ProfessionalIncome {
                professional_id,
                professional_name,
                clinic_total,
            }
        })
        .collect();

    IncomeSummary {
        total_collected,
        per_professional,
    }
}

fn build_activity(
    appointments: &[Appointment],
    professionals: &[Professional],
) -> ProfessionalActivity {
    let active_ids: HashSet<Uuid> = professionals.iter().map(|p| p.id).collect();

    let with_appointments: HashSet<Uuid> = appointments.iter()
        .filter(|apt| matches!(apt.status, AppointmentStatus::Scheduled | AppointmentStatus::Attended))
        .filter(|apt| active_ids.contains(&apt.professional_id))
        .map(|apt| apt.professional_id)
        .collect();

    let in_consultation: HashSet<Uuid> = appointments.iter()
        .filter(|apt| apt.status == AppointmentStatus::Attended)
        .filter(|apt| active_ids.contains(&apt.professional_id))
        .map(|apt| apt.professional_id)
        .collect();

    ProfessionalActivity {
        with_appointments: with_appointments.len(),
        in_consultation: in_consultation.len(),
    }
}
