use chrono::{Duration, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    Consultation, ConsultationError, ConsultationSearchQuery,
    CreateConsultationRequest, PaymentStatus, UpdatePaymentStatusRequest,
};

pub struct ConsultationService {
    supabase: SupabaseClient,
}

impl ConsultationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Record the clinical outcome of an attended appointment. Amounts are
    /// stored exactly as submitted.
    pub async fn create_consultation(
        &self,
        request: CreateConsultationRequest,
        auth_token: &str,
    ) -> Result<Consultation, ConsultationError> {
        debug!("Creating consultation for appointment {}", request.appointment_id);

        if request.amount_charged < 0.0
            || request.professional_commission < 0.0
            || request.clinic_amount < 0.0
        {
            return Err(ConsultationError::ValidationError(
                "amounts must not be negative".to_string()
            ));
        }

        let appointment = self.get_appointment(request.appointment_id, auth_token).await?;

        let status = appointment["status"].as_str().unwrap_or_default();
        if status != "attended" {
            return Err(ConsultationError::AppointmentNotAttended);
        }

        let existing_path = format!("/rest/v1/consultations?appointment_id=eq.{}&select=id",
                                    request.appointment_id);
        let existing: Vec<Value> = self.fetch(&existing_path, auth_token).await?;
        if !existing.is_empty() {
            return Err(ConsultationError::ConsultationAlreadyExists);
        }

        let consultation_data = json!({
            "appointment_id": request.appointment_id,
            "professional_id": appointment["professional_id"],
            "patient_id": appointment["patient_id"],
            "consultation_date": request.consultation_date.format("%Y-%m-%dT%H:%M:%S").to_string(),
            "diagnosis": request.diagnosis,
            "treatment": request.treatment,
            "notes": request.notes,
            "amount_charged": request.amount_charged,
            "professional_commission": request.professional_commission,
            "clinic_amount": request.clinic_amount,
            "payment_status": PaymentStatus::Pending,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/consultations",
            Some(auth_token),
            Some(consultation_data),
            Some(headers),
        ).await.map_err(|e| ConsultationError::DatabaseError(e.to_string()))?;

        let consultation = Self::single_row(result)?;
        info!("Consultation {} recorded for appointment {}",
              consultation.id, consultation.appointment_id);
        Ok(consultation)
    }

    pub async fn get_consultation(
        &self,
        consultation_id: Uuid,
        auth_token: &str,
    ) -> Result<Consultation, ConsultationError> {
        let path = format!("/rest/v1/consultations?id=eq.{}", consultation_id);
        let result: Vec<Value> = self.fetch(&path, auth_token).await?;

        if result.is_empty() {
            return Err(ConsultationError::NotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| ConsultationError::DatabaseError(format!("Failed to parse consultation: {}", e)))
    }

    pub async fn search_consultations(
        &self,
        query: ConsultationSearchQuery,
        auth_token: &str,
    ) -> Result<Vec<Consultation>, ConsultationError> {
        let mut query_parts = vec![];

        if let Some(date) = query.date {
            let day_start = date.and_hms_opt(0, 0, 0).unwrap();
            let day_end = day_start + Duration::days(1);
            query_parts.push(format!("consultation_date=gte.{}",
                urlencoding::encode(&day_start.format("%Y-%m-%dT%H:%M:%S").to_string())));
            query_parts.push(format!("consultation_date=lt.{}",
                urlencoding::encode(&day_end.format("%Y-%m-%dT%H:%M:%S").to_string())));
        }
        if let Some(professional_id) = query.professional_id {
            query_parts.push(format!("professional_id=eq.{}", professional_id));
        }
        if let Some(patient_id) = query.patient_id {
            query_parts.push(format!("patient_id=eq.{}", patient_id));
        }
        if let Some(payment_status) = query.payment_status {
            query_parts.push(format!("payment_status=eq.{}", payment_status));
        }

        let filters = if query_parts.is_empty() {
            String::new()
        } else {
            format!("{}&", query_parts.join("&"))
        };

        let path = format!("/rest/v1/consultations?{}order=consultation_date.asc", filters);
        let result: Vec<Value> = self.fetch(&path, auth_token).await?;

        result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Consultation>, _>>()
            .map_err(|e| ConsultationError::DatabaseError(format!("Failed to parse consultations: {}", e)))
    }

    pub async fn update_payment_status(
        &self,
        consultation_id: Uuid,
        request: UpdatePaymentStatusRequest,
        auth_token: &str,
    ) -> Result<Consultation, ConsultationError> {
        debug!("Updating payment status of consultation {} to {}",
               consultation_id, request.payment_status);

        // Existence check keeps the 404 distinguishable from a failed write
        self.get_consultation(consultation_id, auth_token).await?;

        let update_data = json!({
            "payment_status": request.payment_status,
            "updated_at": Utc::now().to_rfc3339()
        });

        let path = format!("/rest/v1/consultations?id=eq.{}", consultation_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(update_data),
            Some(headers),
        ).await.map_err(|e| ConsultationError::DatabaseError(e.to_string()))?;

        Self::single_row(result)
    }

    async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Value, ConsultationError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self.fetch(&path, auth_token).await?;

        if result.is_empty() {
            return Err(ConsultationError::AppointmentNotFound);
        }

        Ok(result[0].clone())
    }

    async fn fetch(&self, path: &str, auth_token: &str) -> Result<Vec<Value>, ConsultationError> {
        self.supabase.request(
            Method::GET,
            path,
            Some(auth_token),
            None,
        ).await.map_err(|e| ConsultationError::DatabaseError(e.to_string()))
    }

    fn single_row(result: Vec<Value>) -> Result<Consultation, ConsultationError> {
        if result.is_empty() {
            return Err(ConsultationError::DatabaseError(
                "Write did not return the stored consultation".to_string()
            ));
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| ConsultationError::DatabaseError(format!("Failed to parse consultation: {}", e)))
    }
}
