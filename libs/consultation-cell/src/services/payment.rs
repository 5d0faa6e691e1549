use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{ConsultationError, Payment, RecordPaymentRequest};

pub struct PaymentService {
    supabase: SupabaseClient,
}

impl PaymentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Record money received against a consultation. The consultation's
    /// payment_status is updated separately by the front desk.
    pub async fn record_payment(
        &self,
        consultation_id: Uuid,
        request: RecordPaymentRequest,
        registered_by: Option<Uuid>,
        auth_token: &str,
    ) -> Result<Payment, ConsultationError> {
        debug!("Recording payment for consultation {}", consultation_id);

        if request.amount <= 0.0 {
            return Err(ConsultationError::ValidationError(
                "payment amount must be positive".to_string()
            ));
        }

        let consultation_path = format!("/rest/v1/consultations?id=eq.{}&select=id", consultation_id);
        let existing: Vec<Value> = self.fetch(&consultation_path, auth_token).await?;
        if existing.is_empty() {
            return Err(ConsultationError::NotFound);
        }

        let payment_data = json!({
            "consultation_id": consultation_id,
            "amount": request.amount,
            "payment_method": request.payment_method,
            "receipt_number": request.receipt_number,
            "notes": request.notes,
            "payment_date": request.payment_date.format("%Y-%m-%dT%H:%M:%S").to_string(),
            "registered_by": registered_by,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/payments",
            Some(auth_token),
            Some(payment_data),
            Some(headers),
        ).await.map_err(|e| ConsultationError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(ConsultationError::DatabaseError(
                "Write did not return the stored payment".to_string()
            ));
        }

        let payment: Payment = serde_json::from_value(result[0].clone())
            .map_err(|e| ConsultationError::DatabaseError(format!("Failed to parse payment: {}", e)))?;

        info!("Payment {} of {} recorded for consultation {}",
              payment.id, payment.amount, consultation_id);
        Ok(payment)
    }

    pub async fn list_payments(
        &self,
        consultation_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Payment>, ConsultationError> {
        let path = format!("/rest/v1/payments?consultation_id=eq.{}&order=payment_date.asc",
                          consultation_id);
        let result: Vec<Value> = self.fetch(&path, auth_token).await?;

        result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Payment>, _>>()
            .map_err(|e| ConsultationError::DatabaseError(format!("Failed to parse payments: {}", e)))
    }

    async fn fetch(&self, path: &str, auth_token: &str) -> Result<Vec<Value>, ConsultationError> {
        self.supabase.request(
            Method::GET,
            path,
            Some(auth_token),
            None,
        ).await.map_err(|e| ConsultationError::DatabaseError(e.to_string()))
    }
}
