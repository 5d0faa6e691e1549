// libs/appointment-cell/src/services/booking.rs
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;
use std::sync::Arc;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    Appointment, AppointmentError, AppointmentSearchQuery, AppointmentStatus,
    CreateAppointmentRequest, DurationMinutes, UpdateAppointmentRequest,
};
use crate::services::conflict::ConflictDetectionService;
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::scheduling::{available_slots, SchedulingWindow, TimeInterval};

pub struct AppointmentBookingService {
    supabase: Arc<SupabaseClient>,
    conflict_service: ConflictDetectionService,
    lifecycle_service: AppointmentLifecycleService,
    window: SchedulingWindow,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        let conflict_service = ConflictDetectionService::new(Arc::clone(&supabase));

        Self {
            conflict_service,
            lifecycle_service: AppointmentLifecycleService::new(),
            supabase,
            window: SchedulingWindow::default(),
        }
    }

    pub fn with_window(config: &AppConfig, window: SchedulingWindow) -> Self {
        let mut service = Self::new(config);
        service.window = window;
        service
    }

    /// Book a new appointment with status `scheduled`.
    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
        created_by: Option<Uuid>,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!("Booking appointment for patient {} with professional {}",
              request.patient_id, request.professional_id);

        self.verify_professional_exists(request.professional_id, auth_token).await?;
        self.verify_patient_exists(request.patient_id, auth_token).await?;

        let candidate = TimeInterval::from_start(request.appointment_date, request.duration);
        let conflicting = self.conflict_service.check_conflict(
            request.professional_id,
            candidate,
            None,
            auth_token,
        ).await?;

        if conflicting {
            warn!("Appointment conflict for professional {} at {}",
                  request.professional_id, request.appointment_date);
            return Err(AppointmentError::ConflictDetected);
        }

        let appointment_data = json!({
            "professional_id": request.professional_id,
            "patient_id": request.patient_id,
            "office_id": request.office_id,
            "appointment_date": request.appointment_date.format("%Y-%m-%dT%H:%M:%S").to_string(),
            "duration": request.duration.minutes(),
            "status": AppointmentStatus::Scheduled,
            "notes": request.notes,
            "amount": request.amount,
            "created_by": created_by,
            "confirmed_at": Value::Null,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/appointments",
            Some(auth_token),
            Some(appointment_data),
            Some(headers),
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let appointment = Self::single_row(result)?;
        info!("Appointment {} booked for professional {}",
              appointment.id, appointment.professional_id);
        Ok(appointment)
    }

    /// Full update. The conflict check only re-runs when the slot actually
    /// moved (start time, duration or professional changed); pure field
    /// edits persist without re-validating scheduling.
    pub async fn update_appointment(
        &self,
        appointment_id: Uuid,
        request: UpdateAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Updating appointment: {}", appointment_id);

        let current = self.get_appointment(appointment_id, auth_token).await?;

        if request.status != current.status {
            self.lifecycle_service.validate_status_transition(&current.status, &request.status)?;
        }

        let moved = request.appointment_date != current.appointment_date
            || request.duration != current.duration
            || request.professional_id != current.professional_id;

        if moved {
            let candidate = TimeInterval::from_start(request.appointment_date, request.duration);
            let conflicting = self.conflict_service.check_conflict(
                request.professional_id,
                candidate,
                Some(appointment_id),
                auth_token,
            ).await?;

            if conflicting {
                return Err(AppointmentError::ConflictDetected);
            }
        }

        let confirmed_at = if request.status == current.status {
            json!(current.confirmed_at.map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string()))
        } else if request.status == AppointmentStatus::Attended {
            json!(Utc::now().naive_utc().format("%Y-%m-%dT%H:%M:%S").to_string())
        } else {
            Value::Null
        };

        let update_data = json!({
            "professional_id": request.professional_id,
            "patient_id": request.patient_id,
            "office_id": request.office_id,
            "appointment_date": request.appointment_date.format("%Y-%m-%dT%H:%M:%S").to_string(),
            "duration": request.duration.minutes(),
            "status": request.status,
            "notes": request.notes,
            "amount": request.amount,
            "confirmed_at": confirmed_at,
            "updated_at": Utc::now().to_rfc3339()
        });

        self.patch_appointment(appointment_id, update_data, auth_token).await
    }

    /// Status-only transition (front desk marking attended/absent).
    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Updating appointment {} status to {}", appointment_id, new_status);

        let current = self.get_appointment(appointment_id, auth_token).await?;
        self.lifecycle_service.validate_status_transition(&current.status, &new_status)?;

        let confirmed_at = if new_status == AppointmentStatus::Attended {
            json!(Utc::now().naive_utc().format("%Y-%m-%dT%H:%M:%S").to_string())
        } else {
            Value::Null
        };

        let update_data = json!({
            "status": new_status,
            "confirmed_at": confirmed_at,
            "updated_at": Utc::now().to_rfc3339()
        });

        self.patch_appointment(appointment_id, update_data, auth_token).await
    }

    /// Cancel a booking. Only `scheduled` appointments can be cancelled;
    /// the confirmation timestamp is cleared.
    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Cancelling appointment: {}", appointment_id);

        let current = self.get_appointment(appointment_id, auth_token).await?;

        if current.status != AppointmentStatus::Scheduled {
            warn!("Attempted to cancel appointment {} in status {}",
                  appointment_id, current.status);
            return Err(AppointmentError::InvalidStatusTransition(current.status));
        }

        let update_data = json!({
            "status": AppointmentStatus::Cancelled,
            "confirmed_at": Value::Null,
            "updated_at": Utc::now().to_rfc3339()
        });

        self.patch_appointment(appointment_id, update_data, auth_token).await
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::NotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
    }

    /// Agenda listing: a date range (defaulting to today through the next
    /// seven days) with optional professional/patient/status filters.
    pub async fn search_appointments(
        &self,
        query: AppointmentSearchQuery,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let start_date = query.start_date.unwrap_or_else(|| Utc::now().date_naive());
        let end_date = query.end_date.unwrap_or(start_date + Duration::days(7));

        let range_start = start_date.and_hms_opt(0, 0, 0).unwrap();
        let range_end = end_date.and_hms_opt(0, 0, 0).unwrap() + Duration::days(1);

        let mut query_parts = vec![
            format!("appointment_date=gte.{}",
                    urlencoding::encode(&range_start.format("%Y-%m-%dT%H:%M:%S").to_string())),
            format!("appointment_date=lt.{}",
                    urlencoding::encode(&range_end.format("%Y-%m-%dT%H:%M:%S").to_string())),
        ];

        if let Some(professional_id) = query.professional_id {
            query_parts.push(format!("professional_id=eq.{}", professional_id));
        }
        if let Some(patient_id) = query.patient_id {
            query_parts.push(format!("patient_id=eq.{}", patient_id));
        }
        if let Some(status) = query.status {
            query_parts.push(format!("status=eq.{}", status));
        }

        let path = format!("/rest/v1/appointments?{}&order=appointment_date.asc",
                          query_parts.join("&"));

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointments: {}", e)))
    }

    /// Free slot starts for a professional on one day. `today` comes from
    /// the caller; past dates and weekends yield an empty list.
    pub async fn available_slots(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        duration: DurationMinutes,
        today: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<NaiveTime>, AppointmentError> {
        debug!("Calculating available slots for professional {} on {}", professional_id, date);

        self.verify_professional_exists(professional_id, auth_token).await?;

        let existing = self.conflict_service.scheduled_intervals_for_day(
            professional_id,
            date,
            None,
            auth_token,
        ).await?;

        Ok(available_slots(date, duration, &existing, today, &self.window))
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    async fn verify_professional_exists(
        &self,
        professional_id: Uuid,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        let path = format!("/rest/v1/professionals?id=eq.{}&select=id", professional_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::ProfessionalNotFound);
        }
        Ok(())
    }

    async fn verify_patient_exists(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        let path = format!("/rest/v1/patients?id=eq.{}&select=id", patient_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::PatientNotFound);
        }
        Ok(())
    }

    async fn patch_appointment(
        &self,
        appointment_id: Uuid,
        update_data: Value,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(update_data),
            Some(headers),
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        Self::single_row(result)
    }

    fn single_row(result: Vec<Value>) -> Result<Appointment, AppointmentError> {
        if result.is_empty() {
            return Err(AppointmentError::DatabaseError(
                "Write did not return the stored appointment".to_string()
            ));
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
    }
}
