// libs/appointment-cell/src/services/conflict.rs
use chrono::{Duration, NaiveDate};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use std::sync::Arc;
use shared_database::supabase::SupabaseClient;

use crate::models::{Appointment, AppointmentError, AppointmentStatus};
use crate::services::scheduling::{has_conflict, TimeInterval};

/// Fetch layer for the conflict detector: pulls a professional's
/// `scheduled` appointments for one day and runs the overlap check over
/// them.
pub struct ConflictDetectionService {
    supabase: Arc<SupabaseClient>,
}

impl ConflictDetectionService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// The professional's blocking intervals on `date`, optionally leaving
    /// out the record being edited.
    pub async fn scheduled_intervals_for_day(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        exclude_appointment_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<Vec<TimeInterval>, AppointmentError> {
        let day_start = date.and_hms_opt(0, 0, 0).unwrap();
        let day_end = day_start + Duration::days(1);

        let mut query_parts = vec![
            format!("professional_id=eq.{}", professional_id),
            format!("status=eq.{}", AppointmentStatus::Scheduled),
            format!("appointment_date=gte.{}",
                    urlencoding::encode(&day_start.format("%Y-%m-%dT%H:%M:%S").to_string())),
            format!("appointment_date=lt.{}",
                    urlencoding::encode(&day_end.format("%Y-%m-%dT%H:%M:%S").to_string())),
        ];

        if let Some(exclude_id) = exclude_appointment_id {
            query_parts.push(format!("id=neq.{}", exclude_id));
        }

        let path = format!("/rest/v1/appointments?{}&order=appointment_date.asc",
                          query_parts.join("&"));

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let appointments: Vec<Appointment> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointments: {}", e)))?;

        // The query already filters on status; re-check here so a stale or
        // permissive read can never block a slot with a resolved booking.
        Ok(appointments.iter()
            .filter(|apt| apt.status.blocks_scheduling())
            .map(|apt| TimeInterval::from_start(apt.appointment_date, apt.duration))
            .collect())
    }

    /// Check whether the candidate interval collides with any of the
    /// professional's scheduled appointments on that day.
    pub async fn check_conflict(
        &self,
        professional_id: Uuid,
        candidate: TimeInterval,
        exclude_appointment_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<bool, AppointmentError> {
        debug!("Checking conflicts for professional {} from {} to {}",
               professional_id, candidate.start(), candidate.end());

        let existing = self.scheduled_intervals_for_day(
            professional_id,
            candidate.start().date(),
            exclude_appointment_id,
            auth_token,
        ).await?;

        let conflicting = has_conflict(&candidate, &existing);

        if conflicting {
            warn!("Conflict detected for professional {} at {}",
                  professional_id, candidate.start());
        }

        Ok(conflicting)
    }
}
