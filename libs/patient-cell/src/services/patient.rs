use anyhow::{Result, anyhow};
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Patient, CreatePatientRequest, UpdatePatientRequest, PatientSearchQuery};

pub struct PatientService {
    supabase: SupabaseClient,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_patient(
        &self,
        request: CreatePatientRequest,
        auth_token: &str,
    ) -> Result<Patient> {
        debug!("Creating new patient record for DNI: {}", request.dni);

        // The document number is the front desk's lookup key, keep it unique
        let existing_check_path = format!("/rest/v1/patients?dni=eq.{}", request.dni);
        let existing: Vec<Value> = self.supabase.request(
            Method::GET,
            &existing_check_path,
            Some(auth_token),
            None,
        ).await?;

        if !existing.is_empty() {
            return Err(anyhow!("Patient with DNI {} already exists", request.dni));
        }

        let patient_data = json!({
            "first_name": request.first_name,
            "last_name": request.last_name,
            "dni": request.dni,
            "birth_date": request.birth_date.format("%Y-%m-%d").to_string(),
            "email": request.email,
            "phone": request.phone,
            "address": request.address,
            "health_insurance": request.health_insurance,
            "health_insurance_number": request.health_insurance_number,
            "medical_notes": request.medical_notes,
            "is_active": true,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/patients",
            Some(auth_token),
            Some(patient_data),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Failed to create patient record"));
        }

        let patient: Patient = serde_json::from_value(result[0].clone())?;
        debug!("Patient record created with ID: {}", patient.id);

        Ok(patient)
    }

    pub async fn get_patient(
        &self,
        patient_id: &str,
        auth_token: &str,
    ) -> Result<Patient> {
        debug!("Fetching patient record: {}", patient_id);

        let path = format!("/rest/v1/patients?id=eq.{}", patient_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Patient not found"));
        }

        let patient: Patient = serde_json::from_value(result[0].clone())?;
        Ok(patient)
    }

    pub async fn update_patient(
        &self,
        patient_id: &str,
        request: UpdatePatientRequest,
        auth_token: &str,
    ) -> Result<Patient> {
        debug!("Updating patient record: {}", patient_id);

        let mut update_data = serde_json::Map::new();

        if let Some(first_name) = request.first_name {
            update_data.insert("first_name".to_string(), json!(first_name));
        }
        if let Some(last_name) = request.last_name {
            update_data.insert("last_name".to_string(), json!(last_name));
        }
        if let Some(birth_date) = request.birth_date {
            update_data.insert("birth_date".to_string(), json!(birth_date.format("%Y-%m-%d").to_string()));
        }
        if let Some(email) = request.email {
            update_data.insert("email".to_string(), json!(email));
        }
        if let Some(phone) = request.phone {
            update_data.insert("phone".to_string(), json!(phone));
        }
        if let Some(address) = request.address {
            update_data.insert("address".to_string(), json!(address));
        }
        if let Some(health_insurance) = request.health_insurance {
            update_data.insert("health_insurance".to_string(), json!(health_insurance));
        }
        if let Some(health_insurance_number) = request.health_insurance_number {
            update_data.insert("health_insurance_number".to_string(), json!(health_insurance_number));
        }
        if let Some(medical_notes) = request.medical_notes {
            update_data.insert("medical_notes".to_string(), json!(medical_notes));
        }
        if let Some(is_active) = request.is_active {
            update_data.insert("is_active".to_string(), json!(is_active));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/patients?id=eq.{}", patient_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(Value::Object(update_data)),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Failed to update patient record"));
        }

        let updated_patient: Patient = serde_json::from_value(result[0].clone())?;
        Ok(updated_patient)
    }

    pub async fn search_patients(
        &self,
        query: PatientSearchQuery,
        auth_token: &str,
    ) -> Result<Vec<Patient>> {
        debug!("Searching patients with query: {:?}", query);

        let mut query_parts = vec![];

        if let Some(name) = query.name {
            let encoded = urlencoding::encode(&name).to_string();
            query_parts.push(format!("or=(first_name.ilike.%{}%,last_name.ilike.%{}%)", encoded, encoded));
        }
        if let Some(dni) = query.dni {
            query_parts.push(format!("dni=eq.{}", dni));
        }
        if let Some(health_insurance) = query.health_insurance {
            query_parts.push(format!("health_insurance=ilike.%{}%", urlencoding::encode(&health_insurance)));
        }
        if query.only_active.unwrap_or(true) {
            query_parts.push("is_active=eq.true".to_string());
        }

        let limit = query.limit.unwrap_or(50);
        let offset = query.offset.unwrap_or(0);
        query_parts.push(format!("limit={}", limit));
        query_parts.push(format!("offset={}", offset));

        let path = format!("/rest/v1/patients?{}&order=last_name.asc,first_name.asc",
            query_parts.join("&"));

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let patients: Vec<Patient> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(patients)
    }
}
