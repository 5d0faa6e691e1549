use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    CreateProfessionalRequest, Professional, ProfessionalError,
    ProfessionalSearchQuery, UpdateProfessionalRequest,
};

pub struct ProfessionalService {
    supabase: SupabaseClient,
}

impl ProfessionalService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_professional(
        &self,
        request: CreateProfessionalRequest,
        auth_token: &str,
    ) -> Result<Professional, ProfessionalError> {
        debug!("Creating professional record for license: {}", request.license_number);

        self.verify_specialty_exists(&request.specialty_id.to_string(), auth_token).await?;

        let email_check_path = format!("/rest/v1/professionals?email=eq.{}",
                                       urlencoding::encode(&request.email));
        let existing: Vec<Value> = self.fetch(&email_check_path, auth_token).await?;
        if !existing.is_empty() {
            return Err(ProfessionalError::EmailAlreadyExists { email: request.email });
        }

        let license_check_path = format!("/rest/v1/professionals?license_number=eq.{}",
                                         urlencoding::encode(&request.license_number));
        let existing: Vec<Value> = self.fetch(&license_check_path, auth_token).await?;
        if !existing.is_empty() {
            return Err(ProfessionalError::LicenseAlreadyExists { license: request.license_number });
        }

        let professional_data = json!({
            "first_name": request.first_name,
            "last_name": request.last_name,
            "email": request.email,
            "phone": request.phone,
            "license_number": request.license_number,
            "specialty_id": request.specialty_id,
            "commission_percentage": request.commission_percentage.unwrap_or(0.0),
            "is_active": true,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/professionals",
            Some(auth_token),
            Some(professional_data),
            Some(headers),
        ).await.map_err(|e| ProfessionalError::DatabaseError(e.to_string()))?;

        Self::single_row(result)
    }

    pub async fn get_professional(
        &self,
        professional_id: &str,
        auth_token: &str,
    ) -> Result<Professional, ProfessionalError> {
        debug!("Fetching professional record: {}", professional_id);

        let path = format!("/rest/v1/professionals?id=eq.{}", professional_id);
        let result: Vec<Value> = self.fetch(&path, auth_token).await?;

        if result.is_empty() {
            return Err(ProfessionalError::NotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| ProfessionalError::DatabaseError(format!("Failed to parse professional: {}", e)))
    }

    pub async fn update_professional(
        &self,
        professional_id: &str,
        request: UpdateProfessionalRequest,
        auth_token: &str,
    ) -> Result<Professional, ProfessionalError> {
        debug!("Updating professional record: {}", professional_id);

        if let Some(specialty_id) = &request.specialty_id {
            self.verify_specialty_exists(&specialty_id.to_string(), auth_token).await?;
        }

        let mut update_data = serde_json::Map::new();

        if let Some(first_name) = request.first_name {
            update_data.insert("first_name".to_string(), json!(first_name));
        }
        if let Some(last_name) = request.last_name {
            update_data.insert("last_name".to_string(), json!(last_name));
        }
        if let Some(email) = request.email {
            update_data.insert("email".to_string(), json!(email));
        }
        if let Some(phone) = request.phone {
            update_data.insert("phone".to_string(), json!(phone));
        }
        if let Some(license_number) = request.license_number {
            update_data.insert("license_number".to_string(), json!(license_number));
        }
        if let Some(specialty_id) = request.specialty_id {
            update_data.insert("specialty_id".to_string(), json!(specialty_id));
        }
        if let Some(commission_percentage) = request.commission_percentage {
            update_data.insert("commission_percentage".to_string(), json!(commission_percentage));
        }
        if let Some(is_active) = request.is_active {
            update_data.insert("is_active".to_string(), json!(is_active));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/professionals?id=eq.{}", professional_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(Value::Object(update_data)),
            Some(headers),
        ).await.map_err(|e| ProfessionalError::DatabaseError(e.to_string()))?;

        Self::single_row(result)
    }

    /// Front-desk listing, ordered by last name like the agenda screens.
    pub async fn list_professionals(
        &self,
        query: ProfessionalSearchQuery,
        auth_token: &str,
    ) -> Result<Vec<Professional>, ProfessionalError> {
        let mut query_parts = vec![];

        if let Some(specialty_id) = query.specialty_id {
            query_parts.push(format!("specialty_id=eq.{}", specialty_id));
        }
        if query.only_active.unwrap_or(true) {
            query_parts.push("is_active=eq.true".to_string());
        }

        let filters = if query_parts.is_empty() {
            String::new()
        } else {
            format!("{}&", query_parts.join("&"))
        };

        let path = format!("/rest/v1/professionals?{}order=last_name.asc,first_name.asc", filters);
        let result: Vec<Value> = self.fetch(&path, auth_token).await?;

        result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Professional>, _>>()
            .map_err(|e| ProfessionalError::DatabaseError(format!("Failed to parse professionals: {}", e)))
    }

    async fn verify_specialty_exists(
        &self,
        specialty_id: &str,
        auth_token: &str,
    ) -> Result<(), ProfessionalError> {
        let path = format!("/rest/v1/specialties?id=eq.{}&select=id", specialty_id);
        let result: Vec<Value> = self.fetch(&path, auth_token).await?;

        if result.is_empty() {
            return Err(ProfessionalError::SpecialtyNotFound);
        }
        Ok(())
    }

    async fn fetch(&self, path: &str, auth_token: &str) -> Result<Vec<Value>, ProfessionalError> {
        self.supabase.request(
            Method::GET,
            path,
            Some(auth_token),
            None,
        ).await.map_err(|e| ProfessionalError::DatabaseError(e.to_string()))
    }

    fn single_row(result: Vec<Value>) -> Result<Professional, ProfessionalError> {
        if result.is_empty() {
            return Err(ProfessionalError::DatabaseError(
                "Write did not return the stored professional".to_string()
            ));
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| ProfessionalError::DatabaseError(format!("Failed to parse professional: {}", e)))
    }
}
