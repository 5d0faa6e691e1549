use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    CreateSpecialtyRequest, ProfessionalError, Specialty, UpdateSpecialtyRequest,
};

pub struct SpecialtyService {
    supabase: SupabaseClient,
}

impl SpecialtyService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_specialty(
        &self,
        request: CreateSpecialtyRequest,
        auth_token: &str,
    ) -> Result<Specialty, ProfessionalError> {
        debug!("Creating specialty: {}", request.name);

        let name_check_path = format!("/rest/v1/specialties?name=eq.{}",
                                      urlencoding::encode(&request.name));
        let existing: Vec<Value> = self.fetch(&name_check_path, auth_token).await?;
        if !existing.is_empty() {
            return Err(ProfessionalError::SpecialtyNameTaken { name: request.name });
        }

        let specialty_data = json!({
            "name": request.name,
            "description": request.description,
            "is_active": true,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/specialties",
            Some(auth_token),
            Some(specialty_data),
            Some(headers),
        ).await.map_err(|e| ProfessionalError::DatabaseError(e.to_string()))?;

        Self::single_row(result)
    }

    pub async fn list_specialties(
        &self,
        auth_token: &str,
    ) -> Result<Vec<Specialty>, ProfessionalError> {
        let path = "/rest/v1/specialties?order=name.asc";
        let result: Vec<Value> = self.fetch(path, auth_token).await?;

        result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Specialty>, _>>()
            .map_err(|e| ProfessionalError::DatabaseError(format!("Failed to parse specialties: {}", e)))
    }

    pub async fn update_specialty(
        &self,
        specialty_id: &str,
        request: UpdateSpecialtyRequest,
        auth_token: &str,
    ) -> Result<Specialty, ProfessionalError> {
        debug!("Updating specialty: {}", specialty_id);

        let mut update_data = serde_json::Map::new();

        if let Some(name) = request.name {
            update_data.insert("name".to_string(), json!(name));
        }
        if let Some(description) = request.description {
            update_data.insert("description".to_string(), json!(description));
        }
        if let Some(is_active) = request.is_active {
            update_data.insert("is_active".to_string(), json!(is_active));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/specialties?id=eq.{}", specialty_id);
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

    /// Deleting is refused while any professional still references the
    /// specialty.
    pub async fn delete_specialty(
        &self,
        specialty_id: &str,
        auth_token: &str,
    ) -> Result<(), ProfessionalError> {
        debug!("Deleting specialty: {}", specialty_id);

        let usage_path = format!("/rest/v1/professionals?specialty_id=eq.{}&select=id&limit=1", specialty_id);
        let in_use: Vec<Value> = self.fetch(&usage_path, auth_token).await?;

        if !in_use.is_empty() {
            warn!("Refusing to delete specialty {} still in use", specialty_id);
            return Err(ProfessionalError::SpecialtyInUse);
        }

        let path = format!("/rest/v1/specialties?id=eq.{}", specialty_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let deleted: Vec<Value> = self.supabase.request_with_headers(
            Method::DELETE,
            &path,
            Some(auth_token),
            None,
            Some(headers),
        ).await.map_err(|e| ProfessionalError::DatabaseError(e.to_string()))?;

        if deleted.is_empty() {
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

    fn single_row(result: Vec<Value>) -> Result<Specialty, ProfessionalError> {
        if result.is_empty() {
            return Err(ProfessionalError::DatabaseError(
                "Write did not return the stored specialty".to_string()
            ));
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| ProfessionalError::DatabaseError(format!("Failed to parse specialty: {}", e)))
    }
}
