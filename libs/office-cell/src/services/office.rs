use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{CreateOfficeRequest, Office, OfficeError, UpdateOfficeRequest};

pub struct OfficeService {
    supabase: SupabaseClient,
}

impl OfficeService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_office(
        &self,
        request: CreateOfficeRequest,
        auth_token: &str,
    ) -> Result<Office, OfficeError> {
        debug!("Creating office: {}", request.number);

        let number_check_path = format!("/rest/v1/offices?number=eq.{}",
                                        urlencoding::encode(&request.number));
        let existing: Vec<Value> = self.fetch(&number_check_path, auth_token).await?;
        if !existing.is_empty() {
            return Err(OfficeError::NumberAlreadyExists { number: request.number });
        }

        let office_data = json!({
            "number": request.number,
            "name": request.name,
            "description": request.description,
            "equipment": request.equipment,
            "is_active": true,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/offices",
            Some(auth_token),
            Some(office_data),
            Some(headers),
        ).await.map_err(|e| OfficeError::DatabaseError(e.to_string()))?;

        Self::single_row(result)
    }

    pub async fn get_office(
        &self,
        office_id: &str,
        auth_token: &str,
    ) -> Result<Office, OfficeError> {
        let path = format!("/rest/v1/offices?id=eq.{}", office_id);
        let result: Vec<Value> = self.fetch(&path, auth_token).await?;

        if result.is_empty() {
            return Err(OfficeError::NotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| OfficeError::DatabaseError(format!("Failed to parse office: {}", e)))
    }

    pub async fn update_office(
        &self,
        office_id: &str,
        request: UpdateOfficeRequest,
        auth_token: &str,
    ) -> Result<Office, OfficeError> {
        debug!("Updating office: {}", office_id);

        let mut update_data = serde_json::Map::new();

        if let Some(name) = request.name {
            update_data.insert("name".to_string(), json!(name));
        }
        if let Some(description) = request.description {
            update_data.insert("description".to_string(), json!(description));
        }
        if let Some(equipment) = request.equipment {
            update_data.insert("equipment".to_string(), json!(equipment));
        }
        if let Some(is_active) = request.is_active {
            update_data.insert("is_active".to_string(), json!(is_active));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/offices?id=eq.{}", office_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(Value::Object(update_data)),
            Some(headers),
        ).await.map_err(|e| OfficeError::DatabaseError(e.to_string()))?;

        Self::single_row(result)
    }

    pub async fn list_offices(
        &self,
        only_active: bool,
        auth_token: &str,
    ) -> Result<Vec<Office>, OfficeError> {
        let filter = if only_active { "is_active=eq.true&" } else { "" };
        let path = format!("/rest/v1/offices?{}order=number.asc", filter);
        let result: Vec<Value> = self.fetch(&path, auth_token).await?;

        result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Office>, _>>()
            .map_err(|e| OfficeError::DatabaseError(format!("Failed to parse offices: {}", e)))
    }

    async fn fetch(&self, path: &str, auth_token: &str) -> Result<Vec<Value>, OfficeError> {
        self.supabase.request(
            Method::GET,
            path,
            Some(auth_token),
            None,
        ).await.map_err(|e| OfficeError::DatabaseError(e.to_string()))
    }

    fn single_row(result: Vec<Value>) -> Result<Office, OfficeError> {
        if result.is_empty() {
            return Err(OfficeError::DatabaseError(
                "Write did not return the stored office".to_string()
            ));
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| OfficeError::DatabaseError(format!("Failed to parse office: {}", e)))
    }
}
