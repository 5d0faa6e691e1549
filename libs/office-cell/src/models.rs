use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Office {
    pub id: Uuid,
    pub number: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub equipment: Option<Vec<String>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOfficeRequest {
    pub number: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub equipment: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOfficeRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub equipment: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum OfficeError {
    #[error("Office not found")]
    NotFound,

    #[error("Office number {number} already exists")]
    NumberAlreadyExists { number: String },

    #[error("Database error: {0}")]
    DatabaseError(String),
}
