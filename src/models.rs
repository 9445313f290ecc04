//! Row types for the tables this crate reads and writes.
//!
//! Field names are English; the `serde` renames carry the column names the
//! database actually uses.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Columns not modelled explicitly (profile text, dates, prices, ...)
pub type ExtraColumns = Map<String, Value>;

/// Review state of a candidatura
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidaturaStatus {
    Pendente,
    Aprovada,
    Rejeitada,
    #[serde(other)]
    Outra,
}

/// A candidatura ready to be inserted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCandidatura {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "idade")]
    pub age: i32,
    #[serde(rename = "pais")]
    pub country: Option<String>,
    #[serde(rename = "provincia")]
    pub province: Option<String>,
    pub email: String,
    pub whatsapp: String,
    /// Always sent, `null` without a photo
    pub foto_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foto_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foto_nome: Option<String>,
    pub termos_aceitos: bool,
    pub status: CandidaturaStatus,
    pub notas: String,
}

/// A stored candidatura
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidatura {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "idade")]
    pub age: i32,
    #[serde(rename = "pais", default)]
    pub country: Option<String>,
    #[serde(rename = "provincia", default)]
    pub province: Option<String>,
    pub email: String,
    pub whatsapp: String,
    #[serde(default)]
    pub foto_url: Option<String>,
    #[serde(default)]
    pub foto_path: Option<String>,
    #[serde(default)]
    pub foto_nome: Option<String>,
    #[serde(default)]
    pub termos_aceitos: bool,
    pub status: CandidaturaStatus,
    #[serde(default)]
    pub notas: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraColumns,
}

/// Fields a reviewer may change on a candidatura
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CandidaturaUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CandidaturaStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notas: Option<String>,
}

/// Name and email embedded from `users`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// A model profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub user: Option<UserSummary>,
    /// Only present on the detail query
    #[serde(default)]
    pub model_services: Vec<ModelService>,
    #[serde(flatten)]
    pub extra: ExtraColumns,
}

/// Link row between a model and a service it offers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelService {
    #[serde(default)]
    pub service: Option<Service>,
    #[serde(flatten)]
    pub extra: ExtraColumns,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(flatten)]
    pub extra: ExtraColumns,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    #[serde(other)]
    Other,
}

/// What a client asks for; the manager adds the client id and status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub model_id: String,
    pub service_id: String,
    /// Date, time, notes and whatever else the booking form carries
    #[serde(flatten)]
    pub details: ExtraColumns,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBooking {
    pub client_id: String,
    pub model_id: String,
    pub service_id: String,
    pub status: BookingStatus,
    #[serde(flatten)]
    pub details: ExtraColumns,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub client_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub model_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub service_id: String,
    pub status: BookingStatus,
    #[serde(default)]
    pub model: Option<Value>,
    #[serde(default)]
    pub service: Option<Service>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraColumns,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMessage {
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub booking_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub booking_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// What a client submits about a finished booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub model_id: String,
    pub booking_id: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewReview {
    pub client_id: String,
    pub model_id: String,
    pub booking_id: String,
    pub rating: u8,
    pub comment: Option<String>,
    pub is_anonymous: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub client_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub model_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub booking_id: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub client: Option<UserSummary>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Ids are uuids on some tables and bigints on others
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}
