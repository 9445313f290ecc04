//! Multipart and JSON payloads accepted by the intake endpoints.

use std::io::Write;
use std::path::Path;

use axum::extract::multipart::Field;
use axum::extract::Multipart;
use serde::Deserialize;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::server::error::{ApiError, ApiResult};

const REQUIRED_FIELDS_MISSING: &str = "required fields missing";

/// Raw `POST /api/candidatura` fields, as sent
#[derive(Debug, Default)]
pub struct CandidaturaForm {
    pub nome: Option<String>,
    pub idade: Option<String>,
    pub pais: Option<String>,
    pub provincia: Option<String>,
    pub email: Option<String>,
    pub whatsapp: Option<String>,
    pub foto: Option<PhotoPart>,
}

/// A photo buffered to disk; the file is removed when this is dropped
#[derive(Debug)]
pub struct PhotoPart {
    pub file_name: String,
    pub content_type: Option<String>,
    pub size: u64,
    file: NamedTempFile,
}

impl PhotoPart {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(self.file.path()).await
    }
}

/// A form that passed validation
#[derive(Debug)]
pub struct ValidCandidatura {
    pub name: String,
    pub age: i32,
    pub country: Option<String>,
    pub province: Option<String>,
    pub email: String,
    pub whatsapp: String,
    pub photo: Option<PhotoPart>,
}

impl CandidaturaForm {
    /// Read every part, buffering `foto` into `upload_dir`
    pub async fn from_multipart(multipart: &mut Multipart, upload_dir: &Path) -> ApiResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "foto" => form.foto = buffer_photo(field, upload_dir).await?,
                "nome" => form.nome = text(field).await?,
                "idade" => form.idade = text(field).await?,
                "pais" => form.pais = text(field).await?,
                "provincia" => form.provincia = text(field).await?,
                "email" => form.email = text(field).await?,
                "whatsapp" => form.whatsapp = text(field).await?,
                other => tracing::debug!(field = other, "ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    pub fn validate(self) -> ApiResult<ValidCandidatura> {
        let (Some(name), Some(idade), Some(email), Some(whatsapp)) =
            (self.nome, self.idade, self.email, self.whatsapp)
        else {
            return Err(ApiError::validation(REQUIRED_FIELDS_MISSING));
        };

        let age = idade
            .parse::<i32>()
            .map_err(|_| ApiError::validation("idade must be an integer"))?;

        Ok(ValidCandidatura {
            name,
            age,
            country: self.pais,
            province: self.provincia,
            email,
            whatsapp,
            photo: self.foto,
        })
    }
}

/// Trimmed text value; blank counts as absent
async fn text(field: Field<'_>) -> ApiResult<Option<String>> {
    let value = field.text().await?;
    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

async fn buffer_photo(mut field: Field<'_>, upload_dir: &Path) -> ApiResult<Option<PhotoPart>> {
    // browsers send an empty, unnamed part when no file was chosen
    let file_name = field.file_name().map(base_name).unwrap_or_default();
    let content_type = field.content_type().map(str::to_string);

    let mut file = tempfile::Builder::new()
        .prefix("upload-")
        .tempfile_in(upload_dir)?;
    let mut size = 0u64;

    while let Some(chunk) = field.chunk().await? {
        file.write_all(&chunk)?;
        size += chunk.len() as u64;
    }
    file.flush()?;

    if file_name.is_empty() || size == 0 {
        return Ok(None);
    }

    Ok(Some(PhotoPart {
        file_name,
        content_type,
        size,
        file,
    }))
}

/// Last path component of a client-supplied file name
fn base_name(name: &str) -> String {
    name.rsplit(['/', '\\']).next().unwrap_or(name).trim().to_string()
}

/// Body of the legacy `POST /api/dados` endpoint: either a contact
/// (`nome`, `email`) or a profile (`nome`, `idade`, `pais`, `provincia`)
#[derive(Debug, Default, Deserialize)]
pub struct DadosPayload {
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub idade: Option<Value>,
    #[serde(default)]
    pub pais: Option<String>,
    #[serde(default)]
    pub provincia: Option<String>,
}

impl DadosPayload {
    /// The row to insert, or a validation error
    pub fn into_row(self) -> ApiResult<Value> {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        let idade_present = match &self.idade {
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Number(_)) => true,
            _ => false,
        };

        if !present(&self.nome) {
            return Err(ApiError::validation(REQUIRED_FIELDS_MISSING));
        }

        let mut row = Map::new();
        row.insert("nome".into(), self.nome.into());

        if present(&self.email) {
            row.insert("email".into(), self.email.into());
        } else if idade_present && present(&self.pais) && present(&self.provincia) {
            let idade = match self.idade {
                Some(Value::String(s)) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::from)
                    .map_err(|_| ApiError::validation("idade must be an integer"))?,
                Some(other) => other,
                None => Value::Null,
            };
            row.insert("idade".into(), idade);
            row.insert("pais".into(), self.pais.into());
            row.insert("provincia".into(), self.provincia.into());
        } else {
            return Err(ApiError::validation(REQUIRED_FIELDS_MISSING));
        }

        Ok(Value::Object(row))
    }
}
