use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::config::PhotoReference;
use crate::models::{CandidaturaStatus, NewCandidatura};
use crate::server::error::{ApiError, ApiResult};
use crate::server::form::{CandidaturaForm, DadosPayload, PhotoPart};
use crate::server::state::AppState;
use crate::storage::content_type_for;

/// Where a stored photo ended up
struct StoredPhoto {
    foto_url: Option<String>,
    foto_path: Option<String>,
    foto_nome: String,
}

/// `POST /api/candidatura`
pub async fn submit_candidatura(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    tracing::info!("received candidatura");

    let form = CandidaturaForm::from_multipart(&mut multipart, &state.config.upload_dir).await?;
    tracing::debug!(
        nome = ?form.nome,
        idade = ?form.idade,
        pais = ?form.pais,
        provincia = ?form.provincia,
        email = ?form.email,
        whatsapp = ?form.whatsapp,
        "candidatura fields"
    );
    if let Some(photo) = &form.foto {
        tracing::debug!(
            file_name = %photo.file_name,
            content_type = ?photo.content_type,
            size = photo.size,
            temp_path = %photo.path().display(),
            "candidatura photo"
        );
    }

    let valid = form.validate()?;

    let stored = match valid.photo {
        // the buffered file is dropped, and deleted, when `store_photo` returns
        Some(photo) => Some(store_photo(&state, photo).await?),
        None => None,
    };

    let (foto_url, foto_path, foto_nome) = match stored {
        Some(stored) => (stored.foto_url, stored.foto_path, Some(stored.foto_nome)),
        None => (None, None, None),
    };
    let orphan = foto_path.clone().or_else(|| foto_url.clone());

    let candidatura = NewCandidatura {
        name: valid.name,
        age: valid.age,
        country: valid.country,
        province: valid.province,
        email: valid.email,
        whatsapp: valid.whatsapp,
        foto_url,
        foto_path,
        foto_nome,
        termos_aceitos: true,
        status: CandidaturaStatus::Pendente,
        notas: String::new(),
    };

    let rows = match state.data.create_candidatura(&candidatura).await {
        Ok(rows) => rows,
        Err(source) => {
            if let Some(object) = orphan {
                tracing::warn!(bucket = %state.config.photo_bucket, object = %object, "uploaded photo left without a candidatura");
            }
            return Err(ApiError::Persistence {
                context: "failed to save application",
                source,
            });
        }
    };

    tracing::info!(rows = rows.len(), "candidatura saved");
    Ok(Json(json!({
        "message": "application submitted",
        "data": rows,
    })))
}

async fn store_photo(state: &AppState, photo: PhotoPart) -> ApiResult<StoredPhoto> {
    let config = &state.config;
    let object_path = format!(
        "{}/{}_{}",
        config.photo_prefix,
        Utc::now().timestamp_millis(),
        photo.file_name
    );
    let content_type = content_type_for(&photo.file_name);
    let bytes = photo.read().await?;

    let stored_path = state
        .files
        .upload_file(&config.photo_bucket, &object_path, bytes, content_type.as_ref())
        .await
        .map_err(ApiError::Upload)?;
    tracing::debug!(bucket = %config.photo_bucket, path = %stored_path, "photo uploaded");

    let (foto_url, foto_path) = match config.photo_reference {
        PhotoReference::PublicUrl => {
            let url = state
                .files
                .public_url(&config.photo_bucket, &stored_path)
                .map_err(ApiError::Upload)?;
            (Some(url), None)
        }
        PhotoReference::StoragePath => (None, Some(stored_path)),
    };

    Ok(StoredPhoto {
        foto_url,
        foto_path,
        foto_nome: photo.file_name.clone(),
    })
}

/// `POST /api/dados`
pub async fn save_dados(
    State(state): State<AppState>,
    payload: Result<Json<DadosPayload>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(payload) = payload.map_err(|e| ApiError::validation(e.body_text()))?;
    let row = payload.into_row()?;
    tracing::debug!(table = %state.config.legacy_table, ?row, "received dados");

    let data = state
        .data
        .insert_row(&state.config.legacy_table, &row)
        .await
        .map_err(|source| ApiError::Persistence {
            context: "failed to save data",
            source,
        })?;

    Ok(Json(json!({
        "message": "data saved",
        "data": data,
    })))
}
