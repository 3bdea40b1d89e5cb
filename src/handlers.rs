// src/handlers.rs
use crate::session::{IngestOutcome, SubmitOutcome};
use crate::{AppState, errors::RestyleError, models::SourceImage, style};
use actix_multipart::Multipart;
use actix_web::{Error, HttpResponse, web};
use futures_util::TryStreamExt;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct FieldUpdate {
    pub field: String,
    pub value: String,
}

pub async fn list_presets() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "presets": style::builtin_presets()
    }))
}

pub async fn style_domains() -> HttpResponse {
    HttpResponse::Ok().json(style::domains())
}

pub async fn create_session(data: web::Data<AppState>) -> HttpResponse {
    let session = data.sessions.create();
    HttpResponse::Created().json(session.snapshot())
}

pub async fn list_sessions(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "sessions": data.sessions.list()
    }))
}

pub async fn get_session(
    path: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, RestyleError> {
    let session = data.sessions.get(&path.into_inner())?;
    Ok(HttpResponse::Ok().json(session.snapshot()))
}

pub async fn delete_session(
    path: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, RestyleError> {
    data.sessions.remove(&path.into_inner())?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn upload_image(
    path: web::Path<Uuid>,
    mut payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let session = data.sessions.get(&path.into_inner())?;
    let mut upload: Option<SourceImage> = None;

    while let Some(mut field) = payload.try_next().await? {
        let content_disposition = field.content_disposition();
        let Some(filename) = content_disposition.get_filename().map(|f| f.to_string()) else {
            // plain form fields are not part of the upload
            continue;
        };

        if upload.is_some() {
            return Err(RestyleError::Validation(
                "Only one image can be uploaded at a time".to_string(),
            )
            .into());
        }

        let content_type = field
            .content_type()
            .map(|ct| ct.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let mut image_data = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            if image_data.len() + chunk.len() > data.max_upload_bytes {
                return Err(RestyleError::Validation(format!(
                    "Image exceeds the {} byte upload limit",
                    data.max_upload_bytes
                ))
                .into());
            }
            image_data.extend_from_slice(&chunk);
        }

        upload = Some(SourceImage::new(filename, content_type, image_data));
    }

    let file = upload
        .ok_or_else(|| RestyleError::Validation("No image file provided".to_string()))?;

    let outcome = session.ingest(file).await;
    let snapshot = session.snapshot();
    Ok(match outcome {
        IngestOutcome::Ready => HttpResponse::Ok().json(snapshot),
        IngestOutcome::Failed(message) => {
            log::debug!("Upload to session {} rejected: {}", snapshot.session_id, message);
            HttpResponse::UnprocessableEntity().json(snapshot)
        }
        IngestOutcome::Superseded => HttpResponse::Conflict().json(snapshot),
    })
}

pub async fn get_style(
    path: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, RestyleError> {
    let session = data.sessions.get(&path.into_inner())?;
    Ok(HttpResponse::Ok().json(session.style()))
}

pub async fn update_style_field(
    path: web::Path<Uuid>,
    data: web::Data<AppState>,
    body: web::Json<FieldUpdate>,
) -> Result<HttpResponse, RestyleError> {
    let session = data.sessions.get(&path.into_inner())?;
    session.set_field(&body.field, &body.value)?;
    Ok(HttpResponse::Ok().json(session.snapshot()))
}

pub async fn apply_preset(
    path: web::Path<(Uuid, String)>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, RestyleError> {
    let (session_id, name) = path.into_inner();
    let session = data.sessions.get(&session_id)?;
    session.apply_preset(&name)?;
    Ok(HttpResponse::Ok().json(session.snapshot()))
}

pub async fn restyle(
    path: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, RestyleError> {
    let session = data.sessions.get(&path.into_inner())?;

    let outcome = session.submit().await;
    let snapshot = session.snapshot();
    Ok(match outcome {
        SubmitOutcome::Completed => HttpResponse::Ok().json(snapshot),
        SubmitOutcome::Rejected(message) => {
            log::debug!("Restyle for session {} rejected: {}", snapshot.session_id, message);
            HttpResponse::BadRequest().json(snapshot)
        }
        SubmitOutcome::Failed(message) => {
            log::debug!("Restyle for session {} failed: {}", snapshot.session_id, message);
            HttpResponse::BadGateway().json(snapshot)
        }
        SubmitOutcome::Ignored | SubmitOutcome::Superseded => {
            HttpResponse::Conflict().json(snapshot)
        }
    })
}

pub async fn restyled_image(
    path: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, RestyleError> {
    let session = data.sessions.get(&path.into_inner())?;

    Ok(match session.view().restyled_image {
        Some(image) => HttpResponse::Ok()
            .content_type(image.mime_type.as_str())
            .body(image.data),
        None => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Not found",
            "message": "No restyled image is available"
        })),
    })
}
