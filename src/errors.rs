// src/errors.rs
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;
use uuid::Uuid;

pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred.";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RestyleError {
    #[error("{0}")]
    Precondition(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid preset: {0}")]
    InvalidPreset(String),

    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),
}

impl RestyleError {
    /// Message shown to the user in the view state. Carries the failure's own
    /// text verbatim, without the variant prefix used by `Display`.
    pub fn user_message(&self) -> String {
        let message = match self {
            RestyleError::Precondition(m)
            | RestyleError::ImageProcessing(m)
            | RestyleError::Generation(m)
            | RestyleError::Validation(m)
            | RestyleError::InvalidPreset(m) => m.trim().to_string(),
            RestyleError::SessionNotFound(_) => self.to_string(),
        };

        if message.is_empty() {
            UNKNOWN_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }
}

impl ResponseError for RestyleError {
    fn error_response(&self) -> HttpResponse {
        match self {
            RestyleError::Precondition(_) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Precondition failed",
                "message": self.user_message()
            })),
            RestyleError::ImageProcessing(_) => {
                HttpResponse::UnprocessableEntity().json(serde_json::json!({
                    "error": "Image processing error",
                    "message": self.user_message()
                }))
            }
            RestyleError::Generation(_) => HttpResponse::BadGateway().json(serde_json::json!({
                "error": "Generation error",
                "message": self.user_message()
            })),
            RestyleError::Validation(_) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Validation error",
                "message": self.user_message()
            })),
            RestyleError::InvalidPreset(_) => HttpResponse::NotFound().json(serde_json::json!({
                "error": "Invalid preset",
                "message": self.to_string()
            })),
            RestyleError::SessionNotFound(_) => {
                HttpResponse::NotFound().json(serde_json::json!({
                    "error": "Session not found",
                    "message": self.to_string()
                }))
            }
        }
    }
}
