use crate::resolver::{ErrorClass, ResolveError};
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

/// Tone of a kiosk message, drives the colour of the on-screen alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Success,
    Info,
    Warning,
    Error,
}

/// Envelope of every kiosk response.
#[derive(Debug, Serialize, ToSchema)]
#[schema(example = json!({
    "status": "success",
    "message": "Attendance saved",
    "data": {"full_name": "ANA PEREZ", "kind": "Entrada"}
}))]
pub struct Reply {
    pub status: ReplyStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object, nullable = true)]
    pub data: Option<Value>,
}

impl Reply {
    pub fn new(status: ReplyStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            data: None,
        }
    }

    pub fn success(message: impl Into<String>, data: impl Serialize) -> Self {
        Self {
            status: ReplyStatus::Success,
            message: message.into(),
            // plain structs always serialize
            data: serde_json::to_value(data).ok(),
        }
    }
}

impl ResponseError for ResolveError {
    fn status_code(&self) -> StatusCode {
        match self {
            ResolveError::Validation(_) => StatusCode::BAD_REQUEST,
            ResolveError::UnknownCode(_)
            | ResolveError::EmployeeNotFound(_)
            | ResolveError::InvalidSite(_) => StatusCode::NOT_FOUND,
            ResolveError::Inactive(_) => StatusCode::FORBIDDEN,
            // expected outcome, not a failure
            ResolveError::TooSoon { .. } => StatusCode::OK,
            ResolveError::Fault(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = match (self.class(), self) {
            (_, ResolveError::TooSoon { .. }) => ReplyStatus::Info,
            (ErrorClass::Validation | ErrorClass::PolicyRejection, _) => ReplyStatus::Warning,
            (ErrorClass::NotFound | ErrorClass::Fault, _) => ReplyStatus::Error,
        };

        HttpResponse::build(self.status_code()).json(Reply::new(status, self.user_message()))
    }
}
