use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::delivery::{CommandError, Delivery, DeliveryId, ValidationError};
use crate::store::StorageError;

// ============================================================================
// Response Envelope
// ============================================================================

/// Machine-readable failure code returned to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidRequest,
    MissingAddress,
    MissingOrderId,
    InvalidStatus,
    AssignmentFailed,
    DatabaseError,
    DataProcessingError,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize = ()> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_id: Option<DeliveryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            delivery_id: None,
            message: None,
            data: Some(data),
            error_code: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse {
    pub fn started(delivery_id: DeliveryId, message: impl Into<String>) -> Self {
        Self {
            success: true,
            delivery_id: Some(delivery_id),
            message: Some(message.into()),
            data: None,
            error_code: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            delivery_id: None,
            message: Some(message.into()),
            data: None,
            error_code: Some(code),
            timestamp: Utc::now(),
        }
    }
}

/// Delivery as exposed to clients, with its computed total.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryView {
    #[serde(flatten)]
    pub delivery: Delivery,
    pub total_amount: f64,
}

impl From<Delivery> for DeliveryView {
    fn from(delivery: Delivery) -> Self {
        let total_amount = delivery.calculate_total();
        Self { delivery, total_amount }
    }
}

// ============================================================================
// Gateway Errors
// ============================================================================

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorCode::InvalidRequest, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status).json(ApiResponse::error(self.code, self.message.clone()))
    }
}

impl From<CommandError> for ApiError {
    fn from(err: CommandError) -> Self {
        let message = err.to_string();
        match err {
            CommandError::Validation(ValidationError::MissingOrderId) => {
                Self::new(StatusCode::BAD_REQUEST, ErrorCode::MissingOrderId, message)
            }
            CommandError::Validation(ValidationError::MissingAddress) => {
                Self::new(StatusCode::BAD_REQUEST, ErrorCode::MissingAddress, message)
            }
            CommandError::Validation(_) => Self::invalid_request(message),
            CommandError::NotFound(_) => {
                Self::new(StatusCode::NOT_FOUND, ErrorCode::InvalidRequest, message)
            }
            CommandError::Assignment(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::AssignmentFailed,
                message,
            ),
            CommandError::Transition(_) => {
                Self::new(StatusCode::CONFLICT, ErrorCode::InvalidStatus, message)
            }
            CommandError::Storage(StorageError::Serialization(_)) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::DataProcessingError,
                message,
            ),
            CommandError::Storage(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::DatabaseError,
                message,
            ),
        }
    }
}
