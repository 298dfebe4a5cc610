//! The uniform response envelope shared by every endpoint.
//!
//! ```json
//! {"status": "success", "code": 201, "data": {...}}
//! {"status": "fail", "code": 400, "error": {"message": "...", "details": {...}}}
//! ```

use actix_web::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::FieldErrors;

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_FAIL: &str = "fail";

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<FieldErrors>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl<T> ApiResponse<T> {
    pub fn success(code: StatusCode, data: T) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            code: code.as_u16(),
            data: Some(data),
            error: None,
        }
    }

    pub fn fail(code: StatusCode, message: &str, details: Option<FieldErrors>) -> Self {
        Self {
            status: STATUS_FAIL.to_string(),
            code: code.as_u16(),
            data: None,
            error: Some(ErrorBody {
                message: message.to_string(),
                details,
            }),
        }
    }
}
