// hrx/src/error.rs

use actix_web::{HttpResponse, ResponseError};
use derive_more::Display;
use serde::Serialize;

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum HrxError {
    #[display(fmt = "Not Found")]
    NotFound,
    #[display(fmt = "Bad Request: {}", _0)]
    BadRequest(String),
    #[display(fmt = "Authentication required")]
    Unauthorized,
    #[display(fmt = "Access denied")]
    Forbidden,
    #[display(fmt = "Configuration error: {}", _0)]
    Config(String),
    #[display(fmt = "Permission evaluator failed: {}", _0)]
    Evaluator(String),
    #[display(fmt = "Backend error: {}", _0)]
    Backend(String),
    #[display(fmt = "Internal Server Error")]
    InternalError,
}

impl std::error::Error for HrxError {}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl ResponseError for HrxError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            HrxError::NotFound => StatusCode::NOT_FOUND,
            HrxError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HrxError::Unauthorized => StatusCode::UNAUTHORIZED,
            HrxError::Forbidden => StatusCode::FORBIDDEN,
            HrxError::Backend(_) => StatusCode::BAD_GATEWAY,
            HrxError::Config(_) | HrxError::Evaluator(_) | HrxError::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}
