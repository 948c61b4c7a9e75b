/// 경매 도메인 에러
/// 1. Validation: 잘못된 입력 (재시도 없음)
/// 2. NotFound: 존재하지 않는 엔티티
/// 3. AuctionClosed: 종료된 경매에 대한 요청
/// 4. Storage: 저장소 장애
// region:    --- Imports
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// endregion: --- Imports

// region:    --- Auction Error
/// 필드 단위 검증 실패 원인
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cause {
    pub field: String,
    pub message: String,
}

impl Cause {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuctionError {
    #[error("{message}")]
    Validation { message: String, causes: Vec<Cause> },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AuctionClosed(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl AuctionError {
    pub fn validation(message: impl Into<String>) -> Self {
        AuctionError::Validation {
            message: message.into(),
            causes: Vec::new(),
        }
    }

    /// 기계가 읽을 수 있는 에러 코드
    pub fn error_code(&self) -> &'static str {
        match self {
            AuctionError::Validation { .. } => "VALIDATION_FAILED",
            AuctionError::NotFound(_) => "NOT_FOUND",
            AuctionError::AuctionClosed(_) => "ALREADY_ENDED",
            AuctionError::Storage(_) => "STORAGE_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuctionError::Validation { .. } => StatusCode::BAD_REQUEST,
            AuctionError::NotFound(_) => StatusCode::NOT_FOUND,
            AuctionError::AuctionClosed(_) => StatusCode::CONFLICT,
            AuctionError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AuctionError {
    fn from(e: sqlx::Error) -> Self {
        AuctionError::Storage(e.to_string())
    }
}

// endregion: --- Auction Error

// region:    --- Rest Error
/// API 경계에서 반환되는 에러 본문
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestError {
    pub message: String,
    pub error: String,
    pub code: u16,
    pub causes: Vec<Cause>,
}

impl From<&AuctionError> for RestError {
    fn from(e: &AuctionError) -> Self {
        // 저장소 내부 메시지는 외부로 노출하지 않는다
        let message = match e {
            AuctionError::Storage(_) => "internal storage error".to_string(),
            other => other.to_string(),
        };
        let causes = match e {
            AuctionError::Validation { causes, .. } => causes.clone(),
            _ => Vec::new(),
        };
        RestError {
            message,
            error: e.error_code().to_string(),
            code: e.status_code().as_u16(),
            causes,
        }
    }
}

impl IntoResponse for AuctionError {
    fn into_response(self) -> Response {
        let body = RestError::from(&self);
        (self.status_code(), Json(body)).into_response()
    }
}

// endregion: --- Rest Error

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_hide_details() {
        let err = AuctionError::Storage("connection reset by peer".to_string());
        let rest = RestError::from(&err);
        assert_eq!(rest.code, 500);
        assert_eq!(rest.error, "STORAGE_ERROR");
        assert!(!rest.message.contains("connection reset"));
    }

    #[test]
    fn validation_causes_are_carried() {
        let err = AuctionError::Validation {
            message: "invalid auction".to_string(),
            causes: vec![Cause::new("category", "too short")],
        };
        let rest = RestError::from(&err);
        assert_eq!(rest.code, 400);
        assert_eq!(rest.error, "VALIDATION_FAILED");
        assert_eq!(rest.causes, vec![Cause::new("category", "too short")]);
    }

    #[test]
    fn closed_auction_maps_to_conflict() {
        let err = AuctionError::AuctionClosed("auction abc is closed".to_string());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), "ALREADY_ENDED");
    }

    #[test]
    fn sqlx_errors_become_storage() {
        let err: AuctionError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, AuctionError::Storage(_)));
    }
}
// endregion: --- Tests
