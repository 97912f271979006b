//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};
use ts_rs::TS;

use crate::errors::MedifindError;

use super::types::TS_EXPORT_PATH;

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字，ts-rs 自动生成 TypeScript 类型。
/// 按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 2000-2099: 认证错误
/// - 3000-3099: 药品目录 / 药房错误
/// - 4000-4099: 库存错误
/// - 5000-5099: 预约错误
/// - 6000-6099: 通知 / 统计错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[ts(rename = "ErrorCode")]
#[ts(repr(enum))]
#[repr(i32)]
pub enum ErrorCode {
    // 成功
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,
    Conflict = 1009,
    ServiceUnavailable = 1030,

    // 认证错误 2000-2099
    AuthFailed = 2000,
    TokenExpired = 2001,
    TokenInvalid = 2002,
    RateLimitExceeded = 2004,
    PasswordHashError = 2005,

    // 药品目录 / 药房 3000-3099
    DuplicateRecord = 3000,

    // 库存 4000-4099
    InsufficientStock = 4000,

    // 预约 5000-5099
    InvalidTransition = 5000,

    // 通知 / 统计 6000-6099
    AnalyticsQueryFailed = 6000,
}

impl From<&MedifindError> for ErrorCode {
    fn from(err: &MedifindError) -> Self {
        match err {
            MedifindError::Validation(_) => ErrorCode::BadRequest,
            MedifindError::Unauthorized(_) => ErrorCode::Unauthorized,
            MedifindError::Forbidden(_) => ErrorCode::Forbidden,
            MedifindError::NotFound(_) => ErrorCode::NotFound,
            MedifindError::Conflict(msg) if msg.starts_with("Duplicate") => {
                ErrorCode::DuplicateRecord
            }
            MedifindError::Conflict(_) => ErrorCode::Conflict,
            MedifindError::InvalidTransition(_) => ErrorCode::InvalidTransition,
            MedifindError::InsufficientStock(_) => ErrorCode::InsufficientStock,
            MedifindError::PasswordHash(_) => ErrorCode::PasswordHashError,
            MedifindError::TokenGeneration(_) => ErrorCode::TokenInvalid,
            MedifindError::DatabaseConfig(_)
            | MedifindError::DatabaseConnection(_)
            | MedifindError::DatabaseOperation(_)
            | MedifindError::FileOperation(_)
            | MedifindError::Serialization(_) => ErrorCode::InternalServerError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&ErrorCode::InsufficientStock).unwrap();
        assert_eq!(json, "4000");
        let back: ErrorCode = serde_json::from_str("5000").unwrap();
        assert_eq!(back, ErrorCode::InvalidTransition);
    }

    #[test]
    fn test_from_error() {
        assert_eq!(
            ErrorCode::from(&MedifindError::not_found("x")),
            ErrorCode::NotFound
        );
        assert_eq!(
            ErrorCode::from(&MedifindError::conflict("Duplicate record: users.email")),
            ErrorCode::DuplicateRecord
        );
        assert_eq!(
            ErrorCode::from(&MedifindError::forbidden("Requires role ADMIN")),
            ErrorCode::Forbidden
        );
        assert_eq!(
            ErrorCode::from(&MedifindError::database_operation("x")),
            ErrorCode::InternalServerError
        );
    }
}
