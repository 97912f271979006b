use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum MedifindError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Serialization(String),
    Validation(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    InvalidTransition(String),
    InsufficientStock(String),
    PasswordHash(String),
    TokenGeneration(String),
}

impl MedifindError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            MedifindError::DatabaseConfig(_) => "E001",
            MedifindError::DatabaseConnection(_) => "E002",
            MedifindError::DatabaseOperation(_) => "E003",
            MedifindError::FileOperation(_) => "E004",
            MedifindError::Serialization(_) => "E005",
            MedifindError::Validation(_) => "E006",
            MedifindError::Unauthorized(_) => "E007",
            MedifindError::Forbidden(_) => "E008",
            MedifindError::NotFound(_) => "E009",
            MedifindError::Conflict(_) => "E010",
            MedifindError::InvalidTransition(_) => "E011",
            MedifindError::InsufficientStock(_) => "E012",
            MedifindError::PasswordHash(_) => "E013",
            MedifindError::TokenGeneration(_) => "E014",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            MedifindError::DatabaseConfig(_) => "Database Configuration Error",
            MedifindError::DatabaseConnection(_) => "Database Connection Error",
            MedifindError::DatabaseOperation(_) => "Database Operation Error",
            MedifindError::FileOperation(_) => "File Operation Error",
            MedifindError::Serialization(_) => "Serialization Error",
            MedifindError::Validation(_) => "Validation Error",
            MedifindError::Unauthorized(_) => "Unauthorized",
            MedifindError::Forbidden(_) => "Forbidden",
            MedifindError::NotFound(_) => "Resource Not Found",
            MedifindError::Conflict(_) => "Conflict",
            MedifindError::InvalidTransition(_) => "Invalid Status Transition",
            MedifindError::InsufficientStock(_) => "Insufficient Stock",
            MedifindError::PasswordHash(_) => "Password Hash Error",
            MedifindError::TokenGeneration(_) => "Token Generation Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            MedifindError::DatabaseConfig(msg)
            | MedifindError::DatabaseConnection(msg)
            | MedifindError::DatabaseOperation(msg)
            | MedifindError::FileOperation(msg)
            | MedifindError::Serialization(msg)
            | MedifindError::Validation(msg)
            | MedifindError::Unauthorized(msg)
            | MedifindError::Forbidden(msg)
            | MedifindError::NotFound(msg)
            | MedifindError::Conflict(msg)
            | MedifindError::InvalidTransition(msg)
            | MedifindError::InsufficientStock(msg)
            | MedifindError::PasswordHash(msg)
            | MedifindError::TokenGeneration(msg) => msg,
        }
    }

    /// HTTP 状态码映射
    pub fn http_status(&self) -> StatusCode {
        match self {
            MedifindError::Validation(_) => StatusCode::BAD_REQUEST,
            MedifindError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            MedifindError::Forbidden(_) => StatusCode::FORBIDDEN,
            MedifindError::NotFound(_) => StatusCode::NOT_FOUND,
            MedifindError::Conflict(_)
            | MedifindError::InvalidTransition(_)
            | MedifindError::InsufficientStock(_) => StatusCode::CONFLICT,
            MedifindError::DatabaseConfig(_)
            | MedifindError::DatabaseConnection(_)
            | MedifindError::DatabaseOperation(_)
            | MedifindError::FileOperation(_)
            | MedifindError::Serialization(_)
            | MedifindError::PasswordHash(_)
            | MedifindError::TokenGeneration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 是否为服务端错误（需要 error 级别日志）
    pub fn is_server_error(&self) -> bool {
        self.http_status().is_server_error()
    }

    /// 格式化为彩色输出（用于 CLI 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for MedifindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for MedifindError {}

// 便捷的构造函数
impl MedifindError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        MedifindError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        MedifindError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        MedifindError::DatabaseOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        MedifindError::Validation(msg.into())
    }

    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        MedifindError::Unauthorized(msg.into())
    }

    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        MedifindError::Forbidden(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        MedifindError::NotFound(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        MedifindError::Conflict(msg.into())
    }

    pub fn invalid_transition<T: Into<String>>(msg: T) -> Self {
        MedifindError::InvalidTransition(msg.into())
    }

    pub fn insufficient_stock<T: Into<String>>(msg: T) -> Self {
        MedifindError::InsufficientStock(msg.into())
    }

    pub fn password_hash<T: Into<String>>(msg: T) -> Self {
        MedifindError::PasswordHash(msg.into())
    }
}

impl From<sea_orm::DbErr> for MedifindError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(msg)) => {
                MedifindError::Conflict(format!("Duplicate record: {}", msg))
            }
            Some(sea_orm::SqlErr::ForeignKeyConstraintViolation(msg)) => {
                MedifindError::Conflict(format!("Record is still referenced: {}", msg))
            }
            _ => MedifindError::DatabaseOperation(err.to_string()),
        }
    }
}

impl From<std::io::Error> for MedifindError {
    fn from(err: std::io::Error) -> Self {
        MedifindError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for MedifindError {
    fn from(err: serde_json::Error) -> Self {
        MedifindError::Serialization(err.to_string())
    }
}

impl From<crate::utils::password::PasswordError> for MedifindError {
    fn from(err: crate::utils::password::PasswordError) -> Self {
        MedifindError::PasswordHash(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for MedifindError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        MedifindError::TokenGeneration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MedifindError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(
            MedifindError::validation("x").http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            MedifindError::unauthorized("x").http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            MedifindError::forbidden("x").http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            MedifindError::not_found("x").http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            MedifindError::invalid_transition("x").http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            MedifindError::insufficient_stock("x").http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            MedifindError::database_operation("x").http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_display_uses_simple_format() {
        let err = MedifindError::not_found("Medicine abc not found");
        assert_eq!(
            err.to_string(),
            "Resource Not Found: Medicine abc not found"
        );
        assert_eq!(err.message(), "Medicine abc not found");
    }

    #[test]
    fn test_server_error_flag() {
        assert!(MedifindError::database_connection("down").is_server_error());
        assert!(!MedifindError::conflict("dup").is_server_error());
    }

    #[test]
    fn test_db_err_maps_to_database_operation() {
        let err: MedifindError = sea_orm::DbErr::Custom("boom".to_string()).into();
        assert!(matches!(err, MedifindError::DatabaseOperation(_)));
    }
}
