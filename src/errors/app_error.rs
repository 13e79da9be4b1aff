//! 统一错误类型定义

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;

/// 应用错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // 请求验证错误 (400)
    #[error("请求参数无效: {0}")]
    ValidationError(String),

    // 数据库错误 (500)
    #[error("数据库错误")]
    DatabaseError(#[from] sqlx::Error),

    // Redis 错误 (500)
    #[error("缓存服务错误")]
    RedisError(#[from] redis::RedisError),

    // 内部错误 (500)
    #[error("内部服务错误")]
    InternalError(String),

    // 配置错误
    #[error("配置错误")]
    ConfigError(String),
}

/// API 错误响应结构
#[derive(Serialize)]
struct ErrorResponse {
    code: u16,
    message: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::RedisError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // 内部错误不暴露细节
        let message = match self {
            AppError::ValidationError(msg) => msg.clone(),
            AppError::DatabaseError(_) => "服务暂时不可用".to_string(),
            AppError::RedisError(_) => "服务暂时不可用".to_string(),
            AppError::InternalError(_) => "服务内部错误".to_string(),
            AppError::ConfigError(_) => "服务配置错误".to_string(),
        };

        if status.is_server_error() {
            tracing::error!(error = ?self, status = %status, "请求处理错误");
        } else {
            tracing::debug!(error = %self, status = %status, "请求被拒绝");
        }

        HttpResponse::build(status).json(ErrorResponse {
            code: status.as_u16(),
            message,
        })
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::ValidationError("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(config::ConfigError::NotFound("DATABASE_URL".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::InternalError("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
