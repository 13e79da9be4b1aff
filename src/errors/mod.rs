//! 错误类型

mod app_error;

pub use app_error::AppError;
