//! 数据验证工具

use crate::errors::AppError;

/// 设备 ID 最大长度
pub const DEVICE_ID_MAX_LEN: usize = 64;

/// 验证设备 ID
///
/// 允许字母、数字以及 `-`、`_`、`.`、`:`，长度 1-64。
pub fn validate_device_id(device_id: &str) -> Result<(), AppError> {
    validate_string_length(device_id, "设备 ID", 1, DEVICE_ID_MAX_LEN)?;

    let valid = device_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'));
    if !valid {
        return Err(AppError::ValidationError(
            "设备 ID 只能包含字母、数字和 - _ . :".to_string(),
        ));
    }
    Ok(())
}

/// 验证字符串长度
pub fn validate_string_length(
    s: &str,
    field_name: &str,
    min: usize,
    max: usize,
) -> Result<(), AppError> {
    let len = s.len();
    if len < min || len > max {
        return Err(AppError::ValidationError(format!(
            "{} 长度必须在 {}-{} 字符之间",
            field_name, min, max
        )));
    }
    Ok(())
}
