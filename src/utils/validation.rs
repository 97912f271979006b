//! 输入校验工具

use crate::errors::{MedifindError, Result};

/// 规范化邮箱（去空白 + 小写）
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// 简单的邮箱格式检查：local@domain.tld
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

/// 电话号码：允许数字、空格、+、-、括号，至少 6 位数字
pub fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    digits >= 6
        && phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'))
}

/// 必填字符串字段，返回去除首尾空白后的值
pub fn require_non_empty(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(MedifindError::validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// 可选字符串字段：空串视为 None
pub fn optional_trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// 校验密码长度
pub fn validate_password(password: &str, min_length: usize) -> Result<()> {
    if password.chars().count() < min_length {
        return Err(MedifindError::validation(format!(
            "Password must be at least {} characters",
            min_length
        )));
    }
    Ok(())
}

/// 统一的分页参数处理：page 从 1 开始，page_size 限制在 1..=100
pub fn normalize_page(page: Option<u64>, page_size: Option<u64>) -> (u64, u64) {
    (
        page.unwrap_or(1).max(1),
        page_size.unwrap_or(20).clamp(1, 100),
    )
}
