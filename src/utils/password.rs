//! 账号密码哈希（Argon2id）

use std::sync::OnceLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

#[derive(Debug)]
pub enum PasswordError {
    /// 生成哈希失败
    Hash(String),
    /// 数据库中存储的哈希无法解析
    MalformedHash(String),
}

impl std::fmt::Display for PasswordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hash(msg) => write!(f, "Failed to hash password: {}", msg),
            Self::MalformedHash(msg) => write!(f, "Stored password hash is malformed: {}", msg),
        }
    }
}

impl std::error::Error for PasswordError {}

pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// 校验明文密码与存储的哈希是否匹配
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// 邮箱不存在时也做一次完整的 Argon2 校验，登录耗时不随邮箱是否注册而变化
pub fn verify_against_placeholder(password: &str) {
    static PLACEHOLDER: OnceLock<Option<String>> = OnceLock::new();

    let placeholder = PLACEHOLDER.get_or_init(|| hash_password("medifind-placeholder").ok());
    if let Some(hash) = placeholder {
        let _ = verify_password(password, hash);
    }
}
