pub mod geo;
pub mod password;
pub mod validation;

use base64::Engine;
use rand::RngExt;

/// 生成新的实体 ID（UUID v4）
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 生成 URL 安全的随机 token（用于缺省 JWT 密钥等）
pub fn generate_secure_token(bytes_len: usize) -> String {
    let mut bytes = vec![0u8; bytes_len];
    rand::rng().fill(bytes.as_mut_slice());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
