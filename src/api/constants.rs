//! API 模块常量定义

/// Access Token Cookie 名称
pub const ACCESS_COOKIE_NAME: &str = "medifind_access";

/// Refresh Token Cookie 名称
pub const REFRESH_COOKIE_NAME: &str = "medifind_refresh";

/// API 版本前缀
pub const API_V1_PREFIX: &str = "/api/v1";

/// Refresh Cookie 只在认证路由下发送
pub const REFRESH_COOKIE_PATH: &str = "/api/v1/auth";
