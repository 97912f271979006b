mod r#impl;
mod structs;

pub use r#impl::{get_config, init_config, init_config_from, replace_config};
pub use structs::*;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 环境变量前缀（MF__SERVER__PORT=9000）
pub const ENV_PREFIX: &str = "MF";
