//! 存储层
//!
//! 基于 SeaORM，支持 SQLite、MySQL/MariaDB 与 PostgreSQL，
//! 数据库类型从 URL 推断。

mod connection;

use std::sync::Arc;

use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::errors::{MedifindError, Result};
use migration::entities::user;

pub use connection::{connect_generic, connect_sqlite, run_migrations};

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(MedifindError::database_config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// 数据库连接持有者
#[derive(Clone)]
pub struct Storage {
    db: DatabaseConnection,
    backend_name: String,
}

impl Storage {
    /// 连接数据库并运行迁移
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let database_url = config.database_url.trim();
        if database_url.is_empty() {
            return Err(MedifindError::database_config("database_url 未设置"));
        }

        let backend_name = infer_backend_from_url(database_url)?;
        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url, config.pool_size).await?
        } else {
            connect_generic(database_url, &backend_name, config.pool_size).await?
        };

        run_migrations(&db).await?;
        info!("Storage ready: {} backend", backend_name);

        Ok(Self { db, backend_name })
    }

    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    /// 轻量存活检查：统计用户数
    pub async fn ping(&self) -> Result<u64> {
        self.db
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| MedifindError::database_connection(e.to_string()))?;
        let users = user::Entity::find().count(&self.db).await?;
        debug!("Storage ping ok ({} users)", users);
        Ok(users)
    }

    /// 关闭连接池
    pub async fn close(&self) -> Result<()> {
        self.db
            .clone()
            .close()
            .await
            .map_err(|e| MedifindError::database_connection(e.to_string()))
    }
}

pub struct StorageFactory;

impl StorageFactory {
    /// 使用全局配置创建存储
    pub async fn create() -> Result<Arc<Storage>> {
        let config = crate::config::get_config();
        let storage = Storage::connect(&config.database).await?;
        Ok(Arc::new(storage))
    }
}
