use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::StaticConfig;
use crate::services::Services;
use crate::storage::{Storage, StorageFactory};

pub struct StartupContext {
    pub storage: Arc<Storage>,
    pub services: Services,
}

/// 连接存储并构建服务（CLI 与服务器共用）
pub async fn prepare_services(config: &StaticConfig) -> Result<StartupContext> {
    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());

    let services = Services::new(storage.clone(), config);
    Ok(StartupContext { storage, services })
}

/// 准备服务器启动的上下文
///
/// 包括存储、引导管理员和超时扫描后台任务
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let config = crate::config::get_config();
    let context = prepare_services(&config).await?;

    bootstrap_admin(&context.services, &config).await?;

    context
        .services
        .sweeper()
        .spawn_background_task(config.reservation.sweep_interval_secs);

    debug!("Pre-startup completed in {:?}", start_time.elapsed());
    Ok(context)
}

/// 配置了引导管理员时确保其存在
async fn bootstrap_admin(services: &Services, config: &StaticConfig) -> Result<()> {
    let (Some(email), Some(password)) = (
        config.auth.bootstrap_admin_email.as_deref(),
        config.auth.bootstrap_admin_password.as_deref(),
    ) else {
        debug!("No bootstrap administrator configured");
        return Ok(());
    };

    let created = services
        .auth
        .ensure_admin(email, password)
        .await
        .context("Failed to create bootstrap administrator")?;
    if created {
        warn!(
            "Bootstrap administrator {} created; remove the password from configuration",
            email
        );
    } else {
        debug!("Bootstrap administrator {} already exists", email);
    }
    Ok(())
}
