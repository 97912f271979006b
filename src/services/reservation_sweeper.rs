//! 预约超时扫描后台任务

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Utc;
use tracing::{error, info};

use crate::errors::Result;

use super::ReservationService;

/// 周期性地把超时未响应的预约转为 NO_RESPONSE
pub struct ReservationSweeper {
    reservations: Arc<ReservationService>,
}

impl ReservationSweeper {
    pub fn new(reservations: Arc<ReservationService>) -> Self {
        Self { reservations }
    }

    /// 执行一次扫描
    pub async fn run_once(&self) -> Result<u64> {
        self.reservations.expire_overdue(Utc::now()).await
    }

    /// 启动后台任务，interval_secs 为 0 时不启动
    pub fn spawn_background_task(self: Arc<Self>, interval_secs: u64) -> bool {
        if interval_secs == 0 {
            info!("Reservation timeout sweep disabled (interval = 0)");
            return false;
        }

        tokio::spawn(async move {
            let interval = StdDuration::from_secs(interval_secs);

            loop {
                if let Err(e) = self.run_once().await {
                    error!("Reservation timeout sweep failed: {}", e);
                }

                tokio::time::sleep(interval).await;
            }
        });

        info!(
            "Reservation timeout sweep started (interval: {} seconds)",
            interval_secs
        );
        true
    }
}
