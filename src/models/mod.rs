//! 领域枚举与业务规则
//!
//! 数据库中状态与角色均以大写字符串存储，这里提供强类型视图和状态机。

mod notification;
mod reservation;
mod role;
mod stock;

pub use notification::NotificationKind;
pub use reservation::{ReservationAction, ReservationStatus};
pub use role::Role;
pub use stock::StockStatus;

mod principal;
pub use principal::AuthUser;

use crate::errors::{MedifindError, Result};

/// 解析数据库中存储的枚举字符串
pub(crate) fn parse_stored<T: std::str::FromStr>(field: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        MedifindError::database_operation(format!("Unknown {} value in storage: {}", field, value))
    })
}
