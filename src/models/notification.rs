use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use ts_rs::TS;

use crate::api::types::TS_EXPORT_PATH;

/// 通知类型
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr, TS,
)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    ReservationCreated,
    ReservationAccepted,
    ReservationRejected,
    ReservationCancelled,
    ReservationNoResponse,
    PharmacyRegistered,
    PharmacyApproved,
    PharmacySuspended,
}
