use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use ts_rs::TS;

use crate::api::types::TS_EXPORT_PATH;
use crate::errors::{MedifindError, Result};

/// 预约状态
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
    EnumIter,
    TS,
)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ReservationStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
    NoResponse,
}

/// 驱动状态机的动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum ReservationAction {
    Accept,
    Reject,
    Cancel,
    Expire,
}

impl ReservationStatus {
    /// 状态转换
    ///
    /// ```text
    /// PENDING  --accept--> ACCEPTED
    /// PENDING  --reject--> REJECTED
    /// PENDING  --cancel--> CANCELLED
    /// PENDING  --expire--> NO_RESPONSE
    /// ACCEPTED --cancel--> CANCELLED
    /// ```
    pub fn apply(self, action: ReservationAction) -> Result<ReservationStatus> {
        use ReservationAction as A;
        use ReservationStatus as S;

        match (self, action) {
            (S::Pending, A::Accept) => Ok(S::Accepted),
            (S::Pending, A::Reject) => Ok(S::Rejected),
            (S::Pending, A::Cancel) => Ok(S::Cancelled),
            (S::Pending, A::Expire) => Ok(S::NoResponse),
            (S::Accepted, A::Cancel) => Ok(S::Cancelled),
            (from, action) => Err(MedifindError::invalid_transition(format!(
                "Cannot {} a reservation in status {}",
                action, from
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTIONS: [ReservationAction; 4] = [
        ReservationAction::Accept,
        ReservationAction::Reject,
        ReservationAction::Cancel,
        ReservationAction::Expire,
    ];

    #[test]
    fn test_pending_transitions() {
        let s = ReservationStatus::Pending;
        assert_eq!(
            s.apply(ReservationAction::Accept).unwrap(),
            ReservationStatus::Accepted
        );
        assert_eq!(
            s.apply(ReservationAction::Reject).unwrap(),
            ReservationStatus::Rejected
        );
        assert_eq!(
            s.apply(ReservationAction::Cancel).unwrap(),
            ReservationStatus::Cancelled
        );
        assert_eq!(
            s.apply(ReservationAction::Expire).unwrap(),
            ReservationStatus::NoResponse
        );
    }

    #[test]
    fn test_accepted_only_allows_cancel() {
        let s = ReservationStatus::Accepted;
        assert_eq!(
            s.apply(ReservationAction::Cancel).unwrap(),
            ReservationStatus::Cancelled
        );
        for action in [
            ReservationAction::Accept,
            ReservationAction::Reject,
            ReservationAction::Expire,
        ] {
            let err = s.apply(action).unwrap_err();
            assert!(matches!(err, MedifindError::InvalidTransition(_)));
        }
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        for status in [
            ReservationStatus::Rejected,
            ReservationStatus::Cancelled,
            ReservationStatus::NoResponse,
        ] {
            for action in ACTIONS {
                assert!(
                    status.apply(action).is_err(),
                    "{} + {} should be rejected",
                    status,
                    action
                );
            }
        }
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(ReservationStatus::NoResponse.to_string(), "NO_RESPONSE");
        assert_eq!(
            "no_response".parse::<ReservationStatus>().unwrap(),
            ReservationStatus::NoResponse
        );
        assert_eq!(
            serde_json::to_string(&ReservationStatus::Cancelled).unwrap(),
            "\"CANCELLED\""
        );
    }
}
