use crate::errors::{MedifindError, Result};

use super::Role;

/// 已认证的调用者（由 JWT claims 解析而来）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub role: Role,
}

impl AuthUser {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    /// 角色守卫，不匹配时返回 403
    pub fn require_role(&self, allowed: &[Role]) -> Result<()> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(MedifindError::forbidden(format!(
                "This operation is not available for role {}",
                self.role
            )))
        }
    }

    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_role() {
        let user = AuthUser::new("u1", Role::Patient);
        assert!(user.require_role(&[Role::Patient]).is_ok());
        assert!(user.require_role(&[Role::Patient, Role::Admin]).is_ok());

        let err = user.require_role(&[Role::Pharmacy]).unwrap_err();
        assert!(matches!(err, MedifindError::Forbidden(_)));
    }
}
