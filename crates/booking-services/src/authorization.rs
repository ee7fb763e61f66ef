//! Ownership checks shared by rules, overrides and appointments
//!
//! The single ownership rule of the engine: admins may act on anything in
//! their organization, everyone else only on what they own.

use booking_core::{models::Caller, AppError, AppResult};
use tracing::warn;
use uuid::Uuid;

/// Stateless ownership predicates
pub struct AuthorizationGuard;

impl AuthorizationGuard {
    /// `is_admin OR owner_id == caller_id`
    #[inline]
    pub fn can_manage(is_admin: bool, owner_id: Uuid, caller_id: Uuid) -> bool {
        is_admin || owner_id == caller_id
    }

    /// Fail with `Forbidden` unless the caller may manage a resource owned by `owner_id`
    pub fn ensure_can_manage(caller: &Caller, owner_id: Uuid, resource: &str) -> AppResult<()> {
        if Self::can_manage(caller.is_admin, owner_id, caller.user_id) {
            return Ok(());
        }
        warn!(
            caller = %caller.user_id,
            owner = %owner_id,
            resource,
            "Denied access to resource owned by another user"
        );
        Err(AppError::Forbidden(format!(
            "{} belongs to another user",
            resource
        )))
    }

    /// Agent an operation targets: the explicit target, or the caller itself
    ///
    /// Non-admins may only target themselves.
    pub fn resolve_target_user(caller: &Caller, target: Option<Uuid>) -> AppResult<Uuid> {
        match target {
            None => Ok(caller.user_id),
            Some(target) if Self::can_manage(caller.is_admin, target, caller.user_id) => Ok(target),
            Some(target) => {
                warn!(
                    caller = %caller.user_id,
                    target = %target,
                    "Non-admin attempted to act on behalf of another user"
                );
                Err(AppError::Forbidden(
                    "only admins may act on behalf of another user".to_string(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_manage() {
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert!(AuthorizationGuard::can_manage(false, owner, owner));
        assert!(AuthorizationGuard::can_manage(true, owner, other));
        assert!(!AuthorizationGuard::can_manage(false, owner, other));
    }

    #[test]
    fn test_ensure_can_manage() {
        let org = Uuid::new_v4();
        let owner = Uuid::new_v4();
        let agent = Caller::agent(Uuid::new_v4(), org);
        let admin = Caller::admin(Uuid::new_v4(), org);

        assert!(AuthorizationGuard::ensure_can_manage(&admin, owner, "appointment").is_ok());
        assert!(matches!(
            AuthorizationGuard::ensure_can_manage(&agent, owner, "appointment"),
            Err(AppError::Forbidden(_))
        ));
        assert!(
            AuthorizationGuard::ensure_can_manage(&Caller::agent(owner, org), owner, "rule").is_ok()
        );
    }

    #[test]
    fn test_resolve_target_user() {
        let org = Uuid::new_v4();
        let other = Uuid::new_v4();
        let agent = Caller::agent(Uuid::new_v4(), org);
        let admin = Caller::admin(Uuid::new_v4(), org);

        assert_eq!(AuthorizationGuard::resolve_target_user(&agent, None).unwrap(), agent.user_id);
        assert_eq!(
            AuthorizationGuard::resolve_target_user(&agent, Some(agent.user_id)).unwrap(),
            agent.user_id
        );
        assert!(matches!(
            AuthorizationGuard::resolve_target_user(&agent, Some(other)),
            Err(AppError::Forbidden(_))
        ));
        assert_eq!(AuthorizationGuard::resolve_target_user(&admin, Some(other)).unwrap(), other);
    }
}
