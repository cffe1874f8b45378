use super::domain::{Actor, Role, UserId};
use super::errors::IntegrationError;

pub(crate) const REVIEWERS: &[Role] = &[Role::Admin, Role::Agent, Role::System];
pub(crate) const STAFF: &[Role] = &[Role::Admin, Role::Agent];
pub(crate) const ADMINS: &[Role] = &[Role::Admin, Role::System];

pub(crate) fn require_role(
    actor: &Actor,
    allowed: &[Role],
    action: &str,
) -> Result<(), IntegrationError> {
    if allowed.contains(&actor.role) {
        Ok(())
    } else {
        Err(IntegrationError::forbidden(format!(
            "role {} is not allowed to {action}",
            actor.role.label()
        )))
    }
}

/// The record's owner, or anyone holding one of `allowed`.
pub(crate) fn require_owner_or_role(
    actor: &Actor,
    owner: &UserId,
    allowed: &[Role],
    action: &str,
) -> Result<(), IntegrationError> {
    if actor.is(owner) || allowed.contains(&actor.role) {
        Ok(())
    } else {
        Err(IntegrationError::forbidden(format!(
            "user {} is not allowed to {action}",
            actor.id
        )))
    }
}
