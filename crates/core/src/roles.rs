//! Rules for changing a member's scoped role.

use crate::error::{HubError, HubResult};
use crate::rbac::{ClubRole, GlobalRole, RoleTier};
use crate::types::{Membership, User};

/// The user asking for a role change, as seen from the target's club.
#[derive(Debug, Clone, Copy)]
pub struct Actor<'a> {
    pub user: &'a User,
    /// The actor's own membership in the club, if any.
    pub membership: Option<&'a Membership>,
    /// Whether the actor coordinates the club.
    pub is_coordinator: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct RoleChangeRequest<'a> {
    pub actor: Actor<'a>,
    pub target: &'a Membership,
    pub requested: ClubRole,
    /// Approved memberships of the target's club.
    pub club_memberships: &'a [Membership],
    /// The target user's approved memberships in other clubs.
    pub other_memberships: &'a [Membership],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleChange {
    Unchanged,
    Changed { from: ClubRole, to: ClubRole },
}

/// Validate a role change. Rules are checked in order: target status,
/// no-op, authority, per-club uniqueness, cross-club exclusivity.
pub fn check_role_change(req: &RoleChangeRequest<'_>) -> HubResult<RoleChange> {
    let target = req.target;

    if !target.is_approved() {
        return Err(HubError::bad_request(
            "Only approved members can have their role changed",
        ));
    }

    if target.role == req.requested {
        return Ok(RoleChange::Unchanged);
    }

    check_authority(req)?;
    check_unique(req)?;
    check_cross_club(req.requested, target, req.other_memberships)?;

    Ok(RoleChange::Changed {
        from: target.role,
        to: req.requested,
    })
}

fn check_authority(req: &RoleChangeRequest<'_>) -> HubResult<()> {
    let actor = &req.actor;

    if actor.user.role == GlobalRole::Admin {
        return Ok(());
    }

    if actor.user.id == req.target.user_id {
        return Err(HubError::forbidden("You cannot change your own role"));
    }

    if actor.is_coordinator {
        return Ok(());
    }

    let actor_role = actor
        .membership
        .filter(|m| m.is_approved() && m.club_id == req.target.club_id)
        .map(|m| m.role);

    match actor_role {
        Some(role) if role.is_leadership() => {
            if req.target.role.tier() == RoleTier::Leadership
                || req.requested.tier() == RoleTier::Leadership
            {
                Err(HubError::forbidden(
                    "Only the coordinator can assign or revoke leadership roles",
                ))
            } else {
                Ok(())
            }
        }
        _ => Err(HubError::forbidden(
            "You don't have permission to manage roles in this club",
        )),
    }
}

fn check_unique(req: &RoleChangeRequest<'_>) -> HubResult<()> {
    if !req.requested.is_unique() {
        return Ok(());
    }

    let taken = req.club_memberships.iter().any(|m| {
        m.is_approved()
            && m.club_id == req.target.club_id
            && m.id != req.target.id
            && m.role == req.requested
    });

    if taken {
        return Err(HubError::conflict(format!(
            "This club already has a {}",
            req.requested
        )));
    }

    Ok(())
}

/// Leadership excludes any elevated role elsewhere; a core role excludes
/// leadership elsewhere.
pub fn check_cross_club(
    requested: ClubRole,
    target: &Membership,
    other_memberships: &[Membership],
) -> HubResult<()> {
    let conflicting = other_memberships
        .iter()
        .filter(|m| m.is_approved() && m.club_id != target.club_id && m.user_id == target.user_id)
        .find(|m| match requested.tier() {
            RoleTier::Leadership => m.role.is_elevated(),
            RoleTier::Core => m.role.is_leadership(),
            RoleTier::Member => false,
        });

    if let Some(other) = conflicting {
        return Err(HubError::conflict(format!(
            "Member already holds the {} role in another club",
            other.role
        )));
    }

    Ok(())
}
