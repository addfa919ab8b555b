//! Permission evaluation.
//!
//! A request is authorized from two sources: the actor's single global role
//! ([`GlobalRole`]) and, for club-scoped checks, the scoped role
//! ([`ClubRole`]) recorded on the actor's approved membership in that club.
//! Admins pass every check; a club's coordinator passes every club-scoped
//! check except the admin-only club decisions; everyone else goes through
//! the [`scoped_permissions`] table.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{HubError, HubResult};
use crate::types::{Club, Membership, MembershipStatus, User};

/// Institution-wide role stored on the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GlobalRole {
    Student,
    Coordinator,
    Admin,
}

impl GlobalRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Coordinator => "coordinator",
            Self::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "student" => Some(Self::Student),
            "coordinator" => Some(Self::Coordinator),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for GlobalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role held within a single club, stored on the membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClubRole {
    #[serde(rename = "member")]
    Member,
    #[serde(rename = "core")]
    Core,
    #[serde(rename = "secretary")]
    Secretary,
    #[serde(rename = "treasurer")]
    Treasurer,
    #[serde(rename = "leadPR")]
    LeadPr,
    #[serde(rename = "leadTech")]
    LeadTech,
    #[serde(rename = "president")]
    President,
    #[serde(rename = "vicePresident")]
    VicePresident,
}

/// Coarse grouping of club roles. President and vice-president are
/// permission-equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RoleTier {
    Member,
    Core,
    Leadership,
}

impl ClubRole {
    pub const ALL: [ClubRole; 8] = [
        ClubRole::Member,
        ClubRole::Core,
        ClubRole::Secretary,
        ClubRole::Treasurer,
        ClubRole::LeadPr,
        ClubRole::LeadTech,
        ClubRole::President,
        ClubRole::VicePresident,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Core => "core",
            Self::Secretary => "secretary",
            Self::Treasurer => "treasurer",
            Self::LeadPr => "leadPR",
            Self::LeadTech => "leadTech",
            Self::President => "president",
            Self::VicePresident => "vicePresident",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
    }

    pub fn tier(&self) -> RoleTier {
        match self {
            Self::President | Self::VicePresident => RoleTier::Leadership,
            Self::Core | Self::Secretary | Self::Treasurer | Self::LeadPr | Self::LeadTech => {
                RoleTier::Core
            }
            Self::Member => RoleTier::Member,
        }
    }

    pub fn is_leadership(&self) -> bool {
        self.tier() == RoleTier::Leadership
    }

    /// Core or leadership.
    pub fn is_elevated(&self) -> bool {
        self.tier() >= RoleTier::Core
    }

    /// Roles of which a club may have at most one holder.
    pub fn is_unique(&self) -> bool {
        matches!(self, Self::President | Self::VicePresident)
    }
}

impl fmt::Display for ClubRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource types for permission checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resource {
    Club,
    Membership,
    Event,
    Report,
    AuditLog,
    User,
}

impl Resource {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "club" => Some(Self::Club),
            "membership" => Some(Self::Membership),
            "event" => Some(Self::Event),
            "report" => Some(Self::Report),
            "auditlog" => Some(Self::AuditLog),
            "user" => Some(Self::User),
            _ => None,
        }
    }
}

/// Actions that can be performed on resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    Submit,
    Approve,
    ManageRoles,
    Archive,
}

impl Action {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "create" => Some(Self::Create),
            "read" => Some(Self::Read),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            "submit" => Some(Self::Submit),
            "approve" => Some(Self::Approve),
            "manageroles" => Some(Self::ManageRoles),
            "archive" => Some(Self::Archive),
            _ => None,
        }
    }
}

/// Actions a scoped role grants on a resource inside its own club.
pub fn scoped_permissions(role: ClubRole, resource: Resource) -> &'static [Action] {
    use Action::*;

    match (role.tier(), role, resource) {
        (RoleTier::Leadership, _, Resource::Club) => &[Read, Update, Archive],
        (RoleTier::Leadership, _, Resource::Membership) => &[Read, Approve, Delete, ManageRoles],
        (RoleTier::Leadership, _, Resource::Event) => &[Read, Create, Update, Delete, Submit],
        (RoleTier::Leadership, _, Resource::Report) => &[Read],

        (RoleTier::Core, ClubRole::Secretary, Resource::Membership) => &[Read, Approve],
        (RoleTier::Core, ClubRole::Treasurer, Resource::Report) => &[Read],
        (RoleTier::Core, _, Resource::Club | Resource::Membership) => &[Read],
        (RoleTier::Core, _, Resource::Event) => &[Read, Create, Update],

        (RoleTier::Member, _, Resource::Club | Resource::Membership | Resource::Event) => &[Read],

        _ => &[],
    }
}

/// What granted an allowed decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "role", rename_all = "camelCase")]
pub enum Grant {
    Admin,
    Coordinator,
    ClubRole(ClubRole),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub allowed: bool,
    pub grant: Option<Grant>,
}

impl Decision {
    fn allow(grant: Grant) -> Self {
        Self {
            allowed: true,
            grant: Some(grant),
        }
    }

    fn deny() -> Self {
        Self {
            allowed: false,
            grant: None,
        }
    }
}

/// The club a check is scoped to, with the actor's membership in it.
#[derive(Debug, Clone, Copy)]
pub struct ClubScope<'a> {
    pub club: &'a Club,
    pub membership: Option<&'a Membership>,
}

impl<'a> ClubScope<'a> {
    pub fn new(club: &'a Club, membership: Option<&'a Membership>) -> Self {
        Self { club, membership }
    }

    /// The actor's role in the club, if their membership is approved.
    pub fn approved_role(&self) -> Option<ClubRole> {
        self.membership
            .filter(|m| m.status == MembershipStatus::Approved && m.club_id == self.club.id)
            .map(|m| m.role)
    }
}

/// Club decisions only an admin may take, even in a coordinated club.
fn admin_only(resource: Resource, action: Action) -> bool {
    matches!(
        (resource, action),
        (Resource::Club, Action::Create | Action::Delete | Action::Approve)
    )
}

/// Decide whether `actor` may perform `action` on `resource`.
pub fn evaluate(
    actor: &User,
    scope: Option<ClubScope<'_>>,
    resource: Resource,
    action: Action,
) -> Decision {
    if actor.role == GlobalRole::Admin {
        return Decision::allow(Grant::Admin);
    }

    let Some(scope) = scope else {
        return Decision::deny();
    };

    if admin_only(resource, action) {
        return Decision::deny();
    }

    if actor.role == GlobalRole::Coordinator && scope.club.coordinator_id == actor.id {
        return Decision::allow(Grant::Coordinator);
    }

    match scope.approved_role() {
        Some(role) if scoped_permissions(role, resource).contains(&action) => {
            Decision::allow(Grant::ClubRole(role))
        }
        _ => Decision::deny(),
    }
}

/// Like [`evaluate`], but returns `Forbidden` when denied.
pub fn require(
    actor: &User,
    scope: Option<ClubScope<'_>>,
    resource: Resource,
    action: Action,
) -> HubResult<Grant> {
    let decision = evaluate(actor, scope, resource, action);
    match decision.grant {
        Some(grant) if decision.allowed => Ok(grant),
        _ => Err(HubError::forbidden(format!(
            "You don't have permission to {} this {}",
            action_verb(action),
            resource_noun(resource)
        ))),
    }
}

/// Require the actor's global role to be one of `roles`.
pub fn require_global_role(actor: &User, roles: &[GlobalRole]) -> HubResult<()> {
    if roles.contains(&actor.role) {
        Ok(())
    } else {
        Err(HubError::forbidden(format!(
            "This action requires one of the roles: {}",
            roles
                .iter()
                .map(GlobalRole::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }
}

fn action_verb(action: Action) -> &'static str {
    match action {
        Action::Create => "create",
        Action::Read => "view",
        Action::Update => "update",
        Action::Delete => "delete",
        Action::Submit => "submit",
        Action::Approve => "approve",
        Action::ManageRoles => "manage roles in",
        Action::Archive => "archive",
    }
}

fn resource_noun(resource: Resource) -> &'static str {
    match resource {
        Resource::Club => "club",
        Resource::Membership => "membership",
        Resource::Event => "event",
        Resource::Report => "report",
        Resource::AuditLog => "audit log",
        Resource::User => "user",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClubCategory, ClubStatus};
    use chrono::Utc;

    fn user(id: &str, role: GlobalRole) -> User {
        User {
            id: id.to_string(),
            name: id.to_string(),
            email: format!("{}@campus.edu", id),
            password_hash: None,
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn club(coordinator: &str) -> Club {
        Club {
            id: "club-1".to_string(),
            name: "Robotics".to_string(),
            category: ClubCategory::Technical,
            description: String::new(),
            coordinator_id: coordinator.to_string(),
            status: ClubStatus::Active,
            archive_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn membership(user_id: &str, role: ClubRole, status: MembershipStatus) -> Membership {
        Membership {
            id: format!("m-{}", user_id),
            user_id: user_id.to_string(),
            club_id: "club-1".to_string(),
            role,
            status,
            message: None,
            decision_reason: None,
            decided_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_admin_allowed_everywhere() {
        let admin = user("admin", GlobalRole::Admin);
        let decision = evaluate(&admin, None, Resource::AuditLog, Action::Read);
        assert!(decision.allowed);
        assert_eq!(decision.grant, Some(Grant::Admin));
    }

    #[test]
    fn test_unscoped_checks_deny_non_admins() {
        let coordinator = user("coord", GlobalRole::Coordinator);
        assert!(!evaluate(&coordinator, None, Resource::Club, Action::Create).allowed);
    }

    #[test]
    fn test_coordinator_only_for_own_club() {
        let coordinator = user("coord", GlobalRole::Coordinator);
        let own = club("coord");
        let other = club("someone-else");

        let decision = evaluate(
            &coordinator,
            Some(ClubScope::new(&own, None)),
            Resource::Event,
            Action::Approve,
        );
        assert_eq!(decision.grant, Some(Grant::Coordinator));

        assert!(
            !evaluate(
                &coordinator,
                Some(ClubScope::new(&other, None)),
                Resource::Event,
                Action::Approve,
            )
            .allowed
        );
    }

    #[test]
    fn test_coordinator_cannot_take_admin_club_decisions() {
        let coordinator = user("coord", GlobalRole::Coordinator);
        let own = club("coord");
        for action in [Action::Create, Action::Delete, Action::Approve] {
            assert!(
                !evaluate(
                    &coordinator,
                    Some(ClubScope::new(&own, None)),
                    Resource::Club,
                    action
                )
                .allowed
            );
        }
        assert!(
            evaluate(
                &coordinator,
                Some(ClubScope::new(&own, None)),
                Resource::Club,
                Action::Archive
            )
            .allowed
        );
    }

    #[test]
    fn test_president_and_vice_president_equivalent() {
        let c = club("coord");
        let student = user("s1", GlobalRole::Student);
        for role in [ClubRole::President, ClubRole::VicePresident] {
            let m = membership("s1", role, MembershipStatus::Approved);
            for (resource, action) in [
                (Resource::Membership, Action::ManageRoles),
                (Resource::Event, Action::Submit),
                (Resource::Club, Action::Archive),
            ] {
                let scope = Some(ClubScope::new(&c, Some(&m)));
                let decision = evaluate(&student, scope, resource, action);
                assert_eq!(decision.grant, Some(Grant::ClubRole(role)));
            }
        }
    }

    #[test]
    fn test_scoped_roles_never_approve_events() {
        let c = club("coord");
        let student = user("s1", GlobalRole::Student);
        for role in ClubRole::ALL {
            let m = membership("s1", role, MembershipStatus::Approved);
            assert!(
                !evaluate(
                    &student,
                    Some(ClubScope::new(&c, Some(&m))),
                    Resource::Event,
                    Action::Approve
                )
                .allowed,
                "{} should not approve events",
                role
            );
        }
    }

    #[test]
    fn test_pending_membership_grants_nothing() {
        let c = club("coord");
        let student = user("s1", GlobalRole::Student);
        let m = membership("s1", ClubRole::President, MembershipStatus::Pending);
        assert!(
            !evaluate(
                &student,
                Some(ClubScope::new(&c, Some(&m))),
                Resource::Club,
                Action::Read
            )
            .allowed
        );
    }

    #[test]
    fn test_core_role_table() {
        assert!(
            scoped_permissions(ClubRole::Secretary, Resource::Membership)
                .contains(&Action::Approve)
        );
        assert!(
            !scoped_permissions(ClubRole::LeadTech, Resource::Membership)
                .contains(&Action::Approve)
        );
        assert!(scoped_permissions(ClubRole::Treasurer, Resource::Report).contains(&Action::Read));
        assert!(scoped_permissions(ClubRole::Core, Resource::Report).is_empty());
        assert!(scoped_permissions(ClubRole::LeadPr, Resource::Event).contains(&Action::Create));
        assert!(!scoped_permissions(ClubRole::LeadPr, Resource::Event).contains(&Action::Submit));
        assert!(!scoped_permissions(ClubRole::Member, Resource::Event).contains(&Action::Create));
    }

    #[test]
    fn test_parse_wire_names() {
        assert_eq!(ClubRole::parse("leadPR"), Some(ClubRole::LeadPr));
        assert_eq!(ClubRole::parse("VICEPRESIDENT"), Some(ClubRole::VicePresident));
        assert_eq!(ClubRole::parse("captain"), None);
        assert_eq!(Resource::parse("auditLog"), Some(Resource::AuditLog));
        assert_eq!(Action::parse("manageRoles"), Some(Action::ManageRoles));
        assert_eq!(GlobalRole::parse("Admin"), Some(GlobalRole::Admin));
    }

    #[test]
    fn test_require_global_role() {
        let student = user("s1", GlobalRole::Student);
        assert!(require_global_role(&student, &[GlobalRole::Student]).is_ok());
        let err = require_global_role(&student, &[GlobalRole::Admin, GlobalRole::Coordinator])
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
    }
}
