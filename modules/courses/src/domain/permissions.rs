//! Per-request access predicates, combined with OR per endpoint.

use modkit::Principal;

/// True iff the object has an owner and it is the caller.
pub fn is_owner(caller: &Principal, owner_id: Option<i64>) -> bool {
    caller.owns(owner_id)
}

/// Role check only; not tied to any object.
pub fn is_moderator(caller: &Principal) -> bool {
    caller.is_moderator()
}

pub fn is_admin(caller: &Principal) -> bool {
    caller.is_admin()
}

/// Access rule of a catalog endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Authenticated,
    Admin,
    OwnerOrModeratorOrAdmin,
    OwnerOrAdmin,
}

impl Rule {
    /// `owner_id` is the loaded object's owner; pass `None` for collection endpoints.
    pub fn allows(self, caller: &Principal, owner_id: Option<i64>) -> bool {
        match self {
            Rule::Authenticated => true,
            Rule::Admin => is_admin(caller),
            Rule::OwnerOrModeratorOrAdmin => {
                is_owner(caller, owner_id) || is_moderator(caller) || is_admin(caller)
            }
            Rule::OwnerOrAdmin => is_owner(caller, owner_id) || is_admin(caller),
        }
    }
}

pub const RETRIEVE: Rule = Rule::OwnerOrModeratorOrAdmin;
pub const UPDATE: Rule = Rule::OwnerOrModeratorOrAdmin;
pub const DESTROY: Rule = Rule::OwnerOrAdmin;
pub const CREATE: Rule = Rule::Admin;
pub const LIST: Rule = Rule::Authenticated;
