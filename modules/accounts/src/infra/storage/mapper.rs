use modkit::Role;

use crate::contract::model::User;
use crate::domain::repo::UserRecord;
use crate::infra::storage::entity::users::{DbRole, Model};

impl From<DbRole> for Role {
    fn from(r: DbRole) -> Self {
        match r {
            DbRole::Member => Role::Member,
            DbRole::Moderator => Role::Moderator,
        }
    }
}

impl From<Role> for DbRole {
    fn from(r: Role) -> Self {
        match r {
            Role::Member => DbRole::Member,
            Role::Moderator => DbRole::Moderator,
        }
    }
}

impl From<Model> for UserRecord {
    fn from(m: Model) -> Self {
        Self {
            user: User {
                id: m.id,
                email: m.email,
                first_name: m.first_name,
                last_name: m.last_name,
                phone: m.phone,
                country: m.country,
                avatar: m.avatar,
                role: m.role.into(),
                is_admin: m.is_admin,
                is_active: m.is_active,
                last_login: m.last_login,
                date_joined: m.date_joined,
            },
            password_hash: m.password_hash,
        }
    }
}
