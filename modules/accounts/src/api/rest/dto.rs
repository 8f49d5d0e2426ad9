use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::contract::model::{LoginResult, NewUser, ProfilePatch, User};

/// Public profile of an account
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    pub phone: String,
    pub country: String,
}

/// Registration payload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterReq {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Login payload. Both fields are optional on the wire so a missing one
/// gets the same localized message as an empty one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LoginReq {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResp {
    /// Send as `Authorization: Token <token>`
    pub token: String,
    pub user: UserDto,
}

/// Partial profile update
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateMeReq {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    /// Empty string clears the avatar
    pub avatar: Option<String>,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            avatar: u.avatar,
            phone: u.phone,
            country: u.country,
        }
    }
}

impl From<RegisterReq> for NewUser {
    fn from(req: RegisterReq) -> Self {
        Self {
            email: req.email,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
            phone: req.phone,
            country: req.country,
            avatar: req.avatar,
        }
    }
}

impl From<UpdateMeReq> for ProfilePatch {
    fn from(req: UpdateMeReq) -> Self {
        Self {
            first_name: req.first_name,
            last_name: req.last_name,
            phone: req.phone,
            country: req.country,
            avatar: req.avatar,
        }
    }
}

impl From<LoginResult> for LoginResp {
    fn from(r: LoginResult) -> Self {
        Self {
            token: r.token,
            user: r.user.into(),
        }
    }
}
