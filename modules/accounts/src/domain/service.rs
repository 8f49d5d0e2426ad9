use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use modkit::{Principal, Role};
use tracing::{debug, info, instrument, warn};

use crate::contract::model::{LoginResult, NewUser, ProfilePatch, User};
use crate::domain::error::DomainError;
use crate::domain::password::{self, HashCost};
use crate::domain::repo::{NewUserRecord, UserRecord, UsersRepository};
use crate::domain::token;

const MAX_NAME_LEN: usize = 150;
const MAX_PHONE_LEN: usize = 20;
const MAX_COUNTRY_LEN: usize = 20;

/// Domain service with business rules for accounts and API tokens.
/// Depends only on the repository port, not on infra types.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn UsersRepository>,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub inactivity_days: u32,
    pub hash_cost: HashCost,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            inactivity_days: 30,
            hash_cost: HashCost::default(),
        }
    }
}

impl Service {
    pub fn new(repo: Arc<dyn UsersRepository>, config: ServiceConfig) -> Self {
        Self { repo, config }
    }

    #[instrument(name = "accounts.service.get_user", skip(self), fields(user_id = id))]
    pub async fn get_user(&self, id: i64) -> Result<User, DomainError> {
        debug!("Getting user by id");
        let record = self.load(id).await?;
        Ok(record.user)
    }

    #[instrument(name = "accounts.service.register", skip(self, new_user), fields(email = %new_user.email))]
    pub async fn register(&self, new_user: NewUser) -> Result<User, DomainError> {
        info!("Registering new account");

        let email = normalize_email(&new_user.email);
        validate_email(&email)?;
        if new_user.password.is_empty() {
            return Err(DomainError::validation("password", "must not be empty"));
        }
        validate_profile(
            &new_user.first_name,
            &new_user.last_name,
            &new_user.phone,
            &new_user.country,
        )?;

        if self
            .repo
            .email_exists(&email)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
        {
            return Err(DomainError::email_already_exists(email));
        }

        let password_hash =
            password::hash_password_blocking(&new_user.password, self.config.hash_cost)
                .await
                .map_err(|e| DomainError::internal(e.to_string()))?;

        let record = self
            .repo
            .insert(NewUserRecord {
                email,
                password_hash,
                first_name: new_user.first_name,
                last_name: new_user.last_name,
                phone: new_user.phone,
                country: new_user.country,
                avatar: new_user.avatar,
                role: Role::Member,
                is_admin: false,
                date_joined: Utc::now(),
            })
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        info!(user_id = record.user.id, "Account registered");
        Ok(record.user)
    }

    /// Check credentials, stamp `last_login` and hand out the user's token.
    ///
    /// Every credential failure reports the same error so callers cannot
    /// probe which emails exist.
    #[instrument(name = "accounts.service.login", skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult, DomainError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(DomainError::CredentialsRequired);
        }

        let email = normalize_email(email);
        let Some(mut record) = self
            .repo
            .find_by_email(&email)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
        else {
            debug!("Login for unknown email");
            return Err(DomainError::InvalidCredentials);
        };

        if !password::verify_password_blocking(&record.password_hash, password).await {
            debug!(user_id = record.user.id, "Login with wrong password");
            return Err(DomainError::InvalidCredentials);
        }
        if !record.user.is_active {
            debug!(user_id = record.user.id, "Login to inactive account");
            return Err(DomainError::InvalidCredentials);
        }

        record.user.last_login = Some(Utc::now());
        self.repo
            .update(&record)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        let token = self.token_for(record.user.id).await?;
        info!(user_id = record.user.id, "User logged in");
        Ok(LoginResult {
            token,
            user: record.user,
        })
    }

    /// One token per user, created on first login and reused afterwards.
    async fn token_for(&self, user_id: i64) -> Result<String, DomainError> {
        if let Some(key) = self
            .repo
            .token_of(user_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
        {
            return Ok(key);
        }

        let key = token::generate_key();
        match self.repo.insert_token(user_id, &key, Utc::now()).await {
            Ok(()) => Ok(key),
            Err(e) => {
                // A concurrent login may have created it first.
                warn!(user_id, error = %e, "token insert failed, re-reading");
                self.repo
                    .token_of(user_id)
                    .await
                    .map_err(|e| DomainError::database(e.to_string()))?
                    .ok_or_else(|| DomainError::database(e.to_string()))
            }
        }
    }

    #[instrument(name = "accounts.service.update_profile", skip(self, patch), fields(user_id = id))]
    pub async fn update_profile(&self, id: i64, patch: ProfilePatch) -> Result<User, DomainError> {
        info!("Updating profile");
        let mut record = self.load(id).await?;
        let user = &mut record.user;

        if let Some(v) = patch.first_name {
            user.first_name = v;
        }
        if let Some(v) = patch.last_name {
            user.last_name = v;
        }
        if let Some(v) = patch.phone {
            user.phone = v;
        }
        if let Some(v) = patch.country {
            user.country = v;
        }
        if let Some(v) = patch.avatar {
            user.avatar = (!v.is_empty()).then_some(v);
        }
        validate_profile(&user.first_name, &user.last_name, &user.phone, &user.country)?;

        self.repo
            .update(&record)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        Ok(record.user)
    }

    /// Resolve a token into the caller; inactive accounts do not authenticate.
    #[instrument(name = "accounts.service.authenticate", skip_all)]
    pub async fn authenticate(&self, key: &str) -> Result<Option<Principal>, DomainError> {
        if key.len() != token::TOKEN_KEY_LEN {
            return Ok(None);
        }
        let record = self
            .repo
            .find_by_token(key)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        Ok(record
            .filter(|r| r.user.is_active)
            .map(|r| Principal {
                user_id: r.user.id,
                email: r.user.email,
                role: r.user.role,
                is_admin: r.user.is_admin,
            }))
    }

    #[instrument(name = "accounts.service.emails_for", skip(self, ids), fields(count = ids.len()))]
    pub async fn emails_for(&self, ids: &[i64]) -> Result<Vec<String>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.repo
            .emails_for(ids)
            .await
            .map_err(|e| DomainError::database(e.to_string()))
    }

    /// Create an administrator, or promote an existing account and reset its password.
    #[instrument(name = "accounts.service.create_admin", skip(self, password), fields(email = %email))]
    pub async fn create_admin(&self, email: &str, password: &str) -> Result<User, DomainError> {
        let email = normalize_email(email);
        validate_email(&email)?;
        if password.is_empty() {
            return Err(DomainError::validation("password", "must not be empty"));
        }
        let password_hash = password::hash_password_blocking(password, self.config.hash_cost)
            .await
            .map_err(|e| DomainError::internal(e.to_string()))?;

        let existing = self
            .repo
            .find_by_email(&email)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        let user = match existing {
            Some(mut record) => {
                record.user.is_admin = true;
                record.user.is_active = true;
                record.password_hash = password_hash;
                self.repo
                    .update(&record)
                    .await
                    .map_err(|e| DomainError::database(e.to_string()))?;
                info!(user_id = record.user.id, "Existing account promoted to admin");
                record.user
            }
            None => {
                let record = self
                    .repo
                    .insert(NewUserRecord {
                        email,
                        password_hash,
                        first_name: String::new(),
                        last_name: String::new(),
                        phone: String::new(),
                        country: String::new(),
                        avatar: None,
                        role: Role::Member,
                        is_admin: true,
                        date_joined: Utc::now(),
                    })
                    .await
                    .map_err(|e| DomainError::database(e.to_string()))?;
                info!(user_id = record.user.id, "Admin account created");
                record.user
            }
        };
        Ok(user)
    }

    /// Deactivate every active account whose last login is older than the
    /// inactivity window. Accounts that never logged in are left alone.
    #[instrument(name = "accounts.service.deactivate_stale", skip(self))]
    pub async fn deactivate_stale(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        let cutoff = now - Duration::days(i64::from(self.config.inactivity_days));
        let affected = self
            .repo
            .deactivate_not_seen_since(cutoff)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        info!(affected, %cutoff, "Stale accounts deactivated");
        Ok(affected)
    }

    async fn load(&self, id: i64) -> Result<UserRecord, DomainError> {
        self.repo
            .find_by_id(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::user_not_found(id))
    }
}

/// Trim and lowercase the domain part, keeping the local part as typed.
pub fn normalize_email(raw: &str) -> String {
    let raw = raw.trim();
    match raw.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => raw.to_string(),
    }
}

fn validate_email(email: &str) -> Result<(), DomainError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
                && domain.split('.').count() >= 2
                && domain.split('.').all(|label| !label.is_empty())
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(DomainError::invalid_email(email.to_string()))
    }
}

fn validate_profile(
    first_name: &str,
    last_name: &str,
    phone: &str,
    country: &str,
) -> Result<(), DomainError> {
    let checks = [
        ("first_name", first_name, MAX_NAME_LEN),
        ("last_name", last_name, MAX_NAME_LEN),
        ("phone", phone, MAX_PHONE_LEN),
        ("country", country, MAX_COUNTRY_LEN),
    ];
    for (field, value, max) in checks {
        let len = value.chars().count();
        if len > max {
            return Err(DomainError::validation(
                field,
                format!("too long: {len} characters (max: {max})"),
            ));
        }
    }
    Ok(())
}
