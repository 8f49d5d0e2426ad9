use async_trait::async_trait;
use modkit::{Principal, TokenAuthenticator};
use std::sync::Arc;

use crate::contract::{client::AccountsApi, error::AccountsError, model::User};
use crate::domain::{error::DomainError, service::Service};

/// In-process client: delegates to the domain service.
pub struct AccountsLocalClient {
    service: Arc<Service>,
}

impl AccountsLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl AccountsApi for AccountsLocalClient {
    async fn get_user(&self, id: i64) -> anyhow::Result<User> {
        self.service.get_user(id).await.map_err(to_anyhow)
    }

    async fn emails_for(&self, ids: &[i64]) -> anyhow::Result<Vec<String>> {
        self.service.emails_for(ids).await.map_err(to_anyhow)
    }

    async fn authenticate(&self, token: &str) -> anyhow::Result<Option<Principal>> {
        self.service.authenticate(token).await.map_err(to_anyhow)
    }
}

/// Backs the HTTP token middleware.
#[async_trait]
impl TokenAuthenticator for AccountsLocalClient {
    async fn authenticate(&self, token: &str) -> anyhow::Result<Option<Principal>> {
        AccountsApi::authenticate(self, token).await
    }
}

impl From<DomainError> for AccountsError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::UserNotFound { id } => AccountsError::not_found(id),
            DomainError::EmailAlreadyExists { email } => AccountsError::conflict(email),
            DomainError::InvalidEmail { email } => {
                AccountsError::validation(format!("Invalid email: {email}"))
            }
            DomainError::Validation { field, message } => {
                AccountsError::validation(format!("{field}: {message}"))
            }
            DomainError::CredentialsRequired | DomainError::InvalidCredentials => {
                AccountsError::InvalidCredentials
            }
            DomainError::Database { .. } | DomainError::Internal { .. } => AccountsError::internal(),
        }
    }
}

fn to_anyhow(e: DomainError) -> anyhow::Error {
    if matches!(e, DomainError::Database { .. } | DomainError::Internal { .. }) {
        tracing::error!(error = %e, "accounts call failed");
    }
    anyhow::Error::new(AccountsError::from(e))
}
