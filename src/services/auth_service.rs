use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::auth::{self, Claims};
use crate::config;
use crate::database::store::Store;
use crate::error::ApiError;
use crate::models::{NewUser, PublicUser, Role, User};
use crate::security;

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Registration, login, and current-user resolution.
pub struct AuthService {
    store: Arc<dyn Store>,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create an account and issue a token. Role defaults to CLIENT when the
    /// caller does not specify one.
    pub async fn register(
        &self,
        name: String,
        email: String,
        password: String,
        role: Option<Role>,
    ) -> Result<AuthResponse, ApiError> {
        if self.store.user_by_email(&email).await?.is_some() {
            return Err(ApiError::bad_request("Email already in use"));
        }

        let password_hash = security::hash_password(&password).map_err(|e| {
            tracing::error!("password hashing failed: {}", e);
            ApiError::internal_server_error("Failed to process credentials")
        })?;

        let user = self
            .store
            .create_user(NewUser {
                name,
                email,
                password_hash,
                role: role.unwrap_or(Role::Client),
            })
            .await?;

        let token = self.issue_token(&user)?;
        Ok(AuthResponse {
            token,
            user: PublicUser::from(&user),
        })
    }

    /// Verify credentials and issue a token. Unknown email and wrong password
    /// produce the same response, so the endpoint does not reveal which
    /// accounts exist.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let Some(user) = self.store.user_by_email(email).await? else {
            return Err(ApiError::bad_request("Invalid credentials"));
        };
        if !security::verify_password(&user.password_hash, password) {
            return Err(ApiError::bad_request("Invalid credentials"));
        }

        let token = self.issue_token(&user)?;
        Ok(AuthResponse {
            token,
            user: PublicUser::from(&user),
        })
    }

    /// Fresh profile for a verified token. The token's claims are not trusted
    /// for profile data; the user is re-resolved from the store and may have
    /// been removed since issuance.
    pub async fn current_user(&self, user_id: Uuid) -> Result<PublicUser, ApiError> {
        let user = self
            .store
            .user_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        Ok(PublicUser::from(&user))
    }

    fn issue_token(&self, user: &User) -> Result<String, ApiError> {
        let claims = Claims::new(user.id, user.role);
        let token = auth::generate_jwt(&claims, &config::config().security.jwt_secret)?;
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use axum::http::StatusCode;

    fn service() -> AuthService {
        AuthService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn register_then_login() {
        let service = service();
        let registered = service
            .register(
                "Maeve".into(),
                "maeve@studio.test".into(),
                "chaise-longue".into(),
                Some(Role::Designer),
            )
            .await
            .unwrap();
        assert_eq!(registered.user.role, Role::Designer);
        assert!(!registered.token.is_empty());

        let logged_in = service
            .login("maeve@studio.test", "chaise-longue")
            .await
            .unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);
    }

    #[tokio::test]
    async fn role_defaults_to_client() {
        let service = service();
        let registered = service
            .register("C".into(), "c@studio.test".into(), "pw-123456".into(), None)
            .await
            .unwrap();
        assert_eq!(registered.user.role, Role::Client);
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let service = service();
        service
            .register("A".into(), "a@studio.test".into(), "pw-123456".into(), None)
            .await
            .unwrap();
        let err = service
            .register("B".into(), "a@studio.test".into(), "pw-654321".into(), None)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn bad_password_and_unknown_email_fail_identically() {
        let service = service();
        service
            .register("A".into(), "a@studio.test".into(), "pw-123456".into(), None)
            .await
            .unwrap();

        let wrong_pw = service.login("a@studio.test", "wrong").await.unwrap_err();
        let no_user = service.login("ghost@studio.test", "wrong").await.unwrap_err();
        assert_eq!(wrong_pw.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(wrong_pw.message(), no_user.message());
    }

    #[tokio::test]
    async fn current_user_of_removed_account_is_not_found() {
        let service = service();
        let err = service.current_user(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
