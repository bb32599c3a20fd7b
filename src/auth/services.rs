use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;
use tracing::{info, warn};

use super::{
    dto::{normalize_email, LoginRequest, PublicUser, RegisterRequest, TokenResponse},
    jwt::JwtKeys,
    password::{spawn_hash, spawn_verify, spawn_verify_dummy},
    repo::{RepoError, UserRepo},
    repo_types::NewUser,
};
use crate::{error::AuthError, state::AppState};

/// Credential verification and token issuance.
#[derive(Clone)]
pub struct CredentialService {
    users: Arc<dyn UserRepo>,
    keys: JwtKeys,
}

impl FromRef<AppState> for CredentialService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.users.clone(), state.keys.clone())
    }
}

impl From<RepoError> for AuthError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::DuplicateEmail => AuthError::DuplicateEmail,
            RepoError::Database(e) => {
                AuthError::Internal(anyhow::Error::new(e).context("user store"))
            }
        }
    }
}

impl CredentialService {
    pub fn new(users: Arc<dyn UserRepo>, keys: JwtKeys) -> Self {
        Self { users, keys }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<TokenResponse, AuthError> {
        let RegisterRequest {
            email,
            password,
            name,
            surname,
        } = req;
        let email = normalize_email(&email);
        let password_hash = spawn_hash(password).await?;

        let user = self
            .users
            .create(NewUser {
                email,
                password_hash,
                name: name.unwrap_or_default(),
                surname: surname.unwrap_or_default(),
            })
            .await?;

        let token = self.keys.sign(user.id).context("jwt sign failed")?;
        info!(user_id = %user.id, "user registered");
        Ok(TokenResponse { token })
    }

    pub async fn login(&self, req: LoginRequest) -> Result<TokenResponse, AuthError> {
        let email = normalize_email(&req.email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            // same argon2 cost as a real mismatch
            spawn_verify_dummy(req.password).await;
            warn!("login unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !spawn_verify(req.password, user.password_hash.clone()).await? {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.keys.sign(user.id).context("jwt sign failed")?;
        info!(user_id = %user.id, "user logged in");
        Ok(TokenResponse { token })
    }

    /// Profile of the token's subject. A subject that no longer exists is unauthorized.
    pub async fn profile(&self, user_id: uuid::Uuid) -> Result<PublicUser, AuthError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::Unauthorized("user not found"))?;
        Ok(PublicUser {
            id: user.id,
            email: user.email,
            name: user.name,
            surname: user.surname,
        })
    }
}
