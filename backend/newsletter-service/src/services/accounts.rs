/// Account service - registration, login, profile updates and user administration
use crate::domain::{NewUser, Role, User, UserChanges};
use crate::error::{AppError, Result};
use crate::repository::Store;
use crate::services::password::{hash_password, verify_password};
use chrono::NaiveDate;
use crypto_core::JwtSigner;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const NOT_AUTHORIZED: &str = "Not authorized to access this route";

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Please add your first name"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Please add your sur name"))]
    pub sur_name: String,
    #[validate(length(min = 1, max = 50, message = "Please add a nickname"))]
    pub nickname: String,
    #[validate(email(message = "Please add a valid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateDetailsRequest {
    #[validate(length(min = 1, message = "First name cannot be empty"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, message = "Sur name cannot be empty"))]
    pub sur_name: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Nickname cannot be empty"))]
    pub nickname: Option<String>,
    #[validate(email(message = "Please add a valid email"))]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,
}

/// Admin-side user creation; same rules as registration plus role/profile fields
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateUserRequest {
    #[serde(flatten)]
    pub account: RegisterRequest,
    pub role: Option<Role>,
    pub age: Option<NaiveDate>,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateUserRequest {
    #[serde(flatten)]
    pub details: UpdateDetailsRequest,
    pub role: Option<Role>,
    pub age: Option<NaiveDate>,
    pub profile_picture: Option<String>,
    /// Present only to be refused; passwords change through the auth routes
    pub password: Option<String>,
}

/// A user together with a freshly issued session token
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

impl UpdateDetailsRequest {
    fn normalized(self) -> Self {
        Self {
            first_name: trimmed(self.first_name),
            sur_name: trimmed(self.sur_name),
            nickname: trimmed(self.nickname),
            email: trimmed(self.email),
        }
    }
}

impl RegisterRequest {
    fn normalized(self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            sur_name: self.sur_name.trim().to_string(),
            nickname: self.nickname.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password,
        }
    }
}

#[derive(Clone)]
pub struct AccountService {
    store: Store,
    signer: Arc<JwtSigner>,
}

impl AccountService {
    pub fn new(store: Store, signer: Arc<JwtSigner>) -> Self {
        Self { store, signer }
    }

    pub fn issue_token(&self, user: &User) -> Result<String> {
        Ok(self.signer.issue(user.id, user.role.as_str())?)
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<Session> {
        let user = self
            .insert_account(req, Role::User, None, String::new())
            .await?;
        let token = self.issue_token(&user)?;

        info!(user_id = %user.id, "user registered");
        Ok(Session { user, token })
    }

    pub async fn login(&self, req: LoginRequest) -> Result<Session> {
        let (email, password) = match (trimmed(req.email), req.password) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                (email, password)
            }
            _ => {
                return Err(AppError::ValidationError(
                    "Please provide an email and a password".to_string(),
                ))
            }
        };

        let user = self
            .store
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(&password, &user.password_hash)? {
            warn!(user_id = %user.id, "login rejected: wrong password");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let token = self.issue_token(&user)?;
        Ok(Session { user, token })
    }

    /// Load the account a session token points at. Deleted accounts no longer
    /// authenticate; the role comes from the stored row, not the token.
    pub async fn authenticate(&self, user_id: Uuid) -> Result<User> {
        self.store
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized(NOT_AUTHORIZED.to_string()))
    }

    pub async fn update_details(&self, actor: Uuid, req: UpdateDetailsRequest) -> Result<User> {
        let req = req.normalized();
        req.validate()?;

        let changes = UserChanges {
            first_name: req.first_name,
            sur_name: req.sur_name,
            nickname: req.nickname,
            email: req.email,
            ..UserChanges::default()
        };

        self.store
            .users
            .update(actor, changes)
            .await?
            .ok_or_else(|| AppError::not_found("User", actor))
    }

    /// Change the actor's password and issue a new token
    pub async fn update_password(&self, actor: Uuid, req: UpdatePasswordRequest) -> Result<Session> {
        let user = self.get_user(actor).await?;

        if !verify_password(&req.current_password, &user.password_hash)? {
            return Err(AppError::Unauthorized("Password is incorrect".to_string()));
        }
        req.validate()?;

        let hash = hash_password(&req.new_password)?;
        if !self.store.users.update_password(actor, &hash).await? {
            return Err(AppError::not_found("User", actor));
        }

        let token = self.issue_token(&user)?;
        info!(user_id = %actor, "password updated");
        Ok(Session { user, token })
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.store.users.list().await
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User> {
        self.store
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User", id))
    }

    pub async fn create_user(&self, req: CreateUserRequest) -> Result<User> {
        let user = self
            .insert_account(
                req.account,
                req.role.unwrap_or_default(),
                req.age,
                req.profile_picture.unwrap_or_default(),
            )
            .await?;
        info!(user_id = %user.id, role = %user.role, "user created by admin");
        Ok(user)
    }

    pub async fn update_user(&self, id: Uuid, req: UpdateUserRequest) -> Result<User> {
        if req.password.is_some() {
            return Err(AppError::ValidationError(
                "Passwords cannot be changed through this route".to_string(),
            ));
        }
        let details = req.details.normalized();
        details.validate()?;

        let changes = UserChanges {
            first_name: details.first_name,
            sur_name: details.sur_name,
            nickname: details.nickname,
            email: details.email,
            role: req.role,
            age: req.age,
            profile_picture: req.profile_picture,
        };

        self.store
            .users
            .update(id, changes)
            .await?
            .ok_or_else(|| AppError::not_found("User", id))
    }

    /// Delete an account. Posts and comments by the user are left in place.
    pub async fn delete_user(&self, id: Uuid) -> Result<()> {
        if !self.store.users.delete(id).await? {
            return Err(AppError::not_found("User", id));
        }
        info!(user_id = %id, "user deleted");
        Ok(())
    }

    async fn insert_account(
        &self,
        req: RegisterRequest,
        role: Role,
        age: Option<NaiveDate>,
        profile_picture: String,
    ) -> Result<User> {
        let req = req.normalized();
        req.validate()?;

        let password_hash = hash_password(&req.password)?;
        self.store
            .users
            .insert(NewUser {
                first_name: req.first_name,
                sur_name: req.sur_name,
                nickname: req.nickname,
                email: req.email,
                password_hash,
                role,
                age,
                profile_picture,
            })
            .await
    }
}
