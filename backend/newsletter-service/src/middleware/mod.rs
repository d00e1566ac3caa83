/// Request-scoped authentication for newsletter-service
///
/// `actix_middleware::JwtAuthMiddleware` only proves that a token is valid.
/// [`CurrentUser`] turns that claim into the stored account, so deleted users
/// lose access immediately and role checks see the current role.
use crate::domain::{Role, User};
use crate::error::AppError;
use crate::state::AppState;
use actix_middleware::{Actor, AuthError};
use actix_web::{dev::Payload, web, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use uuid::Uuid;

/// The authenticated account, loaded from the store on each request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn id(&self) -> Uuid {
        self.0.id
    }

    /// Fail with 403 unless the stored role is one of `roles`
    pub fn require_role(&self, roles: &[Role]) -> Result<(), AppError> {
        if roles.contains(&self.0.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "User role {} is not authorized to access this route",
                self.0.role
            )))
        }
    }
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let actor = req.extensions().get::<Actor>().cloned();
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let actor = actor.ok_or(AuthError::Unauthenticated)?;
            let state = state
                .ok_or_else(|| AppError::Internal("application state is not configured".to_string()))?;
            let user = state.accounts.authenticate(actor.id).await?;
            Ok(CurrentUser(user))
        })
    }
}
