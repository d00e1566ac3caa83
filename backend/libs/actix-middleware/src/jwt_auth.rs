use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::StatusCode,
    Error, HttpMessage, HttpRequest, HttpResponse, ResponseError,
};
use crypto_core::jwt::JwtSigner;
use futures::future::{ready, Ready};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use uuid::Uuid;

/// Cookie carrying the session token
pub const TOKEN_COOKIE: &str = "token";

/// Identity claimed by a valid session token
///
/// The role is the one recorded when the token was issued; services that
/// authorize on it should re-read the account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: String,
}

/// Authentication failures, rendered with the service error envelope
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Not authorized to access this route")]
    Unauthenticated,
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "error": self.to_string(),
        }))
    }
}

/// JWT Authentication Middleware
///
/// Resolves the token from `Authorization: Bearer <token>` or, failing that, the
/// `token` cookie. A valid token inserts an [`Actor`] into request extensions; a
/// missing or invalid token lets the request through without one, so routes opt
/// in to authentication by extracting `Actor`.
#[derive(Clone)]
pub struct JwtAuthMiddleware {
    signer: Arc<JwtSigner>,
}

impl JwtAuthMiddleware {
    pub fn new(signer: Arc<JwtSigner>) -> Self {
        Self { signer }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
            signer: self.signer.clone(),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
    signer: Arc<JwtSigner>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let signer = self.signer.clone();

        Box::pin(async move {
            if let Some(token) = extract_token(req.request()) {
                match signer.validate(&token) {
                    Ok(claims) => match claims.user_id() {
                        Ok(id) => {
                            req.extensions_mut().insert(Actor {
                                id,
                                role: claims.role,
                            });
                        }
                        Err(e) => tracing::warn!("Malformed subject in token: {}", e),
                    },
                    Err(e) => tracing::debug!("JWT validation failed: {}", e),
                }
            }

            service.call(req).await
        })
    }
}

/// Bearer header first, then the `token` cookie
fn extract_token(req: &HttpRequest) -> Option<String> {
    let from_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .filter(|value| value.starts_with("Bearer"))
        .and_then(|value| value.split_whitespace().nth(1))
        .map(str::to_string);

    from_header.or_else(|| req.cookie(TOKEN_COOKIE).map(|c| c.value().to_string()))
}

/// FromRequest implementation for Actor
impl actix_web::FromRequest for Actor {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<Actor>() {
            Some(actor) => ready(Ok(actor.clone())),
            None => ready(Err(AuthError::Unauthenticated)),
        }
    }
}
