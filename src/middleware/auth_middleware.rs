/// Authentication middleware.
///
/// Extracts the Bearer token from the Authorization header, verifies it,
/// and inserts the typed `Claims` into the request extensions. Handlers
/// receive the authenticated identity as `web::ReqData<Claims>`; no handler
/// ever parses a token itself.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::verify_access_token;
use crate::configuration::AuthSettings;
use crate::error::{AppError, AuthError};

pub struct AuthMiddleware {
    config: AuthSettings,
}

impl AuthMiddleware {
    pub fn new(config: AuthSettings) -> Self {
        Self { config }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            config: self.config.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    config: AuthSettings,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let bearer = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::to_string);

        let token = match bearer {
            Some(token) if !token.is_empty() => token,
            _ => {
                tracing::warn!("Missing or malformed Authorization header");
                return Box::pin(async move {
                    Err(AppError::Auth(AuthError::MissingToken).into())
                });
            }
        };

        // Failures surface as `AppError`, so middleware 401s carry the same
        // response body as every other endpoint. Expired tokens keep their
        // distinct code so clients know to run the refresh flow.
        match verify_access_token(&token, &self.config) {
            Ok(claims) => {
                req.extensions_mut().insert(claims.clone());

                tracing::debug!(user_id = claims.user_id, "Access token accepted");

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => Box::pin(async move { Err(e.into()) }),
        }
    }
}
