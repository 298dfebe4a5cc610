use std::rc::Rc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::token::{Claims, TokenIssuer};
use crate::error::AppError;
use crate::models::Role;

/// Paths under the API prefix that are reachable without an access token.
const PUBLIC_PATHS: [&str; 3] = ["/api/v1/signup", "/api/v1/signin", "/api/v1/refresh"];

type MiddlewareFuture<B> = LocalBoxFuture<'static, Result<ServiceResponse<EitherBody<B>>, Error>>;

fn forward<S, B>(service: &S, req: ServiceRequest) -> MiddlewareFuture<B>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    let fut = service.call(req);
    Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
}

/// Answers with the error envelope without calling the inner service.
fn reject<B: 'static>(req: ServiceRequest, err: AppError) -> MiddlewareFuture<B> {
    let res = req.error_response(err).map_into_right_body();
    Box::pin(async move { Ok(res) })
}

/// Verifies the bearer token and stores its `Claims` in the request extensions.
///
/// The `TokenIssuer` is looked up in app data, so the middleware itself is stateless.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if PUBLIC_PATHS.contains(&req.path()) {
            return forward(&self.service, req);
        }

        let issuer = match req.app_data::<web::Data<TokenIssuer>>().cloned() {
            Some(issuer) => issuer,
            None => {
                let err = AppError::InternalServerError("TokenIssuer is not registered".into());
                return reject(req, err);
            }
        };

        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        let verified = match token {
            Some(token) => issuer.verify(token),
            None => Err(AppError::Unauthorized(
                "invalid or missing access token".into(),
            )),
        };

        match verified {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                forward(&self.service, req)
            }
            Err(app_err) => reject(req, app_err),
        }
    }
}

/// Rejects requests whose access token lacks any of the required roles.
/// Must run inside `AuthMiddleware`.
#[derive(Clone)]
pub struct RoleGuard {
    required: Rc<Vec<Role>>,
}

impl RoleGuard {
    pub fn new(required: &[Role]) -> Self {
        Self {
            required: Rc::new(required.to_vec()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RoleGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RoleGuardService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RoleGuardService {
            service,
            required: self.required.clone(),
        }))
    }
}

pub struct RoleGuardService<S> {
    service: S,
    required: Rc<Vec<Role>>,
}

impl<S, B> Service<ServiceRequest> for RoleGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let allowed = req
            .extensions()
            .get::<Claims>()
            .map(|claims| self.required.iter().all(|role| claims.has_role(*role)))
            .unwrap_or(false);

        if allowed {
            forward(&self.service, req)
        } else {
            let err = AppError::Forbidden("you don't have permission to do this operation".into());
            reject(req, err)
        }
    }
}
