use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{self, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorInternalServerError,
    web,
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

use crate::bearer_token;
use crate::services::tokens::TokenService;

/// Guards a scope with the rotation pair instead of the access secret.
///
/// Tokens signed with either the current or the previous transition secret
/// pass; the verified claims land in request extensions for the handlers
/// behind the scope. Anything else is answered with 401 before the handler
/// runs.
pub struct TokenTransition;

impl<S, B> Transform<S, ServiceRequest> for TokenTransition
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = TokenTransitionMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TokenTransitionMiddleware { service }))
    }
}

pub struct TokenTransitionMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for TokenTransitionMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let tokens = match req.app_data::<web::Data<TokenService>>() {
            Some(tokens) => tokens.clone(),
            None => {
                return Box::pin(async {
                    Err(ErrorInternalServerError("Token service not found"))
                });
            }
        };

        let verified = bearer_token(req.headers())
            .ok_or(())
            .and_then(|token| tokens.verify_transitional(token).map_err(|_| ()));

        match verified {
            Ok(user) => {
                req.extensions_mut().insert(user);
                let fut = self.service.call(req);

                Box::pin(async move {
                    let res = fut.await?;
                    Ok(res.map_into_left_body())
                })
            }
            Err(()) => {
                let (req_parts, _) = req.into_parts();
                let response = HttpResponse::Unauthorized().finish().map_into_right_body();

                Box::pin(async move { Ok(ServiceResponse::new(req_parts, response)) })
            }
        }
    }
}
