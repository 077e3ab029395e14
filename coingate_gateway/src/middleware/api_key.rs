//! Shared-secret middleware for Actix Web.
//!
//! Internal clients authenticate by sending the shared key in the `X-API-Key` header. The key is compared with the
//! configured `CGW_PROXY_API_KEY` in constant time. If either the header or the configured key is missing, or the two
//! don't match, the request is rejected with a 401 and a generic message.

use std::future::{ready, Ready};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::HeaderValue,
    Error,
};
use cgw_common::Secret;
use futures::future::LocalBoxFuture;
use log::{trace, warn};

use crate::{errors::ServerError, helpers::constant_time_eq};

pub const API_KEY_HEADER: &str = "X-API-Key";

pub struct ApiKeyMiddlewareFactory {
    key: Secret<String>,
}

impl ApiKeyMiddlewareFactory {
    pub fn new(key: Secret<String>) -> Self {
        ApiKeyMiddlewareFactory { key }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<EitherBody<B>>;
    type Transform = ApiKeyMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiKeyMiddlewareService { key: self.key.clone(), service }))
    }
}

pub struct ApiKeyMiddlewareService<S> {
    key: Secret<String>,
    service: S,
}

impl<S, B> Service<ServiceRequest> for ApiKeyMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<EitherBody<B>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        trace!("🔐️ Checking API key for request to {}", req.path());
        if !is_valid_api_key(req.headers().get(API_KEY_HEADER), &self.key) {
            return Box::pin(ready(Ok(req.error_response(ServerError::Unauthorized).map_into_right_body())));
        }
        trace!("🔐️ API key check for request ✅️");
        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}

fn is_valid_api_key(header: Option<&HeaderValue>, expected: &Secret<String>) -> bool {
    if expected.is_empty() {
        warn!("🔐️ CGW_PROXY_API_KEY is not configured. Denying access.");
        return false;
    }
    let Some(supplied) = header else {
        warn!("🔐️ No API key found in request. Denying access.");
        return false;
    };
    let valid = constant_time_eq(supplied.as_bytes(), expected.reveal().as_bytes());
    if !valid {
        warn!("🔐️ Invalid API key found in request. Denying access.");
    }
    valid
}
