//! Callback gate middleware for Actix Web.
//!
//! CoinGate callbacks are unauthenticated, so the gate only lets a request through if it comes from an address in the
//! [`AllowlistCache`]. The caller's address is taken from the proxy headers if the server is configured to trust them
//! (see [`get_remote_ip`]), otherwise from the socket.
//!
//! Rejected callbacks get a 401 and are not processed. There are no retries on our side; CoinGate retries failed
//! deliveries itself.

use std::{
    future::{ready, Ready},
    net::IpAddr,
    rc::Rc,
    sync::Arc,
};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use futures::future::LocalBoxFuture;
use log::{info, warn};

use crate::{
    allowlist::{AllowlistCache, Clock},
    errors::ServerError,
    helpers::get_remote_ip,
    traits::CallbackIpSource,
};

/// The caller address the gate admitted a callback from. Stored in the request extensions for the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackSource(pub IpAddr);

pub struct CallbackGate<I, K> {
    allowlist: Arc<AllowlistCache<I, K>>,
    use_x_forwarded_for: bool,
    use_forwarded: bool,
}

impl<I, K> Clone for CallbackGate<I, K> {
    fn clone(&self) -> Self {
        Self {
            allowlist: Arc::clone(&self.allowlist),
            use_x_forwarded_for: self.use_x_forwarded_for,
            use_forwarded: self.use_forwarded,
        }
    }
}

impl<I, K> CallbackGate<I, K>
where
    I: CallbackIpSource,
    K: Clock,
{
    pub fn new(allowlist: Arc<AllowlistCache<I, K>>, use_x_forwarded_for: bool, use_forwarded: bool) -> Self {
        Self { allowlist, use_x_forwarded_for, use_forwarded }
    }

    /// Decides whether a callback from `peer` may proceed. A request without a resolvable address is never admitted.
    pub async fn admit(&self, peer: Option<IpAddr>) -> bool {
        let Some(ip) = peer else {
            warn!("💸️ No IP address found in callback request, denying access.");
            return false;
        };
        if self.allowlist.is_trusted(&ip).await {
            info!("💸️ Callback from {ip} is allowed");
            true
        } else {
            warn!("💸️ Callback from {ip} is not in the allowlist, denying access.");
            false
        }
    }
}

impl<S, B, I, K> Transform<S, ServiceRequest> for CallbackGate<I, K>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    I: CallbackIpSource + 'static,
    K: Clock,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<EitherBody<B>>;
    type Transform = CallbackGateService<S, I, K>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CallbackGateService { gate: self.clone(), service: Rc::new(service) }))
    }
}

pub struct CallbackGateService<S, I, K> {
    gate: CallbackGate<I, K>,
    service: Rc<S>,
}

impl<S, B, I, K> Service<ServiceRequest> for CallbackGateService<S, I, K>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    I: CallbackIpSource + 'static,
    K: Clock,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<EitherBody<B>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let gate = self.gate.clone();
        let peer = get_remote_ip(req.request(), gate.use_x_forwarded_for, gate.use_forwarded);
        Box::pin(async move {
            if gate.admit(peer).await {
                if let Some(ip) = peer {
                    req.extensions_mut().insert(CallbackSource(ip));
                }
                service.call(req).await.map(ServiceResponse::map_into_left_body)
            } else {
                Ok(req.error_response(ServerError::Unauthorized).map_into_right_body())
            }
        })
    }
}
