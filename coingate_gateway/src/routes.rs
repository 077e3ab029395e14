//! Request handler definitions
//!
//! Define each route and its handler here. The handlers are thin: validation and the mapping of upstream failures
//! live in [`OrderGateway`], and authentication lives in the middleware that wraps each route.
//!
//! Handlers must not block the worker thread. Each actix worker processes its requests sequentially, so anything that
//! waits on I/O (every call to CoinGate, for instance) has to be awaited rather than run synchronously.
use actix_web::{get, web, HttpMessage, HttpRequest, HttpResponse, Responder};
use cgw_common::{truncate_for_log, LOG_BODY_LIMIT};
use log::*;

use crate::{
    data_objects::{CreateOrderRequest, JsonResponse},
    errors::ServerError,
    middleware::CallbackSource,
    order_gateway::OrderGateway,
    traits::OrderManagement,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "" impl OrderManagement);
/// Route handler for creating a CoinGate order.
///
/// The body must contain `order_id`, `amount` and `currency`. `cancel_url`, `success_url`, `title` and `description`
/// are optional and are passed on to CoinGate if present. The callback URL is always the gateway's own.
///
/// On success, CoinGate's representation of the new order is returned as-is with a 201 status.
pub async fn create_order<B: OrderManagement>(
    body: web::Bytes,
    gateway: web::Data<OrderGateway<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received create order request");
    let request = CreateOrderRequest::from_body(&body).map_err(|e| {
        debug!("💻️ Could not parse create order request. {e}");
        e
    })?;
    let order = gateway.create_order(request).await?;
    Ok(HttpResponse::Created().json(order))
}

route!(retrieve_order => Get "/{id}" impl OrderManagement);
pub async fn retrieve_order<B: OrderManagement>(
    path: web::Path<String>,
    gateway: web::Data<OrderGateway<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ GET order {id}");
    let order = gateway.retrieve_order(&id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(cancel_order => Post "/{id}/cancel" impl OrderManagement);
pub async fn cancel_order<B: OrderManagement>(
    path: web::Path<String>,
    gateway: web::Data<OrderGateway<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ Cancel order {id}");
    let order = gateway.cancel_order(&id).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Callback  ----------------------------------------------------
/// Route handler for CoinGate payment callbacks.
///
/// The callback gate has already checked the sender's address by the time this runs. The payload is not validated
/// and nothing is done with it beyond logging; every callback that gets this far is acknowledged.
pub async fn order_callback(req: HttpRequest, body: web::Bytes) -> HttpResponse {
    let payload = String::from_utf8_lossy(&body);
    let source = callback_source(&req);
    info!("💸️ Received CoinGate callback from {source}: {}", truncate_for_log(&payload, LOG_BODY_LIMIT));
    HttpResponse::Ok().json(JsonResponse::success("Callback received"))
}

/// The address the callback gate admitted this request from. This is the forwarded address when the server sits
/// behind a trusted proxy, not the proxy's own.
pub fn callback_source(req: &HttpRequest) -> String {
    req.extensions().get::<CallbackSource>().map(|s| s.0.to_string()).unwrap_or_else(|| "unknown".into())
}
