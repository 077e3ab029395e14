use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, guard, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use coingate_tools::CoinGateApi;
use log::info;

use crate::{
    allowlist::{AllowlistCache, Clock, SystemClock},
    config::{ServerConfig, ServerOptions, CALLBACK_PATH},
    errors::ServerError,
    integrations::coingate::CallbackIpProvider,
    middleware::{ApiKeyMiddlewareFactory, CallbackGate},
    order_gateway::OrderGateway,
    routes::{health, order_callback, CancelOrderRoute, CreateOrderRoute, RetrieveOrderRoute},
    traits::{CallbackIpSource, OrderManagement},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let api = CoinGateApi::new(config.coingate.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, api)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, api: CoinGateApi) -> Result<Server, ServerError> {
    let provider = match &config.callback_ip_allowlist {
        Some(ips) => CallbackIpProvider::Static(ips.clone()),
        None => CallbackIpProvider::CoinGate(api.clone()),
    };
    // One cache for the whole process, shared by every worker
    let allowlist = Arc::new(AllowlistCache::new(provider, SystemClock, config.callback_ip_ttl));
    info!("🚀️ Callback IP allowlist will be cached for {}h", allowlist.ttl().num_hours());
    let callback_url = config.callback_url();
    info!("🚀️ CoinGate will send order callbacks to {callback_url}");
    let gateway = web::Data::new(OrderGateway::new(api, callback_url));
    let options = ServerOptions::from_config(&config);
    let srv = HttpServer::new(move || {
        let gateway = gateway.clone();
        let allowlist = Arc::clone(&allowlist);
        let options = options.clone();
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("cgw::access_log"))
            .configure(move |cfg| configure_routes(cfg, gateway, allowlist, &options))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers every route, along with the gates that protect them.
///
/// The callback resource is registered ahead of the orders scope so that CoinGate's callbacks are checked against the
/// IP allowlist only, and never against the API key.
pub fn configure_routes<B, I, K>(
    cfg: &mut web::ServiceConfig,
    gateway: web::Data<OrderGateway<B>>,
    allowlist: Arc<AllowlistCache<I, K>>,
    options: &ServerOptions,
) where
    B: OrderManagement + 'static,
    I: CallbackIpSource + 'static,
    K: Clock,
{
    let callback_gate = CallbackGate::new(allowlist, options.use_x_forwarded_for, options.use_forwarded);
    let callback = web::resource(CALLBACK_PATH)
        .name("order_callback")
        .guard(guard::Post())
        .to(order_callback)
        .wrap(callback_gate);
    let orders_scope = web::scope("/api/v1/orders")
        .wrap(ApiKeyMiddlewareFactory::new(options.proxy_api_key.clone()))
        .service(CreateOrderRoute::<B>::new())
        .service(RetrieveOrderRoute::<B>::new())
        .service(CancelOrderRoute::<B>::new());
    cfg.app_data(gateway).service(health).service(callback).service(orders_scope);
}
