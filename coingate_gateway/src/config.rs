use std::{env, net::IpAddr};

use cgw_common::{parse_boolean_flag, Secret};
use chrono::Duration;
use coingate_tools::CoinGateConfig;
use log::*;

const DEFAULT_CGW_HOST: &str = "127.0.0.1";
const DEFAULT_CGW_PORT: u16 = 8370;
const DEFAULT_PUBLIC_PROTOCOL: &str = "https";
const DEFAULT_CALLBACK_IP_TTL: Duration = Duration::hours(24);

/// The path, relative to the public host, that CoinGate delivers payment callbacks to.
pub const CALLBACK_PATH: &str = "/api/v1/orders/callback";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// The shared secret clients must present in the `X-API-Key` header.
    pub proxy_api_key: Secret<String>,
    /// Externally reachable host name (and optional port) of this server. Used to build the callback URL that is sent
    /// to CoinGate with each new order.
    pub public_host: String,
    pub public_protocol: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// How long a fetched callback IP list is trusted for before it is fetched again.
    pub callback_ip_ttl: Duration,
    /// If supplied, callbacks are checked against this fixed list and the list is never fetched from CoinGate.
    pub callback_ip_allowlist: Option<Vec<IpAddr>>,
    pub coingate: CoinGateConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CGW_HOST.to_string(),
            port: DEFAULT_CGW_PORT,
            proxy_api_key: Secret::default(),
            public_host: format!("{DEFAULT_CGW_HOST}:{DEFAULT_CGW_PORT}"),
            public_protocol: DEFAULT_PUBLIC_PROTOCOL.to_string(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            callback_ip_ttl: DEFAULT_CALLBACK_IP_TTL,
            callback_ip_allowlist: None,
            coingate: CoinGateConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, public_host: format!("{host}:{port}"), ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("CGW_HOST").ok().unwrap_or_else(|| DEFAULT_CGW_HOST.into());
        let port = env::var("CGW_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for CGW_PORT. {e} Using the default, {DEFAULT_CGW_PORT}, instead."
                    );
                    DEFAULT_CGW_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_CGW_PORT);
        let proxy_api_key = Secret::new(env::var("CGW_PROXY_API_KEY").ok().unwrap_or_else(|| {
            error!("🪛️ CGW_PROXY_API_KEY is not set. All order requests will be rejected until it is configured.");
            String::default()
        }));
        let public_host = env::var("CGW_PUBLIC_HOST")
            .or_else(|_| env::var("RENDER_EXTERNAL_HOSTNAME"))
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| {
                let fallback = format!("{host}:{port}");
                warn!(
                    "🪛️ CGW_PUBLIC_HOST is not set. CoinGate will be told to send callbacks to {fallback}, which is \
                     probably not reachable from the internet."
                );
                fallback
            });
        let public_protocol = env::var("CGW_PUBLIC_PROTOCOL").ok().unwrap_or_else(|| DEFAULT_PUBLIC_PROTOCOL.into());
        let use_x_forwarded_for = parse_boolean_flag(env::var("CGW_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("CGW_USE_FORWARDED").ok(), false);
        let callback_ip_ttl = configure_callback_ip_ttl();
        let callback_ip_allowlist = env::var("CGW_CALLBACK_IP_ALLOWLIST").ok().and_then(|s| parse_ip_allowlist(&s));
        match &callback_ip_allowlist {
            Some(list) if list.is_empty() => {
                warn!(
                    "🚨️ The callback IP allowlist was configured, but is empty. The server will run, but won't \
                     authorise any CoinGate callbacks."
                );
            },
            None => {
                info!("🪛️ No static callback IP allowlist is set. The list will be fetched from CoinGate.");
            },
            Some(v) => {
                let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
                info!("🪛️ Static callback IP allowlist: {addrs}");
            },
        }
        let coingate = CoinGateConfig::new_from_env_or_default();
        Self {
            host,
            port,
            proxy_api_key,
            public_host,
            public_protocol,
            use_x_forwarded_for,
            use_forwarded,
            callback_ip_ttl,
            callback_ip_allowlist,
            coingate,
        }
    }

    /// The URL CoinGate must call when an order changes status. Any callback URL supplied by a client is ignored in
    /// favour of this one.
    pub fn callback_url(&self) -> String {
        format!("{}://{}{CALLBACK_PATH}", self.public_protocol, self.public_host.trim_end_matches('/'))
    }
}

/// Parses a comma-separated list of IP addresses. Invalid entries are dropped with a warning. Returns `None` if the
/// list is explicitly disabled with "none", "false" or "0".
pub fn parse_ip_allowlist(s: &str) -> Option<Vec<IpAddr>> {
    if ["none", "false", "0"].contains(&s.trim().to_lowercase().as_str()) {
        info!(
            "🪛️ Static callback IP allowlist is disabled. If this is not what you want, set CGW_CALLBACK_IP_ALLOWLIST \
             to a comma-separated list of IP addresses to enable it."
        );
        return None;
    }
    let ip_addrs = s
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            s.parse::<IpAddr>()
                .map_err(|e| warn!("🪛️ Ignoring invalid IP address ({s}) in CGW_CALLBACK_IP_ALLOWLIST: {e}"))
                .ok()
        })
        .collect::<Vec<IpAddr>>();
    Some(ip_addrs)
}

fn configure_callback_ip_ttl() -> Duration {
    match env::var("CGW_CALLBACK_IP_TTL") {
        Ok(s) => parse_callback_ip_ttl(&s).unwrap_or(DEFAULT_CALLBACK_IP_TTL),
        Err(_) => {
            info!(
                "🪛️ CGW_CALLBACK_IP_TTL is not set. Using the default value of {} hrs.",
                DEFAULT_CALLBACK_IP_TTL.num_hours()
            );
            DEFAULT_CALLBACK_IP_TTL
        },
    }
}

/// Parses the callback IP list TTL, in hours. Returns `None` (after logging why) for anything that is not a positive
/// number of hours that a `Duration` can hold.
pub fn parse_callback_ip_ttl(s: &str) -> Option<Duration> {
    let hours = s
        .trim()
        .parse::<i64>()
        .map_err(|e| warn!("🪛️ Invalid configuration value for CGW_CALLBACK_IP_TTL. {e}"))
        .ok()?;
    if hours <= 0 {
        warn!("🪛️ CGW_CALLBACK_IP_TTL must be a positive number of hours. Got {hours}.");
        return None;
    }
    let ttl = Duration::try_hours(hours);
    if ttl.is_none() {
        warn!("🪛️ CGW_CALLBACK_IP_TTL is too large ({hours} hrs). Using the default instead.");
    }
    ttl
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// The subset of the server configuration that the request gates need. The API key is kept wrapped in a [`Secret`] so
/// that it never ends up in a log line.
#[derive(Clone, Debug, Default)]
pub struct ServerOptions {
    pub proxy_api_key: Secret<String>,
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            proxy_api_key: config.proxy_api_key.clone(),
            use_x_forwarded_for: config.use_x_forwarded_for,
            use_forwarded: config.use_forwarded,
        }
    }
}
