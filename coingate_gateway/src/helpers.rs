use std::{net::IpAddr, str::FromStr, sync::LazyLock};

use actix_web::HttpRequest;
use log::{debug, trace};
use regex::Regex;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Get the remote IP address from the request. It uses 3 sources to determine the IP address, in decreasing order
/// of preference:
/// 1. The first address in the `X-Forwarded-For` header, iif `use_x_forwarded_for` is set to true in the configuration.
/// 2. The `for=` field of the `Forwarded` header, iif `use_forwarded` is set to true in the configuration.
/// 3. The peer address from the connection info.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool, use_forwarded: bool) -> Option<IpAddr> {
    let mut result = None;
    if use_x_forwarded_for {
        trace!("Checking X-Forwarded-For header");
        result = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| IpAddr::from_str(s.trim()).ok());
        if let Some(ip) = result {
            debug!("Using X-Forwarded-For header for remote address: {ip}");
        }
    }
    if use_forwarded && result.is_none() {
        trace!("Checking Forwarded header");
        result = req.headers().get("Forwarded").and_then(|v| v.to_str().ok()).and_then(parse_forwarded_for);
        if let Some(ip) = result {
            debug!("Using Forwarded header for remote address: {ip}");
        }
    }
    result.or_else(|| {
        let peer_addr = req.peer_addr();
        trace!("Using Peer address for remote address: {:?}", peer_addr);
        peer_addr.map(|a| a.ip())
    })
}

static FORWARDED_FOR: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r#"(?i)for=(?P<ip>[^;,]+)"#).ok());

/// Extracts the first `for=` address from a `Forwarded` header (RFC 7239). Handles quoted values and bracketed IPv6
/// addresses, with or without a port.
fn parse_forwarded_for(header: &str) -> Option<IpAddr> {
    let raw = FORWARDED_FOR.as_ref()?.captures(header)?.name("ip")?.as_str().trim().trim_matches('"');
    if let Some(rest) = raw.strip_prefix('[') {
        return rest.split(']').next().and_then(|s| IpAddr::from_str(s).ok());
    }
    IpAddr::from_str(raw).ok().or_else(|| raw.rsplit_once(':').and_then(|(ip, _port)| IpAddr::from_str(ip).ok()))
}

/// Constant-time comparison of two secrets.
///
/// Both inputs are hashed to fixed-length SHA-256 digests before being compared, so the timing reveals neither the
/// content nor the length of either input.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let ha = Sha256::digest(a);
    let hb = Sha256::digest(b);
    ha.ct_eq(&hb).into()
}
