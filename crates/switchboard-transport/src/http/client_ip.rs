//! Client address and query-string extraction.

use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderMap;
use serde_json::{Map, Value};

const REAL_IP: &str = "x-real-ip";
const FORWARDED_FOR: &str = "x-forwarded-for";

fn parses_as_ip(candidate: &str) -> bool {
    candidate.parse::<IpAddr>().is_ok()
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Resolves the client IP.
///
/// Order: `X-Real-IP`, then the first valid entry of `X-Forwarded-For`, then
/// the peer address. Returns an empty string when nothing resolves.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(real) = header(headers, REAL_IP).map(str::trim)
        && parses_as_ip(real)
    {
        return real.to_string();
    }

    if let Some(forwarded) = header(headers, FORWARDED_FOR)
        && let Some(first) = forwarded.split(',').map(str::trim).find(|ip| parses_as_ip(ip))
    {
        return first.to_string();
    }

    peer.map(|addr| addr.ip().to_string()).unwrap_or_default()
}

/// Converts a raw query string into `{name: [values...]}`.
///
/// Repeated names keep every value in order. A missing query yields `{}`.
pub fn query_map(query: Option<&str>) -> Value {
    let mut params: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    for (name, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
        params
            .entry(name.into_owned())
            .or_default()
            .push(Value::String(value.into_owned()));
    }

    Value::Object(
        params
            .into_iter()
            .map(|(name, values)| (name, Value::Array(values)))
            .collect::<Map<_, _>>(),
    )
}
