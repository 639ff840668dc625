use crate::models::RouteSpec;
use edgeproxy_errors::{ProxyError, Result};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Environment variable holding extra `name.scheme://host:port` routes.
pub const ADD_PROXY_ROUTE: &str = "ADD_PROXY_ROUTE";

pub type RouteMap = BTreeMap<String, RouteSpec>;

/// Parse a comma separated list of `name.scheme://host:port` entries.
/// Any malformed entry fails the whole batch.
pub fn parse_additional_routes(raw: &str) -> Result<RouteMap> {
    let mut routes = RouteMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let spec = parse_entry(entry)?;
        if routes.contains_key(&spec.name) {
            warn!(name = %spec.name, "duplicate additional route, keeping first");
            continue;
        }
        routes.insert(spec.name.clone(), spec);
    }
    Ok(routes)
}

fn parse_entry(entry: &str) -> Result<RouteSpec> {
    let (name, raw_url) = entry
        .split_once('.')
        .ok_or_else(|| ProxyError::parse(entry, "expected `name.scheme://host:port`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(ProxyError::parse(entry, "empty service name"));
    }

    let parsed = url::Url::parse(raw_url).map_err(|e| ProxyError::parse(entry, e.to_string()))?;
    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ProxyError::parse(entry, "empty host"))?;
    let port = match parsed.port() {
        Some(port) => port,
        // the parser drops a port equal to the scheme default
        None if has_explicit_port(raw_url) => parsed
            .port_or_known_default()
            .ok_or_else(|| ProxyError::parse(entry, "missing port"))?,
        None => return Err(ProxyError::parse(entry, "missing port")),
    };

    Ok(RouteSpec::new(name, parsed.scheme(), host, port))
}

/// True when the authority of `raw_url` spells out a numeric port.
fn has_explicit_port(raw_url: &str) -> bool {
    let Some((_, rest)) = raw_url.split_once("://") else {
        return false;
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    let host_port = host_port.rsplit_once(']').map_or(host_port, |(_, p)| p);
    match host_port.rsplit_once(':') {
        Some((_, port)) => !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// Static routes win on name collision; additional ones fill the gaps.
pub fn merge_routes_with(static_routes: &RouteMap, additional: RouteMap) -> RouteMap {
    if additional.is_empty() {
        return static_routes.clone();
    }
    if static_routes.is_empty() {
        return additional;
    }
    let mut merged = static_routes.clone();
    for (name, spec) in additional {
        if merged.contains_key(&name) {
            info!(%name, "route already configured statically, skipping additional entry");
            continue;
        }
        merged.insert(name, spec);
    }
    merged
}

/// Static routes merged with the raw `ADD_PROXY_ROUTE` value. A parse
/// failure drops only the additional contribution.
pub fn effective_routes(static_routes: &RouteMap, raw_additional: Option<&str>) -> RouteMap {
    let additional = match raw_additional.map(parse_additional_routes) {
        Some(Ok(routes)) => routes,
        Some(Err(e)) => {
            warn!(error = %e, "ignoring {}", ADD_PROXY_ROUTE);
            RouteMap::new()
        }
        None => RouteMap::new(),
    };
    merge_routes_with(static_routes, additional)
}
