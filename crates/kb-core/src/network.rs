//! Client address and server domain resolution.

/// Domain used when no allowed host is configured.
pub const DEFAULT_SERVER_DOMAIN: &str = "http://127.0.0.1:8000/";

/// The subset of request metadata used to identify a client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    /// Raw `X-Forwarded-For` header value.
    pub forwarded_for: Option<String>,
    /// Raw `X-Real-IP` header value.
    pub real_ip: Option<String>,
    /// Peer address of the connection.
    pub remote_addr: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Resolve the client IP address of a request.
///
/// A non-empty `X-Forwarded-For` wins and its last entry is used, then
/// `X-Real-IP`, then the connection's remote address.
pub fn client_ip(meta: &RequestMeta) -> Option<&str> {
    if let Some(forwarded) = non_empty(&meta.forwarded_for) {
        return forwarded.rsplit(',').next().map(str::trim);
    }
    if let Some(real_ip) = non_empty(&meta.real_ip) {
        return Some(real_ip);
    }
    meta.remote_addr.as_deref()
}

/// Pick the server domain: the first allowed host, or `default`.
pub fn server_domain<'a>(allowed_hosts: &'a [String], default: &'a str) -> &'a str {
    allowed_hosts.first().map(String::as_str).unwrap_or(default)
}
