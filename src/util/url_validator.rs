use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;
use url::{Host, Url};

/// Reasons an article link is refused before being handed to the browser.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum UrlValidationError {
    #[error("Invalid article URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Refusing to open '{0}:' URL (only http/https)")]
    UnsupportedScheme(String),
    #[error("Refusing to open article URL without a host")]
    MissingHost,
    #[error("Refusing to open local or private address: {0}")]
    LocalAddress(String),
}

/// Validate an upstream article URL before passing it to `open::that`.
///
/// Article links are third-party data. Only `http`/`https` URLs pointing at
/// public hosts are opened. Refused: other schemes, `localhost` (with or
/// without a trailing dot), loopback, private, link-local, CGNAT
/// (`100.64.0.0/10`), unique-local IPv6, and IPv4-mapped IPv6 forms of any
/// of these.
pub fn validate_url_for_open(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    let ip = match url.host() {
        None => return Err(UrlValidationError::MissingHost),
        Some(Host::Domain(domain)) => {
            let bare = domain.strip_suffix('.').unwrap_or(domain);
            if bare.eq_ignore_ascii_case("localhost") {
                return Err(UrlValidationError::LocalAddress(domain.to_owned()));
            }
            return Ok(url);
        }
        Some(Host::Ipv4(v4)) => IpAddr::V4(v4),
        Some(Host::Ipv6(v6)) => IpAddr::V6(v6),
    };

    if is_local_ip(&ip) {
        return Err(UrlValidationError::LocalAddress(ip.to_string()));
    }
    Ok(url)
}

fn is_local_v4(v4: &Ipv4Addr) -> bool {
    let [a, b, ..] = v4.octets();
    v4.is_private()
        || v4.is_loopback()
        || v4.is_link_local()
        || v4.is_unspecified()
        || (a == 100 && (b & 0xc0) == 64) // CGNAT 100.64.0.0/10
}

fn is_local_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_local_v4(v4),
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_local_v4(&v4);
            }
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00 // unique local
                || (first & 0xffc0) == 0xfe80 // link local
        }
    }
}
