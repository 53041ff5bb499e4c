use url::Url;

pub const DEFAULT_PORT: u16 = 11434;
pub const DEFAULT_HOST: &str = "http://127.0.0.1:11434";

/// Normalizes a user supplied host into `scheme://hostname:port[/path]`.
///
/// Without a scheme the port defaults to [`DEFAULT_PORT`]; with one it
/// defaults to the scheme's well-known port. A bare `:port` points at the
/// loopback address. The result never ends with a slash.
pub fn format_host(host: &str) -> String {
    let host = host.trim();
    if host.is_empty() {
        return DEFAULT_HOST.to_string();
    }

    let mut explicit_scheme = host.contains("://");
    let mut candidate = host.to_string();
    if candidate.starts_with(':') {
        candidate = format!("http://127.0.0.1{candidate}");
        explicit_scheme = true;
    }
    if !explicit_scheme {
        candidate = format!("http://{candidate}");
    }

    let Ok(url) = Url::parse(&candidate) else {
        tracing::warn!(host = %host, "could not parse host, using it verbatim");
        return candidate.trim_end_matches('/').to_string();
    };

    // `Url::port` is `None` when the port equals the scheme's default, so
    // `example.com:80` ends up on 11434 like any scheme-less host.
    let port = url.port().unwrap_or(if !explicit_scheme {
        DEFAULT_PORT
    } else if url.scheme() == "https" {
        443
    } else {
        80
    });

    let formatted = format!(
        "{}://{}:{}{}",
        url.scheme(),
        url.host_str().unwrap_or("127.0.0.1"),
        port,
        url.path()
    );
    formatted.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_uses_default() {
        assert_eq!(format_host(""), "http://127.0.0.1:11434");
    }

    #[test]
    fn bare_port_expands_to_loopback() {
        assert_eq!(format_host(":9999"), "http://127.0.0.1:9999");
    }

    #[test]
    fn scheme_picks_well_known_port() {
        assert_eq!(format_host("https://example.com"), "https://example.com:443");
        assert_eq!(format_host("http://example.com"), "http://example.com:80");
    }

    #[test]
    fn no_scheme_uses_ollama_port() {
        assert_eq!(format_host("example.com"), "http://example.com:11434");
        assert_eq!(format_host("1.2.3.4"), "http://1.2.3.4:11434");
    }

    #[test]
    fn explicit_port_and_path_are_kept() {
        assert_eq!(format_host("example.com:56789"), "http://example.com:56789");
        assert_eq!(
            format_host("https://example.com:8443/ollama/"),
            "https://example.com:8443/ollama"
        );
    }

    #[test]
    fn scheme_default_port_without_scheme_is_replaced() {
        assert_eq!(format_host("example.com:80"), "http://example.com:11434");
        assert_eq!(format_host("http://example.com:80"), "http://example.com:80");
        assert_eq!(format_host("https://example.com:443"), "https://example.com:443");
    }
}
