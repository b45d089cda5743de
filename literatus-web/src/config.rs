//! literatus-web specific configuration

use std::net::SocketAddr;
use std::path::PathBuf;

/// Web service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub port: u16,
    /// Base URL of the Google Books volumes API (overridable for tests)
    pub lookup_base_url: String,
}

impl Config {
    /// Listen address for the HTTP server (all interfaces, configured port)
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::GOOGLE_BOOKS_BASE_URL;

    #[test]
    fn test_bind_addr_uses_configured_port() {
        let config = Config {
            db_path: PathBuf::from("literatus.db"),
            port: 5750,
            lookup_base_url: GOOGLE_BOOKS_BASE_URL.to_string(),
        };
        assert_eq!(config.bind_addr().port(), 5750);
        assert!(config.bind_addr().ip().is_unspecified());
        assert!(config.lookup_base_url.starts_with("https://www.googleapis.com"));
    }
}
