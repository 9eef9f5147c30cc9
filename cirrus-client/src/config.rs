use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn scheme(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

/// Endpoint of one firmware WebDAV server. Immutable once the client is
/// built; several clients with different configurations may coexist.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClientConfig {
    pub protocol: Protocol,
    pub host: String,
    /// Omitted: the scheme default (80/443) applies.
    pub port: Option<u16>,
    #[serde(default)]
    pub auth: Option<BasicAuth>,
    /// Trust the router's self-signed certificate.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl ClientConfig {
    pub fn new(protocol: Protocol, host: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            protocol,
            host: host.into(),
            port,
            auth: None,
            accept_invalid_certs: false,
        }
    }

    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(BasicAuth {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// `protocol://host[:port]`, no trailing slash
    pub fn base_url(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{}", self.protocol.scheme(), self.host, port),
            None => format!("{}://{}", self.protocol.scheme(), self.host),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.host.is_empty() {
            return Err(Error::Usage("empty host in client configuration".into()));
        }
        if self.host.contains('/') || self.host.contains(' ') {
            return Err(Error::Usage(format!(
                "invalid host in client configuration: {:?}",
                self.host
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_with_and_without_port() {
        let cfg = ClientConfig::new(Protocol::Https, "router.local", Some(8443));
        assert_eq!(cfg.base_url(), "https://router.local:8443");

        let cfg = ClientConfig::new(Protocol::Http, "192.168.1.1", None);
        assert_eq!(cfg.base_url(), "http://192.168.1.1");
    }

    #[test]
    fn rejects_malformed_host() {
        let cfg = ClientConfig::new(Protocol::Http, "", None);
        assert!(cfg.validate().is_err());

        let cfg = ClientConfig::new(Protocol::Http, "host/with/path", None);
        assert!(cfg.validate().is_err());
    }
}
