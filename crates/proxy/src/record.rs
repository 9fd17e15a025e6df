use anyhow::{anyhow, Context, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyProtocol {
    Socks5,
    Http,
}

impl ProxyProtocol {
    /// `socks5` (any case) selects SOCKS; everything else, including a missing
    /// tag, selects HTTP proxying.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("socks5") {
            Self::Socks5
        } else {
            Self::Http
        }
    }

    pub fn scheme(self) -> &'static str {
        match self {
            Self::Socks5 => "socks5",
            Self::Http => "http",
        }
    }
}

/// `host:port:protocol` entry from the proxy list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyRecord {
    pub raw: String,
    pub host: String,
    pub port: u16,
    pub protocol: ProxyProtocol,
}

impl ProxyRecord {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let mut parts = raw.split(':');
        let host = parts.next().map(str::trim).unwrap_or_default();
        if host.is_empty() {
            return Err(anyhow!("proxy {:?} has no host", raw));
        }
        let port = parts
            .next()
            .map(str::trim)
            .ok_or_else(|| anyhow!("proxy {:?} has no port", raw))?
            .parse::<u16>()
            .with_context(|| format!("proxy {:?} has an invalid port", raw))?;
        let protocol = ProxyProtocol::parse(parts.next().unwrap_or_default());
        Ok(Self {
            raw: raw.to_string(),
            host: host.to_string(),
            port,
            protocol,
        })
    }

    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol.scheme(), self.host, self.port)
    }
}

impl fmt::Display for ProxyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
