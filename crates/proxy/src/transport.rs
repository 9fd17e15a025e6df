use anyhow::{Context, Result};
use reqwest::{Client, Proxy};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use super::{ProxyProtocol, ProxyRecord};

/// An HTTP client bound to one outbound proxy.
pub trait ProxyTransport: Debug + Send + Sync {
    fn protocol(&self) -> ProxyProtocol;
    fn proxy_url(&self) -> &str;
    fn client(&self) -> &Client;
}

#[derive(Debug)]
pub struct SocksTransport {
    url: String,
    client: Client,
}

impl SocksTransport {
    pub fn new(record: &ProxyRecord, timeout: Duration) -> Result<Self> {
        let url = record.url();
        let client = proxied_client(&url, timeout)?;
        Ok(Self { url, client })
    }
}

impl ProxyTransport for SocksTransport {
    fn protocol(&self) -> ProxyProtocol {
        ProxyProtocol::Socks5
    }

    fn proxy_url(&self) -> &str {
        &self.url
    }

    fn client(&self) -> &Client {
        &self.client
    }
}

#[derive(Debug)]
pub struct HttpProxyTransport {
    url: String,
    client: Client,
}

impl HttpProxyTransport {
    pub fn new(record: &ProxyRecord, timeout: Duration) -> Result<Self> {
        let url = record.url();
        let client = proxied_client(&url, timeout)?;
        Ok(Self { url, client })
    }
}

impl ProxyTransport for HttpProxyTransport {
    fn protocol(&self) -> ProxyProtocol {
        ProxyProtocol::Http
    }

    fn proxy_url(&self) -> &str {
        &self.url
    }

    fn client(&self) -> &Client {
        &self.client
    }
}

pub fn build_transport(record: &ProxyRecord, timeout: Duration) -> Result<Arc<dyn ProxyTransport>> {
    let transport: Arc<dyn ProxyTransport> = match record.protocol {
        ProxyProtocol::Socks5 => Arc::new(SocksTransport::new(record, timeout)?),
        ProxyProtocol::Http => Arc::new(HttpProxyTransport::new(record, timeout)?),
    };
    Ok(transport)
}

fn proxied_client(proxy_url: &str, timeout: Duration) -> Result<Client> {
    let proxy = Proxy::all(proxy_url)
        .with_context(|| format!("invalid proxy url {}", proxy_url))?;
    Client::builder()
        .proxy(proxy)
        .timeout(timeout)
        .build()
        .with_context(|| format!("failed to build reqwest client for proxy {}", proxy_url))
}
