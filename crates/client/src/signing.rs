use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use md5::{Digest, Md5};
use serde::Serialize;

/// Fields covered by the request signature, in wire order.
#[derive(Debug, Clone, Serialize)]
pub struct SignedFields<'a> {
    pub address: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<&'a str>,
}

/// Request body: the signed fields plus `sign`.
#[derive(Debug, Clone, Serialize)]
pub struct ActionBody {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    pub sign: String,
}

impl ActionBody {
    pub fn new(address: &str, task: Option<&str>, secret: &str) -> Result<Self> {
        let sign = compute_sign(&SignedFields { address, task }, secret)?;
        Ok(Self {
            address: address.to_string(),
            task: task.map(ToString::to_string),
            sign,
        })
    }
}

/// Uppercase hex MD5 of the compact JSON of `payload` followed by `secret`.
pub fn compute_sign<T: Serialize>(payload: &T, secret: &str) -> Result<String> {
    let serialized =
        serde_json::to_string(payload).context("failed to serialize signed payload")?;
    let mut hasher = Md5::new();
    hasher.update(serialized.as_bytes());
    hasher.update(secret.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02X}", byte);
    }
    Ok(out)
}

/// Authorization token: base64 of `wallet:user_agent`.
pub fn derive_token(wallet: &str, user_agent: &str) -> String {
    BASE64_STANDARD.encode(format!("{}:{}", wallet, user_agent))
}
