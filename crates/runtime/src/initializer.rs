use anyhow::{anyhow, Result};
use rand::seq::SliceRandom;
use snakebot_client::derive_token;
use snakebot_core_types::Identity;
use tracing::debug;

use crate::context::RunContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletSource {
    Pool,
    /// Pool exhausted; random pick from the full list, duplicates possible.
    Fallback,
}

/// Binds wallet, user agent and token to `identity` in place.
pub fn initialize(ctx: &RunContext, identity: &mut Identity) -> Result<WalletSource> {
    let mut rng = rand::thread_rng();
    let (wallet, source) = match ctx.wallet_pool.pop() {
        Some(wallet) => (wallet, WalletSource::Pool),
        None => {
            let wallet = ctx
                .inputs
                .wallets
                .choose(&mut rng)
                .cloned()
                .ok_or_else(|| anyhow!("no wallets available"))?;
            debug!(
                account = identity.ordinal,
                "wallet pool exhausted, using random wallet"
            );
            (wallet, WalletSource::Fallback)
        }
    };
    let user_agent = ctx
        .inputs
        .user_agents
        .choose(&mut rng)
        .cloned()
        .ok_or_else(|| anyhow!("no user agents available"))?;

    identity.token = derive_token(&wallet, &user_agent);
    identity.wallet = wallet;
    identity.user_agent = user_agent;
    Ok(source)
}
