use anyhow::{anyhow, Result};
use async_trait::async_trait;
use snakebot_client::ActionClient;
use snakebot_core_types::{ActionKind, ActionOutcome, Identity};
use snakebot_inputs::InputLists;
use snakebot_proxy::{ProxyPool, ProxyRoute, TransportCache};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::context::{RunContext, RunSettings};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub ordinal: usize,
    pub wallet: String,
    pub action: ActionKind,
    pub proxy_host: Option<String>,
}

/// In-memory [`ActionClient`] with scripted replies and a call log.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    delay: Duration,
    failing_accounts: HashSet<usize>,
    panicking_accounts: HashSet<usize>,
    failing_actions: HashSet<ActionKind>,
    rejecting_actions: HashSet<ActionKind>,
    calls: Mutex<Vec<RecordedCall>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedClient {
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_account(mut self, ordinal: usize) -> Self {
        self.failing_accounts.insert(ordinal);
        self
    }

    pub fn panicking_account(mut self, ordinal: usize) -> Self {
        self.panicking_accounts.insert(ordinal);
        self
    }

    pub fn failing_action(mut self, action: ActionKind) -> Self {
        self.failing_actions.insert(action);
        self
    }

    pub fn rejecting_action(mut self, action: ActionKind) -> Self {
        self.rejecting_actions.insert(action);
        self
    }

    pub fn call_log(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("call log").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("call log").len()
    }

    pub fn actions_for(&self, ordinal: usize) -> Vec<ActionKind> {
        self.call_log()
            .into_iter()
            .filter(|call| call.ordinal == ordinal)
            .map(|call| call.action)
            .collect()
    }

    pub fn wallet_for(&self, ordinal: usize) -> Option<String> {
        self.call_log()
            .into_iter()
            .find(|call| call.ordinal == ordinal)
            .map(|call| call.wallet)
    }

    pub fn proxy_hosts(&self) -> Vec<Option<String>> {
        self.call_log()
            .into_iter()
            .map(|call| call.proxy_host)
            .collect()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActionClient for ScriptedClient {
    async fn perform(
        &self,
        identity: &Identity,
        action: ActionKind,
        route: Option<&ProxyRoute>,
    ) -> Result<ActionOutcome> {
        self.calls.lock().expect("call log").push(RecordedCall {
            ordinal: identity.ordinal,
            wallet: identity.wallet.clone(),
            action,
            proxy_host: route.map(|route| route.record.host.clone()),
        });

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.panicking_accounts.contains(&identity.ordinal) {
            panic!("scripted panic for account {}", identity.ordinal);
        }
        if self.failing_accounts.contains(&identity.ordinal) || self.failing_actions.contains(&action)
        {
            return Err(anyhow!("scripted failure on {}", action.label()));
        }
        if self.rejecting_actions.contains(&action) {
            return Ok(ActionOutcome::Rejected {
                status: "0".to_string(),
                message: "scripted rejection".to_string(),
            });
        }
        Ok(ActionOutcome::Accepted {
            message: "ok".to_string(),
        })
    }
}

pub fn inputs(identities: usize, wallets: &[&str]) -> InputLists {
    InputLists {
        identities: (1..=identities)
            .map(|index| format!("query_id=acc{index}"))
            .collect(),
        wallets: wallets.iter().map(ToString::to_string).collect(),
        proxies: Vec::new(),
        user_agents: vec!["Mozilla/5.0 (X11; Linux x86_64)".to_string()],
    }
}

pub fn context_with(lists: InputLists, settings: RunSettings) -> RunContext {
    let proxy_pool = Arc::new(ProxyPool::parse(&lists.proxies));
    RunContext::new(
        Uuid::new_v4(),
        settings,
        Arc::new(lists),
        proxy_pool,
        Arc::new(TransportCache::new(Duration::from_secs(1))),
    )
}
