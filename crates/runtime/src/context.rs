use snakebot_config::RunConfig;
use snakebot_inputs::InputLists;
use snakebot_proxy::{ProxyPool, ProxySelector, TransportCache};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Per-step switches and delays an account runner follows.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub concurrency: usize,
    pub rotate_proxy: bool,
    pub do_tasks: bool,
    pub play_games: bool,
    pub task_delay: Duration,
    pub game_delay: Duration,
}

impl RunSettings {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            concurrency: config.concurrency.max(1),
            rotate_proxy: config.rotate_proxy,
            do_tasks: config.do_tasks,
            play_games: config.play_games,
            task_delay: config.task_delay(),
            game_delay: config.game_delay(),
        }
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self::from_config(&RunConfig::default())
    }
}

/// Wallets not yet handed out in the current cycle, front first.
#[derive(Debug, Default)]
pub struct WalletPool {
    queue: Mutex<VecDeque<String>>,
}

impl WalletPool {
    pub fn new(wallets: &[String]) -> Self {
        Self {
            queue: Mutex::new(wallets.iter().cloned().collect()),
        }
    }

    pub fn pop(&self) -> Option<String> {
        self.queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
    }

    pub fn remaining(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

/// Everything one cycle's runners share: the inputs, a fresh wallet pool and
/// the proxy selector backed by the process-wide transport cache.
#[derive(Debug)]
pub struct RunContext {
    pub cycle_id: Uuid,
    pub settings: RunSettings,
    pub inputs: Arc<InputLists>,
    pub wallet_pool: WalletPool,
    pub selector: ProxySelector,
    active: AtomicUsize,
    peak_active: AtomicUsize,
}

impl RunContext {
    pub fn new(
        cycle_id: Uuid,
        settings: RunSettings,
        inputs: Arc<InputLists>,
        proxy_pool: Arc<ProxyPool>,
        transport_cache: Arc<TransportCache>,
    ) -> Self {
        let selector = ProxySelector::new(proxy_pool, transport_cache, settings.rotate_proxy);
        Self {
            cycle_id,
            wallet_pool: WalletPool::new(&inputs.wallets),
            settings,
            inputs,
            selector,
            active: AtomicUsize::new(0),
            peak_active: AtomicUsize::new(0),
        }
    }

    /// Marks one runner as executing until the returned guard drops.
    pub fn enter(&self) -> ActiveRunner<'_> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_active.fetch_max(now, Ordering::SeqCst);
        ActiveRunner { ctx: self }
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn peak_active(&self) -> usize {
        self.peak_active.load(Ordering::SeqCst)
    }
}

pub struct ActiveRunner<'a> {
    ctx: &'a RunContext,
}

impl Drop for ActiveRunner<'_> {
    fn drop(&mut self) {
        self.ctx.active.fetch_sub(1, Ordering::SeqCst);
    }
}
