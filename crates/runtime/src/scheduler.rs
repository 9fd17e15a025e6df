use snakebot_client::ActionClient;
use snakebot_core_types::{AccountReport, CycleSummary, Identity};
use snakebot_inputs::InputLists;
use snakebot_proxy::{ProxyPool, TransportCache};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::context::{RunContext, RunSettings};
use crate::runner::run_account;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreconditionError {
    NoIdentities,
    NoWallets,
    NoProxies,
}

impl fmt::Display for PreconditionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoIdentities => write!(f, "no accounts found in the identity list"),
            Self::NoWallets => write!(f, "no wallets found in the wallet list"),
            Self::NoProxies => write!(
                f,
                "proxy rotation is enabled but the proxy list has no usable entries"
            ),
        }
    }
}

impl std::error::Error for PreconditionError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleError {
    Precondition(PreconditionError),
    AlreadyRunning,
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Precondition(reason) => write!(f, "cycle aborted: {}", reason),
            Self::AlreadyRunning => write!(f, "a cycle is already running"),
        }
    }
}

impl std::error::Error for CycleError {}

impl From<PreconditionError> for CycleError {
    fn from(reason: PreconditionError) -> Self {
        Self::Precondition(reason)
    }
}

/// Runs every identity through [`run_account`] with at most
/// `settings.concurrency` runners alive at once.
pub struct Scheduler {
    client: Arc<dyn ActionClient>,
    settings: RunSettings,
    transport_cache: Arc<TransportCache>,
    running: AtomicBool,
}

impl Scheduler {
    pub fn new(
        client: Arc<dyn ActionClient>,
        settings: RunSettings,
        transport_cache: Arc<TransportCache>,
    ) -> Self {
        Self {
            client,
            settings,
            transport_cache,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// One full pass over `inputs.identities`. Returns once every identity is
    /// terminal; precondition failures abort before any remote call. Dropping
    /// the returned future aborts every account runner it started.
    pub async fn run_cycle(&self, inputs: Arc<InputLists>) -> Result<CycleSummary, CycleError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("cycle requested while another is running");
            return Err(CycleError::AlreadyRunning);
        }
        let _running = RunningFlag(&self.running);

        let proxy_pool = Arc::new(ProxyPool::parse(&inputs.proxies));
        if let Err(reason) = check_preconditions(&inputs, &proxy_pool, self.settings.rotate_proxy)
        {
            error!(reason = %reason, "cycle aborted before start");
            return Err(reason.into());
        }

        let cycle_id = Uuid::new_v4();
        info!(
            cycle_id = %cycle_id,
            accounts = inputs.identities.len(),
            wallets = inputs.wallets.len(),
            proxies = proxy_pool.len(),
            concurrency = self.settings.concurrency,
            "running accounts"
        );

        let mut summary = CycleSummary::begin(cycle_id, inputs.identities.len());
        let ctx = Arc::new(RunContext::new(
            cycle_id,
            self.settings.clone(),
            inputs.clone(),
            proxy_pool,
            self.transport_cache.clone(),
        ));
        let slots = Arc::new(Semaphore::new(self.settings.concurrency.max(1)));
        let mut workers: JoinSet<AccountReport> = JoinSet::new();
        let mut ordinals: HashMap<task::Id, usize> = HashMap::new();

        for (index, record) in inputs.identities.iter().enumerate() {
            let ordinal = index + 1;
            // Admission follows input order: the next identity waits here for a slot.
            let permit = match slots.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(closed) => {
                    error!(error = %closed, "concurrency slots closed, stopping admission");
                    break;
                }
            };
            let identity = Identity::new(ordinal, record.clone());
            let runner_ctx = ctx.clone();
            let client = self.client.clone();
            let handle = workers.spawn(async move {
                let _permit = permit;
                let _active = runner_ctx.enter();
                run_account(&runner_ctx, client.as_ref(), identity).await
            });
            ordinals.insert(handle.id(), ordinal);
            debug!(account = ordinal, active = ctx.active(), "account admitted");
        }

        while let Some(joined) = workers.join_next_with_id().await {
            let report = match joined {
                Ok((_, report)) => report,
                Err(join_error) => {
                    let ordinal = ordinals.get(&join_error.id()).copied().unwrap_or_default();
                    let message = join_error_message(join_error);
                    error!(account = ordinal, error = %message, "account runner aborted");
                    AccountReport::errored(ordinal, message)
                }
            };
            summary.absorb(&report);
        }

        summary.peak_concurrency = ctx.peak_active();
        summary.finish();
        info!(
            cycle_id = %cycle_id,
            accounts = summary.identities,
            done = summary.done,
            errored = summary.errored,
            accepted = summary.accepted,
            rejected = summary.rejected,
            failed = summary.failed,
            peak_concurrency = summary.peak_concurrency,
            wallets_unused = ctx.wallet_pool.remaining(),
            proxy_transports = self.transport_cache.len(),
            proxy_transports_built = self.transport_cache.constructed(),
            "all accounts have been run"
        );
        Ok(summary)
    }
}

pub fn check_preconditions(
    inputs: &InputLists,
    proxy_pool: &ProxyPool,
    rotate_proxy: bool,
) -> Result<(), PreconditionError> {
    if inputs.identities.is_empty() {
        return Err(PreconditionError::NoIdentities);
    }
    if inputs.wallets.is_empty() {
        return Err(PreconditionError::NoWallets);
    }
    if rotate_proxy && proxy_pool.is_empty() {
        return Err(PreconditionError::NoProxies);
    }
    Ok(())
}

struct RunningFlag<'a>(&'a AtomicBool);

impl Drop for RunningFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn join_error_message(join_error: task::JoinError) -> String {
    if !join_error.is_panic() {
        return join_error.to_string();
    }
    let payload = join_error.into_panic();
    if let Some(message) = payload.downcast_ref::<String>() {
        return format!("account runner panicked: {}", message);
    }
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        return format!("account runner panicked: {}", message);
    }
    "account runner panicked: unknown panic payload".to_string()
}
