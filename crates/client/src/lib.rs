mod http_utils;
pub mod signing;

pub use self::signing::{compute_sign, derive_token, ActionBody, SignedFields};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use snakebot_config::RemoteConfig;
use snakebot_core_types::{ActionKind, ActionOutcome, Identity, RemoteReply, TaskKind};
use snakebot_proxy::ProxyRoute;
use tracing::{error, info};

use self::http_utils::{classify_request_error, join_endpoint, validate_endpoint_url};

/// The three remote operations an account runs.
///
/// `route` is the proxy picked for this single request, `None` when rotation
/// is off. Non-success replies come back as `Ok(ActionOutcome::Rejected)`;
/// transport failures are `Err`. Nothing is retried.
#[async_trait]
pub trait ActionClient: Send + Sync {
    async fn perform(
        &self,
        identity: &Identity,
        action: ActionKind,
        route: Option<&ProxyRoute>,
    ) -> Result<ActionOutcome>;

    async fn do_task(
        &self,
        identity: &Identity,
        task: TaskKind,
        route: Option<&ProxyRoute>,
    ) -> Result<ActionOutcome> {
        self.perform(identity, ActionKind::Task(task), route).await
    }

    async fn play_game(
        &self,
        identity: &Identity,
        route: Option<&ProxyRoute>,
    ) -> Result<ActionOutcome> {
        self.perform(identity, ActionKind::PlayGame, route).await
    }

    async fn get_daily(
        &self,
        identity: &Identity,
        route: Option<&ProxyRoute>,
    ) -> Result<ActionOutcome> {
        self.perform(identity, ActionKind::Daily, route).await
    }
}

#[derive(Debug, Clone)]
pub struct HttpActionClient {
    base_url: String,
    direct: Client,
}

impl HttpActionClient {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let base_url = config.base_url.trim().to_string();
        validate_endpoint_url(&base_url)
            .with_context(|| format!("invalid remote base url {:?}", base_url))?;
        let direct = Client::builder()
            .no_proxy()
            .timeout(config.request_timeout())
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self { base_url, direct })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ActionClient for HttpActionClient {
    async fn perform(
        &self,
        identity: &Identity,
        action: ActionKind,
        route: Option<&ProxyRoute>,
    ) -> Result<ActionOutcome> {
        let task = match action {
            ActionKind::Task(task) => Some(task.as_str()),
            ActionKind::PlayGame | ActionKind::Daily => None,
        };
        let body = ActionBody::new(&identity.wallet, task, &identity.user_agent)?;
        let url = join_endpoint(&self.base_url, action.endpoint());

        let client = route.map_or(&self.direct, |route| route.transport.client());
        let mut request = client
            .post(&url)
            .header(USER_AGENT, identity.user_agent.as_str())
            .header(AUTHORIZATION, identity.token.as_str())
            .json(&body);
        if let Some(route) = route {
            request = request
                .header("X-Forwarded-For", route.record.host.as_str())
                .header("Forwarded", format!("for={}", route.record.host));
        }

        let response = request.send().await.map_err(|error| {
            anyhow!(
                "{} request failed ({}): {}",
                action.endpoint(),
                classify_request_error(&error),
                error
            )
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!(
                "{} returned http status {}",
                action.endpoint(),
                status
            ));
        }
        let reply: RemoteReply = response
            .json()
            .await
            .with_context(|| format!("{} returned an undecodable body", action.endpoint()))?;

        let outcome = ActionOutcome::from(reply);
        log_outcome(identity, action, &outcome);
        Ok(outcome)
    }
}

pub fn log_outcome(identity: &Identity, action: ActionKind, outcome: &ActionOutcome) {
    match outcome {
        ActionOutcome::Accepted { message } => info!(
            account = identity.ordinal,
            action = action.label(),
            message = %message,
            "action done"
        ),
        ActionOutcome::Rejected { status, message } => error!(
            account = identity.ordinal,
            action = action.label(),
            status = %status,
            message = %message,
            "action rejected"
        ),
    }
}
