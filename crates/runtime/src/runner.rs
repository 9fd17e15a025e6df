use anyhow::Result;
use snakebot_client::ActionClient;
use snakebot_core_types::{
    AccountReport, AccountState, ActionKind, ActionOutcome, Identity, TaskKind,
};
use std::time::Duration;
use tokio::time;
use tracing::{debug, error, warn};

use crate::context::RunContext;
use crate::format_error_chain;
use crate::initializer::initialize;

/// Drives one identity through
/// `Initializing -> TaskLoop* -> GamePlay? -> DailyClaim -> Done`.
///
/// Never fails: any error ends this identity in `Errored` and is reported in
/// the returned [`AccountReport`].
pub async fn run_account(
    ctx: &RunContext,
    client: &dyn ActionClient,
    mut identity: Identity,
) -> AccountReport {
    let mut report = AccountReport::new(identity.ordinal);

    transition(&mut report, AccountState::Initializing);
    if let Err(error) = initialize(ctx, &mut identity) {
        return fail(report, &error);
    }
    report.wallet = Some(identity.wallet.clone());

    match run_sequence(ctx, client, &identity, &mut report).await {
        Ok(()) => {
            transition(&mut report, AccountState::Done);
            report
        }
        Err(error) => fail(report, &error),
    }
}

async fn run_sequence(
    ctx: &RunContext,
    client: &dyn ActionClient,
    identity: &Identity,
    report: &mut AccountReport,
) -> Result<()> {
    let settings = &ctx.settings;

    if settings.do_tasks {
        transition(report, AccountState::TaskLoop);
        for task in TaskKind::ALL {
            match perform(ctx, client, identity, ActionKind::Task(task)).await {
                Ok(outcome) => report.record(&outcome),
                Err(error) => {
                    report.record_failure();
                    warn!(
                        account = identity.ordinal,
                        task = task.as_str(),
                        error = %format_error_chain(&error),
                        "task failed"
                    );
                }
            }
            pause(settings.task_delay).await;
        }
    }

    if settings.play_games {
        transition(report, AccountState::GamePlay);
        let outcome = perform(ctx, client, identity, ActionKind::PlayGame)
            .await
            .inspect_err(|_| report.record_failure())?;
        report.record(&outcome);
        pause(settings.game_delay).await;
    }

    transition(report, AccountState::DailyClaim);
    let outcome = perform(ctx, client, identity, ActionKind::Daily)
        .await
        .inspect_err(|_| report.record_failure())?;
    report.record(&outcome);
    Ok(())
}

async fn perform(
    ctx: &RunContext,
    client: &dyn ActionClient,
    identity: &Identity,
    action: ActionKind,
) -> Result<ActionOutcome> {
    let route = ctx.selector.next_route()?;
    client.perform(identity, action, route.as_ref()).await
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        time::sleep(delay).await;
    }
}

fn transition(report: &mut AccountReport, state: AccountState) {
    debug!(
        account = report.ordinal,
        from = report.state.as_str(),
        to = state.as_str(),
        "account state"
    );
    report.state = state;
}

fn fail(mut report: AccountReport, error: &anyhow::Error) -> AccountReport {
    let message = format_error_chain(error);
    error!(
        account = report.ordinal,
        state = report.state.as_str(),
        error = %message,
        "account failed"
    );
    report.state = AccountState::Errored;
    report.error = Some(message);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RunSettings;
    use crate::testing::{context_with, inputs, ScriptedClient};
    use std::sync::Arc;

    fn all_actions() -> Vec<ActionKind> {
        vec![
            ActionKind::Task(TaskKind::FollowChannel),
            ActionKind::Task(TaskKind::JoinGroup),
            ActionKind::Task(TaskKind::FollowSocial),
            ActionKind::PlayGame,
            ActionKind::Daily,
        ]
    }

    #[tokio::test]
    async fn full_sequence_runs_in_order() {
        let ctx = context_with(inputs(1, &["0xw1"]), RunSettings::default());
        let client = ScriptedClient::default();

        let report = run_account(&ctx, &client, Identity::new(1, "acc")).await;

        assert_eq!(report.state, AccountState::Done);
        assert_eq!(report.accepted, 5);
        assert_eq!(report.wallet.as_deref(), Some("0xw1"));
        assert_eq!(client.actions_for(1), all_actions());
    }

    #[tokio::test]
    async fn disabled_phases_leave_only_daily_claim() {
        let settings = RunSettings {
            do_tasks: false,
            play_games: false,
            ..RunSettings::default()
        };
        let ctx = context_with(inputs(1, &["0xw1"]), settings);
        let client = ScriptedClient::default();

        let report = run_account(&ctx, &client, Identity::new(1, "acc")).await;

        assert_eq!(report.state, AccountState::Done);
        assert_eq!(client.actions_for(1), vec![ActionKind::Daily]);
    }

    #[tokio::test]
    async fn task_failure_does_not_stop_the_sequence() {
        let ctx = context_with(inputs(1, &["0xw1"]), RunSettings::default());
        let client = ScriptedClient::default()
            .failing_action(ActionKind::Task(TaskKind::JoinGroup));

        let report = run_account(&ctx, &client, Identity::new(1, "acc")).await;

        assert_eq!(report.state, AccountState::Done);
        assert_eq!(report.failed, 1);
        assert_eq!(report.accepted, 4);
        assert_eq!(client.actions_for(1), all_actions());
    }

    #[tokio::test]
    async fn rejected_game_still_claims_daily() {
        let ctx = context_with(inputs(1, &["0xw1"]), RunSettings::default());
        let client = ScriptedClient::default().rejecting_action(ActionKind::PlayGame);

        let report = run_account(&ctx, &client, Identity::new(1, "acc")).await;

        assert_eq!(report.state, AccountState::Done);
        assert_eq!(report.rejected, 1);
        assert_eq!(client.actions_for(1).last(), Some(&ActionKind::Daily));
    }

    #[tokio::test]
    async fn game_transport_error_moves_account_to_errored() {
        let ctx = context_with(inputs(1, &["0xw1"]), RunSettings::default());
        let client = ScriptedClient::default().failing_action(ActionKind::PlayGame);

        let report = run_account(&ctx, &client, Identity::new(1, "acc")).await;

        assert_eq!(report.state, AccountState::Errored);
        assert!(report
            .error
            .as_deref()
            .is_some_and(|message| message.contains("scripted failure")));
        assert!(!client.actions_for(1).contains(&ActionKind::Daily));
    }

    #[tokio::test]
    async fn initialization_failure_makes_no_remote_calls() {
        let mut lists = inputs(1, &["0xw1"]);
        lists.user_agents.clear();
        let ctx = context_with(lists, RunSettings::default());
        let client = ScriptedClient::default();

        let report = run_account(&ctx, &client, Identity::new(1, "acc")).await;

        assert_eq!(report.state, AccountState::Errored);
        assert!(report.wallet.is_none());
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn delays_follow_each_task_and_the_game() {
        let settings = RunSettings {
            task_delay: Duration::from_secs(2),
            game_delay: Duration::from_secs(5),
            ..RunSettings::default()
        };
        let ctx = Arc::new(context_with(inputs(1, &["0xw1"]), settings));
        let client = ScriptedClient::default();

        let started = time::Instant::now();
        let report = run_account(&ctx, &client, Identity::new(1, "acc")).await;
        let elapsed = started.elapsed();

        assert_eq!(report.state, AccountState::Done);
        assert!(elapsed >= Duration::from_secs(11), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_secs(12), "elapsed {elapsed:?}");
    }

    #[tokio::test]
    async fn rotation_passes_a_route_on_every_call() {
        let settings = RunSettings {
            rotate_proxy: true,
            do_tasks: false,
            ..RunSettings::default()
        };
        let mut lists = inputs(1, &["0xw1"]);
        lists.proxies = vec!["10.1.1.1:8080:http".to_string()];
        let ctx = context_with(lists, settings);
        let client = ScriptedClient::default();

        let report = run_account(&ctx, &client, Identity::new(1, "acc")).await;

        assert_eq!(report.state, AccountState::Done);
        let hosts = client.proxy_hosts();
        assert_eq!(hosts.len(), 2);
        assert!(hosts
            .iter()
            .all(|host| host.as_deref() == Some("10.1.1.1")));
    }
}
