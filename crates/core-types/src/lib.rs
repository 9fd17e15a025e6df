use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One account processed through the action sequence in a cycle.
///
/// Built fresh for every runner invocation; `wallet`, `user_agent` and `token`
/// stay empty until the initializer binds them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub ordinal: usize,
    pub record: String,
    pub wallet: String,
    pub user_agent: String,
    pub token: String,
}

impl Identity {
    pub fn new(ordinal: usize, record: impl Into<String>) -> Self {
        Self {
            ordinal,
            record: record.into(),
            wallet: String::new(),
            user_agent: String::new(),
            token: String::new(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        !self.wallet.is_empty() && !self.token.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    FollowChannel,
    JoinGroup,
    FollowSocial,
}

impl TaskKind {
    /// Fixed execution order of the task loop.
    pub const ALL: [TaskKind; 3] = [Self::FollowChannel, Self::JoinGroup, Self::FollowSocial];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FollowChannel => "FOLLOW_TELEGRAM",
            Self::JoinGroup => "JOIN_TELEGRAM_GROUP",
            Self::FollowSocial => "FOLLOW_TWITTER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Task(TaskKind),
    PlayGame,
    Daily,
}

impl ActionKind {
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Task(_) => "doTask",
            Self::PlayGame => "playGame",
            Self::Daily => "getDaily",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Task(task) => task.as_str(),
            Self::PlayGame => "game",
            Self::Daily => "daily",
        }
    }
}

/// Response envelope returned by every remote action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteReply {
    #[serde(default)]
    pub status: serde_json::Value,
    #[serde(default)]
    pub message: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionOutcome {
    Accepted { message: String },
    Rejected { status: String, message: String },
}

impl ActionOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Accepted { message } | Self::Rejected { message, .. } => message,
        }
    }
}

impl From<RemoteReply> for ActionOutcome {
    fn from(reply: RemoteReply) -> Self {
        let message = match reply.message {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(text) => text,
            other => other.to_string(),
        };
        if reply.status.as_f64() == Some(1.0) {
            Self::Accepted { message }
        } else {
            Self::Rejected {
                status: reply.status.to_string(),
                message,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountState {
    Initializing,
    TaskLoop,
    GamePlay,
    DailyClaim,
    Done,
    Errored,
}

impl AccountState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::TaskLoop => "task_loop",
            Self::GamePlay => "game_play",
            Self::DailyClaim => "daily_claim",
            Self::Done => "done",
            Self::Errored => "errored",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountReport {
    pub ordinal: usize,
    pub wallet: Option<String>,
    pub state: AccountState,
    pub accepted: u64,
    pub rejected: u64,
    pub failed: u64,
    pub error: Option<String>,
}

impl AccountReport {
    pub fn new(ordinal: usize) -> Self {
        Self {
            ordinal,
            wallet: None,
            state: AccountState::Initializing,
            accepted: 0,
            rejected: 0,
            failed: 0,
            error: None,
        }
    }

    pub fn errored(ordinal: usize, error: impl Into<String>) -> Self {
        Self {
            state: AccountState::Errored,
            error: Some(error.into()),
            ..Self::new(ordinal)
        }
    }

    pub fn record(&mut self, outcome: &ActionOutcome) {
        if outcome.is_accepted() {
            self.accepted += 1;
        } else {
            self.rejected += 1;
        }
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleSummary {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub identities: usize,
    pub done: usize,
    pub errored: usize,
    pub accepted: u64,
    pub rejected: u64,
    pub failed: u64,
    pub peak_concurrency: usize,
}

impl CycleSummary {
    pub fn begin(cycle_id: Uuid, identities: usize) -> Self {
        let now = Utc::now();
        Self {
            cycle_id,
            started_at: now,
            finished_at: now,
            identities,
            done: 0,
            errored: 0,
            accepted: 0,
            rejected: 0,
            failed: 0,
            peak_concurrency: 0,
        }
    }

    pub fn absorb(&mut self, report: &AccountReport) {
        match report.state {
            AccountState::Errored => self.errored += 1,
            _ => self.done += 1,
        }
        self.accepted += report.accepted;
        self.rejected += report.rejected;
        self.failed += report.failed;
    }

    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
    }

    pub fn finished(&self) -> usize {
        self.done + self.errored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_one_is_accepted_and_keeps_message() {
        let reply: RemoteReply =
            serde_json::from_value(json!({"status": 1, "message": "claimed"})).expect("reply");
        assert_eq!(
            ActionOutcome::from(reply),
            ActionOutcome::Accepted {
                message: "claimed".to_string()
            }
        );
    }

    #[test]
    fn float_status_one_is_accepted() {
        let reply: RemoteReply =
            serde_json::from_value(json!({"status": 1.0, "message": "ok"})).expect("reply");
        assert!(ActionOutcome::from(reply).is_accepted());
    }

    #[test]
    fn other_status_values_are_rejected() {
        for status in [json!(0), json!(2), json!(1.5), json!("1"), json!(null)] {
            let reply: RemoteReply =
                serde_json::from_value(json!({"status": status, "message": "nope"}))
                    .expect("reply");
            let outcome = ActionOutcome::from(reply);
            assert!(!outcome.is_accepted(), "status {status} must be rejected");
            assert_eq!(outcome.message(), "nope");
        }
    }

    #[test]
    fn missing_fields_decode_as_rejected_with_empty_message() {
        let reply: RemoteReply = serde_json::from_value(json!({})).expect("reply");
        let outcome = ActionOutcome::from(reply);
        assert!(!outcome.is_accepted());
        assert_eq!(outcome.message(), "");
    }

    #[test]
    fn task_order_and_wire_labels_are_fixed() {
        let labels: Vec<&str> = TaskKind::ALL.iter().map(|task| task.as_str()).collect();
        assert_eq!(
            labels,
            vec!["FOLLOW_TELEGRAM", "JOIN_TELEGRAM_GROUP", "FOLLOW_TWITTER"]
        );
        assert_eq!(ActionKind::Task(TaskKind::JoinGroup).endpoint(), "doTask");
        assert_eq!(ActionKind::PlayGame.endpoint(), "playGame");
        assert_eq!(ActionKind::Daily.endpoint(), "getDaily");
    }

    #[test]
    fn summary_counts_errored_separately_from_done() {
        let mut summary = CycleSummary::begin(Uuid::new_v4(), 2);
        let mut ok = AccountReport::new(1);
        ok.state = AccountState::Done;
        ok.record(&ActionOutcome::Accepted {
            message: String::new(),
        });
        ok.record_failure();
        summary.absorb(&ok);
        summary.absorb(&AccountReport::errored(2, "boom"));
        summary.finish();

        assert_eq!(summary.done, 1);
        assert_eq!(summary.errored, 1);
        assert_eq!(summary.finished(), 2);
        assert_eq!(summary.accepted, 1);
        assert_eq!(summary.failed, 1);
        assert!(summary.finished_at >= summary.started_at);
    }
}
