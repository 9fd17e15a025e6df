pub mod context;
pub mod initializer;
pub mod runner;
pub mod scheduler;
pub mod timer;

#[cfg(test)]
mod testing;

pub use self::context::{RunContext, RunSettings, WalletPool};
pub use self::initializer::{initialize, WalletSource};
pub use self::runner::run_account;
pub use self::scheduler::{check_preconditions, CycleError, PreconditionError, Scheduler};
pub use self::timer::{CycleTimer, TimerStats};

/// Renders an error and all of its causes on one line.
pub fn format_error_chain(error: &anyhow::Error) -> String {
    let mut chain = String::new();
    for (idx, cause) in error.chain().enumerate() {
        if idx > 0 {
            chain.push_str(" | ");
        }
        chain.push_str(&cause.to_string());
    }
    chain
}
