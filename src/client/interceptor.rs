use crate::schedule::intent::{GridState, collect};
use crate::schedule::merge::MergeOutcome;
use crate::schedule::payload::rewrite_body;
use crate::ui::messages::{info, warning};

/// Route the schedule grid posts its edits to.
pub const SAVE_PATH: &str = "/weekly-grind/api/save";

/// A hook run on every outgoing body before it reaches the transport.
pub trait SaveInterceptor {
    fn before_send(&self, path: &str, body: String) -> String;
}

/// Writes the grid's "Complete" toggles into the `status` column of a save.
pub struct StatusPersist<F>
where
    F: Fn() -> GridState,
{
    ui_state: F,
    verbose: bool,
}

impl<F> StatusPersist<F>
where
    F: Fn() -> GridState,
{
    pub fn new(ui_state: F) -> Self {
        Self {
            ui_state,
            verbose: false,
        }
    }

    /// Print the merge outcome of every intercepted save.
    pub fn verbose(mut self, on: bool) -> Self {
        self.verbose = on;
        self
    }
}

impl<F> SaveInterceptor for StatusPersist<F>
where
    F: Fn() -> GridState,
{
    fn before_send(&self, path: &str, body: String) -> String {
        if !path.contains(SAVE_PATH) {
            return body;
        }

        let (out, report) = rewrite_body(&body, || collect(&(self.ui_state)()));

        if self.verbose
            && let Some(report) = report
        {
            match report.outcome {
                MergeOutcome::Rewritten { matched, dropped } => {
                    info(format!("status merge: {matched} matched, {dropped} dropped"))
                }
                MergeOutcome::Unchanged(reason) => warning(format!("status merge skipped: {reason}")),
            }
        }

        out
    }
}
