//! Execution record of a single wrapped invocation.

use std::fmt;

use chrono::{DateTime, Local, TimeDelta};
use serde::{Deserialize, Serialize};

/// Terminal outcome of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    /// Past-tense verb used in notification subjects.
    pub fn verb(&self) -> &'static str {
        match self {
            Outcome::Success => "succeeded",
            Outcome::Failure => "failed",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => write!(f, "success"),
            Outcome::Failure => write!(f, "failure"),
        }
    }
}

/// Frozen facts about one invocation of a wrapped task.
///
/// The error fields describe the last attempt only; earlier failures are
/// discarded when a retry starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub function_name: String,
    pub start_time: DateTime<Local>,
    pub end_time: DateTime<Local>,
    pub outcome: Outcome,
    pub error_message: Option<String>,
    pub traceback_text: Option<String>,
    /// Number of attempts made, always at least one.
    pub attempt_count: u32,
}

impl ExecutionRecord {
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    /// Wall-clock time from the first attempt to the terminal outcome.
    pub fn duration(&self) -> TimeDelta {
        self.end_time.signed_duration_since(self.start_time)
    }
}

/// Tracks an invocation while it is running.
///
/// Finishing consumes the tracker, so a record can only be frozen once.
#[derive(Debug)]
pub struct ExecutionTracker {
    function_name: String,
    start_time: DateTime<Local>,
    attempt_count: u32,
}

impl ExecutionTracker {
    /// Stamp the start time and begin the first attempt.
    pub fn start(function_name: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            start_time: Local::now(),
            attempt_count: 1,
        }
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    /// The attempt currently running (1-based).
    pub fn attempt(&self) -> u32 {
        self.attempt_count
    }

    /// Move on to the next attempt.
    pub fn begin_retry(&mut self) {
        self.attempt_count = self.attempt_count.saturating_add(1);
    }

    pub fn succeed(self) -> ExecutionRecord {
        self.finish(Outcome::Success, None, None)
    }

    pub fn fail(self, error_message: String, traceback_text: String) -> ExecutionRecord {
        self.finish(Outcome::Failure, Some(error_message), Some(traceback_text))
    }

    fn finish(
        self,
        outcome: Outcome,
        error_message: Option<String>,
        traceback_text: Option<String>,
    ) -> ExecutionRecord {
        ExecutionRecord {
            function_name: self.function_name,
            start_time: self.start_time,
            end_time: Local::now(),
            outcome,
            error_message,
            traceback_text,
            attempt_count: self.attempt_count,
        }
    }
}
