//! Fault isolation for script invocations.
//!
//! Scripts run on the simulation thread and cannot be pre-empted. The
//! sandbox catches errors and panics, and measures how long the invocation
//! took: a result that arrives after the budget is discarded as if the
//! script had failed.

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use thiserror::Error;

/// Why a script invocation's result was discarded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptFault {
    /// The hook returned an error.
    #[error("{label} failed: {message}")]
    Error { label: String, message: String },
    /// The hook panicked.
    #[error("{label} panicked: {message}")]
    Panic { label: String, message: String },
    /// The hook returned after its time budget.
    #[error("{label} took {elapsed:?}, budget is {budget:?}")]
    Timeout {
        label: String,
        elapsed: Duration,
        budget: Duration,
    },
}

impl ScriptFault {
    /// The label of the invocation that faulted.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            ScriptFault::Error { label, .. }
            | ScriptFault::Panic { label, .. }
            | ScriptFault::Timeout { label, .. } => label,
        }
    }
}

/// Run `hook`, converting errors, panics and budget overruns into a
/// [`ScriptFault`]. `label` names the invocation in the fault
/// (e.g. `"entity 12 update"`).
///
/// # Errors
///
/// Returns a [`ScriptFault`] if the hook fails, panics or overruns `budget`.
pub fn invoke<T>(
    label: impl FnOnce() -> String,
    budget: Duration,
    hook: impl FnOnce() -> anyhow::Result<T>,
) -> Result<T, ScriptFault> {
    let start = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(hook));
    let elapsed = start.elapsed();

    match outcome {
        Err(payload) => Err(ScriptFault::Panic {
            label: label(),
            message: panic_message(payload.as_ref()),
        }),
        Ok(Err(err)) => Err(ScriptFault::Error {
            label: label(),
            message: format!("{err:#}"),
        }),
        Ok(Ok(_)) if elapsed > budget => Err(ScriptFault::Timeout {
            label: label(),
            elapsed,
            budget,
        }),
        Ok(Ok(value)) => Ok(value),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use anyhow::bail;

    use super::*;

    const BUDGET: Duration = Duration::from_secs(5);

    #[test]
    fn test_ok_passes_through() {
        let result = invoke(|| "ok".into(), BUDGET, || Ok(42));
        assert_eq!(result, Ok(42));
    }

    #[test]
    fn test_error_becomes_fault() {
        let result: Result<(), _> = invoke(|| "entity 1 update".into(), BUDGET, || bail!("boom"));
        let fault = result.unwrap_err();
        assert!(matches!(&fault, ScriptFault::Error { message, .. } if message == "boom"));
        assert_eq!(fault.label(), "entity 1 update");
    }

    #[test]
    fn test_panic_is_caught() {
        let result: Result<(), _> = invoke(|| "p".into(), BUDGET, || panic!("kaboom"));
        assert!(matches!(result, Err(ScriptFault::Panic { message, .. }) if message == "kaboom"));
    }

    #[test]
    fn test_overrun_is_discarded() {
        let result = invoke(|| "slow".into(), Duration::ZERO, || {
            std::thread::sleep(Duration::from_millis(2));
            Ok(1)
        });
        assert!(matches!(result, Err(ScriptFault::Timeout { .. })));
    }
}
