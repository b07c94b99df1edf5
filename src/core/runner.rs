//! # Runner: supervise a static set of tasks to completion.
//!
//! The [`Runner`] owns an ordered list of [`TaskRef`]s and a set of [`Hooks`].
//! [`Runner::run`] consumes it, starts every task on its own tokio task and waits
//! for **all** of them to terminate.
//!
//! ## Flow
//! ```text
//! Runner::run(ctx)
//!   ├─► token = ctx.child_token()
//!   ├─► for each task (registration order):
//!   │      spawn ──► on_starting(status)
//!   │                 task.run(token)      (panics caught)
//!   │                   ├─ Ok / Canceled ─► on_stopped(status)
//!   │                   └─ Err(e)        ─► on_failed(status, e)
//!   │                                       └─ CancelSiblings or Fatal → token.cancel()
//!   └─► join all ──► RunReport
//! ```
//!
//! ## Rules
//! - `on_starting` for a task always precedes that task's terminal callback.
//! - Exactly one terminal callback per task.
//! - No ordering across tasks.
//! - `run` never returns before every task terminated; a task that ignores its
//!   token keeps `run` waiting (no forced termination).
//! - Adding after `run` is impossible: `run` takes the runner by value.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span};

use crate::core::{config::RunnerConfig, hooks::Hooks, report::RunReport};
use crate::error::TaskError;
use crate::policies::FailurePolicy;
use crate::tasks::{Task, TaskRef, TaskStatus};

/// Supervises a fixed set of tasks concurrently.
///
/// # Example
/// ```rust
/// use tokio_util::sync::CancellationToken;
/// use svcvisor::{Hooks, Runner, TaskError, TaskFn};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let mut runner = Runner::new().with_hooks(Hooks::logging());
///     runner.add(TaskFn::arc("once", |_ctx: CancellationToken| async { Ok::<_, TaskError>(()) }));
///     runner.add(TaskFn::arc("broken", |_ctx: CancellationToken| async { Err::<(), _>(TaskError::fail("boom")) }));
///
///     let report = runner.run(CancellationToken::new()).await;
///     assert_eq!(report.total(), 2);
///     assert_eq!(report.failed().len(), 1);
/// }
/// ```
#[derive(Default)]
pub struct Runner {
    cfg: RunnerConfig,
    hooks: Hooks,
    tasks: Vec<TaskRef>,
}

impl Runner {
    /// Creates an empty runner with default config and no hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty runner with the given config.
    pub fn with_config(cfg: RunnerConfig) -> Self {
        Self {
            cfg,
            ..Self::default()
        }
    }

    /// Replaces the lifecycle callbacks.
    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Replaces the lifecycle callbacks in place.
    pub fn set_hooks(&mut self, hooks: Hooks) {
        self.hooks = hooks;
    }

    /// Replaces the failure policy.
    pub fn set_failure_policy(&mut self, failure: FailurePolicy) {
        self.cfg.failure = failure;
    }

    /// Appends a task to the supervised set.
    ///
    /// Names should be unique; duplicates only make logs ambiguous.
    pub fn add(&mut self, task: TaskRef) {
        self.tasks.push(task);
    }

    /// Appends an owned task to the supervised set.
    pub fn add_task(&mut self, task: impl Task) {
        self.add(Arc::new(task));
    }

    /// Names of the registered tasks, in registration order.
    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.name()).collect()
    }

    /// Number of registered tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True if no task was registered.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Runs every task concurrently until all of them terminated.
    ///
    /// Tasks run inside the caller's current span. Cancelling `ctx` is the only
    /// way to request a coordinated shutdown. The returned
    /// [`RunReport`] mirrors the terminal callbacks that were issued.
    pub async fn run(self, ctx: CancellationToken) -> RunReport {
        let token = ctx.child_token();
        let hooks = Arc::new(self.hooks);
        let failure = self.cfg.failure;

        let handles: Vec<_> = self
            .tasks
            .into_iter()
            .map(|task| {
                let name = task.name().to_owned();
                let handle = tokio::spawn(
                    supervise(task, Arc::clone(&hooks), token.clone(), failure)
                        .instrument(Span::current()),
                );
                (name, handle)
            })
            .collect();

        let (names, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        let mut report = RunReport::default();
        for (name, joined) in names.into_iter().zip(join_all(handles).await) {
            match joined {
                Ok(Ok(())) => report.record_stopped(name),
                Ok(Err(err)) => report.record_failed(name, &err),
                Err(join_err) => {
                    // Only reachable when a hook itself panicked.
                    let err = TaskError::Panicked {
                        info: join_err.to_string(),
                    };
                    tracing::error!(task = %name, error = %err, "task supervisor aborted");
                    report.record_failed(name, &err);
                }
            }
        }
        report
    }
}

/// Runs one task and issues its lifecycle callbacks.
///
/// Returns `Ok(())` for a graceful stop, the task's error otherwise.
async fn supervise(
    task: TaskRef,
    hooks: Arc<Hooks>,
    token: CancellationToken,
    failure: FailurePolicy,
) -> Result<(), TaskError> {
    hooks.starting(&TaskStatus::starting(task.name()));

    let res = AssertUnwindSafe(task.run(token.clone()))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            Err(TaskError::Panicked {
                info: panic_message(panic.as_ref()),
            })
        });

    let status = TaskStatus::terminated(task.name());
    match res {
        Ok(()) | Err(TaskError::Canceled) => {
            hooks.stopped(&status);
            Ok(())
        }
        Err(err) => {
            hooks.failed(&status, &err);
            if failure.cancels_siblings() || matches!(err, TaskError::Fatal { .. }) {
                token.cancel();
            }
            Err(err)
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use tokio::time::{sleep, timeout};

    use super::*;
    use crate::tasks::TaskFn;

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum Seen {
        Starting(String),
        Stopped(String),
        Failed(String, String),
    }

    fn recording_hooks() -> (Hooks, Arc<Mutex<Vec<Seen>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (a, b, c) = (log.clone(), log.clone(), log.clone());
        let hooks = Hooks::new()
            .on_starting(move |st| {
                assert!(st.running);
                a.lock().unwrap().push(Seen::Starting(st.name.clone()));
            })
            .on_stopped(move |st| {
                assert!(!st.running);
                b.lock().unwrap().push(Seen::Stopped(st.name.clone()));
            })
            .on_failed(move |st, err| {
                c.lock()
                    .unwrap()
                    .push(Seen::Failed(st.name.clone(), err.to_string()));
            });
        (hooks, log)
    }

    fn count(log: &[Seen], f: impl Fn(&Seen) -> bool) -> usize {
        log.iter().filter(|s| f(s)).count()
    }

    fn waits_for_cancel(name: &'static str) -> TaskRef {
        TaskFn::arc(name, |ctx: CancellationToken| async move {
            ctx.cancelled().await;
            Err::<(), _>(TaskError::Canceled)
        })
    }

    #[tokio::test]
    async fn test_two_succeed_one_fails_after_delay() {
        let (hooks, log) = recording_hooks();
        let mut runner = Runner::new().with_hooks(hooks);
        runner.add(TaskFn::arc("a", |_ctx: CancellationToken| async { Ok::<_, TaskError>(()) }));
        runner.add(TaskFn::arc("b", |_ctx: CancellationToken| async { Ok::<_, TaskError>(()) }));
        runner.add(TaskFn::arc("c", |_ctx: CancellationToken| async {
            sleep(Duration::from_millis(50)).await;
            Err::<(), _>(TaskError::fail("disk full"))
        }));

        let report = timeout(Duration::from_secs(5), runner.run(CancellationToken::new()))
            .await
            .unwrap();

        let log = log.lock().unwrap().clone();
        assert_eq!(log.len(), 6);
        assert_eq!(count(&log, |s| matches!(s, Seen::Starting(_))), 3);
        assert_eq!(count(&log, |s| matches!(s, Seen::Stopped(_))), 2);
        assert!(log.contains(&Seen::Failed(
            "c".into(),
            "execution failed: disk full".into()
        )));

        assert_eq!(report.total(), 3);
        assert_eq!(report.failed().len(), 1);
        assert_eq!(report.failed()[0].name, "c");
        assert_eq!(report.failed()[0].label, "task_failed");
        assert!(!report.is_success());
    }

    #[tokio::test]
    async fn test_starting_precedes_terminal_for_each_task() {
        let (hooks, log) = recording_hooks();
        let mut runner = Runner::new().with_hooks(hooks);
        for (i, name) in ["t0", "t1", "t2", "t3", "t4"].into_iter().enumerate() {
            runner.add(TaskFn::arc(name, move |_ctx: CancellationToken| async move {
                sleep(Duration::from_millis(10 * (5 - i as u64))).await;
                if i % 2 == 0 {
                    Ok::<_, TaskError>(())
                } else {
                    Err(TaskError::fail("odd"))
                }
            }));
        }

        let report = runner.run(CancellationToken::new()).await;
        assert_eq!(report.total(), 5);

        let log = log.lock().unwrap().clone();
        for name in ["t0", "t1", "t2", "t3", "t4"] {
            let starts: Vec<_> = log
                .iter()
                .enumerate()
                .filter(|(_, s)| **s == Seen::Starting(name.into()))
                .map(|(i, _)| i)
                .collect();
            let ends: Vec<_> = log
                .iter()
                .enumerate()
                .filter(|(_, s)| match s {
                    Seen::Stopped(n) | Seen::Failed(n, _) => n == name,
                    Seen::Starting(_) => false,
                })
                .map(|(i, _)| i)
                .collect();
            assert_eq!(starts.len(), 1, "{name} started once");
            assert_eq!(ends.len(), 1, "{name} terminated once");
            assert!(starts[0] < ends[0], "{name} started before terminating");
        }
    }

    #[tokio::test]
    async fn test_cancel_stops_cooperating_tasks() {
        let (hooks, log) = recording_hooks();
        let mut runner = Runner::new().with_hooks(hooks);
        runner.add(waits_for_cancel("x"));
        runner.add(waits_for_cancel("y"));
        runner.add(waits_for_cancel("z"));

        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(30)).await;
            canceller.cancel();
        });

        let report = timeout(Duration::from_secs(5), runner.run(token))
            .await
            .expect("run returns after cancellation");
        assert_eq!(report.stopped().len(), 3);
        assert!(report.is_success());

        let log = log.lock().unwrap().clone();
        assert_eq!(count(&log, |s| matches!(s, Seen::Stopped(_))), 3);
    }

    #[tokio::test]
    async fn test_continue_policy_leaves_siblings_running() {
        let sibling_cancelled = Arc::new(AtomicBool::new(false));
        let flag = sibling_cancelled.clone();

        let mut runner = Runner::new();
        runner.add(TaskFn::arc("fails", |_ctx: CancellationToken| async { Err::<(), _>(TaskError::fail("boom")) }));
        runner.add(TaskFn::arc("sibling", move |ctx: CancellationToken| {
            let flag = flag.clone();
            async move {
                tokio::select! {
                    _ = ctx.cancelled() => {
                        flag.store(true, Ordering::SeqCst);
                        Err(TaskError::Canceled)
                    }
                    _ = sleep(Duration::from_millis(100)) => Ok::<_, TaskError>(()),
                }
            }
        }));

        let report = runner.run(CancellationToken::new()).await;
        assert!(!sibling_cancelled.load(Ordering::SeqCst));
        assert_eq!(report.stopped(), ["sibling".to_string()]);
        assert_eq!(report.failed().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_siblings_policy() {
        let parent = CancellationToken::new();
        let mut runner = Runner::with_config(RunnerConfig::cancel_on_failure());
        runner.add(TaskFn::arc("fails", |_ctx: CancellationToken| async {
            sleep(Duration::from_millis(20)).await;
            Err::<(), _>(TaskError::fail("lost connection"))
        }));
        runner.add(waits_for_cancel("listener"));

        let report = timeout(Duration::from_secs(5), runner.run(parent.clone()))
            .await
            .expect("siblings cancelled after failure");
        assert_eq!(report.stopped(), ["listener".to_string()]);
        assert_eq!(report.failed()[0].label, "task_failed");
        assert!(!parent.is_cancelled(), "caller token is never cancelled");
    }

    #[tokio::test]
    async fn test_fatal_error_cancels_siblings_under_continue() {
        let parent = CancellationToken::new();
        let mut runner = Runner::new();
        runner.add(TaskFn::arc("bridge", |_ctx: CancellationToken| async {
            sleep(Duration::from_millis(20)).await;
            Err::<(), _>(TaskError::fatal("credentials revoked"))
        }));
        runner.add(waits_for_cancel("listener"));

        let report = timeout(Duration::from_secs(5), runner.run(parent.clone()))
            .await
            .expect("fatal failure stops siblings");
        assert_eq!(report.stopped(), ["listener".to_string()]);
        assert_eq!(report.failed()[0].label, "task_fatal");
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn test_panicking_task_is_reported_as_failure() {
        let (hooks, log) = recording_hooks();
        let mut runner = Runner::new().with_hooks(hooks);
        runner.add(TaskFn::arc("panics", |_ctx: CancellationToken| async {
            if true {
                panic!("kaboom");
            }
            Ok::<_, TaskError>(())
        }));
        runner.add(TaskFn::arc("fine", |_ctx: CancellationToken| async { Ok::<_, TaskError>(()) }));

        let report = runner.run(CancellationToken::new()).await;
        assert_eq!(report.total(), 2);
        assert_eq!(report.failed()[0].label, "task_panicked");

        let log = log.lock().unwrap().clone();
        assert!(log.contains(&Seen::Failed("panics".into(), "task panicked: kaboom".into())));
    }

    #[tokio::test]
    async fn test_empty_runner_returns_immediately() {
        let runner = Runner::new();
        assert!(runner.is_empty());
        let report = timeout(Duration::from_secs(1), runner.run(CancellationToken::new()))
            .await
            .unwrap();
        assert_eq!(report.total(), 0);
        assert!(report.is_success());
    }

    #[test]
    fn test_task_names_in_registration_order() {
        let mut runner = Runner::new();
        runner.add(waits_for_cancel("first"));
        runner.add(waits_for_cancel("second"));
        assert_eq!(runner.task_names(), vec!["first", "second"]);
        assert_eq!(runner.len(), 2);
    }
}
