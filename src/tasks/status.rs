/// Snapshot of a task handed to [`Hooks`](crate::Hooks) callbacks.
///
/// Ephemeral: built for each callback and never stored by the runner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskStatus {
    /// Task name, as returned by [`Task::name`](crate::Task::name).
    pub name: String,
    /// `true` when reported before the task runs, `false` once it terminated.
    pub running: bool,
}

impl TaskStatus {
    pub(crate) fn starting(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            running: true,
        }
    }

    pub(crate) fn terminated(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            running: false,
        }
    }
}
