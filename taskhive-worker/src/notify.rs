/// Update notifications for reset tasks
///
/// The sweeper reports every task it rolls forward through a notifier, so
/// delivery (log line today, push channel later) is swappable without
/// touching the sweep itself.
use taskhive_shared::models::task::Task;

/// Receives notifications about tasks the sweep has reset
pub trait ProjectNotifier: Send + Sync {
    /// Called after a recurring task was rolled forward to a new cycle
    fn task_reset(&self, task: &Task);
}

/// Notifier that emits a structured log line per reset task
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl TracingNotifier {
    pub fn new() -> Self {
        TracingNotifier
    }
}

impl ProjectNotifier for TracingNotifier {
    fn task_reset(&self, task: &Task) {
        tracing::info!(
            task_id = %task.id,
            project_id = ?task.project_id,
            due_date = ?task.due_date,
            pattern = task.recurrence_pattern.as_deref().unwrap_or("weekly"),
            "Recurring task reset for next cycle"
        );
    }
}
