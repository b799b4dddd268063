/// Recurrence sweep
///
/// Walks every completed recurring task and rolls forward the ones whose
/// next occurrence has arrived: status back to in progress, due date set to
/// the next occurrence. Tasks completed ahead of schedule simply wait; the
/// sweep checks them again on the next pass.
///
/// One broken task never takes the sweep down. Each reset is attempted
/// independently and failures are logged and skipped, so the remaining
/// tasks still roll forward.
///
/// The reset itself is conditional in SQL on the task still being done,
/// which lets a concurrent user edit that reopened the task win over the
/// sweep.
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use taskhive_shared::models::task::Task;

use crate::notify::ProjectNotifier;
use crate::recurrence::{anchor_for, next_occurrence};

/// What one sweep pass did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepOutcome {
    /// Completed recurring tasks examined
    pub processed: usize,

    /// Tasks rolled forward to a new cycle
    pub reset: usize,
}

/// The next occurrence for a task that is due for reset at `now`
///
/// Returns None while the task's next occurrence is still in the future.
pub fn due_for_reset(task: &Task, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let pattern = task.recurrence_pattern.as_deref().unwrap_or("weekly");
    let anchor = anchor_for(task.last_completed, task.updated_at);
    let next = next_occurrence(anchor, pattern);

    (now >= next).then_some(next)
}

/// Runs one sweep pass over all completed recurring tasks
pub async fn sweep(
    pool: &PgPool,
    notifier: &dyn ProjectNotifier,
    now: DateTime<Utc>,
) -> Result<SweepOutcome, sqlx::Error> {
    let candidates = Task::list_recurring_done(pool).await?;
    let mut outcome = SweepOutcome {
        processed: candidates.len(),
        reset: 0,
    };

    for task in candidates {
        let Some(next_due) = due_for_reset(&task, now) else {
            continue;
        };

        match Task::reset_recurring(pool, task.id, next_due).await {
            Ok(Some(reset_task)) => {
                outcome.reset += 1;
                notifier.task_reset(&reset_task);
            }
            Ok(None) => {
                // Reopened or deleted since listing; nothing to do.
                tracing::debug!(task_id = %task.id, "Task no longer eligible, skipping");
            }
            Err(e) => {
                tracing::warn!(task_id = %task.id, error = %e, "Failed to reset recurring task");
            }
        }
    }

    tracing::info!(
        processed = outcome.processed,
        reset = outcome.reset,
        "Recurrence sweep complete"
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use taskhive_shared::models::task::TaskPriority;
    use uuid::Uuid;

    fn completed_task(pattern: &str, completed_at: DateTime<Utc>) -> Task {
        Task {
            id: Uuid::new_v4(),
            project_id: None,
            creator_id: Uuid::new_v4(),
            assignee_id: None,
            title: "Water the plants".to_string(),
            description: None,
            status: "done".to_string(),
            priority: TaskPriority::Medium,
            category: None,
            tags: vec![],
            due_date: Some(completed_at),
            is_recurring: true,
            recurrence_pattern: Some(pattern.to_string()),
            last_completed: Some(completed_at),
            position: 0,
            version: 1,
            created_at: completed_at - Duration::days(30),
            updated_at: completed_at,
        }
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_weekly_task_waits_out_its_interval() {
        let task = completed_task("weekly", at(2025, 6, 1));

        // Six days in, nothing happens.
        assert_eq!(due_for_reset(&task, at(2025, 6, 7)), None);

        // On day seven the task is due again, exactly one interval after
        // completion.
        assert_eq!(due_for_reset(&task, at(2025, 6, 8)), Some(at(2025, 6, 8)));
        assert_eq!(due_for_reset(&task, at(2025, 6, 12)), Some(at(2025, 6, 8)));
    }

    #[test]
    fn test_daily_task_resets_next_day() {
        let task = completed_task("daily", at(2025, 6, 1));

        assert_eq!(due_for_reset(&task, at(2025, 6, 1)), None);
        assert_eq!(due_for_reset(&task, at(2025, 6, 2)), Some(at(2025, 6, 2)));
    }

    #[test]
    fn test_missing_pattern_defaults_to_weekly() {
        let mut task = completed_task("weekly", at(2025, 6, 1));
        task.recurrence_pattern = None;

        assert_eq!(due_for_reset(&task, at(2025, 6, 8)), Some(at(2025, 6, 8)));
    }

    #[test]
    fn test_anchor_is_completion_not_sweep_time() {
        // Completed June 1, sweep runs late on June 20. The next due date is
        // still June 8, one interval after completion.
        let task = completed_task("weekly", at(2025, 6, 1));

        assert_eq!(due_for_reset(&task, at(2025, 6, 20)), Some(at(2025, 6, 8)));
    }

    #[test]
    fn test_falls_back_to_updated_at_without_last_completed() {
        let mut task = completed_task("daily", at(2025, 6, 1));
        task.last_completed = None;
        task.updated_at = at(2025, 6, 3);

        assert_eq!(due_for_reset(&task, at(2025, 6, 3)), None);
        assert_eq!(due_for_reset(&task, at(2025, 6, 4)), Some(at(2025, 6, 4)));
    }
}
